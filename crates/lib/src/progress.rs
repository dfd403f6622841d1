//! Progress reporting.
//!
//! A [`Progress`] wraps an optional callback receiving a message and a
//! fraction in `0.0..=1.0`. Callbacks run on the reporting thread (including
//! rayon workers during file emission) and must return promptly.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

type Callback = dyn Fn(&str, f32) + Send + Sync;

/// One progress notification, as delivered by [`Progress::channel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
  pub message: String,
  pub fraction: f32,
}

/// Injectable progress sink. The default reports nowhere.
#[derive(Clone, Default)]
pub struct Progress {
  callback: Option<Arc<Callback>>,
}

impl Progress {
  /// A sink that drops every report.
  pub fn none() -> Self {
    Self::default()
  }

  pub fn new(callback: impl Fn(&str, f32) + Send + Sync + 'static) -> Self {
    Self {
      callback: Some(Arc::new(callback)),
    }
  }

  /// A sink that forwards reports over an unbounded channel.
  ///
  /// Sending never blocks; reports are dropped once the receiver is gone.
  pub fn channel() -> (Self, Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel();
    let progress = Self::new(move |message, fraction| {
      let _ = tx.send(ProgressEvent {
        message: message.to_string(),
        fraction,
      });
    });
    (progress, rx)
  }

  pub fn is_enabled(&self) -> bool {
    self.callback.is_some()
  }

  pub fn report(&self, message: &str, fraction: f32) {
    if let Some(callback) = &self.callback {
      callback(message, fraction.clamp(0.0, 1.0));
    }
  }
}

impl fmt::Debug for Progress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Progress").field("enabled", &self.is_enabled()).finish()
  }
}
