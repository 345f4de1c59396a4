//! Cooperative cancellation of DICOM P10 reads and writes.

#[cfg(feature = "std")]
use std::sync::Arc;
#[cfg(feature = "std")]
use std::sync::atomic::{AtomicBool, Ordering};

/// A caller-owned token used to cancel an in-progress read or write.
/// Cancellation is cooperative: the drivers check the token between reader
/// invocations and at least once every [`CANCELLATION_CHECK_INTERVAL`]
/// tokens, and surface [`crate::P10Error::Cancelled`] without corrupting any
/// buffered state.
///
#[cfg(feature = "std")]
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  is_cancelled: Arc<AtomicBool>,
}

/// The maximum number of tokens processed between cancellation checks.
///
pub const CANCELLATION_CHECK_INTERVAL: usize = 1000;

#[cfg(feature = "std")]
impl CancelToken {
  /// Creates a new cancellation token in the not-cancelled state.
  ///
  pub fn new() -> Self {
    Self::default()
  }

  /// Requests cancellation. This is safe to call from any thread.
  ///
  pub fn cancel(&self) {
    self.is_cancelled.store(true, Ordering::Relaxed);
  }

  /// Returns whether cancellation has been requested.
  ///
  pub fn is_cancelled(&self) -> bool {
    self.is_cancelled.load(Ordering::Relaxed)
  }
}

#[cfg(all(test, feature = "std"))]
mod tests {
  use super::*;

  #[test]
  fn cancel_token_test() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());

    let shared = token.clone();
    shared.cancel();

    assert!(token.is_cancelled());
  }
}
