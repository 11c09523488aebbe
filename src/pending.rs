//! Background work whose result is picked up from the UI tick.
//!
//! ```ignore
//! let mut load = Some(Pending::spawn(async move { client.load_storefront(policy).await }));
//!
//! // In event loop tick
//! if let Some(outcome) = Pending::take_ready(&mut load) {
//!     // Task finished, `load` is None again
//! }
//! ```

use std::future::Future;
use thiserror::Error;
use tokio::sync::oneshot;

/// The task ended without sending a result (it panicked or was aborted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("background task ended without a result")]
pub struct Cancelled;

/// Handle to a spawned task. Dropping it does not stop the task, the result
/// is just discarded.
#[derive(Debug)]
pub struct Pending<T> {
  rx: oneshot::Receiver<T>,
}

impl<T: Send + 'static> Pending<T> {
  pub fn spawn<F>(future: F) -> Self
  where
    F: Future<Output = T> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      // Receiver may be gone
      let _ = tx.send(future.await);
    });
    Self { rx }
  }

  /// Non-blocking check. `None` while the task is still running.
  pub fn poll(&mut self) -> Option<Result<T, Cancelled>> {
    match self.rx.try_recv() {
      Ok(value) => Some(Ok(value)),
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => Some(Err(Cancelled)),
    }
  }

  /// Poll the task held in `slot`, emptying the slot once it has finished.
  pub fn take_ready(slot: &mut Option<Self>) -> Option<Result<T, Cancelled>> {
    let outcome = slot.as_mut()?.poll()?;
    *slot = None;
    Some(outcome)
  }
}
