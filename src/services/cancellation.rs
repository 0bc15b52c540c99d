//! Cancellation for in-flight transfers

use crate::services::transfer::TransferError;

/// A token that can be used to check if an operation has been cancelled
///
/// Clones share state. Cancellation is sticky.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Check if the operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// `Err(TransferError::Cancelled)` once cancelled, for use with `?` between chunks
    pub fn check(&self) -> Result<(), TransferError> {
        if self.is_cancelled() {
            Err(TransferError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Wait until the token is cancelled
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }
}
