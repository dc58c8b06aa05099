use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::VqError;

/// Cooperative cancellation flag shared between a trainer and its caller.
///
/// Clones share the same flag. Training checks it between phases and stops
/// with [`VqError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token for every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Reports whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<(), VqError> {
        if self.is_cancelled() {
            Err(VqError::Cancelled)
        } else {
            Ok(())
        }
    }
}
