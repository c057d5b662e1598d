use std::time::Duration;
use thiserror::Error;

/// Failure of a device operation. The simulated backend never produces these
/// on its own; timeouts and cancellation come from [`crate::Operation`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("device connection failed: {0}")]
    Connection(String),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("partial result: {0}")]
    Partial(String),
    #[error("operation cancelled")]
    Cancelled,
}
