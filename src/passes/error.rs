use thiserror::Error;

use crate::predict::PropagationError;

#[derive(Debug, Error)]
pub enum PassError {
    #[error("propagation failed during refinement: {0}")]
    Propagation(#[from] PropagationError),
    #[error("no falling edge within {0} s after rise; retry with a larger lookahead")]
    SetNotFound(i64),
    #[error("aborted after {0} consecutive propagation failures")]
    TooManyFailures(u32),
    #[error("search deadline exceeded")]
    DeadlineExceeded,
    #[error("invalid search window: {0}")]
    InvalidWindow(String),
    #[error("search worker failed: {0}")]
    Worker(String),
}
