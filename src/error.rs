use crate::entry::Handle;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("a callback is already scheduled with handle {0}")]
    DuplicateHandle(Handle),

    #[error("invalid wheel configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}
