use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn allocation_failed(requested: usize, source: TryReserveError) -> Error {
        ErrorKind::AllocationFailed { requested, source }.into()
    }

    pub fn capacity_limit(requested: usize, limit: usize) -> Error {
        ErrorKind::CapacityLimitExceeded { requested, limit }.into()
    }

    pub fn buffer_full(write_pos: usize, requested: usize, len: usize) -> Error {
        ErrorKind::BufferFull {
            write_pos,
            requested,
            len,
        }
        .into()
    }

    pub fn invalid_position(pos: usize, len: usize) -> Error {
        ErrorKind::InvalidPosition { pos, len }.into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    /// Returns `true` for failures caused by the allocator or by a capacity limit,
    /// as opposed to plain validation failures of a fixed-size buffer.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AllocationFailed { .. } | ErrorKind::CapacityLimitExceeded { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("failed to allocate storage for {requested} elements: {source}")]
    AllocationFailed {
        requested: usize,
        source: TryReserveError,
    },

    #[error("requested length {requested} exceeds the capacity limit {limit}")]
    CapacityLimitExceeded { requested: usize, limit: usize },

    #[error("buffer is full: cannot write {requested} elements at {write_pos} (length {len})")]
    BufferFull {
        write_pos: usize,
        requested: usize,
        len: usize,
    },

    #[error("write position {pos} is past the end of the buffer (length {len})")]
    InvalidPosition { pos: usize, len: usize },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
