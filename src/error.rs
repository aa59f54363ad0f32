use std::fmt::{Display, Formatter};
use std::num::TryFromIntError;
use std::sync::PoisonError;

use config::ConfigError;

use crate::buffer::FrameId;
use crate::storage::page::PageNo;
use crate::storage::FileId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Internal(String),
    Value(String),
    /// Every frame was observed pinned over a full clock sweep.
    BufferExhausted,
    /// Unpin of a page whose pin count is already zero.
    PageNotPinned { file: FileId, page_no: PageNo, frame_id: FrameId },
    /// A page of the file is still in use.
    PageStillPinned { file: FileId, page_no: PageNo, frame_id: FrameId },
    /// Page index and frame descriptors disagree.
    InternalInconsistency(String),
    /// Failure reported by a page store, propagated as-is.
    Storage(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal(s) | Error::Value(s) => {
                write!(f, "{}", s)
            }
            Error::BufferExhausted => write!(f, "buffer pool exhausted: all frames are pinned"),
            Error::PageNotPinned { file, page_no, frame_id } => {
                write!(f, "page {} of file {} in frame {} is not pinned", page_no, file, frame_id)
            }
            Error::PageStillPinned { file, page_no, frame_id } => {
                write!(f, "page {} of file {} in frame {} is still pinned", page_no, file, frame_id)
            }
            Error::InternalInconsistency(s) => write!(f, "internal inconsistency: {}", s),
            Error::Storage(s) => write!(f, "storage: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<TryFromIntError> for Error {
    fn from(err: TryFromIntError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<log::ParseLevelError> for Error {
    fn from(err: log::ParseLevelError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Error::Internal(err.to_string())
    }
}
