//! Error types for the stream surface.
//!
//! Byte-level operations report failure through the `Option<u8>`
//! sentinel and the stream's sticky flags; the `Result`-typed surface
//! below covers open, flush, seek, tell, close, spawn, and reap. Every
//! OS-level variant carries the raw errno captured at the failing call.

use thiserror::Error;

/// Failure opening a stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenError {
    #[error("empty path")]
    EmptyPath,
    #[error("unrecognized mode string {0:?}")]
    BadMode(String),
    #[error("path contains an embedded NUL byte")]
    NulInPath,
    #[error("os open failed: errno {errno}")]
    Os { errno: i32 },
}

/// Failure on the flush, seek, or tell path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("os read failed: errno {errno}")]
    Read { errno: i32 },
    #[error("os write failed: errno {errno}")]
    Write { errno: i32 },
    #[error("os seek failed: errno {errno}")]
    Seek { errno: i32 },
}

impl StreamError {
    /// Raw errno of the failing call.
    #[must_use]
    pub const fn errno(&self) -> i32 {
        match self {
            StreamError::Read { errno }
            | StreamError::Write { errno }
            | StreamError::Seek { errno } => *errno,
        }
    }
}

/// Failure closing a stream. The descriptor is released in either case;
/// when both steps fail, the close failure is the one reported.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CloseError {
    #[error("flush before close failed: errno {errno}")]
    Flush { errno: i32 },
    #[error("descriptor close failed: errno {errno}")]
    Close { errno: i32 },
}

/// Failure spawning a process-backed stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("command contains an embedded NUL byte")]
    NulInCommand,
    #[error("pipe creation failed: errno {errno}")]
    Pipe { errno: i32 },
    #[error("process creation failed: errno {errno}")]
    Fork { errno: i32 },
}

/// Failure closing and reaping a process-backed stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReapError {
    #[error("stream has no child to reap")]
    NotProcessBacked,
    #[error("close before reap failed: {0}")]
    Close(#[from] CloseError),
    #[error("wait for child failed: errno {errno}")]
    Wait { errno: i32 },
}
