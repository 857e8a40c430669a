//! # fdbuf
//!
//! Buffered sequential I/O over a raw OS file descriptor — an
//! application-level take on C's buffered file streams — plus streams
//! connected to a spawned child process through a pipe.
//!
//! A [`Stream`] amortizes per-byte reads and writes over one fixed
//! 4096-byte buffer shared between the two directions. End of input and
//! OS read failures latch sticky flags; block transfers ride the byte
//! path. [`Stream::spawn`] runs `/bin/sh -c command` behind a pipe and
//! [`Stream::close_and_reap`] collects the child's exit code.
//!
//! The API is single-threaded and fully blocking by contract: every
//! operation may block on the underlying OS call, and pipe capacity is
//! the only flow control between a stream and its child.

pub mod error;
pub mod process;
pub mod stream;
pub mod sys;

pub use error::{CloseError, OpenError, ReapError, SpawnError, StreamError};
pub use fdbuf_core::{CAPACITY, OpenMode, Phase, Whence};
pub use process::Direction;
pub use stream::Stream;
