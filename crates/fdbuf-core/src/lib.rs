//! # fdbuf-core
//!
//! Pure state machine for buffered sequential I/O over a file descriptor.
//!
//! This crate holds everything about a buffered stream that can be decided
//! without touching the operating system: the shared read/write buffer and
//! its phase transitions, open-mode parsing, seek origins, and wait-status
//! decoding. The `fdbuf` crate wires these decisions to real descriptors.
//! No `unsafe` code is permitted at the crate level.

#![deny(unsafe_code)]

pub mod buffer;
pub mod mode;
pub mod wait;
pub mod whence;

pub use buffer::{BufferState, CAPACITY, Phase};
pub use mode::OpenMode;
pub use whence::Whence;
