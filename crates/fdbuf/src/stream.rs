//! Buffered stream over a raw file descriptor.

use std::ffi::CString;
use std::path::Path;

use fdbuf_core::buffer::BufferState;
use fdbuf_core::mode::{CREATE_PERMISSIONS, OpenMode};
use fdbuf_core::whence::Whence;

use crate::error::{CloseError, OpenError, StreamError};
use crate::sys;

/// A buffered sequential I/O channel over an OS file descriptor.
///
/// One 4096-byte buffer is shared by the read and write paths;
/// [`Phase`](fdbuf_core::Phase) tracks which direction currently owns
/// it. End of input and OS read failures latch sticky flags read
/// through [`at_eof`](Stream::at_eof) and
/// [`has_error`](Stream::has_error); reopening is the only reset.
///
/// A stream exclusively owns its descriptor and is closed exactly once:
/// [`close`](Stream::close) consumes it, and dropping an unclosed
/// stream releases the descriptor without flushing or reporting.
#[derive(Debug)]
pub struct Stream {
    pub(crate) fd: i32,
    pub(crate) state: BufferState,
    pub(crate) child: Option<i32>,
}

impl Stream {
    /// Open `path` with one of the six mode strings (`"r"`, `"r+"`,
    /// `"w"`, `"w+"`, `"a"`, `"a+"`).
    ///
    /// The truncating modes create missing files with 0644 permissions;
    /// the append modes require the file to exist.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Stream, OpenError> {
        let bytes = path.as_ref().as_os_str().as_encoded_bytes();
        if bytes.is_empty() {
            return Err(OpenError::EmptyPath);
        }
        let parsed = OpenMode::parse(mode).ok_or_else(|| OpenError::BadMode(mode.to_string()))?;
        let c_path = CString::new(bytes).map_err(|_| OpenError::NulInPath)?;
        let fd = sys::sys_open(&c_path, parsed.open_flags(), CREATE_PERMISSIONS)
            .map_err(|errno| OpenError::Os { errno })?;
        Ok(Stream::from_descriptor(fd))
    }

    /// Wrap an already-open descriptor in a fresh stream.
    ///
    /// The stream takes ownership: the descriptor is released when the
    /// stream is closed or dropped.
    #[must_use]
    pub fn from_descriptor(fd: i32) -> Stream {
        Stream {
            fd,
            state: BufferState::new(),
            child: None,
        }
    }

    // -----------------------------------------------------------------------
    // Byte path
    // -----------------------------------------------------------------------

    /// Read one byte. `None` is the end-of-stream sentinel, covering
    /// both exhaustion (sticky eof) and OS read failure (sticky error);
    /// the flag queries distinguish them.
    ///
    /// An exhausted or direction-switching buffer triggers one refill
    /// read of up to the full buffer capacity. Leaving `Writing` drains
    /// staged bytes first; a drain failure surfaces as the sentinel
    /// without latching a flag.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.state.at_eof() {
            return None;
        }
        if self.state.needs_refill() {
            if self.flush().is_err() {
                return None;
            }
            let n = match sys::sys_read(self.fd, self.state.begin_refill()) {
                Ok(0) => {
                    self.state.mark_eof();
                    return None;
                }
                Ok(n) => n,
                Err(_) => {
                    self.state.mark_error();
                    return None;
                }
            };
            self.state.finish_refill(n);
        }
        self.state.take_byte()
    }

    /// Write one byte through the buffer, returning it on success.
    ///
    /// A full buffer is drained first; a drain failure surfaces as the
    /// sentinel. A stream that has latched eof refuses further writes.
    /// Entering `Writing` from `Reading` discards buffered read-ahead;
    /// seek between the two directions to keep positions coherent.
    pub fn write_byte(&mut self, byte: u8) -> Option<u8> {
        if self.state.at_eof() {
            return None;
        }
        if self.state.is_full() && self.flush().is_err() {
            return None;
        }
        if self.state.stage_byte(byte) {
            Some(byte)
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Block path
    // -----------------------------------------------------------------------

    /// Read `count` elements of `elem_size` bytes each through the byte
    /// path, into the front of `buf`.
    ///
    /// Stops at the first sentinel and returns the number of fully
    /// completed elements (0 when nothing completed). A short final
    /// element's bytes stay in `buf` as written — the legacy
    /// partial-read contract.
    ///
    /// # Panics
    ///
    /// Panics if `buf` cannot hold `elem_size * count` bytes.
    pub fn read_block(&mut self, buf: &mut [u8], elem_size: usize, count: usize) -> usize {
        let mut stored = 0usize;
        for elem in 0..count {
            for _ in 0..elem_size {
                match self.read_byte() {
                    Some(byte) => {
                        buf[stored] = byte;
                        stored += 1;
                    }
                    None => return elem,
                }
            }
        }
        count
    }

    /// Write `count` elements of `elem_size` bytes each through the
    /// byte path.
    ///
    /// Returns `count` on success and 0 on any failure — the whole call
    /// is voided, with no partial credit. This asymmetry with
    /// [`read_block`](Stream::read_block) is the legacy contract.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than `elem_size * count` bytes.
    pub fn write_block(&mut self, buf: &[u8], elem_size: usize, count: usize) -> usize {
        let mut offset = 0usize;
        for _ in 0..count {
            for _ in 0..elem_size {
                if self.write_byte(buf[offset]).is_none() {
                    return 0;
                }
                offset += 1;
            }
        }
        count
    }

    // -----------------------------------------------------------------------
    // Flush / reposition
    // -----------------------------------------------------------------------

    /// Drain staged output to the descriptor. No-op outside `Writing`.
    ///
    /// Short writes advance and continue; a failed OS write surfaces
    /// here with the unwritten remainder still staged, so a later flush
    /// resumes where this one stopped.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        while !self.state.staged_bytes().is_empty() {
            match sys::sys_write(self.fd, self.state.staged_bytes()) {
                Ok(n) => self.state.mark_flushed(n),
                Err(errno) => return Err(StreamError::Write { errno }),
            }
        }
        Ok(())
    }

    /// Reposition the descriptor.
    ///
    /// Staged output is drained first (reconciling the logical write
    /// position with the descriptor) and buffered read-ahead is
    /// discarded, so I/O after a successful seek starts from a clean
    /// buffer. The eof flag is not cleared; only reopening resets it.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<(), StreamError> {
        self.flush()?;
        self.state.reset();
        sys::sys_lseek(self.fd, offset, whence.to_raw())
            .map_err(|errno| StreamError::Seek { errno })?;
        Ok(())
    }

    /// Logical stream position: the raw descriptor offset adjusted for
    /// buffered bytes (staged output counts toward it; unconsumed
    /// read-ahead counts against it). A failed OS position query
    /// latches the sticky error flag.
    pub fn tell(&mut self) -> Result<i64, StreamError> {
        let raw = match sys::sys_lseek(self.fd, 0, Whence::Cur.to_raw()) {
            Ok(pos) => pos,
            Err(errno) => {
                self.state.mark_error();
                return Err(StreamError::Seek { errno });
            }
        };
        Ok(raw + self.state.position_adjustment())
    }

    // -----------------------------------------------------------------------
    // Status / interop
    // -----------------------------------------------------------------------

    /// Whether a refill has observed end of input. Sticky; never
    /// probes the OS.
    #[must_use]
    pub fn at_eof(&self) -> bool {
        self.state.at_eof()
    }

    /// Whether an OS read or position query has failed. Sticky.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.state.has_error()
    }

    /// Raw descriptor, for interop with descriptor-level calls. The
    /// stream still owns it.
    #[must_use]
    pub fn descriptor(&self) -> i32 {
        self.fd
    }

    // -----------------------------------------------------------------------
    // Close
    // -----------------------------------------------------------------------

    /// Flush staged output and release the descriptor.
    ///
    /// The descriptor is released even when the flush fails; when both
    /// the flush and the close fail, the close failure is reported.
    pub fn close(mut self) -> Result<(), CloseError> {
        self.release()
    }

    /// Shared close path for `close` and `close_and_reap`: flush, then
    /// unconditionally release the descriptor.
    pub(crate) fn release(&mut self) -> Result<(), CloseError> {
        let flushed = self.flush();
        let fd = self.fd;
        self.fd = -1;
        sys::sys_close(fd).map_err(|errno| CloseError::Close { errno })?;
        flushed.map_err(|err| CloseError::Flush { errno: err.errno() })
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if self.fd >= 0 {
            let _ = sys::sys_close(self.fd);
        }
    }
}
