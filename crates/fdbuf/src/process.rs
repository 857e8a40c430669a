//! Process-backed streams.
//!
//! A process-backed stream wraps one end of a pipe whose other end is
//! the standard input or output of a child running `/bin/sh -c command`.
//! Every buffered operation applies unchanged; only the close path
//! differs, adding a blocking wait for the child's exit code.

use std::ffi::CString;

use fdbuf_core::wait;

use crate::error::{ReapError, SpawnError};
use crate::stream::Stream;
use crate::sys;

/// Exit status the child reports when the shell image cannot be
/// executed.
const EXEC_FAILURE_STATUS: i32 = 127;

/// Which side of the child the parent holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Parent writes; the pipe feeds the child's standard input.
    WriteToChild,
    /// Parent reads; the pipe carries the child's standard output.
    ReadFromChild,
}

impl Direction {
    /// Legacy type-string mapping: `"w"` writes to the child, anything
    /// else reads from it.
    #[must_use]
    pub fn from_type_str(type_str: &str) -> Direction {
        if type_str == "w" {
            Direction::WriteToChild
        } else {
            Direction::ReadFromChild
        }
    }
}

impl Stream {
    /// Spawn `/bin/sh -c command` with a pipe to its standard input or
    /// output and wrap the parent's pipe end in a stream.
    ///
    /// The child rewires its side of the pipe onto fd 0 (`WriteToChild`)
    /// or fd 1 (`ReadFromChild`), closes both pipe descriptors, and
    /// execs the shell; an exec failure terminates it with status 127.
    ///
    /// Close the result with [`Stream::close_and_reap`] to collect the
    /// child's exit code. Plain [`Stream::close`] (or dropping) releases
    /// the descriptor but leaves the child unreaped.
    pub fn spawn(command: &str, direction: Direction) -> Result<Stream, SpawnError> {
        let c_command = CString::new(command).map_err(|_| SpawnError::NulInCommand)?;
        let (read_end, write_end) = sys::sys_pipe().map_err(|errno| SpawnError::Pipe { errno })?;

        // SAFETY: the child path below sticks to async-signal-safe calls
        // on data prepared before the fork.
        let pid = match unsafe { sys::sys_fork() } {
            Ok(pid) => pid,
            Err(errno) => {
                let _ = sys::sys_close(read_end);
                let _ = sys::sys_close(write_end);
                return Err(SpawnError::Fork { errno });
            }
        };

        if pid == 0 {
            // Child: wire the matching end onto stdin or stdout, drop
            // both pipe descriptors, and become the shell.
            match direction {
                Direction::WriteToChild => {
                    let _ = sys::sys_dup2(read_end, 0);
                }
                Direction::ReadFromChild => {
                    let _ = sys::sys_dup2(write_end, 1);
                }
            }
            let _ = sys::sys_close(read_end);
            let _ = sys::sys_close(write_end);
            sys::sys_exec_shell(&c_command);
            sys::sys_exit(EXEC_FAILURE_STATUS);
        }

        let fd = match direction {
            Direction::WriteToChild => {
                let _ = sys::sys_close(read_end);
                write_end
            }
            Direction::ReadFromChild => {
                let _ = sys::sys_close(write_end);
                read_end
            }
        };
        let mut stream = Stream::from_descriptor(fd);
        stream.child = Some(pid);
        Ok(stream)
    }

    /// Flush, close, and reap the child, returning its exit code
    /// (0..=255).
    ///
    /// Blocks until the recorded child exits; the wait retries on EINTR
    /// and is attempted even when the close failed, so the child is
    /// never left a zombie by a close error. A close failure is still
    /// reported after the reap. On a stream with no child the
    /// descriptor is released and [`ReapError::NotProcessBacked`] comes
    /// back.
    pub fn close_and_reap(mut self) -> Result<i32, ReapError> {
        let child = self.child.take();
        let close_result = self.release();
        let Some(pid) = child else {
            close_result?;
            return Err(ReapError::NotProcessBacked);
        };
        let status = loop {
            match sys::sys_waitpid(pid) {
                Ok(status) => break status,
                Err(errno) if errno == libc::EINTR => continue,
                Err(errno) => return Err(ReapError::Wait { errno }),
            }
        };
        close_result?;
        Ok(wait::exit_code(status))
    }
}
