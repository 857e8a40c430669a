//! Typed OS-call veneer.
//!
//! One thin wrapper per OS facility the stream engine consumes, each
//! returning `Result<_, i32>` with the raw errno of the failing call.
//! This is the only module that touches `libc`; everything above it
//! works with safe types.

use std::ffi::CStr;

/// errno of the most recent failed OS call on this thread.
#[inline]
fn last_errno() -> i32 {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO)
}

/// `open(path, flags, mode)` — open a file, returning the descriptor.
pub fn sys_open(path: &CStr, flags: i32, mode: u32) -> Result<i32, i32> {
    // SAFETY: path is NUL-terminated and outlives the call.
    let fd = unsafe { libc::open(path.as_ptr(), flags, mode as libc::mode_t) };
    if fd < 0 { Err(last_errno()) } else { Ok(fd) }
}

/// `read(fd, buf)` — read into `buf`, returning bytes read (0 at end
/// of input).
pub fn sys_read(fd: i32, buf: &mut [u8]) -> Result<usize, i32> {
    // SAFETY: buf is a live mutable slice and count is its exact length.
    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if n < 0 { Err(last_errno()) } else { Ok(n as usize) }
}

/// `write(fd, buf)` — write from `buf`, returning bytes written (may be
/// short).
pub fn sys_write(fd: i32, buf: &[u8]) -> Result<usize, i32> {
    // SAFETY: buf is a live slice and count is its exact length.
    let n = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
    if n < 0 { Err(last_errno()) } else { Ok(n as usize) }
}

/// `lseek(fd, offset, whence)` — reposition, returning the resulting
/// offset from the start of the file.
pub fn sys_lseek(fd: i32, offset: i64, whence: i32) -> Result<i64, i32> {
    // SAFETY: lseek takes no pointers.
    let pos = unsafe { libc::lseek(fd, offset as libc::off_t, whence) };
    if pos < 0 { Err(last_errno()) } else { Ok(pos as i64) }
}

/// `close(fd)` — release a descriptor.
pub fn sys_close(fd: i32) -> Result<(), i32> {
    // SAFETY: close accepts any fd value; invalid ones report EBADF.
    let rc = unsafe { libc::close(fd) };
    if rc < 0 { Err(last_errno()) } else { Ok(()) }
}

/// `pipe()` — create a pipe, returning `(read_end, write_end)`.
pub fn sys_pipe() -> Result<(i32, i32), i32> {
    let mut fds = [0i32; 2];
    // SAFETY: fds is a live array of exactly two ints.
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc < 0 { Err(last_errno()) } else { Ok((fds[0], fds[1])) }
}

/// `dup2(oldfd, newfd)` — duplicate `oldfd` onto `newfd`, closing
/// whatever `newfd` referred to.
pub fn sys_dup2(oldfd: i32, newfd: i32) -> Result<(), i32> {
    // SAFETY: dup2 takes no pointers.
    let rc = unsafe { libc::dup2(oldfd, newfd) };
    if rc < 0 { Err(last_errno()) } else { Ok(()) }
}

/// `fork()` — create a child process. Returns 0 in the child and the
/// child's pid in the parent.
///
/// # Safety
///
/// Between fork and exec the child may only perform async-signal-safe
/// operations; in particular it must not allocate. Callers confine the
/// child path to `sys_dup2`/`sys_close`/`sys_exec_shell`/`sys_exit` on
/// data prepared before the fork.
pub unsafe fn sys_fork() -> Result<i32, i32> {
    // SAFETY: fork takes no arguments; the post-fork discipline above
    // is the caller's contract.
    let pid = unsafe { libc::fork() };
    if pid < 0 { Err(last_errno()) } else { Ok(pid) }
}

/// Replace the process image with `/bin/sh -c command`.
///
/// Only returns on failure, yielding the errno of the exec attempt. The
/// environment is inherited, matching shell conventions.
pub fn sys_exec_shell(command: &CStr) -> i32 {
    let argv: [*const libc::c_char; 4] = [
        c"sh".as_ptr(),
        c"-c".as_ptr(),
        command.as_ptr(),
        std::ptr::null(),
    ];
    // SAFETY: argv is NUL-terminated, every element points at a live C
    // string, and execv does not return on success.
    unsafe { libc::execv(c"/bin/sh".as_ptr(), argv.as_ptr()) };
    last_errno()
}

/// `_exit(code)` — terminate immediately, without unwinding or atexit
/// handlers. The only safe way out of a forked child that failed exec.
pub fn sys_exit(code: i32) -> ! {
    // SAFETY: _exit takes no pointers and never returns.
    unsafe { libc::_exit(code) }
}

/// `waitpid(pid, 0)` — block until the specific child changes state,
/// returning its raw wait status. Callers decide EINTR policy.
pub fn sys_waitpid(pid: i32) -> Result<i32, i32> {
    let mut status: libc::c_int = 0;
    // SAFETY: status is a live int for the duration of the call.
    let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
    if rc < 0 { Err(last_errno()) } else { Ok(status) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fdbuf_core::whence::SEEK_CUR;

    #[test]
    fn pipe_write_read_round_trip() {
        let (r, w) = sys_pipe().unwrap();
        assert_eq!(sys_write(w, b"veneer"), Ok(6));
        let mut buf = [0u8; 16];
        assert_eq!(sys_read(r, &mut buf), Ok(6));
        assert_eq!(&buf[..6], b"veneer");
        sys_close(r).unwrap();
        sys_close(w).unwrap();
    }

    #[test]
    fn read_reports_zero_after_writer_closes() {
        let (r, w) = sys_pipe().unwrap();
        sys_close(w).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(sys_read(r, &mut buf), Ok(0));
        sys_close(r).unwrap();
    }

    #[test]
    fn dup2_redirects_onto_target_fd() {
        let (r, w) = sys_pipe().unwrap();
        let (r2, w2) = sys_pipe().unwrap();
        sys_dup2(w, w2).unwrap();
        assert_eq!(sys_write(w2, b"x"), Ok(1));
        let mut buf = [0u8; 1];
        assert_eq!(sys_read(r, &mut buf), Ok(1));
        assert_eq!(buf[0], b'x');
        for fd in [r, w, r2, w2] {
            let _ = sys_close(fd);
        }
    }

    #[test]
    fn close_bad_fd_reports_ebadf() {
        assert_eq!(sys_close(-1), Err(libc::EBADF));
    }

    #[test]
    fn lseek_on_pipe_reports_espipe() {
        let (r, w) = sys_pipe().unwrap();
        assert_eq!(sys_lseek(r, 0, SEEK_CUR), Err(libc::ESPIPE));
        sys_close(r).unwrap();
        sys_close(w).unwrap();
    }

    #[test]
    fn open_missing_file_reports_enoent() {
        let missing = c"/nonexistent/fdbuf-sys-test/file";
        assert_eq!(sys_open(missing, 0, 0), Err(libc::ENOENT));
    }
}
