//! Open-mode parsing and O_* flag mapping.
//!
//! The stream API accepts exactly six mode strings. Unlike POSIX fopen
//! there are no modifier characters: `"rb"` or `"a+x"` are rejected, and
//! the append modes deliberately omit the create flag (the legacy engine
//! never created files through them).

/// `O_RDONLY` bit value.
pub const O_RDONLY: i32 = 0;
/// `O_WRONLY` bit value.
pub const O_WRONLY: i32 = 0o1;
/// `O_RDWR` bit value.
pub const O_RDWR: i32 = 0o2;
/// `O_CREAT` bit value.
pub const O_CREAT: i32 = 0o100;
/// `O_TRUNC` bit value.
pub const O_TRUNC: i32 = 0o1000;
/// `O_APPEND` bit value.
pub const O_APPEND: i32 = 0o2000;

/// Permission bits for files created by the truncating modes.
pub const CREATE_PERMISSIONS: u32 = 0o644;

/// One of the six accepted open modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `"r"` — read-only, file must exist.
    Read,
    /// `"r+"` — read and write, file must exist.
    ReadWrite,
    /// `"w"` — write-only, create or truncate.
    WriteTruncate,
    /// `"w+"` — read and write, create or truncate.
    ReadWriteTruncate,
    /// `"a"` — write-only at end of file.
    Append,
    /// `"a+"` — read and write, writes at end of file.
    AppendReadWrite,
}

impl OpenMode {
    /// Parse a mode string. Only the six exact spellings are accepted.
    #[must_use]
    pub fn parse(mode: &str) -> Option<OpenMode> {
        match mode {
            "r" => Some(OpenMode::Read),
            "r+" => Some(OpenMode::ReadWrite),
            "w" => Some(OpenMode::WriteTruncate),
            "w+" => Some(OpenMode::ReadWriteTruncate),
            "a" => Some(OpenMode::Append),
            "a+" => Some(OpenMode::AppendReadWrite),
            _ => None,
        }
    }

    /// O_* bits passed to the OS open call.
    #[must_use]
    pub const fn open_flags(self) -> i32 {
        match self {
            OpenMode::Read => O_RDONLY,
            OpenMode::ReadWrite => O_RDWR,
            OpenMode::WriteTruncate => O_WRONLY | O_CREAT | O_TRUNC,
            OpenMode::ReadWriteTruncate => O_RDWR | O_CREAT | O_TRUNC,
            OpenMode::Append => O_WRONLY | O_APPEND,
            OpenMode::AppendReadWrite => O_RDWR | O_APPEND,
        }
    }

    /// Whether the mode permits reads.
    #[must_use]
    pub const fn readable(self) -> bool {
        matches!(
            self,
            OpenMode::Read
                | OpenMode::ReadWrite
                | OpenMode::ReadWriteTruncate
                | OpenMode::AppendReadWrite
        )
    }

    /// Whether the mode permits writes.
    #[must_use]
    pub const fn writable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
