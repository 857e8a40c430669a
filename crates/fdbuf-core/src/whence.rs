//! Seek origins.

/// `SEEK_SET` — reposition relative to the start of the file.
pub const SEEK_SET: i32 = 0;
/// `SEEK_CUR` — reposition relative to the current offset.
pub const SEEK_CUR: i32 = 1;
/// `SEEK_END` — reposition relative to the end of the file.
pub const SEEK_END: i32 = 2;

/// Typed seek origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the file.
    Set,
    /// From the current offset.
    Cur,
    /// From the end of the file.
    End,
}

impl Whence {
    /// Raw SEEK_* value for the OS call.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            Whence::Set => SEEK_SET,
            Whence::Cur => SEEK_CUR,
            Whence::End => SEEK_END,
        }
    }

    /// Decode a raw SEEK_* value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Whence> {
        match raw {
            SEEK_SET => Some(Whence::Set),
            SEEK_CUR => Some(Whence::Cur),
            SEEK_END => Some(Whence::End),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_match_posix() {
        assert_eq!(Whence::Set.to_raw(), 0);
        assert_eq!(Whence::Cur.to_raw(), 1);
        assert_eq!(Whence::End.to_raw(), 2);
    }

    #[test]
    fn from_raw_round_trips() {
        for whence in [Whence::Set, Whence::Cur, Whence::End] {
            assert_eq!(Whence::from_raw(whence.to_raw()), Some(whence));
        }
        assert_eq!(Whence::from_raw(3), None);
        assert_eq!(Whence::from_raw(-1), None);
    }
}
