//! Wait-status decoding.
//!
//! Matches the status word described in waitpid(2): a normally-exited
//! child encodes its exit argument in bits 8..16 with the low seven
//! bits clear.

/// True if the child terminated normally (via `_exit` or `exit`).
#[must_use]
pub const fn exited(status: i32) -> bool {
    (status & 0x7f) == 0
}

/// Exit code of a terminated child, in the 0..=255 range.
///
/// This is the legacy engine's unconditional decode: for a child killed
/// by a signal (where [`exited`] is false) it reports 0.
#[must_use]
pub const fn exit_code(status: i32) -> i32 {
    (status >> 8) & 0xff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_exit_encodings() {
        assert!(exited(0));
        assert_eq!(exit_code(0), 0);
        let status = 7 << 8;
        assert!(exited(status));
        assert_eq!(exit_code(status), 7);
        let status = 255 << 8;
        assert!(exited(status));
        assert_eq!(exit_code(status), 255);
    }

    #[test]
    fn signal_death_is_not_exited() {
        // Killed by SIGKILL: low 7 bits carry the signal number.
        let status = 9;
        assert!(!exited(status));
        assert_eq!(exit_code(status), 0);
    }

    #[test]
    fn exit_code_masks_to_one_byte() {
        let status = 0x1_2345 << 8;
        assert_eq!(exit_code(status), 0x45);
    }
}
