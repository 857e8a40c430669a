//! Shared read/write buffer state machine.
//!
//! One fixed-capacity buffer serves both directions of a stream. Which
//! semantics its bytes currently carry is tracked by a tagged [`Phase`]
//! rather than parallel flag/counter fields, so read metadata and write
//! metadata can never be considered valid at the same time.
//!
//! Design: this module decides everything that does not require an OS
//! call. The owning stream performs the actual descriptor I/O and feeds
//! the results back in (`finish_refill`, `mark_flushed`), so the whole
//! machine is testable without a descriptor.

/// Fixed buffer capacity, identical for read and write paths.
pub const CAPACITY: usize = 4096;

/// What the buffer currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing meaningful buffered.
    Idle,
    /// `buf[cursor..filled]` is read-ahead not yet consumed.
    Reading {
        /// Bytes made valid by the last refill.
        filled: usize,
    },
    /// `buf[0..cursor]` is staged output not yet persisted.
    Writing,
}

/// Buffer contents, cursor, phase, and the stream's sticky flags.
///
/// Invariants:
/// - `cursor <= CAPACITY`
/// - `Phase::Reading { filled }` implies `cursor <= filled <= CAPACITY`
/// - `eof` and `error`, once set, stay set for the life of the state
#[derive(Debug)]
pub struct BufferState {
    data: [u8; CAPACITY],
    /// Next byte to consume (Reading) or next free slot (Writing).
    cursor: usize,
    phase: Phase,
    eof: bool,
    error: bool,
}

impl BufferState {
    /// Fresh state: empty buffer, [`Phase::Idle`], both flags clear.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: [0u8; CAPACITY],
            cursor: 0,
            phase: Phase::Idle,
            eof: false,
            error: false,
        }
    }

    /// Current phase tag.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current cursor offset.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // -----------------------------------------------------------------------
    // Sticky flags
    // -----------------------------------------------------------------------

    /// Whether a refill has observed end of input.
    #[must_use]
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Whether an OS read or position query has failed.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Latch the end-of-input flag. Never cleared.
    pub fn mark_eof(&mut self) {
        self.eof = true;
    }

    /// Latch the error flag. Never cleared.
    pub fn mark_error(&mut self) {
        self.error = true;
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    /// Buffered bytes available for consumption. Zero outside `Reading`.
    #[must_use]
    pub fn readable(&self) -> usize {
        match self.phase {
            Phase::Reading { filled } => filled - self.cursor,
            _ => 0,
        }
    }

    /// True when the next read byte requires an OS refill first.
    #[must_use]
    pub fn needs_refill(&self) -> bool {
        self.readable() == 0
    }

    /// Hand out the whole buffer for a refill read.
    ///
    /// Refilling replaces the buffer contents entirely; a stream in
    /// `Writing` phase drains its staged bytes before calling this.
    pub fn begin_refill(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Record a refill of `n` bytes: cursor rewinds to the start and the
    /// phase becomes `Reading`. `n` must not exceed [`CAPACITY`].
    pub fn finish_refill(&mut self, n: usize) {
        debug_assert!(n <= CAPACITY);
        self.cursor = 0;
        self.phase = Phase::Reading { filled: n };
    }

    /// Consume the next buffered byte, or `None` when a refill is due.
    pub fn take_byte(&mut self) -> Option<u8> {
        match self.phase {
            Phase::Reading { filled } if self.cursor < filled => {
                let byte = self.data[self.cursor];
                self.cursor += 1;
                Some(byte)
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Write side
    // -----------------------------------------------------------------------

    /// Staged output bytes awaiting a drain. Empty outside `Writing`.
    #[must_use]
    pub fn staged_bytes(&self) -> &[u8] {
        match self.phase {
            Phase::Writing => &self.data[..self.cursor],
            _ => &[],
        }
    }

    /// True when no further byte can be staged without draining.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self.phase, Phase::Writing) && self.cursor == CAPACITY
    }

    /// Stage one byte for output, switching to `Writing` if needed.
    ///
    /// Entering `Writing` from `Idle` or `Reading` discards buffered
    /// read-ahead and restarts the cursor at zero (the legacy engine's
    /// mode-switch contract). Returns `false` when the buffer is already
    /// full; the caller drains and retries.
    pub fn stage_byte(&mut self, byte: u8) -> bool {
        if !matches!(self.phase, Phase::Writing) {
            self.cursor = 0;
            self.phase = Phase::Writing;
        }
        if self.cursor == CAPACITY {
            return false;
        }
        self.data[self.cursor] = byte;
        self.cursor += 1;
        true
    }

    /// Drop the first `written` staged bytes after a (possibly short)
    /// drain, keeping the remainder at the front of the buffer. A fully
    /// drained buffer returns to `Idle`.
    pub fn mark_flushed(&mut self, written: usize) {
        debug_assert!(written <= self.cursor);
        let written = written.min(self.cursor);
        if written > 0 {
            self.data.copy_within(written..self.cursor, 0);
            self.cursor -= written;
        }
        if self.cursor == 0 {
            self.phase = Phase::Idle;
        }
    }

    // -----------------------------------------------------------------------
    // Repositioning
    // -----------------------------------------------------------------------

    /// Discard all buffered state (read-ahead or staged bytes) ahead of a
    /// reposition. Sticky flags are untouched; only reopening clears them.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.phase = Phase::Idle;
    }

    /// Difference between the logical stream position and the raw
    /// descriptor offset.
    ///
    /// `Writing`: staged bytes count toward the position (`+cursor`).
    /// `Reading`: the descriptor has advanced a full buffer past the
    /// consumption point (`-(CAPACITY - cursor)`, the legacy adjustment,
    /// which assumes the last refill filled the whole buffer). `Idle`:
    /// the raw offset is the position.
    #[must_use]
    pub fn position_adjustment(&self) -> i64 {
        match self.phase {
            Phase::Idle => 0,
            Phase::Reading { .. } => -((CAPACITY - self.cursor) as i64),
            Phase::Writing => self.cursor as i64,
        }
    }
}

impl Default for BufferState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn refilled(bytes: &[u8]) -> BufferState {
        let mut state = BufferState::new();
        state.begin_refill()[..bytes.len()].copy_from_slice(bytes);
        state.finish_refill(bytes.len());
        state
    }

    #[test]
    fn fresh_state_is_idle_and_clean() {
        let state = BufferState::new();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.cursor(), 0);
        assert!(state.needs_refill());
        assert!(state.staged_bytes().is_empty());
        assert!(!state.at_eof());
        assert!(!state.has_error());
    }

    #[test]
    fn refill_then_take_consumes_in_order() {
        let mut state = refilled(b"abc");
        assert_eq!(state.readable(), 3);
        assert_eq!(state.take_byte(), Some(b'a'));
        assert_eq!(state.take_byte(), Some(b'b'));
        assert_eq!(state.take_byte(), Some(b'c'));
        assert_eq!(state.take_byte(), None);
        assert!(state.needs_refill());
        assert_eq!(state.phase(), Phase::Reading { filled: 3 });
    }

    #[test]
    fn take_outside_reading_yields_none() {
        let mut state = BufferState::new();
        assert_eq!(state.take_byte(), None);
        assert!(state.stage_byte(b'x'));
        assert_eq!(state.take_byte(), None);
    }

    #[test]
    fn staging_enters_writing_and_accumulates() {
        let mut state = BufferState::new();
        assert!(state.stage_byte(b'h'));
        assert!(state.stage_byte(b'i'));
        assert_eq!(state.phase(), Phase::Writing);
        assert_eq!(state.staged_bytes(), b"hi");
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn staging_discards_read_ahead() {
        let mut state = refilled(b"old data");
        assert_eq!(state.take_byte(), Some(b'o'));
        assert!(state.stage_byte(b'n'));
        assert_eq!(state.staged_bytes(), b"n");
        assert_eq!(state.readable(), 0);
    }

    #[test]
    fn stage_refuses_when_full() {
        let mut state = BufferState::new();
        for _ in 0..CAPACITY {
            assert!(state.stage_byte(0x55));
        }
        assert!(state.is_full());
        assert!(!state.stage_byte(0xaa));
        assert_eq!(state.cursor(), CAPACITY);
    }

    #[test]
    fn full_drain_returns_to_idle() {
        let mut state = BufferState::new();
        for &b in b"xyz" {
            state.stage_byte(b);
        }
        state.mark_flushed(3);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.cursor(), 0);
        assert!(state.staged_bytes().is_empty());
    }

    #[test]
    fn short_drain_keeps_remainder_in_order() {
        let mut state = BufferState::new();
        for &b in b"abcdef" {
            state.stage_byte(b);
        }
        state.mark_flushed(2);
        assert_eq!(state.phase(), Phase::Writing);
        assert_eq!(state.staged_bytes(), b"cdef");
        state.mark_flushed(4);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn reset_discards_buffer_but_not_flags() {
        let mut state = refilled(b"pending");
        state.mark_eof();
        state.mark_error();
        state.reset();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.cursor(), 0);
        assert!(state.at_eof());
        assert!(state.has_error());
    }

    #[test]
    fn flags_latch_once_set() {
        let mut state = BufferState::new();
        state.mark_eof();
        state.stage_byte(b'a');
        state.mark_flushed(1);
        state.reset();
        assert!(state.at_eof());
    }

    #[test]
    fn adjustment_idle_is_zero() {
        assert_eq!(BufferState::new().position_adjustment(), 0);
    }

    #[test]
    fn adjustment_writing_adds_staged_count() {
        let mut state = BufferState::new();
        for _ in 0..10 {
            state.stage_byte(0);
        }
        assert_eq!(state.position_adjustment(), 10);
    }

    #[test]
    fn adjustment_reading_subtracts_unconsumed_capacity() {
        let mut state = refilled(&[0u8; CAPACITY]);
        for _ in 0..4 {
            state.take_byte();
        }
        assert_eq!(state.position_adjustment(), -(CAPACITY as i64 - 4));
    }

    #[test]
    fn refill_after_exhaustion_rewinds_cursor() {
        let mut state = refilled(b"ab");
        state.take_byte();
        state.take_byte();
        assert!(state.needs_refill());
        state.begin_refill()[..2].copy_from_slice(b"cd");
        state.finish_refill(2);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.take_byte(), Some(b'c'));
    }
}
