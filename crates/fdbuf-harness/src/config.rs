//! Drive mode configuration.
//!
//! The drive mode is set via the `FDBUF_DRIVE` environment variable:
//! - `byte` (default): bulk transfers go through the single-byte calls,
//!   one byte per call. This exercises the refill/drain state machine at
//!   every boundary.
//! - `block`: bulk transfers go through the block calls. This exercises
//!   the element-accounting paths.
//!
//! A scenario must produce identical observable outcomes under both.

use std::sync::OnceLock;

/// How the runner moves bulk data through a stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveMode {
    /// One `read_byte`/`write_byte` call per byte.
    #[default]
    Byte,
    /// One `read_block`/`write_block` call per transfer.
    Block,
}

impl DriveMode {
    /// Parse from string (case-insensitive). Unknown strings fall back to `Byte`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "block" | "blocks" | "bulk" => Self::Block,
            _ => Self::Byte,
        }
    }

    /// Short name used in fixtures and log records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Block => "block",
        }
    }
}

impl std::fmt::Display for DriveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static GLOBAL_DRIVE: OnceLock<DriveMode> = OnceLock::new();

/// Get the configured drive mode (reads env var on first call, caches thereafter).
#[must_use]
pub fn drive_mode() -> DriveMode {
    *GLOBAL_DRIVE.get_or_init(|| {
        std::env::var("FDBUF_DRIVE")
            .map(|v| DriveMode::from_str_loose(&v))
            .unwrap_or_default()
    })
}
