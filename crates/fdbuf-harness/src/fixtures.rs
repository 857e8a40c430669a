//! Scenario fixture loading and management.

use serde::{Deserialize, Serialize};

/// A single operation in a scenario.
///
/// Paths are relative to the per-case scratch directory the runner creates.
/// Bulk transfers (`write_bytes`/`read_bytes`) are driven byte-at-a-time or
/// in blocks depending on the active drive mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScenarioOp {
    /// Open a file stream.
    Open { path: String, mode: String },
    /// Write the UTF-8 bytes of `data`. With `expect_refused`, the write
    /// must be rejected instead.
    WriteBytes {
        data: String,
        #[serde(default)]
        expect_refused: bool,
    },
    /// Read exactly `count` bytes. A short read fails the case. If `expect`
    /// is present, the bytes read must match it. With `expect_refused`, not
    /// a single byte may come back.
    ReadBytes {
        count: usize,
        #[serde(default)]
        expect: Option<String>,
        #[serde(default)]
        expect_refused: bool,
    },
    /// Drain staged output to the descriptor.
    Flush,
    /// Reposition the descriptor. `whence` is one of `set`, `cur`, `end`.
    Seek { offset: i64, whence: String },
    /// Logical position must equal `expect`.
    Tell { expect: i64 },
    /// Close the active stream.
    Close,
    /// Spawn a shell child; `direction` is `r` (read from child) or
    /// `w` (write to child).
    Spawn { command: String, direction: String },
    /// Close the active process stream and reap; exit code must equal
    /// `expect_exit`.
    CloseAndReap { expect_exit: i32 },
    /// The next read must hit end-of-stream and the flag must latch.
    ExpectEof,
    /// The stream's error flag must be set.
    ExpectError,
}

/// A single scenario: a named op sequence with a drive constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCase {
    /// Case identifier.
    pub name: String,
    /// Drive mode this case runs under: `byte`, `block`, or `both`.
    pub drive: String,
    /// Operations executed in order against a fresh scratch directory.
    pub ops: Vec<ScenarioOp>,
}

/// A collection of scenario cases for one behavior family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Schema version.
    pub version: String,
    /// Behavior family name.
    pub family: String,
    /// Individual scenarios.
    pub cases: Vec<ScenarioCase>,
}

impl ScenarioSet {
    /// Load a scenario set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize a scenario set to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a scenario set from a file path.
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let set = Self::from_json(&content)?;
        Ok(set)
    }
}
