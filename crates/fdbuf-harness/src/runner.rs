//! Scenario execution engine.
//!
//! Each case runs against real streams in a fresh scratch directory under
//! the system temp dir. The scratch directory is removed when the case
//! finishes, pass or fail.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fdbuf::{Direction, Stream, Whence};

use crate::config::DriveMode;
use crate::fixtures::{ScenarioCase, ScenarioOp, ScenarioSet};

/// Result of one executed scenario.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub case_name: String,
    pub drive: DriveMode,
    pub passed: bool,
    /// Which op failed and why, when the case did not pass.
    pub failure: Option<String>,
}

/// Runs scenario sets against real streams under one drive mode.
pub struct ScenarioRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Drive mode bulk transfers run under.
    pub drive: DriveMode,
}

impl ScenarioRunner {
    /// Create a new scenario runner.
    #[must_use]
    pub fn new(campaign: impl Into<String>, drive: DriveMode) -> Self {
        Self {
            campaign: campaign.into(),
            drive,
        }
    }

    /// Run all cases in a set that match this runner's drive mode.
    pub fn run(&self, set: &ScenarioSet) -> Vec<CaseResult> {
        set.cases
            .iter()
            .filter(|case| drive_matches(self.drive, &case.drive))
            .map(|case| {
                let case_name = if case.drive.eq_ignore_ascii_case("both") {
                    format!("{} [{}]", case.name, self.drive)
                } else {
                    case.name.clone()
                };
                match execute_case(&self.campaign, case, self.drive) {
                    Ok(()) => CaseResult {
                        case_name,
                        drive: self.drive,
                        passed: true,
                        failure: None,
                    },
                    Err(msg) => CaseResult {
                        case_name,
                        drive: self.drive,
                        passed: false,
                        failure: Some(msg),
                    },
                }
            })
            .collect()
    }
}

fn drive_matches(active: DriveMode, case_drive: &str) -> bool {
    let case = case_drive.to_ascii_lowercase();
    case == active.as_str() || case == "both"
}

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

fn scratch_dir(campaign: &str) -> Result<PathBuf, String> {
    let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "fdbuf-scenario-{}-{}-{}",
        sanitize(campaign),
        std::process::id(),
        seq
    ));
    std::fs::create_dir_all(&dir).map_err(|err| format!("failed creating scratch dir: {err}"))?;
    Ok(dir)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

fn execute_case(campaign: &str, case: &ScenarioCase, drive: DriveMode) -> Result<(), String> {
    let dir = scratch_dir(campaign)?;
    let result = run_ops(&dir, &case.ops, drive);
    let _ = std::fs::remove_dir_all(&dir);
    result
}

fn run_ops(dir: &Path, ops: &[ScenarioOp], drive: DriveMode) -> Result<(), String> {
    let mut stream: Option<Stream> = None;
    for (index, op) in ops.iter().enumerate() {
        apply_op(dir, &mut stream, op, drive)
            .map_err(|msg| format!("op {index} ({}): {msg}", op_label(op)))?;
    }
    Ok(())
}

fn apply_op(
    dir: &Path,
    stream: &mut Option<Stream>,
    op: &ScenarioOp,
    drive: DriveMode,
) -> Result<(), String> {
    match op {
        ScenarioOp::Open { path, mode } => {
            if stream.is_some() {
                return Err("a stream is already open".to_string());
            }
            let opened = Stream::open(dir.join(path), mode).map_err(|err| err.to_string())?;
            *stream = Some(opened);
            Ok(())
        }
        ScenarioOp::WriteBytes {
            data,
            expect_refused,
        } => write_bulk(active(stream)?, data.as_bytes(), *expect_refused, drive),
        ScenarioOp::ReadBytes {
            count,
            expect,
            expect_refused,
        } => {
            let got = read_bulk(active(stream)?, *count, *expect_refused, drive)?;
            if let Some(want) = expect
                && got != want.as_bytes()
            {
                return Err(format!(
                    "content mismatch: expected {:?}, got {:?}",
                    want,
                    String::from_utf8_lossy(&got)
                ));
            }
            Ok(())
        }
        ScenarioOp::Flush => active(stream)?.flush().map_err(|err| err.to_string()),
        ScenarioOp::Seek { offset, whence } => {
            let whence = parse_whence(whence)?;
            active(stream)?
                .seek(*offset, whence)
                .map_err(|err| err.to_string())
        }
        ScenarioOp::Tell { expect } => {
            let got = active(stream)?.tell().map_err(|err| err.to_string())?;
            if got != *expect {
                return Err(format!("expected position {expect}, got {got}"));
            }
            Ok(())
        }
        ScenarioOp::Close => {
            let s = stream.take().ok_or_else(no_stream)?;
            s.close().map_err(|err| err.to_string())
        }
        ScenarioOp::Spawn { command, direction } => {
            if stream.is_some() {
                return Err("a stream is already open".to_string());
            }
            let spawned = Stream::spawn(command, Direction::from_type_str(direction))
                .map_err(|err| err.to_string())?;
            *stream = Some(spawned);
            Ok(())
        }
        ScenarioOp::CloseAndReap { expect_exit } => {
            let s = stream.take().ok_or_else(no_stream)?;
            let code = s.close_and_reap().map_err(|err| err.to_string())?;
            if code != *expect_exit {
                return Err(format!("expected exit code {expect_exit}, got {code}"));
            }
            Ok(())
        }
        ScenarioOp::ExpectEof => {
            let s = active(stream)?;
            if s.read_byte().is_some() {
                return Err("expected end of stream, got a byte".to_string());
            }
            if !s.at_eof() {
                return Err("end-of-stream flag not latched".to_string());
            }
            Ok(())
        }
        ScenarioOp::ExpectError => {
            if active(stream)?.has_error() {
                Ok(())
            } else {
                Err("error flag not set".to_string())
            }
        }
    }
}

fn active<'a>(stream: &'a mut Option<Stream>) -> Result<&'a mut Stream, String> {
    stream.as_mut().ok_or_else(no_stream)
}

fn no_stream() -> String {
    "no open stream".to_string()
}

fn op_label(op: &ScenarioOp) -> &'static str {
    match op {
        ScenarioOp::Open { .. } => "open",
        ScenarioOp::WriteBytes { .. } => "write_bytes",
        ScenarioOp::ReadBytes { .. } => "read_bytes",
        ScenarioOp::Flush => "flush",
        ScenarioOp::Seek { .. } => "seek",
        ScenarioOp::Tell { .. } => "tell",
        ScenarioOp::Close => "close",
        ScenarioOp::Spawn { .. } => "spawn",
        ScenarioOp::CloseAndReap { .. } => "close_and_reap",
        ScenarioOp::ExpectEof => "expect_eof",
        ScenarioOp::ExpectError => "expect_error",
    }
}

fn write_bulk(
    s: &mut Stream,
    data: &[u8],
    expect_refused: bool,
    drive: DriveMode,
) -> Result<(), String> {
    match drive {
        DriveMode::Byte => {
            for (i, &byte) in data.iter().enumerate() {
                if s.write_byte(byte).is_none() {
                    return if expect_refused {
                        Ok(())
                    } else {
                        Err(format!("write refused after {i} bytes"))
                    };
                }
            }
            if expect_refused {
                Err("write was accepted".to_string())
            } else {
                Ok(())
            }
        }
        DriveMode::Block => {
            let written = s.write_block(data, 1, data.len());
            match (expect_refused, written) {
                (true, 0) => Ok(()),
                (true, _) => Err("write was accepted".to_string()),
                (false, n) if n == data.len() => Ok(()),
                (false, n) => Err(format!("short write: {n} of {}", data.len())),
            }
        }
    }
}

fn read_bulk(
    s: &mut Stream,
    count: usize,
    expect_refused: bool,
    drive: DriveMode,
) -> Result<Vec<u8>, String> {
    match drive {
        DriveMode::Byte => {
            let mut got = Vec::with_capacity(count);
            while got.len() < count {
                match s.read_byte() {
                    Some(byte) => got.push(byte),
                    None => break,
                }
            }
            if expect_refused {
                if got.is_empty() {
                    Ok(got)
                } else {
                    Err(format!("read was accepted: got {} bytes", got.len()))
                }
            } else if got.len() == count {
                Ok(got)
            } else {
                Err(format!("short read: got {} of {count}", got.len()))
            }
        }
        DriveMode::Block => {
            let mut buf = vec![0u8; count];
            let completed = s.read_block(&mut buf, 1, count);
            buf.truncate(completed);
            if expect_refused {
                if completed == 0 {
                    Ok(buf)
                } else {
                    Err(format!("read was accepted: got {completed} bytes"))
                }
            } else if completed == count {
                Ok(buf)
            } else {
                Err(format!("short read: got {completed} of {count}"))
            }
        }
    }
}

fn parse_whence(raw: &str) -> Result<Whence, String> {
    match raw.to_ascii_lowercase().as_str() {
        "set" => Ok(Whence::Set),
        "cur" => Ok(Whence::Cur),
        "end" => Ok(Whence::End),
        other => Err(format!("unknown whence '{other}', expected set|cur|end")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ScenarioSet;

    #[test]
    fn byte_runner_executes_matching_cases() {
        let set = ScenarioSet::from_json(
            r#"{
                "version":"v1",
                "family":"stream/basic",
                "cases":[
                    {"name":"byte_only","drive":"byte","ops":[
                        {"op":"open","path":"a.bin","mode":"w"},
                        {"op":"write_bytes","data":"abc"},
                        {"op":"tell","expect":3},
                        {"op":"close"}
                    ]},
                    {"name":"block_only","drive":"block","ops":[
                        {"op":"open","path":"b.bin","mode":"w"},
                        {"op":"close"}
                    ]}
                ]
            }"#,
        )
        .expect("valid scenario json");

        let results = ScenarioRunner::new("smoke", DriveMode::Byte).run(&set);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].case_name, "byte_only");
        assert!(results[0].passed, "{:?}", results[0].failure);
    }

    #[test]
    fn both_drive_case_runs_under_either_drive() {
        let set = ScenarioSet::from_json(
            r#"{
                "version":"v1",
                "family":"stream/basic",
                "cases":[
                    {"name":"write_then_read","drive":"both","ops":[
                        {"op":"open","path":"a.bin","mode":"w+"},
                        {"op":"write_bytes","data":"hello"},
                        {"op":"flush"},
                        {"op":"seek","offset":0,"whence":"set"},
                        {"op":"read_bytes","count":5,"expect":"hello"},
                        {"op":"expect_eof"},
                        {"op":"close"}
                    ]}
                ]
            }"#,
        )
        .expect("valid scenario json");

        let byte = ScenarioRunner::new("smoke", DriveMode::Byte).run(&set);
        assert_eq!(byte.len(), 1);
        assert_eq!(byte[0].case_name, "write_then_read [byte]");
        assert!(byte[0].passed, "{:?}", byte[0].failure);

        let block = ScenarioRunner::new("smoke", DriveMode::Block).run(&set);
        assert_eq!(block.len(), 1);
        assert_eq!(block[0].case_name, "write_then_read [block]");
        assert!(block[0].passed, "{:?}", block[0].failure);
    }

    #[test]
    fn failed_expectation_names_the_op() {
        let set = ScenarioSet::from_json(
            r#"{
                "version":"v1",
                "family":"stream/basic",
                "cases":[
                    {"name":"wrong_tell","drive":"byte","ops":[
                        {"op":"open","path":"a.bin","mode":"w"},
                        {"op":"write_bytes","data":"abc"},
                        {"op":"tell","expect":99},
                        {"op":"close"}
                    ]}
                ]
            }"#,
        )
        .expect("valid scenario json");

        let results = ScenarioRunner::new("smoke", DriveMode::Byte).run(&set);
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        let failure = results[0].failure.as_deref().unwrap_or_default();
        assert!(failure.contains("(tell)"), "unexpected failure: {failure}");
        assert!(
            failure.contains("expected position 99"),
            "unexpected failure: {failure}"
        );
    }

    #[test]
    fn refused_read_latches_the_error_flag() {
        let set = ScenarioSet::from_json(
            r#"{
                "version":"v1",
                "family":"stream/errors",
                "cases":[
                    {"name":"read_on_write_only","drive":"both","ops":[
                        {"op":"open","path":"a.bin","mode":"w"},
                        {"op":"write_bytes","data":"abc"},
                        {"op":"read_bytes","count":1,"expect_refused":true},
                        {"op":"expect_error"},
                        {"op":"close"}
                    ]}
                ]
            }"#,
        )
        .expect("valid scenario json");

        for drive in [DriveMode::Byte, DriveMode::Block] {
            let results = ScenarioRunner::new("errors", drive).run(&set);
            assert_eq!(results.len(), 1);
            assert!(results[0].passed, "{drive}: {:?}", results[0].failure);
        }
    }

    #[test]
    fn process_scenario_reaps_the_child() {
        let set = ScenarioSet::from_json(
            r#"{
                "version":"v1",
                "family":"process/basic",
                "cases":[
                    {"name":"printf_roundtrip","drive":"both","ops":[
                        {"op":"spawn","command":"printf hi","direction":"r"},
                        {"op":"read_bytes","count":2,"expect":"hi"},
                        {"op":"expect_eof"},
                        {"op":"close_and_reap","expect_exit":0}
                    ]}
                ]
            }"#,
        )
        .expect("valid scenario json");

        for drive in [DriveMode::Byte, DriveMode::Block] {
            let results = ScenarioRunner::new("process", drive).run(&set);
            assert_eq!(results.len(), 1);
            assert!(results[0].passed, "{drive}: {:?}", results[0].failure);
        }
    }
}
