//! CLI entrypoint for the fdbuf scenario harness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use fdbuf_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, sha256_hex, validate_log_file,
};
use fdbuf_harness::{DriveMode, ScenarioRunner, ScenarioSet};

/// Scenario tooling for fdbuf.
#[derive(Debug, Parser)]
#[command(name = "fdbuf-harness")]
#[command(about = "Scenario-driven conformance harness for fdbuf streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run scenario fixtures against real streams.
    Run {
        /// Directory containing scenario JSON files.
        #[arg(long)]
        scenarios: PathBuf,
        /// Drive mode: `byte`, `block`, or `both`. Defaults to the
        /// FDBUF_DRIVE environment configuration.
        #[arg(long)]
        drive: Option<String>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Artifact index JSON output path (requires --log).
        #[arg(long)]
        artifact_index: Option<PathBuf>,
    },
    /// Validate a structured JSONL log against the schema.
    ValidateLog {
        /// Structured JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
    /// Recompute artifact digests and verify them against an index.
    HashArtifacts {
        /// Artifact index JSON path.
        #[arg(long)]
        index: PathBuf,
        /// Workspace root used for fallback artifact resolution.
        #[arg(long, default_value = ".")]
        workspace_root: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            scenarios,
            drive,
            log,
            artifact_index,
        } => {
            let drives: Vec<DriveMode> = match drive.as_deref() {
                Some("both") => vec![DriveMode::Byte, DriveMode::Block],
                Some(raw) => vec![DriveMode::from_str_loose(raw)],
                None => vec![fdbuf_harness::config::drive_mode()],
            };

            eprintln!("Running scenarios from {}", scenarios.display());
            let mut scenario_paths: Vec<PathBuf> = std::fs::read_dir(&scenarios)?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
                .collect();
            scenario_paths.sort();

            let mut sets = Vec::new();
            for path in scenario_paths {
                match ScenarioSet::from_file(&path) {
                    Ok(set) => sets.push((path, set)),
                    Err(err) => eprintln!("Skipping {}: {}", path.display(), err),
                }
            }
            if sets.is_empty() {
                return Err(format!(
                    "No scenario JSON files found in {}",
                    scenarios.display()
                )
                .into());
            }

            let run_id = format!("run-{}", std::process::id());
            let mut emitter = match &log {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    Some(LogEmitter::to_file(path, "fdbuf", &run_id)?)
                }
                None => None,
            };

            let mut total = 0usize;
            let mut failed = 0usize;
            for (_, set) in &sets {
                for drive in &drives {
                    let runner = ScenarioRunner::new("harness-run", *drive);
                    for result in runner.run(set) {
                        total += 1;
                        let outcome = if result.passed {
                            Outcome::Pass
                        } else {
                            failed += 1;
                            eprintln!(
                                "FAIL {} :: {}: {}",
                                set.family,
                                result.case_name,
                                result.failure.as_deref().unwrap_or("unknown failure")
                            );
                            Outcome::Fail
                        };
                        if let Some(emitter) = emitter.as_mut() {
                            let level = if result.passed {
                                LogLevel::Info
                            } else {
                                LogLevel::Error
                            };
                            let mut entry = LogEntry::new("", level, "scenario_case")
                                .with_family(&set.family)
                                .with_scenario(&result.case_name)
                                .with_drive(drive.as_str())
                                .with_outcome(outcome);
                            if let Some(failure) = &result.failure {
                                entry =
                                    entry.with_details(serde_json::json!({ "failure": failure }));
                            }
                            emitter.emit_entry(entry)?;
                        }
                    }
                }
            }
            if let Some(emitter) = emitter.as_mut() {
                emitter.flush()?;
            }
            drop(emitter);

            eprintln!(
                "Scenario run complete: total={total}, passed={}, failed={failed}",
                total - failed
            );

            if let Some(index_path) = artifact_index {
                let log_path = log
                    .as_ref()
                    .ok_or("--artifact-index requires --log")?;
                let mut index = ArtifactIndex::new(&run_id, "fdbuf");
                index.add(
                    log_path.display().to_string(),
                    "log",
                    sha256_hex(log_path)?,
                );
                for (path, _) in &sets {
                    index.add(path.display().to_string(), "scenario", sha256_hex(path)?);
                }
                if let Some(parent) = index_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&index_path, index.to_json()?)?;
                eprintln!("Wrote artifact index to {}", index_path.display());
            }

            if failed > 0 {
                return Err(format!("{failed} scenario case(s) failed").into());
            }
        }
        Command::ValidateLog { log } => {
            let (count, errors) = validate_log_file(&log)?;
            if !errors.is_empty() {
                for err in &errors {
                    eprintln!("{err}");
                }
                return Err(format!(
                    "{} schema violation(s) in {}",
                    errors.len(),
                    log.display()
                )
                .into());
            }
            eprintln!("OK: {count} log line(s) conform to the schema");
        }
        Command::HashArtifacts {
            index,
            workspace_root,
        } => {
            let idx = ArtifactIndex::from_file(&index)?;
            let run_root = index
                .parent()
                .map_or_else(|| workspace_root.clone(), Path::to_path_buf);

            let mut mismatches = 0usize;
            for entry in &idx.artifacts {
                let Some(path) = resolve_artifact(&workspace_root, &run_root, &entry.path) else {
                    eprintln!("MISSING {}", entry.path);
                    mismatches += 1;
                    continue;
                };
                match sha256_hex(&path) {
                    Ok(digest) if digest == entry.sha256 => eprintln!("OK      {}", entry.path),
                    Ok(digest) => {
                        eprintln!(
                            "CHANGED {} (index {}, actual {digest})",
                            entry.path, entry.sha256
                        );
                        mismatches += 1;
                    }
                    Err(err) => {
                        eprintln!("ERROR   {}: {err}", entry.path);
                        mismatches += 1;
                    }
                }
            }

            if mismatches > 0 {
                return Err(format!("{mismatches} artifact(s) failed integrity check").into());
            }
            eprintln!("All {} artifact(s) verified", idx.artifacts.len());
        }
    }

    Ok(())
}

fn resolve_artifact(workspace_root: &Path, run_root: &Path, path: &str) -> Option<PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Some(candidate.to_path_buf());
    }

    // Preferred: relative to the index's directory (self-contained bundles).
    let in_run = run_root.join(candidate);
    if in_run.exists() {
        return Some(in_run);
    }

    // Fallback: relative to the workspace root.
    let in_ws = workspace_root.join(candidate);
    if in_ws.exists() {
        return Some(in_ws);
    }

    None
}
