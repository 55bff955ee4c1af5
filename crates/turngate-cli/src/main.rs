// turngate-cli/src/main.rs
// ============================================================================
// Module: Turngate Binary
// Description: Command dispatcher for the turn controller.
// Purpose: Parse arguments, wire the runtime, and delegate to the library.
// Dependencies: clap, turngate-cli, turngate-config, turngate-store-sqlite
// ============================================================================

//! ## Overview
//! `turngate serve` drives the controller over stdin/stdout; the remaining
//! subcommands are offline maintenance: config inspection, memory
//! promotion, override ingest, and graph-seed export.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use turngate_cli::ServeRuntime;
use turngate_cli::StderrTurnLogger;
use turngate_cli::run_loop;
use turngate_config::TurngateConfig;
use turngate_core::interfaces::MemoryStore;

/// Command-line arguments for the turngate binary.
#[derive(Debug, Parser)]
#[command(name = "turngate", about = "Gated turn controller for planning agents")]
struct Cli {
    /// Path to turngate.toml; falls back to TURNGATE_CONFIG, then the
    /// working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Serves the controller over newline-delimited JSON on stdin/stdout.
    Serve {
        /// Absolute worktree root sessions resolve paths against.
        #[arg(long, default_value = ".")]
        worktree_root: PathBuf,
    },
    /// Configuration inspection commands.
    Config {
        /// The config subcommand to run.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Memory lifecycle maintenance commands.
    Memory {
        /// The memory subcommand to run.
        #[command(subcommand)]
        command: MemoryCommand,
    },
    /// Domain-anchor maintenance commands.
    Anchors {
        /// The anchors subcommand to run.
        #[command(subcommand)]
        command: AnchorsCommand,
    },
}

/// Anchor maintenance subcommands.
#[derive(Debug, Subcommand)]
enum AnchorsCommand {
    /// Walks the workspace and seeds the domain-anchor tree.
    Seed {
        /// Workspace root to walk.
        #[arg(long, default_value = ".")]
        worktree_root: PathBuf,
    },
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Prints the annotated example configuration.
    Example,
    /// Loads and validates the configuration, reporting success or failure.
    Validate,
}

/// Memory maintenance subcommands.
#[derive(Debug, Subcommand)]
enum MemoryCommand {
    /// Runs the age-based pending-to-provisional promotion pass.
    Promote,
    /// Ingests human override drop-in files from the configured directory.
    IngestOverrides,
    /// Exports active memories as graph-seed rows.
    ExportGraphSeed,
}

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failed to load or validate.
    #[error("config error: {0}")]
    Config(String),
    /// The serve loop or a maintenance command failed.
    #[error("{0}")]
    Runtime(String),
}

/// Formats the current instant as RFC 3339 for lifecycle timestamps.
fn now_rfc3339() -> Result<String, CliError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| CliError::Runtime(err.to_string()))
}

/// Entry point: parses arguments and runs the selected subcommand.
fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Config { command: ConfigCommand::Example } => {
            stdout
                .write_all(turngate_config::example_config_toml().as_bytes())
                .map_err(|err| CliError::Runtime(err.to_string()))?;
            Ok(())
        }
        Command::Config { command: ConfigCommand::Validate } => {
            let path = cli.config.as_deref();
            TurngateConfig::load(path).map_err(|err| CliError::Config(err.to_string()))?;
            writeln!(stdout, "configuration is valid").map_err(|err| CliError::Runtime(err.to_string()))?;
            Ok(())
        }
        Command::Serve { worktree_root } => {
            let config = TurngateConfig::load(cli.config.as_deref())
                .map_err(|err| CliError::Config(err.to_string()))?;
            let runtime = ServeRuntime::from_config(config, worktree_root)
                .map_err(|err| CliError::Runtime(err.to_string()))?;
            let stdin = std::io::stdin();
            run_loop(stdin.lock(), stdout, &runtime, &StderrTurnLogger)
                .map_err(|err| CliError::Runtime(err.to_string()))
        }
        Command::Memory { command } => {
            let config = TurngateConfig::load(cli.config.as_deref())
                .map_err(|err| CliError::Config(err.to_string()))?;
            let runtime = ServeRuntime::from_config(config, PathBuf::from("."))
                .map_err(|err| CliError::Runtime(err.to_string()))?;
            let now = now_rfc3339()?;
            match command {
                MemoryCommand::Promote => {
                    let mut memories = runtime
                        .store()
                        .load_memories()
                        .map_err(|err| CliError::Runtime(err.to_string()))?;
                    let before: Vec<_> = memories.iter().map(|record| record.state).collect();
                    turngate_core::runtime::memory_service::run_auto_promotion(&mut memories, &now);
                    let mut transitioned = 0_usize;
                    for (record, prior) in memories.iter().zip(before) {
                        if record.state != prior {
                            transitioned += 1;
                            let entry = serde_json::json!({
                                "event": "memory_transition",
                                "memoryId": record.id,
                                "from": prior,
                                "to": record.state,
                            });
                            runtime
                                .store()
                                .append_changelog(&now, &entry)
                                .map_err(|err| CliError::Runtime(err.to_string()))?;
                        }
                        runtime
                            .store()
                            .save_memory(record)
                            .map_err(|err| CliError::Runtime(err.to_string()))?;
                    }
                    writeln!(
                        stdout,
                        "promotion pass complete: {transitioned} transition(s) over {} record(s)",
                        memories.len()
                    )
                    .map_err(|err| CliError::Runtime(err.to_string()))?;
                }
                MemoryCommand::IngestOverrides => {
                    let dir = PathBuf::from(&runtime.config().paths.overrides_dir);
                    let initial_state = runtime.config().memory.override_initial_state;
                    let ingested = runtime
                        .store()
                        .ingest_override_files(&dir, initial_state, &now)
                        .map_err(|err| CliError::Runtime(err.to_string()))?;
                    for id in &ingested {
                        let entry = serde_json::json!({ "event": "override_ingested", "memoryId": id });
                        runtime
                            .store()
                            .append_changelog(&now, &entry)
                            .map_err(|err| CliError::Runtime(err.to_string()))?;
                    }
                    writeln!(stdout, "ingested {} override record(s)", ingested.len())
                        .map_err(|err| CliError::Runtime(err.to_string()))?;
                }
                MemoryCommand::ExportGraphSeed => {
                    let dir = PathBuf::from(&runtime.config().paths.graph_seed_dir);
                    let rows = runtime
                        .store()
                        .write_graph_seed(&dir)
                        .map_err(|err| CliError::Runtime(err.to_string()))?;
                    writeln!(stdout, "exported {rows} graph-seed row(s)")
                        .map_err(|err| CliError::Runtime(err.to_string()))?;
                }
            }
            Ok(())
        }
        Command::Anchors { command: AnchorsCommand::Seed { worktree_root } } => {
            let config = TurngateConfig::load(cli.config.as_deref())
                .map_err(|err| CliError::Config(err.to_string()))?;
            let runtime = ServeRuntime::from_config(config, worktree_root.clone())
                .map_err(|err| CliError::Runtime(err.to_string()))?;
            let walk = turngate_providers::AnchorWalk {
                max_depth: runtime.config().anchors.max_depth,
                exclude_patterns: runtime.config().anchors.exclude_patterns.clone(),
                force_include: runtime.config().anchors.force_include.clone(),
            };
            let anchors = turngate_providers::seed_anchors(&worktree_root, &walk)
                .map_err(|err| CliError::Runtime(err.to_string()))?;
            for anchor in &anchors {
                runtime
                    .store()
                    .save_anchor(anchor)
                    .map_err(|err| CliError::Runtime(err.to_string()))?;
            }
            writeln!(stdout, "seeded {} anchor(s)", anchors.len())
                .map_err(|err| CliError::Runtime(err.to_string()))?;
            Ok(())
        }
    }
}
