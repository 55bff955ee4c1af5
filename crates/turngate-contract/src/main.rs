// turngate-contract/src/main.rs
// ============================================================================
// Module: Contract Generator Binary
// Description: Renders the turngate contract bundle to a docs directory.
// Purpose: Keep the published contract regenerable with one command.
// Dependencies: clap, turngate-contract
// ============================================================================

//! ## Overview
//! `turngate-contract generate [--out DIR]` writes the bundle; `verify`
//! rebuilds it in memory and exits non-zero if any artifact on disk differs
//! from the freshly generated one, which CI uses to catch drift.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use turngate_contract::ContractBuilder;
use turngate_contract::ContractError;
use turngate_core::hashing::hash_bytes;

/// Command-line arguments for the contract generator.
#[derive(Debug, Parser)]
#[command(name = "turngate-contract", about = "Generate or verify the turngate contract bundle")]
struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Generates the contract bundle into the output directory.
    Generate {
        /// Output directory for generated artifacts.
        #[arg(long, default_value_os_t = ContractBuilder::default_output_dir())]
        out: PathBuf,
    },
    /// Verifies the on-disk bundle matches a fresh generation.
    Verify {
        /// Directory holding the previously generated artifacts.
        #[arg(long, default_value_os_t = ContractBuilder::default_output_dir())]
        out: PathBuf,
    },
}

/// Entry point: parses arguments and runs the selected subcommand.
fn main() -> Result<(), ContractError> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Generate { out } => {
            let manifest = ContractBuilder::new(out.clone()).write()?;
            writeln!(stdout, "wrote {} artifacts to {}", manifest.artifacts.len(), out.display())
                .map_err(|err| ContractError::Io(err.to_string()))?;
        }
        Command::Verify { out } => {
            let bundle = ContractBuilder::new(out.clone()).build()?;
            let mut drifted = Vec::new();
            for artifact in &bundle.artifacts {
                let on_disk = std::fs::read(out.join(&artifact.path)).unwrap_or_default();
                let expected = hash_bytes(bundle.manifest.hash_algorithm, &artifact.bytes);
                let actual = hash_bytes(bundle.manifest.hash_algorithm, &on_disk);
                if expected != actual {
                    drifted.push(artifact.path.clone());
                }
            }
            if !drifted.is_empty() {
                return Err(ContractError::Io(format!(
                    "contract drift in: {}",
                    drifted.join(", ")
                )));
            }
            writeln!(stdout, "contract bundle in {} is up to date", out.display())
                .map_err(|err| ContractError::Io(err.to_string()))?;
        }
    }
    Ok(())
}
