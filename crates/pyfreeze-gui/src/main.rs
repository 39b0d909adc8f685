//! # pyfreeze-gui
//!
//! Front-end for assembling and running PyInstaller builds.
//!
//! ## Modes
//!
//! - **GUI mode** (default): `pyfreeze-gui` - graphical interface
//! - **Scan**: `pyfreeze-gui scan <script>` - print detected imports
//! - **Headless build**: `pyfreeze-gui build <script> [options]` - assemble
//!   and run the packaging command without the GUI (`--dry-run` prints the
//!   command instead of running it)

mod app;
mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pyfreeze-gui")]
#[command(about = "GUI/CLI front-end for PyInstaller builds")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the modules a script imports, one per line
    Scan {
        /// Python script to scan
        script: PathBuf,
    },

    /// Assemble and run a build in headless (CLI) mode
    Build(cli::BuildArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Some(Command::Scan { script }) => cli::run_scan(&script),
        Some(Command::Build(build_args)) => cli::run_build(build_args),
        None => app::run().map_err(|e| e.into()),
    }
}
