//! Headless (CLI) mode: scan a script or run a build without the GUI.

use clap::Args;
use pyfreeze_core::command::{self, BuildSelection, Flag};
use pyfreeze_core::imports;
use pyfreeze_core::runner::{BuildEvent, BuildOutcome, BuildRunner};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Options for a headless build, mirroring the packaging tool's own
/// option names.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Target Python script
    pub script: PathBuf,

    /// Bundle everything into a single executable
    #[arg(long)]
    pub onefile: bool,

    /// Bundle into one directory of supporting files
    #[arg(long)]
    pub onedir: bool,

    /// Replace the output directory without asking
    #[arg(long)]
    pub noconfirm: bool,

    /// Clean the build cache and temporary files first
    #[arg(long)]
    pub clean: bool,

    /// Strip symbols to reduce size
    #[arg(long)]
    pub strip: bool,

    /// Build a windowed executable with no console
    #[arg(long)]
    pub noconsole: bool,

    /// Name of the produced executable
    #[arg(long)]
    pub name: Option<String>,

    /// Icon file (converted to ICO if needed)
    #[arg(long)]
    pub icon: Option<PathBuf>,

    /// Extra data to bundle, in the tool's SRC;DEST convention
    #[arg(long = "add-data", value_name = "SPEC")]
    pub add_data: Option<String>,

    /// Output directory (defaults to the script's directory)
    #[arg(long)]
    pub distpath: Option<PathBuf>,

    /// Module to bundle explicitly (repeatable)
    #[arg(long = "hidden-import", value_name = "MODULE")]
    pub hidden_imports: Vec<String>,

    /// Print the assembled command without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Map parsed arguments onto a core selection.
pub fn selection_from_args(args: &BuildArgs) -> BuildSelection {
    let flag_switches = [
        (Flag::OneFile, args.onefile),
        (Flag::OneDir, args.onedir),
        (Flag::NoConfirm, args.noconfirm),
        (Flag::Clean, args.clean),
        (Flag::Strip, args.strip),
        (Flag::NoConsole, args.noconsole),
    ];

    BuildSelection {
        script: args.script.clone(),
        flags: flag_switches
            .into_iter()
            .filter_map(|(flag, enabled)| enabled.then_some(flag))
            .collect(),
        name: args.name.clone(),
        icon: args.icon.clone(),
        add_data: args.add_data.clone(),
        dist_path: args.distpath.clone(),
        hidden_imports: args.hidden_imports.clone(),
    }
}

/// Scan a script and print its imported modules, one per line.
pub fn run_scan(script: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match imports::scan_file(script) {
        Ok(modules) => {
            for module in modules {
                println!("{}", module);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Assemble the packaging command and run it, streaming merged output.
pub fn run_build(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let selection = selection_from_args(&args);
    let prepared = command::prepare(&selection)?;

    for warning in &prepared.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!("Command: {}", prepared.argv.join(" "));

    if args.dry_run {
        return Ok(());
    }

    let runner = BuildRunner::new();
    let (tx, rx) = mpsc::channel();
    runner.start(prepared.argv, tx)?;

    for event in rx {
        match event {
            BuildEvent::Output(line) => println!("{}", line),
            BuildEvent::Finished(outcome) => match outcome {
                BuildOutcome::Success => {
                    println!("\nBuild completed successfully.");
                    return Ok(());
                }
                BuildOutcome::Failed { exit_code, .. } => {
                    match exit_code {
                        Some(code) => eprintln!("\nBuild failed (exit code {}).", code),
                        None => eprintln!("\nBuild terminated by signal."),
                    }
                    std::process::exit(1);
                }
                BuildOutcome::LaunchFailed { message } => {
                    eprintln!("\nError: {}", message);
                    std::process::exit(1);
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(script: &str) -> BuildArgs {
        BuildArgs {
            script: PathBuf::from(script),
            onefile: false,
            onedir: false,
            noconfirm: false,
            clean: false,
            strip: false,
            noconsole: false,
            name: None,
            icon: None,
            add_data: None,
            distpath: None,
            hidden_imports: Vec::new(),
            dry_run: false,
        }
    }

    #[test]
    fn switches_map_to_flags() {
        let mut args = base_args("/tmp/app.py");
        args.onefile = true;
        args.strip = true;

        let selection = selection_from_args(&args);
        assert_eq!(selection.flags, vec![Flag::OneFile, Flag::Strip]);
    }

    #[test]
    fn hidden_imports_preserve_argument_order() {
        let mut args = base_args("/tmp/app.py");
        args.hidden_imports = vec!["requests".to_string(), "os".to_string()];

        let selection = selection_from_args(&args);
        assert_eq!(selection.hidden_imports, vec!["requests", "os"]);
    }

    #[test]
    fn name_flag_scenario_assembles_expected_command() {
        let mut args = base_args("/tmp/app.py");
        args.onefile = true;
        args.name = Some("MyApp".to_string());

        let argv = command::assemble(&selection_from_args(&args), None);
        assert_eq!(
            argv,
            vec![
                "pyinstaller",
                "/tmp/app.py",
                "--onefile",
                "--name",
                "MyApp",
                "--distpath",
                "/tmp",
            ]
        );
    }
}
