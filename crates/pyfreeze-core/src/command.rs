//! Command assembly for the packaging invocation.
//!
//! [`assemble`] is a pure function from a [`BuildSelection`] to an argv:
//! identical input always yields a byte-identical command, options with
//! blank values are omitted, and flags are emitted in their fixed
//! declaration order rather than user-interaction order. [`prepare`] wraps
//! it with the two impure concerns: the script precondition and icon
//! normalization.

use crate::icon;
use std::path::{Path, PathBuf};

/// Program name of the external packaging tool.
pub const PACKAGER_PROGRAM: &str = "pyinstaller";

/// Recognized boolean flags, in the fixed order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    OneFile,
    OneDir,
    NoConfirm,
    Clean,
    Strip,
    NoConsole,
}

impl Flag {
    /// All recognized flags in declaration (= emission) order.
    pub const ALL: [Flag; 6] = [
        Flag::OneFile,
        Flag::OneDir,
        Flag::NoConfirm,
        Flag::Clean,
        Flag::Strip,
        Flag::NoConsole,
    ];

    /// The token passed to the packaging tool.
    pub fn token(self) -> &'static str {
        match self {
            Flag::OneFile => "--onefile",
            Flag::OneDir => "--onedir",
            Flag::NoConfirm => "--noconfirm",
            Flag::Clean => "--clean",
            Flag::Strip => "--strip",
            Flag::NoConsole => "--noconsole",
        }
    }

    /// Short description shown next to the checkbox in the GUI.
    pub fn describe(self) -> &'static str {
        match self {
            Flag::OneFile => "bundle everything into a single executable",
            Flag::OneDir => "bundle into one directory of supporting files",
            Flag::NoConfirm => "replace the output directory without asking",
            Flag::Clean => "clean the build cache and temporary files first",
            Flag::Strip => "strip symbols to reduce size",
            Flag::NoConsole => "build a windowed executable with no console",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Everything the user selected for one build.
///
/// `flags` holds the enabled flags in any order; emission order is fixed by
/// [`Flag::ALL`]. `hidden_imports` keeps insertion order, which is the
/// order the modules were presented in.
#[derive(Debug, Clone, Default)]
pub struct BuildSelection {
    pub script: PathBuf,
    pub flags: Vec<Flag>,
    pub name: Option<String>,
    pub icon: Option<PathBuf>,
    pub add_data: Option<String>,
    pub dist_path: Option<PathBuf>,
    pub hidden_imports: Vec<String>,
}

/// Errors from validating a selection before assembly.
#[derive(Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// No target script was supplied.
    MissingScript,
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::MissingScript => write!(f, "no target script selected"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// An assembled command plus any warnings produced while preparing it.
#[derive(Debug, Clone)]
pub struct PreparedCommand {
    pub argv: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate the selection and assemble the packaging command.
///
/// Fails only on the missing-script precondition. An icon that cannot be
/// normalized is dropped from the command and reported as a warning; the
/// build proceeds without it.
pub fn prepare(selection: &BuildSelection) -> Result<PreparedCommand, SelectionError> {
    if selection.script.as_os_str().is_empty() {
        return Err(SelectionError::MissingScript);
    }

    let mut warnings = Vec::new();
    let resolved_icon = match trimmed_path(selection.icon.as_deref()) {
        Some(icon_path) => match icon::normalize(&icon_path) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                warnings.push(format!("icon option dropped: {}", e));
                None
            }
        },
        None => None,
    };

    Ok(PreparedCommand {
        argv: assemble(selection, resolved_icon.as_deref()),
        warnings,
    })
}

/// Assemble the argv for the packaging invocation.
///
/// Pure and deterministic; `resolved_icon` is the already-normalized icon
/// path, or `None` when no icon applies. Callers other than tests should
/// go through [`prepare`].
pub fn assemble(selection: &BuildSelection, resolved_icon: Option<&Path>) -> Vec<String> {
    let mut argv = vec![
        PACKAGER_PROGRAM.to_string(),
        selection.script.display().to_string(),
    ];

    for flag in Flag::ALL {
        if selection.flags.contains(&flag) {
            argv.push(flag.token().to_string());
        }
    }

    if let Some(name) = trimmed(selection.name.as_deref()) {
        argv.push("--name".to_string());
        argv.push(name);
    }

    if let Some(icon_path) = resolved_icon {
        argv.push("--icon".to_string());
        argv.push(icon_path.display().to_string());
    }

    // The add-data value's internal separator convention is the user's
    // responsibility; it is passed through unmodified.
    if let Some(spec) = trimmed(selection.add_data.as_deref()) {
        argv.push("--add-data".to_string());
        argv.push(spec);
    }

    argv.push("--distpath".to_string());
    argv.push(dist_path(selection).display().to_string());

    for module in &selection.hidden_imports {
        argv.push(format!("--hidden-import={}", module));
    }

    argv
}

/// The output directory: the explicit selection when non-blank, otherwise
/// the directory containing the target script, so a destination is always
/// specified.
fn dist_path(selection: &BuildSelection) -> PathBuf {
    if let Some(dir) = trimmed_path(selection.dist_path.as_deref()) {
        return dir;
    }
    match selection.script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn trimmed_path(value: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value?.to_str()?.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(script: &str) -> BuildSelection {
        BuildSelection {
            script: PathBuf::from(script),
            ..Default::default()
        }
    }

    #[test]
    fn bare_selection_yields_program_script_and_default_distpath() {
        let argv = assemble(&selection("/tmp/app.py"), None);
        assert_eq!(argv, vec!["pyinstaller", "/tmp/app.py", "--distpath", "/tmp"]);
    }

    #[test]
    fn relative_script_without_parent_defaults_distpath_to_current_dir() {
        let argv = assemble(&selection("app.py"), None);
        assert_eq!(argv, vec!["pyinstaller", "app.py", "--distpath", "."]);
    }

    #[test]
    fn explicit_dist_path_overrides_default() {
        let mut sel = selection("/tmp/app.py");
        sel.dist_path = Some(PathBuf::from("/out"));
        let argv = assemble(&sel, None);
        assert_eq!(argv, vec!["pyinstaller", "/tmp/app.py", "--distpath", "/out"]);
    }

    #[test]
    fn blank_dist_path_falls_back_to_script_dir() {
        let mut sel = selection("/tmp/app.py");
        sel.dist_path = Some(PathBuf::from("   "));
        let argv = assemble(&sel, None);
        assert_eq!(argv, vec!["pyinstaller", "/tmp/app.py", "--distpath", "/tmp"]);
    }

    #[test]
    fn flags_are_emitted_in_declaration_order() {
        let mut sel = selection("/tmp/app.py");
        // Enabled in reverse interaction order; output order must not change.
        sel.flags = vec![Flag::NoConsole, Flag::Clean, Flag::OneFile];
        let argv = assemble(&sel, None);
        assert_eq!(
            argv,
            vec![
                "pyinstaller",
                "/tmp/app.py",
                "--onefile",
                "--clean",
                "--noconsole",
                "--distpath",
                "/tmp",
            ]
        );
    }

    #[test]
    fn name_is_trimmed_and_blank_name_is_omitted() {
        let mut sel = selection("/tmp/app.py");
        sel.name = Some("  MyApp  ".to_string());
        sel.flags = vec![Flag::OneFile];
        let argv = assemble(&sel, None);
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

        sel.name = Some("   ".to_string());
        let argv = assemble(&sel, None);
        assert!(!argv.contains(&"--name".to_string()));
    }

    #[test]
    fn resolved_icon_is_appended_and_none_is_omitted() {
        let sel = selection("/tmp/app.py");
        let argv = assemble(&sel, Some(Path::new("/tmp/pyfreeze_icon.ico")));
        assert_eq!(
            argv,
            vec![
                "pyinstaller",
                "/tmp/app.py",
                "--icon",
                "/tmp/pyfreeze_icon.ico",
                "--distpath",
                "/tmp",
            ]
        );

        let argv = assemble(&sel, None);
        assert!(!argv.contains(&"--icon".to_string()));
    }

    #[test]
    fn add_data_value_is_passed_through_unmodified() {
        let mut sel = selection("/tmp/app.py");
        sel.add_data = Some("data.txt;data".to_string());
        let argv = assemble(&sel, None);
        let pos = argv.iter().position(|a| a == "--add-data").unwrap();
        assert_eq!(argv[pos + 1], "data.txt;data");
    }

    #[test]
    fn hidden_imports_keep_presentation_order() {
        let mut sel = selection("/tmp/app.py");
        sel.hidden_imports = vec!["os".to_string(), "requests".to_string()];
        let argv = assemble(&sel, None);
        assert_eq!(
            &argv[argv.len() - 2..],
            &["--hidden-import=os", "--hidden-import=requests"]
        );
    }

    #[test]
    fn assembly_is_deterministic() {
        let mut sel = selection("/tmp/app.py");
        sel.flags = vec![Flag::OneFile, Flag::Strip];
        sel.name = Some("MyApp".to_string());
        sel.add_data = Some("assets;assets".to_string());
        sel.hidden_imports = vec!["requests".to_string()];

        let first = assemble(&sel, None);
        let second = assemble(&sel, None);
        assert_eq!(first, second);
    }

    #[test]
    fn prepare_rejects_missing_script() {
        let result = prepare(&BuildSelection::default());
        assert_eq!(result.unwrap_err(), SelectionError::MissingScript);
    }

    #[test]
    fn prepare_drops_icon_and_warns_when_conversion_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bad_icon = dir.path().join("broken.bmp");
        std::fs::write(&bad_icon, b"not an image").unwrap();

        let mut sel = selection("/tmp/app.py");
        sel.icon = Some(bad_icon);
        sel.flags = vec![Flag::OneFile];

        let prepared = prepare(&sel).unwrap();
        assert!(!prepared.argv.contains(&"--icon".to_string()));
        assert!(prepared.argv.contains(&"--onefile".to_string()));
        assert_eq!(prepared.warnings.len(), 1);
        assert!(prepared.warnings[0].contains("icon option dropped"));
    }

    #[test]
    fn prepare_passes_ico_paths_through() {
        let mut sel = selection("/tmp/app.py");
        sel.icon = Some(PathBuf::from("/assets/app.ico"));

        let prepared = prepare(&sel).unwrap();
        let pos = prepared.argv.iter().position(|a| a == "--icon").unwrap();
        assert_eq!(prepared.argv[pos + 1], "/assets/app.ico");
        assert!(prepared.warnings.is_empty());
    }
}
