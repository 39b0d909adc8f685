//! Static import scanner for Python scripts.
//!
//! This is a best-effort textual scan, not a dependency resolver: it
//! recognizes `import X` and `from X import ...` at the (optionally
//! indented) start of a line and keeps only the first dotted segment, so
//! `from foo.bar import baz` yields `foo`. Conditional imports, dynamic
//! `__import__` calls and re-exports are out of scope.

use regex::Regex;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Errors from scanning a script file.
#[derive(Debug)]
pub enum ScanError {
    /// The file could not be opened.
    Open { path: PathBuf, source: io::Error },
    /// A line could not be read or was not valid UTF-8.
    Read { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::Open { path, source } => {
                write!(f, "failed to open {}: {}", path.display(), source)
            }
            ScanError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Open { source, .. } | ScanError::Read { source, .. } => Some(source),
        }
    }
}

/// Collect top-level module names referenced by import statements in `src`.
///
/// Relative imports (`from . import x`) have no leading identifier segment
/// and are ignored.
pub fn scan_source(src: &str) -> BTreeSet<String> {
    let pattern = Regex::new(r"^\s*(?:import|from)\s+([A-Za-z_][A-Za-z0-9_.]*)")
        .expect("import pattern is valid");

    src.lines()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| {
            let dotted = caps.get(1)?.as_str();
            let first = dotted.split('.').next()?;
            Some(first.to_string())
        })
        .collect()
}

/// Scan a script file and return its imported module names, sorted and
/// deduplicated.
///
/// The file is read line by line as UTF-8 text; an open failure or a
/// decode failure on any line aborts the scan with a [`ScanError`]. Callers
/// treat a failed scan as "no modules detected" after reporting it.
pub fn scan_file(path: &Path) -> Result<Vec<String>, ScanError> {
    let file = File::open(path).map_err(|e| ScanError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut source = String::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| ScanError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        source.push_str(&line);
        source.push('\n');
    }

    Ok(scan_source(&source).into_iter().collect())
}
