//! Icon normalization for the `--icon` option.
//!
//! PyInstaller wants an ICO container; users hand us whatever raster file
//! they have lying around. A path that already ends in `.ico` is returned
//! unchanged. Anything else is decoded, resized to 256x256 and re-encoded
//! as a single-entry ICO under a fixed name in the system temp directory.
//! Repeated calls overwrite the same file, which is fine because builds are
//! single-flight.

use image::imageops::FilterType;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Edge length of the canonical icon image.
pub const ICON_SIZE: u32 = 256;

/// Fixed filename for the converted icon in the temp directory.
pub const TEMP_ICON_FILENAME: &str = "pyfreeze_icon.ico";

/// Errors from icon normalization.
#[derive(Debug)]
pub enum IconError {
    /// The source image could not be opened or decoded.
    Decode { path: PathBuf, message: String },
    /// The resized image could not be encoded as an ICO entry.
    Encode { source: io::Error },
    /// The ICO file could not be written.
    Write { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for IconError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IconError::Decode { path, message } => {
                write!(f, "failed to decode image {}: {}", path.display(), message)
            }
            IconError::Encode { source } => {
                write!(f, "failed to encode icon: {}", source)
            }
            IconError::Write { path, source } => {
                write!(f, "failed to write icon {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for IconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IconError::Decode { .. } => None,
            IconError::Encode { source } | IconError::Write { source, .. } => Some(source),
        }
    }
}

/// Resolve a user-supplied image path to an ICO path usable by the
/// packaging tool.
///
/// `.ico` inputs pass through untouched (no copy, no existence check -
/// the packaging tool validates its own inputs). Other formats are
/// converted into the temp directory and the converted path is returned.
pub fn normalize(path: &Path) -> Result<PathBuf, IconError> {
    if has_ico_extension(path) {
        return Ok(path.to_path_buf());
    }
    convert_to_ico(path, &std::env::temp_dir().join(TEMP_ICON_FILENAME))
}

fn has_ico_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ico"))
}

/// Decode `input`, resize to the canonical resolution and write a
/// single-entry ICO container to `output`.
fn convert_to_ico(input: &Path, output: &Path) -> Result<PathBuf, IconError> {
    let img = image::open(input).map_err(|e| IconError::Decode {
        path: input.to_path_buf(),
        message: e.to_string(),
    })?;

    let resized = img
        .resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
        .to_rgba8();

    let icon_image = ico::IconImage::from_rgba_data(ICON_SIZE, ICON_SIZE, resized.into_raw());
    let entry = ico::IconDirEntry::encode(&icon_image).map_err(|e| IconError::Encode { source: e })?;

    let mut dir = ico::IconDir::new(ico::ResourceType::Icon);
    dir.add_entry(entry);

    let file = File::create(output).map_err(|e| IconError::Write {
        path: output.to_path_buf(),
        source: e,
    })?;
    dir.write(BufWriter::new(file)).map_err(|e| IconError::Write {
        path: output.to_path_buf(),
        source: e,
    })?;

    Ok(output.to_path_buf())
}
