//! Frame sources for `attend analyze`: image files and directories of images.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbaImage};

/// Expand `paths` into image files. Directories contribute their image files
/// sorted by name; files are taken as given. Order across arguments is kept.
pub fn collect(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for path in paths {
        if path.is_dir() {
            frames.extend(list_dir(path)?);
        } else if path.is_file() {
            frames.push(path.clone());
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }
    Ok(frames)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_file() && ImageFormat::from_path(&path).is_ok() {
            files.push(path);
        }
    }
    files.sort();
    tracing::debug!(dir = %dir.display(), count = files.len(), "frames listed");
    Ok(files)
}

/// Decode an image file into an RGBA8 buffer.
pub fn load(path: &Path) -> Result<RgbaImage> {
    let image =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(image.to_rgba8())
}
