//! URL modeling and output path derivation.

mod path;

pub use path::filename_from_url_path;

use std::io;
use std::path::{Path, PathBuf};

/// Filename used when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Derives the absolute output path: last URL path segment joined under `folder`.
///
/// A relative `folder` is resolved against the current working directory.
///
/// # Examples
///
/// - `https://example.com/pub/debian-12.iso` with folder `/srv` → `/srv/debian-12.iso`
/// - `https://example.com/my%20file.iso` with folder `/srv` → `/srv/my file.iso`
/// - `https://example.com/` with folder `/srv` → `/srv/download.bin`
pub fn output_path(folder: &Path, url: &url::Url) -> io::Result<PathBuf> {
    let name = filename_from_url_path(url).unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let joined = folder.join(name);
    if joined.is_absolute() {
        Ok(joined)
    } else {
        Ok(std::env::current_dir()?.join(joined))
    }
}
