//! Filename extraction from URL path.

use percent_encoding::percent_decode_str;

/// Extracts the last path segment from a URL for use as a filename.
///
/// The segment is percent-decoded (`my%20file.iso` gives `my file.iso`).
/// Returns `None` if the path is empty/root, or if the decoded segment is not
/// UTF-8, contains a path separator, or is `.`/`..`.
pub fn filename_from_url_path(url: &url::Url) -> Option<String> {
    let raw = url.path().split('/').filter(|s| !s.is_empty()).last()?;
    let segment = percent_decode_str(raw).decode_utf8().ok()?;
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return None;
    }
    Some(segment.into_owned())
}
