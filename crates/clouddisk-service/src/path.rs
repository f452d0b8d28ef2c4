//! Path and file-name helpers for the virtual tree.

use clouddisk_core::error::AppError;
use clouddisk_core::result::AppResult;

/// Split a slash-separated path into directory segments.
///
/// Leading, trailing and repeated slashes are ignored, as are `.` and `..`
/// segments. Backslashes are ordinary characters here.
pub fn normalize_path(path: &str) -> AppResult<Vec<String>> {
    let mut segments = Vec::new();
    for seg in path.split('/') {
        if seg.is_empty() || seg == "." || seg == ".." {
            continue;
        }
        if seg.contains('\0') {
            return Err(AppError::invalid_input(format!(
                "Path segment contains a NUL byte: {seg:?}"
            )));
        }
        segments.push(seg.to_string());
    }
    Ok(segments)
}

/// The final component of a client-supplied name, after the last `/` or `\`.
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Check that `name` can be stored as a single entry name.
pub fn validate_entry_name(name: &str) -> AppResult<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::invalid_input(format!("Invalid name: {name:?}")));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(AppError::invalid_input(format!(
            "Name must be a single path segment: {name:?}"
        )));
    }
    Ok(())
}

/// Split a relative upload path into its directory part and base name.
///
/// `"docs/2024/report.pdf"` becomes `("docs/2024", "report.pdf")`; a path
/// without a slash has an empty directory part.
pub fn split_relative_path(relative: &str) -> (&str, &str) {
    let relative = relative.trim_start_matches('/');
    match relative.rsplit_once('/') {
        Some((dir, base)) => (dir, base),
        None => ("", relative),
    }
}

/// Extension of `name` including the leading dot, or `""`.
///
/// Everything from the last dot onward counts, so `archive.tar.GZ` yields
/// `.GZ` and `.profile` yields `.profile`.
pub fn extension(name: &str) -> &str {
    let name = base_name(name);
    name.rfind('.').map(|i| &name[i..]).unwrap_or("")
}
