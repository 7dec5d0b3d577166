//! Output and temporary file naming

use chrono::Utc;
use std::path::{Path, PathBuf};

/// Longest sanitized title, in characters
pub const MAX_FILENAME_CHARS: usize = 200;

const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitizes a title so it can be used as a file name.
///
/// Strips characters rejected by common filesystems, collapses whitespace
/// runs into a single space, trims, and truncates to [`MAX_FILENAME_CHARS`]
/// characters.
///
/// # Examples
/// ```
/// use vidgrab::utils::sanitize_filename;
/// assert_eq!(sanitize_filename("My:Video/Title*?"), "MyVideoTitle");
/// assert_eq!(sanitize_filename("  a   b\tc  "), "a b c");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !INVALID_CHARS.contains(c) && (!c.is_control() || c.is_whitespace()))
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Final file name for a title and container extension
pub fn output_filename(title: &str, extension: &str) -> String {
    let mut base = sanitize_filename(title);
    if base.is_empty() {
        base = "video".to_string();
    }
    format!("{}.{}", base, extension)
}

/// Unique temporary path for one stream of a merge job
///
/// The millisecond timestamp keeps stale temps from earlier runs apart, the
/// nonce separates jobs started within the same millisecond.
pub fn temp_file_path(dir: &Path, kind: &str, extension: &str) -> PathBuf {
    let stamp = Utc::now().timestamp_millis();
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    dir.join(format!("temp_{}_{}_{}.{}", kind, stamp, &nonce[..8], extension))
}
