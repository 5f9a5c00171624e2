//! Best-effort text reads from sysfs attribute files.
//!
//! Devices can detach between discovery and read, so an absent or
//! unreadable file is not an error here: it yields an empty result and the
//! caller decides what an empty value means.

use std::fs;
use std::path::Path;

/// Reads every line of `path`, or nothing if the file cannot be read.
pub fn read_all_lines(path: impl AsRef<Path>) -> Vec<String> {
    match fs::read_to_string(path.as_ref()) {
        Ok(content) => content.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

/// Reads the first line of `path` with surrounding whitespace removed.
///
/// Returns an empty string when the file is absent, unreadable or empty.
pub fn read_first_line(path: impl AsRef<Path>) -> String {
    read_all_lines(path)
        .into_iter()
        .next()
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_first_line_trims() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dirty_data");
        fs::write(&path, "  1.5G \nsecond\n").unwrap();

        assert_eq!(read_first_line(&path), "1.5G");
        assert_eq!(read_all_lines(&path), vec!["  1.5G ", "second"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats_hour/cache_hits");

        assert_eq!(read_first_line(&path), "");
        assert!(read_all_lines(&path).is_empty());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bypassed");
        fs::write(&path, "").unwrap();

        assert_eq!(read_first_line(&path), "");
    }

    #[test]
    fn test_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_first_line(dir.path()), "");
    }
}
