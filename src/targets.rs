//! Target list loading.

use std::path::Path;

use crate::error::{CollectError, CollectResult};

/// Read a line-oriented target list: one username per line, surrounding
/// whitespace trimmed, blank lines skipped.
///
/// An unreadable file or an empty post-filter list is a configuration error;
/// a batch run with nothing to do aborts before opening a browser.
pub fn load_targets(path: &Path) -> CollectResult<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CollectError::Configuration(format!("cannot read target list {}: {e}", path.display()))
    })?;

    let targets: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if targets.is_empty() {
        return Err(CollectError::Configuration(format!(
            "no targets found in {}",
            path.display()
        )));
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn trims_and_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "alice\n\n  bob  \n\t\ncarol\n").unwrap();

        let targets = load_targets(&path).unwrap();
        assert_eq!(targets, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_targets(&dir.path().join("nope.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_list_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n   \n\n").unwrap();

        let err = load_targets(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
