//! Batch input: raw bibliography texts from a file or a directory.

use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const BIB_EXTENSION: &str = "bib";

/// Reads the raw texts to ingest from `path`.
///
/// A file yields its own contents. A directory yields the contents of each
/// `.bib` file directly inside it, in file-name order; files that cannot be
/// read, or directory entries that cannot be listed, are logged and skipped.
///
/// # Errors
///
/// Returns `BibError::Io` if `path` itself cannot be read.
pub fn read_inputs(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Ok(vec![fs::read_to_string(path)?]);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(path)? {
        match entry {
            Ok(entry) => {
                let file = entry.path();
                if file.is_file() && has_bib_extension(&file) {
                    files.push(file);
                }
            }
            Err(e) => warn!("Skipping unlistable entry in {}: {}", path.display(), e),
        }
    }
    files.sort();

    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        match fs::read_to_string(&file) {
            Ok(text) => inputs.push(text),
            Err(e) => warn!("Skipping unreadable input {}: {}", file.display(), e),
        }
    }
    Ok(inputs)
}

fn has_bib_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BIB_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BibError;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("refs.txt");
        fs::write(&file, "@misc{a, author = {A, B.}}").unwrap();

        assert_eq!(read_inputs(&file).unwrap(), vec!["@misc{a, author = {A, B.}}"]);
    }

    #[test]
    fn test_directory_reads_bib_files_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.bib"), "second").unwrap();
        fs::write(dir.path().join("a.BIB"), "first").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.bib")).unwrap();

        assert_eq!(read_inputs(dir.path()).unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.bib"), "ok").unwrap();
        fs::write(dir.path().join("latin1.bib"), [0xff, 0xfe, 0x00]).unwrap();

        assert_eq!(read_inputs(dir.path()).unwrap(), vec!["ok"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(read_inputs(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = read_inputs(dir.path().join("absent.bib"));
        assert!(matches!(result, Err(BibError::Io(_))));
    }
}
