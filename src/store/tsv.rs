use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::warn;

use crate::error::PuzzleError;

/// Lines read from a word list, validated against the first line's shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TsvBatch {
    pub columns: usize,
    pub entries: Vec<String>,
    pub skipped: usize,
}

fn tab_count(line: &str) -> usize {
    line.bytes().filter(|&b| b == b'\t').count()
}

/// Reads one record per line. The first line fixes the column count (tabs + 1);
/// later lines need at least as many tabs and are kept verbatim.
pub fn read_entries<R: BufRead>(reader: R, path: &Path) -> Result<TsvBatch, PuzzleError> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(|e| PuzzleError::io(path, e))?,
        None => String::new(),
    };

    let tabs = tab_count(&header);
    if tabs == 0 {
        return Err(PuzzleError::Format {
            path: path.to_path_buf(),
        });
    }

    let mut entries = vec![header];
    let mut skipped = 0;
    for line in lines {
        let line = line.map_err(|e| PuzzleError::io(path, e))?;
        if tab_count(&line) >= tabs {
            entries.push(line);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped lines with too few fields");
    }

    Ok(TsvBatch {
        columns: tabs + 1,
        entries,
        skipped,
    })
}

/// Writes one entry per line through a temporary file, then renames it into place.
pub fn write_entries<'a, I>(path: &Path, entries: I) -> Result<(), PuzzleError>
where
    I: IntoIterator<Item = &'a str>,
{
    let tmp_path = path.with_extension("tmp");

    let mut content = String::new();
    for entry in entries {
        content.push_str(entry);
        content.push('\n');
    }

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PuzzleError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn read(content: &str) -> Result<TsvBatch, PuzzleError> {
        read_entries(Cursor::new(content), Path::new("words.tsv"))
    }

    #[test]
    fn test_column_count_comes_from_first_line() {
        let batch = read("dog\tchien\tnoun\ncat\tchat\tnoun\n").unwrap();
        assert_eq!(batch.columns, 3);
        assert_eq!(batch.entries.len(), 2);
    }

    #[test]
    fn test_short_lines_are_skipped_and_long_lines_kept_verbatim() {
        let batch = read("dog\tchien\ncat\ncow\tvache\textra\n\n").unwrap();
        assert_eq!(batch.columns, 2);
        assert_eq!(batch.entries, vec!["dog\tchien", "cow\tvache\textra"]);
        assert_eq!(batch.skipped, 2);
    }

    #[test]
    fn test_header_without_separator_is_rejected() {
        let err = read("dog chien\ncat\tchat\n").unwrap_err();
        assert!(matches!(err, PuzzleError::Format { .. }));
        assert!(err.to_string().contains("no field separator"));
    }

    #[test]
    fn test_empty_input_is_a_format_error() {
        assert!(matches!(read(""), Err(PuzzleError::Format { .. })));
    }

    #[test]
    fn test_crlf_line_endings() {
        let batch = read("dog\tchien\r\ncat\tchat\r\n").unwrap();
        assert_eq!(batch.entries, vec!["dog\tchien", "cat\tchat"]);
    }

    #[test]
    fn test_write_then_read_preserves_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.tsv");
        write_entries(&path, ["a\t1", "b\t2\tx"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\t1\nb\t2\tx\n");
        assert!(!dir.path().join("deck.tmp").exists());
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("deck.tsv");
        let err = write_entries(&path, ["a\t1"]).unwrap_err();
        assert!(matches!(err, PuzzleError::Io { .. }));
    }
}
