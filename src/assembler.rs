//! Interleaved original/translated output.
//!
//! Each source line is followed by its translation and a blank separator
//! line. Appending is not idempotent: the pipeline must never append a
//! chapter it has already recorded as done.

use crate::error::StorageError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Interleaves the lines of `original` and `translated`.
///
/// Lines missing on either side are rendered empty, so a translation that
/// merged or split lines still produces a complete block.
pub fn render(original: &str, translated: &str) -> String {
    let original_lines: Vec<&str> = original.split('\n').collect();
    let translated_lines: Vec<&str> = translated.split('\n').collect();
    let n = original_lines.len().max(translated_lines.len());

    let mut output = String::with_capacity(original.len() + translated.len() + n * 3);
    for i in 0..n {
        let original_line = original_lines.get(i).copied().unwrap_or("");
        let translated_line = translated_lines.get(i).copied().unwrap_or("");
        output.push_str(original_line);
        output.push('\n');
        output.push_str(translated_line);
        output.push_str("\n\n");
    }
    output
}

/// Appends a rendered block to the output artifact, creating it if absent.
pub fn append(rendered: &str, output_path: &Path) -> Result<(), StorageError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_path)
        .map_err(|e| StorageError::io(output_path, e))?;
    file.write_all(rendered.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| StorageError::io(output_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_missing_translated_line() {
        assert_eq!(render("A\nB", "1"), "A\n1\n\nB\n\n\n");
    }

    #[test]
    fn test_render_extra_translated_lines() {
        assert_eq!(render("A", "1\n2"), "A\n1\n\n\n2\n\n");
    }

    #[test]
    fn test_render_equal_lengths() {
        assert_eq!(
            render("你好\n世界", "Hello\nWorld"),
            "你好\nHello\n\n世界\nWorld\n\n"
        );
    }

    #[test]
    fn test_render_keeps_blank_lines_aligned() {
        assert_eq!(render("A\n\nB", "1\n\n2"), "A\n1\n\n\n\n\nB\n2\n\n");
    }

    #[test]
    fn test_append_creates_then_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("translated_novel.txt");

        append("A\n1\n\n", &path).unwrap();
        append("B\n2\n\n", &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "A\n1\n\nB\n2\n\n"
        );
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent").join("out.txt");
        assert!(matches!(
            append("x", &path),
            Err(StorageError::Io { .. })
        ));
    }
}
