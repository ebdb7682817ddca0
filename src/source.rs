//! Loads the novel file as text.

use crate::error::InputError;
use encoding_rs::{GBK, UTF_8};
use std::path::Path;

/// Decoded source document.
#[derive(Debug)]
pub struct SourceText {
    /// Text with `\r\n` normalized to `\n`.
    pub text: String,
    /// Name of the encoding the bytes were decoded with.
    pub encoding: &'static str,
    /// True if undecodable bytes were replaced.
    pub had_errors: bool,
}

/// Reads and decodes the novel at `path`.
pub fn load(path: &Path) -> Result<SourceText, InputError> {
    let bytes = std::fs::read(path).map_err(|source| InputError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode(&bytes))
}

/// Decodes bytes as UTF-8 (BOM allowed), falling back to GBK.
pub fn decode(bytes: &[u8]) -> SourceText {
    let (text, encoding, had_errors) = match UTF_8.decode_with_bom_removal(bytes) {
        (text, false) => (text, UTF_8, false),
        (_, true) => {
            let (text, had_errors) = GBK.decode_without_bom_handling(bytes);
            (text, GBK, had_errors)
        }
    };

    SourceText {
        text: text.replace("\r\n", "\n"),
        encoding: encoding.name(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("第一章\r\n开始".as_bytes());

        let source = decode(&bytes);
        assert_eq!(source.text, "第一章\n开始");
        assert_eq!(source.encoding, "UTF-8");
        assert!(!source.had_errors);
    }

    #[test]
    fn test_gbk_fallback() {
        let (bytes, _, _) = GBK.encode("医道官途");
        let source = decode(&bytes);
        assert_eq!(source.text, "医道官途");
        assert_eq!(source.encoding, "GBK");
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let temp = TempDir::new().unwrap();
        let result = load(&temp.path().join("missing.txt"));
        assert!(matches!(result, Err(InputError::ReadError { .. })));
    }
}
