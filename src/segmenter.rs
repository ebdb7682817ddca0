//! Splits a decoded novel into bounded-size chapters.
//!
//! Chapters are cut only at line breaks. A window of `max_chars` characters
//! is taken from the current offset and, unless it already reaches the end of
//! the text, extended to the next `\n`. Each slice is trimmed and empty slices
//! are dropped without consuming an id, so the same `(text, max_chars)` pair
//! always yields the same `id -> text` mapping.

use std::ops::Range;

/// A contiguous, line-bounded slice of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Stable 0-based index, used for progress tracking and ordering.
    pub id: usize,
    /// Trimmed chapter text.
    pub text: String,
    /// Byte range of the untrimmed slice within the source text.
    pub span: Range<usize>,
}

impl Chapter {
    /// Display label, 1-based ("Chapter 1" for id 0).
    pub fn label(&self) -> String {
        format!("Chapter {}", self.id + 1)
    }

    /// Number of lines in the chapter text.
    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// Lines of the chapter text, split on `\n` only.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Characters that would be sent to the gateway (blank lines excluded).
    pub fn estimated_chars(&self) -> usize {
        self.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.chars().count())
            .sum()
    }
}

/// Splits `text` into chapters of roughly `max_chars` characters.
///
/// A chapter may exceed `max_chars` when no line break follows the window
/// end, but it is never cut in the middle of a line.
pub fn segment(text: &str, max_chars: usize) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let end = match rest.char_indices().nth(max_chars) {
            None => rest.len(),
            Some((window_end, _)) => rest[window_end..]
                .find('\n')
                .map_or(rest.len(), |pos| window_end + pos),
        };

        let slice = rest[..end].trim();
        if !slice.is_empty() {
            chapters.push(Chapter {
                id: chapters.len(),
                text: slice.to_string(),
                span: offset..offset + end,
            });
        }

        // Skip the line break that ended this chapter.
        offset += end + 1;
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chapters: &[Chapter]) -> Vec<&str> {
        chapters.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_empty_text() {
        assert!(segment("", 10).is_empty());
        assert!(segment("\n\n  \n", 2).is_empty());
    }

    #[test]
    fn test_short_text_single_chapter() {
        let chapters = segment("line one\nline two", 100);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].id, 0);
        assert_eq!(chapters[0].text, "line one\nline two");
        assert_eq!(chapters[0].label(), "Chapter 1");
        assert_eq!(chapters[0].line_count(), 2);
    }

    #[test]
    fn test_window_extends_to_next_line_break() {
        // Window of 3 lands inside "aaaa", so the chapter runs to its end.
        // The second window lands inside "cc", which is the last line.
        let chapters = segment("aaaa\nbb\ncc", 3);
        assert_eq!(texts(&chapters), vec!["aaaa", "bb\ncc"]);
    }

    #[test]
    fn test_window_landing_on_line_break() {
        let chapters = segment("ab\ncd\nef", 2);
        assert_eq!(texts(&chapters), vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_groups_lines_within_window() {
        let chapters = segment("a\nb\nc\nd\ne\nf", 4);
        assert_eq!(texts(&chapters), vec!["a\nb\nc", "d\ne\nf"]);
    }

    #[test]
    fn test_no_line_break_takes_remainder() {
        let chapters = segment("abcdefghij", 3);
        assert_eq!(texts(&chapters), vec!["abcdefghij"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // Six CJK characters per line, 18 bytes each.
        let text = "第一行第一行\n第二行第二行\n第三行第三行";
        let chapters = segment(text, 6);
        assert_eq!(
            texts(&chapters),
            vec!["第一行第一行", "第二行第二行", "第三行第三行"]
        );
    }

    #[test]
    fn test_blank_slices_do_not_consume_ids() {
        let chapters = segment("abc\n\n\n\n\ndef", 1);
        assert_eq!(texts(&chapters), vec!["abc", "def"]);
        assert_eq!(chapters[0].id, 0);
        assert_eq!(chapters[1].id, 1);
        assert_eq!(chapters[1].label(), "Chapter 2");
    }

    #[test]
    fn test_slices_are_trimmed() {
        let chapters = segment("  hello  \n\t world \n", 3);
        assert_eq!(texts(&chapters), vec!["hello", "world"]);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let text = "春眠不觉晓\n处处闻啼鸟\n\n夜来风雨声\n花落知多少\n".repeat(20);
        let first = segment(&text, 17);
        let second = segment(&text, 17);
        assert_eq!(first, second);
        assert!(first.len() > 1);
    }

    #[test]
    fn test_never_cuts_mid_line() {
        let text = "short\na much longer line here\nx\nanother fairly long line\nend";
        for max_chars in 1..20 {
            let chapters = segment(text, max_chars);
            for chapter in &chapters {
                match text[chapter.span.end..].chars().next() {
                    None | Some('\n') => {}
                    Some(c) => panic!("chapter {} cut before {:?}", chapter.id, c),
                }
            }
        }
    }

    #[test]
    fn test_spans_cover_source() {
        let text = "alpha\nbeta\n\ngamma delta\nepsilon\nzeta eta theta\n";
        let chapters = segment(text, 7);

        // Everything outside the spans is a boundary line break or blank.
        let mut cursor = 0;
        for chapter in &chapters {
            assert!(text[cursor..chapter.span.start].trim().is_empty());
            assert_eq!(text[chapter.span.clone()].trim(), chapter.text);
            cursor = chapter.span.end;
        }
        assert!(text[cursor..].trim().is_empty());

        let rebuilt: Vec<&str> = chapters.iter().flat_map(|c| c.lines()).collect();
        let original: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        let rebuilt: Vec<&str> = rebuilt.into_iter().filter(|l| !l.is_empty()).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_estimated_chars_skips_blank_lines() {
        let chapter = Chapter {
            id: 0,
            text: "你好\n\n   \nabc".to_string(),
            span: 0..0,
        };
        assert_eq!(chapter.estimated_chars(), 5);
    }
}
