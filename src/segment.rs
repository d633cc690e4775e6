//! Splits a line into maximal runs sharing one script classification.

use crate::script::is_han;

/// A maximal contiguous run of characters with a single classification.
/// Invariant: `text` is never empty, and concatenating the segments of a
/// line in order reproduces the line exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_han: bool,
}

/// Partitions `line` into alternating Han / non-Han segments. Empty input
/// yields an empty vec; a uniform line yields exactly one segment.
pub fn tokenize(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut buffer_is_han = false;

    for ch in line.chars() {
        let han = is_han(ch);
        if !buffer.is_empty() && han != buffer_is_han {
            segments.push(Segment {
                text: std::mem::take(&mut buffer),
                is_han: buffer_is_han,
            });
        }
        buffer_is_han = han;
        buffer.push(ch);
    }

    if !buffer.is_empty() {
        segments.push(Segment {
            text: buffer,
            is_han: buffer_is_han,
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::is_han;

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn uniform_line_yields_one_segment() {
        let segments = tokenize("你好世界");
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_han);
        assert_eq!(segments[0].text, "你好世界");

        let segments = tokenize("plain ascii");
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_han);
    }

    #[test]
    fn mixed_line_splits_on_script_boundaries() {
        let segments = tokenize("你好world再见");
        let expected = [("你好", true), ("world", false), ("再见", true)];
        assert_eq!(segments.len(), expected.len());
        for (segment, (text, is_han)) in segments.iter().zip(expected) {
            assert_eq!(segment.text, text);
            assert_eq!(segment.is_han, is_han);
        }
    }

    #[test]
    fn partition_reproduces_input_exactly() {
        for line in [
            "你好world再见",
            "abc",
            "中",
            "  leading 空格 and trailing  ",
            "标点，。！mixed with 「brackets」",
            "ümlaut日本語かな漢字",
        ] {
            let joined: String = tokenize(line).iter().map(|s| s.text.as_str()).collect();
            assert_eq!(joined, line);
        }
    }

    #[test]
    fn segments_are_consistent_and_alternating() {
        let segments = tokenize("1一2二3三and四more五");
        for segment in &segments {
            assert!(!segment.text.is_empty());
            for ch in segment.text.chars() {
                assert_eq!(is_han(ch), segment.is_han);
            }
        }
        for pair in segments.windows(2) {
            assert_ne!(pair[0].is_han, pair[1].is_han);
        }
    }

    #[test]
    fn tokenize_is_deterministic() {
        let line = "你好world再见";
        assert_eq!(tokenize(line), tokenize(line));
    }
}
