//! Per-character pinyin readings for Han segments.

use pinyin::ToPinyin;

use crate::segment::Segment;

/// A segment paired with its phonetic rendering. Non-Han segments carry
/// their text through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSegment {
    pub original: String,
    pub phonetic: String,
    pub is_han: bool,
}

/// Annotates each segment in order. Han segments become space-joined
/// tone-marked readings, one token per character; a character without a
/// known reading is emitted verbatim so output is never dropped.
pub fn annotate(segments: &[Segment]) -> Vec<AnnotatedSegment> {
    segments
        .iter()
        .map(|segment| {
            let phonetic = if segment.is_han {
                han_readings(&segment.text)
            } else {
                segment.text.clone()
            };
            AnnotatedSegment {
                original: segment.text.clone(),
                phonetic,
                is_han: segment.is_han,
            }
        })
        .collect()
}

/// In-order concatenation of the segments' phonetic fields, the top row of
/// a rendered card.
pub fn phonetic_line(segments: &[AnnotatedSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.phonetic.as_str())
        .collect()
}

fn han_readings(text: &str) -> String {
    text.chars()
        .map(|ch| match ch.to_pinyin() {
            Some(reading) => reading.with_tone().to_string(),
            None => ch.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
