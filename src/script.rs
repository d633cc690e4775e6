//! Character classification for the trigger script.

/// Unified CJK ideograph block, the range that triggers card generation.
const HAN_RANGE: std::ops::RangeInclusive<u32> = 0x4E00..=0x9FFF;

pub fn is_han(ch: char) -> bool {
    HAN_RANGE.contains(&(ch as u32))
}

pub fn contains_han(text: &str) -> bool {
    text.chars().any(is_han)
}
