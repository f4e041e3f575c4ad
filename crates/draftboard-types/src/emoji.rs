//! Reaction emoji validation.
//!
//! A reaction is accepted only if every code point falls in one of the
//! allow-listed Unicode blocks below. No normalization is applied.

use std::ops::RangeInclusive;

const PERMITTED_RANGES: &[RangeInclusive<u32>] = &[
    0x1F600..=0x1F64F, // Emoticons
    0x1F300..=0x1F5FF, // Misc Symbols and Pictographs
    0x1F680..=0x1F6FF, // Transport and Map
    0x2600..=0x26FF,   // Misc Symbols
    0x2700..=0x27BF,   // Dingbats
    0xFE00..=0xFE0F,   // Variation Selectors
    0x1F900..=0x1F9FF, // Supplemental Symbols and Pictographs
    0x1F1E6..=0x1F1FF, // Regional Indicator Symbols
];

/// Returns true if `c` lies inside an allow-listed block.
#[inline]
pub fn is_permitted_emoji(c: char) -> bool {
    let cp = c as u32;
    PERMITTED_RANGES.iter().any(|range| range.contains(&cp))
}

/// Returns true if every code point of `s` is permitted.
/// The empty string passes; callers decide whether that is acceptable.
pub fn is_permitted_emoji_string(s: &str) -> bool {
    s.chars().all(is_permitted_emoji)
}
