//! XML Name Character Classification
//!
//! Table-driven classifier for name start/continuation characters. The
//! table is a sorted list of inclusive ranges; lookup is a binary search
//! on the range end, so classification is O(log n) with no allocation.

/// One inclusive character range with its start-char eligibility.
#[derive(Debug, Clone, Copy)]
struct NameRange {
    start: u16,
    end: u16,
    starts_name: bool,
}

const fn range(start: u16, end: u16, starts_name: bool) -> NameRange {
    NameRange {
        start,
        end,
        starts_name,
    }
}

/// Sorted by range end. Ranges marked `false` are continuation-only
/// (digits, `-`, `.`, `:`, combining marks).
const NAME_RANGES: [NameRange; 20] = [
    range(0x002D, 0x002E, false), // - .
    range(0x0030, 0x0039, false), // 0-9
    range(0x003A, 0x003A, false), // :
    range(0x0041, 0x005A, true),  // A-Z
    range(0x005F, 0x005F, true),  // _
    range(0x0061, 0x007A, true),  // a-z
    range(0x00B7, 0x00B7, false),
    range(0x00C0, 0x00D6, true),
    range(0x00D8, 0x00F6, true),
    range(0x00F8, 0x02FF, true),
    range(0x0300, 0x036F, false),
    range(0x0370, 0x037D, true),
    range(0x037F, 0x1FFF, true),
    range(0x200C, 0x200D, true),
    range(0x203F, 0x2040, false),
    range(0x2070, 0x218F, true),
    range(0x2C00, 0x2FEF, true),
    range(0x3001, 0xD7FF, true),
    range(0xF900, 0xFDCF, true),
    range(0xFDF0, 0xFFFD, true),
];

/// Whether `ch` may appear in an XML name.
///
/// With `first` set, only ranges eligible to start a name qualify: digits,
/// `-`, `.`, `:`, and combining marks are continuation characters only.
/// Characters beyond U+FFFD never qualify.
pub fn is_name_char(ch: char, first: bool) -> bool {
    let cp = ch as u32;
    let idx = NAME_RANGES.partition_point(|r| (r.end as u32) < cp);
    match NAME_RANGES.get(idx) {
        Some(r) => cp >= r.start as u32 && (!first || r.starts_name),
        None => false,
    }
}
