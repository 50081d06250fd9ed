//! XML Entity Handling
//!
//! Two halves:
//! - `TextBuffer`: the parser's pending-text accumulator, which rewrites
//!   entity references in place as characters arrive
//! - `escape_text`: the serializer's five-way escape, with a Cow fast path
//!   when nothing needs escaping
//!
//! Entity resolution is forgiving rather than strict: a numeric reference
//! that overflows, lands on zero, or names a non-scalar becomes a space,
//! and an unrecognized named entity disappears entirely.

use memchr::{memchr2, memchr3};
use std::borrow::Cow;

/// Highest codepoint a numeric reference may produce.
const MAX_CODEPOINT: u32 = 0x10FFFF;

/// Accumulates pending text for the parser, resolving entity references
/// as they complete.
///
/// `push_text` tracks the byte offset of an opening `&`; when the matching
/// `;` arrives, the span between them is resolved and the buffer rewritten:
/// the replacement character lands where the `&` was and the raw reference
/// text is dropped. An unrecognized reference is dropped without a
/// replacement. `push_raw` appends without any of this, for states that
/// collect names and skipped content.
#[derive(Debug, Default)]
pub struct TextBuffer {
    text: String,
    entity_start: Option<usize>,
}

impl TextBuffer {
    pub fn new() -> Self {
        TextBuffer::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether an `&` has been seen without its closing `;`.
    #[inline]
    pub fn entity_open(&self) -> bool {
        self.entity_start.is_some()
    }

    /// Append a character with no entity tracking.
    #[inline]
    pub fn push_raw(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Append a string with no entity tracking.
    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Append one character of text content, resolving entities.
    pub fn push_text(&mut self, ch: char) {
        self.text.push(ch);
        match self.entity_start {
            Some(start) if ch == ';' => {
                // Span between the '&' and the ';' just pushed
                let span = &self.text[start + 1..self.text.len() - 1];
                let replacement = resolve_entity(span);
                self.text.truncate(start);
                if let Some(decoded) = replacement {
                    self.text.push(decoded);
                }
                self.entity_start = None;
            }
            None if ch == '&' => {
                self.entity_start = Some(self.text.len() - 1);
            }
            _ => {}
        }
    }

    /// Take the accumulated text, abandoning any half-open entity.
    pub fn take(&mut self) -> String {
        self.entity_start = None;
        std::mem::take(&mut self.text)
    }

    /// Discard the accumulated text.
    pub fn clear(&mut self) {
        self.entity_start = None;
        self.text.clear();
    }
}

/// Resolve the text between `&` and `;`. `None` means the reference (and
/// its delimiters) should vanish.
fn resolve_entity(span: &str) -> Option<char> {
    if span.is_empty() {
        return None;
    }
    if let Some(numeric) = span.strip_prefix('#') {
        return Some(resolve_numeric(numeric));
    }
    match span {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

/// Decode the digits of a numeric reference (after the `#`).
///
/// Hexadecimal only behind a lowercase `x`; anything else runs the decimal
/// loop. Accumulation wraps at u32 and stops at the first bad digit,
/// keeping what was read so far. Zero, overflow past U+10FFFF, and
/// surrogate results all collapse to a space.
fn resolve_numeric(digits: &str) -> char {
    let mut value: u32 = 0;
    if let Some(hex) = digits.strip_prefix('x') {
        for w in hex.chars() {
            let nibble = match w {
                '0'..='9' => w as u32 - '0' as u32,
                'A'..='F' => w as u32 - 55,
                'a'..='f' => w as u32 - 87,
                _ => break,
            };
            value = value.wrapping_shl(4).wrapping_add(nibble);
        }
    } else {
        for w in digits.chars() {
            if !w.is_ascii_digit() {
                break;
            }
            value = value.wrapping_mul(10).wrapping_add(w as u32 - '0' as u32);
        }
    }

    if value == 0 || value > MAX_CODEPOINT {
        return ' ';
    }
    char::from_u32(value).unwrap_or(' ')
}

/// Escape text for XML output.
///
/// Returns Borrowed when nothing needs escaping (the common case for
/// element names and most content), Owned otherwise.
pub fn escape_text(input: &str) -> Cow<'_, str> {
    // Fast path: scan the UTF-8 bytes for anything escapable
    let bytes = input.as_bytes();
    if memchr3(b'&', b'<', b'>', bytes).is_none() && memchr2(b'\'', b'"', bytes).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\'' => result.push_str("&apos;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}
