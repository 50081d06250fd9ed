//! Encoding Detection and Stream Decoding
//!
//! Detects UTF-8 / UTF-16 input from the byte order mark and decodes it
//! incrementally into characters for the syntax parser. Malformed sequences
//! are replaced with U+FFFD so the same bytes always decode the same way.

/// Text encoding of the raw input, decided once from the BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Detect encoding from the byte order mark.
    ///
    /// Returns the encoding and the BOM length to skip. Input without a
    /// recognized BOM is treated as UTF-8 with nothing skipped.
    pub fn detect(input: &[u8]) -> (Self, usize) {
        if input.len() >= 3 && input[0] == 0xEF && input[1] == 0xBB && input[2] == 0xBF {
            return (Encoding::Utf8, 3);
        }
        if input.len() >= 2 {
            // UTF-16 LE BOM: 0xFF 0xFE
            if input[0] == 0xFF && input[1] == 0xFE {
                return (Encoding::Utf16Le, 2);
            }
            // UTF-16 BE BOM: 0xFE 0xFF
            if input[0] == 0xFE && input[1] == 0xFF {
                return (Encoding::Utf16Be, 2);
            }
        }
        (Encoding::Utf8, 0)
    }
}

/// Incremental decoder over a byte slice.
///
/// `read` produces up to a requested number of characters per call, which
/// is how the parser refills its working plane. Bad input never stops the
/// decoder: invalid UTF-8 bytes and lone UTF-16 surrogates each become one
/// U+FFFD and decoding continues at the next unit.
pub struct StreamDecoder<'a> {
    input: &'a [u8],
    pos: usize,
    encoding: Encoding,
}

const REPLACEMENT: char = '\u{FFFD}';

impl<'a> StreamDecoder<'a> {
    /// Create a decoder, detecting and skipping any BOM.
    pub fn new(input: &'a [u8]) -> Self {
        let (encoding, bom_len) = Encoding::detect(input);
        StreamDecoder {
            input,
            pos: bom_len,
            encoding,
        }
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Bytes consumed so far, BOM included.
    #[inline]
    pub fn byte_pos(&self) -> usize {
        self.pos
    }

    /// Total input length in bytes, BOM included.
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Decode up to `max_chars` characters, appending them to `out`.
    ///
    /// Returns the number of characters produced. Zero means end of input.
    pub fn read(&mut self, out: &mut Vec<char>, max_chars: usize) -> usize {
        let mut produced = 0;
        while produced < max_chars && self.pos < self.input.len() {
            let ch = match self.encoding {
                Encoding::Utf8 => self.next_utf8(),
                Encoding::Utf16Le => self.next_utf16(u16::from_le_bytes),
                Encoding::Utf16Be => self.next_utf16(u16::from_be_bytes),
            };
            out.push(ch);
            produced += 1;
        }
        produced
    }

    /// Decode one UTF-8 scalar, consuming one byte on any malformed sequence.
    fn next_utf8(&mut self) -> char {
        let bytes = &self.input[self.pos..];
        let first = bytes[0];

        let len = match first {
            0x00..=0x7F => {
                self.pos += 1;
                return first as char;
            }
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => {
                // Stray continuation byte or invalid lead
                self.pos += 1;
                return REPLACEMENT;
            }
        };

        if bytes.len() < len {
            self.pos += 1;
            return REPLACEMENT;
        }

        // Validate the whole sequence in one shot; on failure consume only
        // the lead byte so a later valid sequence is not skipped.
        match std::str::from_utf8(&bytes[..len]) {
            Ok(s) => {
                self.pos += len;
                s.chars().next().unwrap_or(REPLACEMENT)
            }
            Err(_) => {
                self.pos += 1;
                REPLACEMENT
            }
        }
    }

    /// Decode one UTF-16 scalar, pairing surrogates where possible.
    fn next_utf16(&mut self, from_bytes: fn([u8; 2]) -> u16) -> char {
        let bytes = &self.input[self.pos..];
        if bytes.len() < 2 {
            // Trailing odd byte
            self.pos = self.input.len();
            return REPLACEMENT;
        }
        let unit = from_bytes([bytes[0], bytes[1]]);
        self.pos += 2;

        match unit {
            0xD800..=0xDBFF => {
                // High surrogate: needs a low surrogate to complete
                let rest = &self.input[self.pos..];
                if rest.len() >= 2 {
                    let low = from_bytes([rest[0], rest[1]]);
                    if (0xDC00..=0xDFFF).contains(&low) {
                        self.pos += 2;
                        let cp =
                            0x10000 + ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
                        return char::from_u32(cp).unwrap_or(REPLACEMENT);
                    }
                }
                REPLACEMENT
            }
            0xDC00..=0xDFFF => REPLACEMENT,
            _ => char::from_u32(unit as u32).unwrap_or(REPLACEMENT),
        }
    }
}
