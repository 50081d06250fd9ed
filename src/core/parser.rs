//! Syntax Parser - State machine over the decoded character stream
//!
//! Implements a pull parser that emits syntax events:
//! - Element open / tag name / break / close
//! - Attribute name and value pairs
//! - Processing instruction target and data tokens
//! - Text and CDATA content
//!
//! The machine is deliberately forgiving where real-world documents are
//! sloppy (stray `?` inside instruction data, `</>` closes, skipped
//! declarations) and strict about input that ends mid-construct.

use super::encoding::{Encoding, StreamDecoder};
use super::entities::TextBuffer;
use super::names::is_name_char;

/// Characters decoded per plane refill unless overridden.
pub const DEFAULT_PLANE_SIZE: usize = 1024;

#[inline]
fn is_xml_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}

/// Why a parse failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A name was required and the input does not begin one
    MalformedName,
    /// The input ended inside an unfinished construct
    UnterminatedConstruct,
    /// A close tag names something other than the open element
    MismatchedClose,
    /// Markup structure violated in some other way
    StructuralViolation,
}

impl ParseErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            ParseErrorKind::MalformedName => "malformed name",
            ParseErrorKind::UnterminatedConstruct => "unterminated construct",
            ParseErrorKind::MismatchedClose => "mismatched close tag",
            ParseErrorKind::StructuralViolation => "structural violation",
        }
    }
}

/// Parse failure, carrying the character offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        ParseError { kind, position }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at character {}", self.kind.message(), self.position)
    }
}

impl std::error::Error for ParseError {}

/// Current state of the syntax machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Between markup, collecting character content
    Text,
    /// Just after `<`, deciding what it opens
    Node,
    /// Collecting an instruction target name
    Target,
    /// Collecting an element tag name
    Tag,
    /// Collecting an attribute name, or leaving the attribute list
    AttrName,
    /// Expecting `=` after an attribute name
    AttrEq,
    /// Expecting the opening attribute quote
    AttrQuote,
    /// Collecting a quoted attribute value
    AttrValue,
    /// After `?`, expecting `>` to close an instruction
    CloseInstruction,
    /// After the attribute list, expecting `>` or `/`
    BreakElement,
    /// Collecting a close tag name, or finishing `/>`
    CloseElement,
    /// Just after `<!`, deciding comment / CDATA / declaration
    SkipDeclOrComment,
    /// Discarding a comment
    SkipComment,
    /// Collecting CDATA content
    SkipCData,
    /// Discarding a declaration with bracket matching
    SkipDecl,
    /// Collecting instruction data tokens
    TargetData,
}

/// One parsing step's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxEvent {
    /// `<` opened an element; the tag name follows
    ElementOpen,
    /// Element tag name
    TagName(String),
    /// Attribute name (its value follows)
    AttrName(String),
    /// Attribute value
    AttrValue(String),
    /// `>` ended an open tag; children follow
    ElementBreak,
    /// Element closed; empty name for `/>` and `</>`
    ElementClose(String),
    /// `<?` opened a processing instruction
    InstructionOpen,
    /// Instruction target name
    TargetName(String),
    /// One instruction data token
    TargetData(String),
    /// `?>` ended a processing instruction
    InstructionClose,
    /// Character content between markup
    Text(String),
    /// CDATA section content
    CData(String),
    /// Input exhausted with the machine at rest
    EndOfInput,
}

/// What kind of construct the parser is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Element,
    Instruction,
}

/// Pull parser producing [`SyntaxEvent`]s from a byte stream.
///
/// Characters are decoded into a working plane that is refilled on demand;
/// multi-character lookahead (`-->`, `]]>`, `[CDATA[`) extends the plane
/// rather than guessing at a boundary. Both errors and `EndOfInput` are
/// sticky: once returned, every later call returns the same.
pub struct SyntaxParser<'a> {
    decoder: StreamDecoder<'a>,
    plane: Vec<char>,
    cursor: usize,
    plane_size: usize,
    parsed_chars: usize,
    parsed_bytes: usize,
    state: ParseState,
    buffer: TextBuffer,
    scope_stack: Vec<ScopeKind>,
    skip_stack: Vec<char>,
    quote: Option<char>,
    eof_in_cdata: bool,
    finished: bool,
    error: Option<ParseError>,
}

impl<'a> SyntaxParser<'a> {
    /// Parser over raw bytes, with BOM detection.
    pub fn from_bytes(input: &'a [u8]) -> Self {
        SyntaxParser::new(StreamDecoder::new(input))
    }

    pub fn new(decoder: StreamDecoder<'a>) -> Self {
        SyntaxParser::with_plane_size(decoder, DEFAULT_PLANE_SIZE)
    }

    /// Parser with an explicit plane size. Small planes change refill
    /// frequency, never outcomes.
    pub fn with_plane_size(decoder: StreamDecoder<'a>, plane_size: usize) -> Self {
        SyntaxParser {
            decoder,
            plane: Vec::new(),
            cursor: 0,
            plane_size: plane_size.max(1),
            parsed_chars: 0,
            parsed_bytes: 0,
            state: ParseState::Text,
            buffer: TextBuffer::new(),
            scope_stack: Vec::new(),
            skip_stack: Vec::new(),
            quote: None,
            eof_in_cdata: false,
            finished: false,
            error: None,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Input encoding decided from the BOM.
    pub fn encoding(&self) -> Encoding {
        self.decoder.encoding()
    }

    /// Absolute character offset of the next unconsumed character.
    pub fn position(&self) -> usize {
        self.parsed_chars + self.cursor
    }

    /// Percentage of input bytes consumed as of the last plane refill.
    pub fn progress(&self) -> u8 {
        if self.finished || self.decoder.len() == 0 {
            return 100;
        }
        ((self.parsed_bytes * 100) / self.decoder.len()) as u8
    }

    /// Whether the input ended inside a CDATA section.
    pub fn eof_in_cdata(&self) -> bool {
        self.eof_in_cdata
    }

    /// Advance the machine to its next event.
    pub fn next_event(&mut self) -> Result<SyntaxEvent, ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.finished {
            return Ok(SyntaxEvent::EndOfInput);
        }

        loop {
            if self.cursor >= self.plane.len() && !self.refill() {
                return self.resolve_eof();
            }

            while self.cursor < self.plane.len() {
                let ch = self.plane[self.cursor];
                let event = match self.state {
                    ParseState::Text => self.on_text(ch),
                    ParseState::Node => self.on_node(ch),
                    ParseState::Target | ParseState::Tag => self.on_name(ch)?,
                    ParseState::AttrName => self.on_attr_name(ch)?,
                    ParseState::AttrEq => self.on_attr_eq(ch)?,
                    ParseState::AttrQuote => self.on_attr_quote(ch)?,
                    ParseState::AttrValue => self.on_attr_value(ch)?,
                    ParseState::CloseInstruction => self.on_close_instruction(ch)?,
                    ParseState::BreakElement => self.on_break_element(ch)?,
                    ParseState::CloseElement => self.on_close_element(ch)?,
                    ParseState::SkipDeclOrComment => self.on_skip_decl_or_comment(),
                    ParseState::SkipComment => self.on_skip_comment(),
                    ParseState::SkipCData => self.on_skip_cdata(),
                    ParseState::SkipDecl => self.on_skip_decl(ch),
                    ParseState::TargetData => self.on_target_data(ch),
                };
                if let Some(event) = event {
                    return Ok(event);
                }
            }
        }
    }

    /// Refill the working plane. Returns false at end of input.
    fn refill(&mut self) -> bool {
        if self.decoder.is_eof() {
            return false;
        }
        self.parsed_chars += self.plane.len();
        self.parsed_bytes = self.decoder.byte_pos();
        self.plane.clear();
        self.cursor = 0;
        self.decoder.read(&mut self.plane, self.plane_size) > 0
    }

    /// Decide what end of input means for the current state.
    fn resolve_eof(&mut self) -> Result<SyntaxEvent, ParseError> {
        match self.state {
            ParseState::Text => {
                // Pending character content that never met a '<' is dropped
                self.finished = true;
                Ok(SyntaxEvent::EndOfInput)
            }
            ParseState::SkipCData => {
                // Keep what was collected; the document layer decides
                // whether the truncation is acceptable
                self.eof_in_cdata = true;
                self.state = ParseState::Text;
                Ok(SyntaxEvent::CData(self.buffer.take()))
            }
            _ => Err(self.fail(ParseErrorKind::UnterminatedConstruct)),
        }
    }

    /// Compare upcoming characters against `pattern`, pulling more input
    /// across a plane boundary when needed. Short input never matches.
    fn lookahead_matches(&mut self, pattern: &str, ignore_case: bool) -> bool {
        let needed = pattern.len();
        while self.plane.len() - self.cursor < needed {
            if self.decoder.read(&mut self.plane, self.plane_size) == 0 {
                return false;
            }
        }
        let window = &self.plane[self.cursor..self.cursor + needed];
        if ignore_case {
            window
                .iter()
                .zip(pattern.chars())
                .all(|(a, b)| a.eq_ignore_ascii_case(&b))
        } else {
            window.iter().zip(pattern.chars()).all(|(a, b)| *a == b)
        }
    }

    fn fail(&mut self, kind: ParseErrorKind) -> ParseError {
        let err = ParseError::new(kind, self.position());
        self.error = Some(err.clone());
        err
    }

    /// `Text`: flush at `<`, otherwise accumulate content.
    fn on_text(&mut self, ch: char) -> Option<SyntaxEvent> {
        if ch == '<' {
            if !self.buffer.is_empty() {
                // Emit the pending run; the '<' is reprocessed next call
                return Some(SyntaxEvent::Text(self.buffer.take()));
            }
            self.cursor += 1;
            self.state = ParseState::Node;
            None
        } else {
            self.buffer.push_text(ch);
            self.cursor += 1;
            None
        }
    }

    /// `Node`: classify what the `<` introduced.
    fn on_node(&mut self, ch: char) -> Option<SyntaxEvent> {
        match ch {
            '!' => {
                self.cursor += 1;
                self.state = ParseState::SkipDeclOrComment;
                None
            }
            '/' => {
                self.cursor += 1;
                self.state = ParseState::CloseElement;
                None
            }
            '?' => {
                self.scope_stack.push(ScopeKind::Instruction);
                self.cursor += 1;
                self.state = ParseState::Target;
                Some(SyntaxEvent::InstructionOpen)
            }
            _ => {
                self.scope_stack.push(ScopeKind::Element);
                self.state = ParseState::Tag;
                Some(SyntaxEvent::ElementOpen)
            }
        }
    }

    /// `Target` / `Tag`: accumulate a name until a non-name character.
    fn on_name(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if is_name_char(ch, self.buffer.is_empty()) {
            self.buffer.push_raw(ch);
            self.cursor += 1;
            return Ok(None);
        }
        if self.buffer.is_empty() {
            return Err(self.fail(ParseErrorKind::MalformedName));
        }
        let name = self.buffer.take();
        let event = if self.state == ParseState::Target {
            SyntaxEvent::TargetName(name)
        } else {
            SyntaxEvent::TagName(name)
        };
        self.state = ParseState::AttrName;
        Ok(Some(event))
    }

    /// `AttrName`: a name, or one of the ways out of the attribute list.
    fn on_attr_name(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if self.buffer.is_empty() && is_xml_whitespace(ch) {
            self.cursor += 1;
            return Ok(None);
        }
        if is_name_char(ch, self.buffer.is_empty()) {
            self.buffer.push_raw(ch);
            self.cursor += 1;
            return Ok(None);
        }
        if self.buffer.is_empty() {
            match self.scope_stack.last() {
                Some(ScopeKind::Element) if ch == '>' || ch == '/' => {
                    self.state = ParseState::BreakElement;
                    return Ok(None);
                }
                Some(ScopeKind::Instruction) => {
                    if ch == '?' {
                        self.state = ParseState::CloseInstruction;
                        self.cursor += 1;
                    } else {
                        self.state = ParseState::TargetData;
                    }
                    return Ok(None);
                }
                _ => {}
            }
            return Err(self.fail(ParseErrorKind::MalformedName));
        }
        // An instruction pseudo-attribute without '=' turns out to be data;
        // the collected name stays in the buffer
        if matches!(self.scope_stack.last(), Some(ScopeKind::Instruction))
            && ch != '='
            && !is_xml_whitespace(ch)
        {
            self.state = ParseState::TargetData;
            return Ok(None);
        }
        self.state = ParseState::AttrEq;
        Ok(Some(SyntaxEvent::AttrName(self.buffer.take())))
    }

    /// `AttrEq`: expect `=`; instructions may bail back to data.
    fn on_attr_eq(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if is_xml_whitespace(ch) {
            self.cursor += 1;
            return Ok(None);
        }
        if ch != '=' {
            if matches!(self.scope_stack.last(), Some(ScopeKind::Instruction)) {
                self.state = ParseState::TargetData;
                return Ok(None);
            }
            return Err(self.fail(ParseErrorKind::StructuralViolation));
        }
        self.cursor += 1;
        self.state = ParseState::AttrQuote;
        Ok(None)
    }

    /// `AttrQuote`: expect the opening quote.
    fn on_attr_quote(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if is_xml_whitespace(ch) {
            self.cursor += 1;
            return Ok(None);
        }
        if ch != '"' && ch != '\'' {
            return Err(self.fail(ParseErrorKind::StructuralViolation));
        }
        self.quote = Some(ch);
        self.cursor += 1;
        self.state = ParseState::AttrValue;
        Ok(None)
    }

    /// `AttrValue`: content until the matching quote.
    fn on_attr_value(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if Some(ch) == self.quote {
            if self.buffer.entity_open() {
                return Err(self.fail(ParseErrorKind::UnterminatedConstruct));
            }
            self.quote = None;
            self.cursor += 1;
            self.state = ParseState::AttrName;
            return Ok(Some(SyntaxEvent::AttrValue(self.buffer.take())));
        }
        self.buffer.push_text(ch);
        self.cursor += 1;
        Ok(None)
    }

    /// `CloseInstruction`: at `?`, waiting for `>`.
    fn on_close_instruction(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if ch != '>' {
            // Not a close after all. The char joins the buffer here and is
            // reprocessed in TargetData, which usually appends it again.
            self.buffer.push_raw(ch);
            self.state = ParseState::TargetData;
            return Ok(None);
        }
        if !self.buffer.is_empty() {
            return Ok(Some(SyntaxEvent::TargetData(self.buffer.take())));
        }
        self.cursor += 1;
        if self.scope_stack.pop().is_none() {
            return Err(self.fail(ParseErrorKind::StructuralViolation));
        }
        self.state = ParseState::Text;
        Ok(Some(SyntaxEvent::InstructionClose))
    }

    /// `BreakElement`: after the attribute list, `>` or `/>`.
    fn on_break_element(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        match ch {
            '>' => {
                self.cursor += 1;
                self.state = ParseState::Text;
                Ok(Some(SyntaxEvent::ElementBreak))
            }
            '/' => {
                self.cursor += 1;
                self.state = ParseState::CloseElement;
                Ok(None)
            }
            _ => Err(self.fail(ParseErrorKind::StructuralViolation)),
        }
    }

    /// `CloseElement`: the name after `</`, or the bare `>` of `/>`.
    fn on_close_element(&mut self, ch: char) -> Result<Option<SyntaxEvent>, ParseError> {
        if is_name_char(ch, self.buffer.is_empty()) {
            self.buffer.push_raw(ch);
            self.cursor += 1;
            return Ok(None);
        }
        if ch == '>' {
            if self.scope_stack.pop().is_none() {
                return Err(self.fail(ParseErrorKind::StructuralViolation));
            }
            self.cursor += 1;
            self.state = ParseState::Text;
            return Ok(Some(SyntaxEvent::ElementClose(self.buffer.take())));
        }
        if !is_xml_whitespace(ch) {
            return Err(self.fail(ParseErrorKind::MalformedName));
        }
        self.cursor += 1;
        Ok(None)
    }

    /// `<!` seen: comment, CDATA, or a declaration to skip.
    fn on_skip_decl_or_comment(&mut self) -> Option<SyntaxEvent> {
        if self.lookahead_matches("--", false) {
            self.cursor += 2;
            self.state = ParseState::SkipComment;
        } else if self.lookahead_matches("[CDATA[", true) {
            self.cursor += 7;
            self.state = ParseState::SkipCData;
        } else {
            self.state = ParseState::SkipDecl;
            self.skip_stack.push('>');
        }
        None
    }

    /// `SkipComment`: discard everything through `-->`.
    fn on_skip_comment(&mut self) -> Option<SyntaxEvent> {
        if self.lookahead_matches("-->", false) {
            self.cursor += 2;
            self.state = ParseState::Text;
        }
        self.cursor += 1;
        None
    }

    /// `SkipCData`: collect raw content until `]]>`.
    fn on_skip_cdata(&mut self) -> Option<SyntaxEvent> {
        if self.lookahead_matches("]]>", false) {
            self.cursor += 3;
            self.state = ParseState::Text;
            return Some(SyntaxEvent::CData(self.buffer.take()));
        }
        let ch = self.plane[self.cursor];
        self.buffer.push_raw(ch);
        self.cursor += 1;
        None
    }

    /// `SkipDecl`: bracket/quote matching until the opening `>` closes.
    fn on_skip_decl(&mut self, ch: char) -> Option<SyntaxEvent> {
        let top = self.skip_stack.last().copied();
        match top {
            Some(quote) if quote == '\'' || quote == '"' => {
                // Quoted literal: consumed, never collected
                self.cursor += 1;
                if ch == quote {
                    self.skip_stack.pop();
                    if self.skip_stack.is_empty() {
                        self.state = ParseState::Text;
                    }
                }
                return None;
            }
            _ => {}
        }

        match ch {
            '<' => self.skip_stack.push('>'),
            '[' => self.skip_stack.push(']'),
            '(' => self.skip_stack.push(')'),
            '\'' | '"' => self.skip_stack.push(ch),
            _ => {
                if top == Some(ch) {
                    self.skip_stack.pop();
                    if self.skip_stack.is_empty() {
                        // Declaration consumed; its content is dropped
                        self.buffer.clear();
                        self.state = ParseState::Text;
                    }
                }
            }
        }
        if !self.skip_stack.is_empty() {
            self.buffer.push_raw(ch);
        }
        self.cursor += 1;
        None
    }

    /// `TargetData`: whitespace-delimited tokens, with `"` quoting.
    fn on_target_data(&mut self, ch: char) -> Option<SyntaxEvent> {
        if is_xml_whitespace(ch) {
            if self.buffer.is_empty() {
                self.cursor += 1;
                return None;
            }
            if self.quote.is_none() {
                self.cursor += 1;
                return Some(SyntaxEvent::TargetData(self.buffer.take()));
            }
            // Inside a quoted run whitespace is ordinary content
        }
        if ch == '?' {
            // Checked ahead of the quote logic: '?' ends data even mid-quote
            self.state = ParseState::CloseInstruction;
            self.cursor += 1;
            return None;
        }
        if ch == '"' {
            if self.quote.is_none() {
                self.quote = Some(ch);
                self.cursor += 1;
                return None;
            }
            self.quote = None;
            self.cursor += 1;
            return Some(SyntaxEvent::TargetData(self.buffer.take()));
        }
        self.buffer.push_raw(ch);
        self.cursor += 1;
        None
    }
}
