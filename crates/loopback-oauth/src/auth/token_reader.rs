//! Streaming reader for token endpoint responses
//!
//! Token responses differ between providers, but only a handful of scalar
//! members matter. [`TokenFieldReader`] scans a JSON object directly from a
//! byte source and yields every string or number member as a
//! [`TokenField`], without building a document in memory.
//!
//! Grammar accepted:
//! - the top-level value must be an object
//! - strings and numbers at any depth are yielded under the innermost member
//!   name; array elements use the name of the array that holds them
//! - `true`, `false` and `null` are validated but not yielded
//! - only whitespace may follow the closing brace
//!
//! Malformed or truncated input is reported as [`AuthError::MalformedJson`],
//! so a clean end of object is always distinguishable from a corrupt body.

use super::types::{AuthError, AuthResult};
use std::io::{self, BufRead};

/// Maximum container nesting before the input is rejected
const MAX_DEPTH: usize = 64;

/// One scalar member of a token response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Object just opened: member name or `}`
    FirstKey,
    /// After `,` in an object
    Key,
    Colon,
    /// Array just opened: element or `]`
    FirstElement,
    Value,
    /// After a value: `,` or the matching close
    CommaOrClose,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    expect: Expect,
    /// Current member name (objects) or inherited name (arrays)
    name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    NotStarted,
    Reading,
    Finished,
    Failed,
}

/// Forward-only scanner over a single JSON object
///
/// One reader consumes one source, once. Not thread-safe.
pub struct TokenFieldReader<R> {
    source: R,
    offset: usize,
    stack: Vec<Frame>,
    state: ReaderState,
}

impl<'a> TokenFieldReader<&'a [u8]> {
    /// Read from an in-memory body
    pub fn from_slice(body: &'a [u8]) -> Self {
        Self::new(body)
    }
}

impl<R: BufRead> TokenFieldReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            offset: 0,
            stack: Vec::new(),
            state: ReaderState::NotStarted,
        }
    }

    /// Number of bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Advance to the next scalar member.
    ///
    /// Returns `Ok(None)` once the top-level object has closed cleanly.
    /// After an error the reader stays failed and keeps returning an error.
    pub fn read_field(&mut self) -> AuthResult<Option<TokenField>> {
        match self.state {
            ReaderState::Finished => return Ok(None),
            ReaderState::Failed => return Err(self.error("reader already failed")),
            ReaderState::NotStarted | ReaderState::Reading => {}
        }

        let result = self.advance();
        if result.is_err() {
            self.state = ReaderState::Failed;
        }
        result
    }

    fn advance(&mut self) -> AuthResult<Option<TokenField>> {
        if self.state == ReaderState::NotStarted {
            self.skip_whitespace()?;
            match self.peek()? {
                Some(b'{') => {
                    self.bump();
                    self.open(Container::Object, None)?;
                    self.state = ReaderState::Reading;
                }
                Some(_) => return Err(self.error("token response must be a JSON object")),
                None => return Err(self.error("empty token response")),
            }
        }

        loop {
            let Some(frame) = self.stack.last() else {
                self.skip_whitespace()?;
                if self.peek()?.is_some() {
                    return Err(self.error("unexpected data after closing brace"));
                }
                self.state = ReaderState::Finished;
                return Ok(None);
            };
            let (container, expect) = (frame.container, frame.expect);

            self.skip_whitespace()?;
            let Some(byte) = self.peek()? else {
                return Err(self.error("unexpected end of input"));
            };

            match expect {
                Expect::FirstKey if byte == b'}' => {
                    self.bump();
                    self.stack.pop();
                }
                Expect::FirstKey | Expect::Key => {
                    if byte != b'"' {
                        return Err(self.error("expected member name"));
                    }
                    let key = self.read_string()?;
                    let frame = self.top_mut()?;
                    frame.name = Some(key);
                    frame.expect = Expect::Colon;
                }
                Expect::Colon => {
                    if byte != b':' {
                        return Err(self.error("expected ':' after member name"));
                    }
                    self.bump();
                    self.top_mut()?.expect = Expect::Value;
                }
                Expect::FirstElement if byte == b']' => {
                    self.bump();
                    self.stack.pop();
                }
                Expect::FirstElement | Expect::Value => {
                    let frame = self.top_mut()?;
                    frame.expect = Expect::CommaOrClose;
                    let name = frame.name.clone();

                    match byte {
                        b'{' => {
                            self.bump();
                            self.open(Container::Object, None)?;
                        }
                        b'[' => {
                            self.bump();
                            self.open(Container::Array, name)?;
                        }
                        b'"' => {
                            let value = self.read_string()?;
                            if let Some(name) = name {
                                return Ok(Some(TokenField { name, value }));
                            }
                        }
                        b'-' | b'0'..=b'9' => {
                            let value = self.read_number()?;
                            if let Some(name) = name {
                                return Ok(Some(TokenField { name, value }));
                            }
                        }
                        b't' => self.expect_literal(b"true")?,
                        b'f' => self.expect_literal(b"false")?,
                        b'n' => self.expect_literal(b"null")?,
                        _ => return Err(self.error("unexpected character")),
                    }
                }
                Expect::CommaOrClose => match (byte, container) {
                    (b',', Container::Object) => {
                        self.bump();
                        self.top_mut()?.expect = Expect::Key;
                    }
                    (b',', Container::Array) => {
                        self.bump();
                        self.top_mut()?.expect = Expect::Value;
                    }
                    (b'}', Container::Object) | (b']', Container::Array) => {
                        self.bump();
                        self.stack.pop();
                    }
                    _ => return Err(self.error("expected ',' or closing bracket")),
                },
            }
        }
    }

    fn open(&mut self, container: Container, name: Option<String>) -> AuthResult<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let expect = match container {
            Container::Object => Expect::FirstKey,
            Container::Array => Expect::FirstElement,
        };
        self.stack.push(Frame {
            container,
            expect,
            name,
        });
        Ok(())
    }

    fn top_mut(&mut self) -> AuthResult<&mut Frame> {
        let offset = self.offset;
        self.stack.last_mut().ok_or(AuthError::MalformedJson {
            offset,
            reason: "no open container".to_string(),
        })
    }

    /// Reads a string starting at the opening quote
    fn read_string(&mut self) -> AuthResult<String> {
        self.bump();
        let mut buf = Vec::new();
        loop {
            let Some(byte) = self.next_byte()? else {
                return Err(self.error("unterminated string"));
            };
            match byte {
                b'"' => break,
                b'\\' => self.read_escape(&mut buf)?,
                0x00..=0x1f => return Err(self.error("control character in string")),
                _ => buf.push(byte),
            }
        }
        String::from_utf8(buf).map_err(|_| self.error("invalid UTF-8 in string"))
    }

    fn read_escape(&mut self, buf: &mut Vec<u8>) -> AuthResult<()> {
        let Some(byte) = self.next_byte()? else {
            return Err(self.error("unterminated escape sequence"));
        };
        let unescaped = match byte {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let ch = self.read_unicode_escape()?;
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                return Ok(());
            }
            _ => return Err(self.error("invalid escape sequence")),
        };
        buf.push(unescaped);
        Ok(())
    }

    /// Decodes the digits after `\u`, joining surrogate pairs
    fn read_unicode_escape(&mut self) -> AuthResult<char> {
        let first = self.read_hex4()?;
        let code = match first {
            0xD800..=0xDBFF => {
                if self.next_byte()? != Some(b'\\') || self.next_byte()? != Some(b'u') {
                    return Err(self.error("unpaired surrogate in string"));
                }
                let second = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.error("invalid low surrogate in string"));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.error("unpaired surrogate in string")),
            _ => first,
        };
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn read_hex4(&mut self) -> AuthResult<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .next_byte()?
                .and_then(|b| (b as char).to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Reads a number literal, returning its text unchanged
    fn read_number(&mut self) -> AuthResult<String> {
        let mut text = String::new();
        if self.peek()? == Some(b'-') {
            self.bump();
            text.push('-');
        }

        match self.peek()? {
            Some(b'0') => {
                self.bump();
                text.push('0');
            }
            Some(b'1'..=b'9') => {
                self.take_digits(&mut text)?;
            }
            _ => return Err(self.error("invalid number")),
        }

        if self.peek()? == Some(b'.') {
            self.bump();
            text.push('.');
            if !self.take_digits(&mut text)? {
                return Err(self.error("expected digit after decimal point"));
            }
        }

        if let Some(marker @ (b'e' | b'E')) = self.peek()? {
            self.bump();
            text.push(marker as char);
            if let Some(sign @ (b'+' | b'-')) = self.peek()? {
                self.bump();
                text.push(sign as char);
            }
            if !self.take_digits(&mut text)? {
                return Err(self.error("expected digit in exponent"));
            }
        }

        Ok(text)
    }

    fn take_digits(&mut self, text: &mut String) -> AuthResult<bool> {
        let mut any = false;
        while let Some(digit @ b'0'..=b'9') = self.peek()? {
            self.bump();
            text.push(digit as char);
            any = true;
        }
        Ok(any)
    }

    fn expect_literal(&mut self, literal: &[u8]) -> AuthResult<()> {
        for expected in literal {
            if self.next_byte()? != Some(*expected) {
                return Err(self.error("invalid literal"));
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> AuthResult<()> {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek()? {
            self.bump();
        }
        Ok(())
    }

    fn peek(&mut self) -> AuthResult<Option<u8>> {
        loop {
            match self.source.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(AuthError::Io(e)),
            }
        }
    }

    /// Consumes the byte returned by the last successful `peek`
    fn bump(&mut self) {
        self.source.consume(1);
        self.offset += 1;
    }

    fn next_byte(&mut self) -> AuthResult<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.bump();
        }
        Ok(byte)
    }

    fn error(&self, reason: &str) -> AuthError {
        AuthError::MalformedJson {
            offset: self.offset,
            reason: reason.to_string(),
        }
    }
}

impl<R: BufRead> Iterator for TokenFieldReader<R> {
    type Item = AuthResult<TokenField>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ReaderState::Failed {
            return None;
        }
        self.read_field().transpose()
    }
}
