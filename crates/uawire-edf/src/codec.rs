use bytes::{Buf, BytesMut};

use crate::error::{EdfError, Result};
use crate::tree::{EdfData, Value};

const PRETTY_EOL: &str = "\r\n";
const PRETTY_INDENT: &str = "  ";

/// Nesting deeper than this is rejected rather than risking unbounded
/// recursion on a hostile stream.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Escape a string value for the wire: `\` becomes `\\`, then `"` becomes `\"`.
pub fn escape(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Invert [`escape`]: `\"` becomes `"`, then `\\` becomes `\`.
///
/// Quote sequences must be unescaped before backslash sequences so a
/// literal `\"` is not processed twice. A backslash before any other
/// character passes through unchanged.
pub fn unescape(input: &str) -> String {
    input.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Encode a tree in compact wire form.
pub fn encode(tree: &EdfData) -> String {
    let mut out = String::new();
    write_element(&mut out, tree, false, 0);
    out
}

/// Encode a tree with CRLF line endings and two-space indentation per depth.
///
/// Pretty output is for diagnostics; it decodes back to the same tree.
pub fn encode_pretty(tree: &EdfData) -> String {
    let mut out = String::new();
    write_element(&mut out, tree, true, 0);
    out
}

fn write_element(out: &mut String, node: &EdfData, pretty: bool, depth: usize) {
    if pretty {
        for _ in 0..depth {
            out.push_str(PRETTY_INDENT);
        }
    }
    out.push('<');
    out.push_str(node.name());

    match node.value() {
        Value::None => {}
        Value::Str(text) => {
            out.push_str("=\"");
            out.push_str(&escape(text));
            out.push('"');
        }
        Value::Int(number) => {
            out.push('=');
            out.push_str(&number.to_string());
        }
    }

    if node.children().is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        if pretty {
            out.push_str(PRETTY_EOL);
        }
        for child in node.children() {
            write_element(out, child, pretty, depth + 1);
        }
        if pretty {
            for _ in 0..depth {
                out.push_str(PRETTY_INDENT);
            }
            out.push_str("</");
            out.push_str(node.name());
            out.push('>');
        } else {
            out.push_str("</>");
        }
    }

    if pretty {
        out.push_str(PRETTY_EOL);
    }
}

/// Decode one complete tree from the front of `src`.
///
/// Returns `Ok(None)` when the buffer does not yet hold a complete tree;
/// callers append more bytes and retry. On success the consumed bytes
/// (including leading whitespace) are removed from the buffer, leaving any
/// following tree in place.
pub fn decode_tree(src: &mut BytesMut) -> Result<Option<EdfData>> {
    let mut cursor = Cursor::new(&src[..]);
    match parse_element(&mut cursor, 0) {
        Ok(tree) => {
            let consumed = cursor.pos;
            src.advance(consumed);
            Ok(Some(tree))
        }
        Err(ParseFail::Incomplete) => Ok(None),
        Err(ParseFail::Fatal(err)) => Err(err),
    }
}

/// Parse exactly one tree from a complete string.
///
/// Trailing whitespace is permitted; any other trailing content fails.
pub fn decode_str(input: &str) -> Result<EdfData> {
    let mut cursor = Cursor::new(input.as_bytes());
    match parse_element(&mut cursor, 0) {
        Ok(tree) => {
            cursor.skip_whitespace();
            if cursor.pos < input.len() {
                return Err(EdfError::Syntax {
                    message: "trailing input after element".to_string(),
                    offset: cursor.pos,
                });
            }
            Ok(tree)
        }
        Err(ParseFail::Incomplete) => Err(EdfError::Syntax {
            message: "unexpected end of input".to_string(),
            offset: input.len(),
        }),
        Err(ParseFail::Fatal(err)) => Err(err),
    }
}

// A parse attempt over a partial buffer either fails for good or ran out
// of bytes; the streaming reader retries the latter with more input.
enum ParseFail {
    Incomplete,
    Fatal(EdfError),
}

type ParseResult<T> = std::result::Result<T, ParseFail>;

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.buf.get(self.pos + ahead).copied()
    }

    fn advance(&mut self, count: usize) {
        self.pos += count;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(byte) if byte.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8, context: &str) -> ParseResult<()> {
        match self.peek() {
            None => Err(ParseFail::Incomplete),
            Some(found) if found == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(ParseFail::Fatal(EdfError::Syntax {
                message: format!(
                    "expected '{}' {context}, found {}",
                    byte as char,
                    show_byte(found)
                ),
                offset: self.pos,
            })),
        }
    }

    /// Read a possibly empty element name: ASCII letters, digits, `_`.
    fn read_name(&mut self) -> ParseResult<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(byte) if is_name_byte(byte)) {
            self.pos += 1;
        }
        if self.peek().is_none() {
            // The name may continue in bytes not yet received.
            return Err(ParseFail::Incomplete);
        }
        Ok(self.buf[start..self.pos]
            .iter()
            .map(|&byte| byte as char)
            .collect())
    }

    fn read_integer(&mut self) -> ParseResult<i32> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(byte) if byte.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(ParseFail::Incomplete);
        }

        let digits = &self.buf[start..self.pos];
        if digits.is_empty() || digits == b"-" {
            return Err(ParseFail::Fatal(EdfError::Lexical {
                message: "invalid integer literal".to_string(),
                offset: start,
            }));
        }

        let text: String = digits.iter().map(|&byte| byte as char).collect();
        text.parse::<i32>().map_err(|_| {
            ParseFail::Fatal(EdfError::Lexical {
                message: format!("integer literal '{text}' out of range"),
                offset: start,
            })
        })
    }

    /// Read a quoted string value, returning its unescaped content.
    ///
    /// A quote preceded by an even number of backslashes ends the string;
    /// a backslash consumes the byte after it, whatever it is.
    fn read_string(&mut self) -> ParseResult<String> {
        let start = self.pos;
        self.expect(b'"', "to open string value")?;
        let content_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(ParseFail::Incomplete),
                Some(b'\\') => {
                    if self.peek_at(1).is_none() {
                        return Err(ParseFail::Incomplete);
                    }
                    self.pos += 2;
                }
                Some(b'"') => break,
                Some(_) => self.pos += 1,
            }
        }

        let raw = &self.buf[content_start..self.pos];
        self.pos += 1;
        match std::str::from_utf8(raw) {
            Ok(text) => Ok(unescape(text)),
            Err(_) => Err(ParseFail::Fatal(EdfError::Lexical {
                message: "string value is not valid UTF-8".to_string(),
                offset: start,
            })),
        }
    }
}

fn parse_element(cursor: &mut Cursor<'_>, depth: usize) -> ParseResult<EdfData> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(ParseFail::Fatal(EdfError::Syntax {
            message: format!("element nesting exceeds {MAX_NESTING_DEPTH} levels"),
            offset: cursor.pos,
        }));
    }

    cursor.skip_whitespace();
    cursor.expect(b'<', "to open element")?;
    if cursor.peek() == Some(b'/') {
        return Err(ParseFail::Fatal(EdfError::Syntax {
            message: "close tag with no matching open tag".to_string(),
            offset: cursor.pos - 1,
        }));
    }

    let name = cursor.read_name()?;
    cursor.skip_whitespace();

    let value = if cursor.peek() == Some(b'=') {
        cursor.advance(1);
        cursor.skip_whitespace();
        parse_value(cursor)?
    } else {
        Value::None
    };

    let mut node = match value {
        Value::None => EdfData::new(name),
        Value::Str(text) => EdfData::string(name, text),
        Value::Int(number) => EdfData::integer(name, number),
    };

    cursor.skip_whitespace();
    match cursor.peek() {
        None => Err(ParseFail::Incomplete),
        Some(b'/') => {
            cursor.advance(1);
            cursor.expect(b'>', "to close leaf element")?;
            Ok(node)
        }
        Some(b'>') => {
            cursor.advance(1);
            parse_children(cursor, &mut node, depth)?;
            Ok(node)
        }
        Some(found) => Err(ParseFail::Fatal(EdfError::Syntax {
            message: format!(
                "expected '>' or '/>' after element head, found {}",
                show_byte(found)
            ),
            offset: cursor.pos,
        })),
    }
}

fn parse_value(cursor: &mut Cursor<'_>) -> ParseResult<Value> {
    match cursor.peek() {
        None => Err(ParseFail::Incomplete),
        Some(b'"') => Ok(Value::Str(cursor.read_string()?)),
        Some(byte) if byte == b'-' || byte.is_ascii_digit() => {
            Ok(Value::Int(cursor.read_integer()?))
        }
        Some(found) => Err(ParseFail::Fatal(EdfError::Lexical {
            message: format!(
                "expected quoted string or integer value, found {}",
                show_byte(found)
            ),
            offset: cursor.pos,
        })),
    }
}

fn parse_children(cursor: &mut Cursor<'_>, node: &mut EdfData, depth: usize) -> ParseResult<()> {
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => return Err(ParseFail::Incomplete),
            Some(b'<') => match cursor.peek_at(1) {
                None => return Err(ParseFail::Incomplete),
                Some(b'/') => {
                    cursor.advance(2);
                    cursor.skip_whitespace();
                    // Close tag names are not validated against the open
                    // tag: `</two>` closes whatever element is open.
                    let _ = cursor.read_name()?;
                    cursor.skip_whitespace();
                    cursor.expect(b'>', "to end close tag")?;
                    return Ok(());
                }
                Some(_) => node.add_child(parse_element(cursor, depth + 1)?),
            },
            Some(found) => {
                return Err(ParseFail::Fatal(EdfError::Syntax {
                    message: format!(
                        "expected child element or close tag, found {}",
                        show_byte(found)
                    ),
                    offset: cursor.pos,
                }))
            }
        }
    }
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn show_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("0x{byte:02x}")
    }
}
