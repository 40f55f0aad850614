//! Restricted data-literal parser.
//!
//! Directive arguments are written as Python-style literals:
//! `{'path': 'data.csv', 'span': [2, 3], 'strip': True}`. Only static data
//! is accepted: strings, numbers, `True`/`False`/`None`, lists, tuples and
//! mappings. Names, calls and operators are rejected before anything runs.

use serde_json::{Map, Number, Value};

/// Maximum nesting of lists, tuples and mappings.
const MAX_DEPTH: usize = 64;

/// Error raised when an argument literal is not a static data literal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ArgsError {
    /// Byte offset into the literal where parsing failed.
    pub offset: usize,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ArgsError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Parse a data literal into a generic value.
///
/// Tuples are read as lists and adjacent string literals are concatenated.
///
/// # Example
///
/// ```
/// use markdata_core::directive::parse_literal;
/// use serde_json::json;
///
/// let value = parse_literal("{'span': (2, 3), 'lang': None}").unwrap();
/// assert_eq!(value, json!({"span": [2, 3], "lang": null}));
///
/// assert!(parse_literal("{'path': open('x')}").is_err());
/// ```
pub fn parse_literal(input: &str) -> Result<Value, ArgsError> {
    let mut parser = LiteralParser { src: input, pos: 0 };
    parser.skip_trivia();
    let value = parser.parse_value(0)?;
    parser.skip_trivia();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected `{c}` after literal")));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl LiteralParser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ArgsError {
        ArgsError::new(self.pos, message)
    }

    /// Skip whitespace (including newlines) and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ArgsError> {
        if depth > MAX_DEPTH {
            return Err(self.error("literal is nested too deeply"));
        }
        match self.peek() {
            None => Err(self.error("unexpected end of literal")),
            Some('{') => self.parse_mapping(depth),
            Some('[') => self.parse_list(depth),
            Some('(') => self.parse_tuple(depth),
            Some('\'' | '"') => self.parse_strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | '+') => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                if self.string_prefix().is_some() {
                    self.parse_strings()
                } else {
                    self.parse_name()
                }
            }
            Some(c) => Err(self.error(format!("unexpected `{c}`"))),
        }
    }

    fn parse_mapping(&mut self, depth: usize) -> Result<Value, ArgsError> {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.eat('}') {
                break;
            }
            let key_offset = self.pos;
            let Value::String(key) = self.parse_value(depth + 1)? else {
                return Err(ArgsError::new(key_offset, "mapping keys must be strings"));
            };
            self.skip_trivia();
            if !self.eat(':') {
                return Err(self.error("expected `:` after mapping key"));
            }
            self.skip_trivia();
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return Err(self.error("expected `,` or `}` in mapping"));
        }
        Ok(Value::Object(map))
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value, ArgsError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(']') {
                break;
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                break;
            }
            return Err(self.error("expected `,` or `]` in list"));
        }
        Ok(Value::Array(items))
    }

    /// Parse `(a, b)` as a list; `(a)` is just a parenthesized value.
    fn parse_tuple(&mut self, depth: usize) -> Result<Value, ArgsError> {
        self.bump();
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_trivia();
            if self.eat(')') {
                break;
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_trivia();
            if self.eat(',') {
                saw_comma = true;
                continue;
            }
            if self.eat(')') {
                break;
            }
            return Err(self.error("expected `,` or `)` in tuple"));
        }
        if !saw_comma
            && items.len() == 1
            && let Some(value) = items.pop()
        {
            return Ok(value);
        }
        Ok(Value::Array(items))
    }

    fn parse_name(&mut self) -> Result<Value, ArgsError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let src = self.src;
        let name = &src[start..self.pos];
        match name {
            "True" => return Ok(Value::Bool(true)),
            "False" => return Ok(Value::Bool(false)),
            "None" => return Ok(Value::Null),
            _ => {}
        }
        if matches!(self.peek(), Some('\'' | '"')) {
            return Err(ArgsError::new(
                start,
                format!("unsupported string prefix `{name}`"),
            ));
        }
        self.skip_trivia();
        if self.peek() == Some('(') {
            Err(ArgsError::new(
                start,
                format!("function calls are not allowed: `{name}(...)`"),
            ))
        } else {
            Err(ArgsError::new(
                start,
                format!("names are not allowed: `{name}`"),
            ))
        }
    }

    /// Length and rawness of a string prefix (`r`, `u`) at the cursor.
    fn string_prefix(&self) -> Option<(usize, bool)> {
        match (self.peek(), self.peek_nth(1)) {
            (Some('\'' | '"'), _) => Some((0, false)),
            (Some('r' | 'R'), Some('\'' | '"')) => Some((1, true)),
            (Some('u' | 'U'), Some('\'' | '"')) => Some((1, false)),
            _ => None,
        }
    }

    fn parse_strings(&mut self) -> Result<Value, ArgsError> {
        let mut out = String::new();
        while let Some((prefix_len, raw)) = self.string_prefix() {
            self.pos += prefix_len;
            self.parse_string(raw, &mut out)?;
            self.skip_trivia();
        }
        Ok(Value::String(out))
    }

    fn parse_string(&mut self, raw: bool, out: &mut String) -> Result<(), ArgsError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.error("expected string"));
        };
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.pos += 2 * quote.len_utf8();
        }

        loop {
            let Some(c) = self.bump() else {
                return Err(ArgsError::new(start, "unterminated string"));
            };
            match c {
                c if c == quote => {
                    if !triple {
                        return Ok(());
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.pos += 2 * quote.len_utf8();
                        return Ok(());
                    }
                    out.push(c);
                }
                '\n' if !triple => {
                    return Err(ArgsError::new(start, "unterminated string"));
                }
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.parse_escape(out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), ArgsError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match c {
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.char_from_code(code)?);
            }
            'x' => out.push(self.parse_hex_escape(2)?),
            'u' => out.push(self.parse_hex_escape(4)?),
            'U' => out.push(self.parse_hex_escape(8)?),
            'N' => return Err(self.error("named unicode escapes are not supported")),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Result<char, ArgsError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                return Err(self.error(format!("expected {digits} hex digits in escape")));
            };
            code = code * 16 + d;
            self.bump();
        }
        self.char_from_code(code)
    }

    fn char_from_code(&self, code: u32) -> Result<char, ArgsError> {
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid character code {code:#x}")))
    }

    fn parse_number(&mut self) -> Result<Value, ArgsError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_trivia();

        let rest = self.rest();
        let radix = match rest.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            self.pos += 2;
            let digits = self.take_while(|c| c.is_digit(radix) || c == '_');
            let value = i64::from_str_radix(&digits, radix)
                .map_err(|_| ArgsError::new(start, "invalid integer literal"))?;
            self.reject_number_suffix(start)?;
            return Ok(Value::from(if negative { -value } else { value }));
        }

        let mut text = self.take_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));
        }
        if matches!(self.peek(), Some('e' | 'E')) && !text.is_empty() && text != "." {
            is_float = true;
            self.bump();
            text.push('e');
            if let Some(sign @ ('-' | '+')) = self.peek() {
                self.bump();
                text.push(sign);
            }
            let exponent = self.take_while(|c| c.is_ascii_digit() || c == '_');
            if exponent.is_empty() {
                return Err(ArgsError::new(start, "invalid float exponent"));
            }
            text.push_str(&exponent);
        }
        if text.is_empty() || text == "." {
            return Err(ArgsError::new(start, "expected a number"));
        }
        self.reject_number_suffix(start)?;

        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| ArgsError::new(start, "invalid float literal"))?;
            let value = if negative { -value } else { value };
            Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| ArgsError::new(start, "float literal out of range"))
        } else {
            let signed = if negative { format!("-{text}") } else { text };
            signed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ArgsError::new(start, "integer literal out of range"))
        }
    }

    fn reject_number_suffix(&self, start: usize) -> Result<(), ArgsError> {
        match self.peek() {
            Some('j' | 'J') => Err(ArgsError::new(start, "complex numbers are not supported")),
            Some(c) if is_ident_continue(c) => {
                Err(ArgsError::new(start, "invalid number literal"))
            }
            _ => Ok(()),
        }
    }

    /// Consume characters matching `pred`, returning them without `_` separators.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|&c| pred(c)) {
            if c != '_' {
                out.push(c);
            }
            self.bump();
        }
        out
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
