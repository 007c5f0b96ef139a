//! Python-style literal values: rendering and safe decoding.
//!
//! Search-space updates are persisted as text using the literal syntax of
//! Python tooling (`(10, 2000)`, `0.01`, `'rbf'`, `True`). Decoding
//! accepts only constant literals; nothing is ever evaluated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::LiteralError;

/// A decoded literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    Tuple(Vec<Literal>),
    List(Vec<Literal>),
}

impl Literal {
    /// Decode a complete literal; anything but whitespace after it is an error.
    pub fn parse(input: &str) -> Result<Self, LiteralError> {
        let (value, rest) = Self::parse_prefix(input)?;
        let rest = rest.trim();
        if !rest.is_empty() {
            return Err(LiteralError::TrailingInput {
                rest: rest.to_string(),
            });
        }
        Ok(value)
    }

    /// Decode one literal from the front of `input` (leading whitespace is
    /// skipped) and return it together with the unconsumed remainder.
    pub fn parse_prefix(input: &str) -> Result<(Self, &str), LiteralError> {
        let mut parser = LiteralParser::new(input);
        parser.skip_whitespace();
        let value = parser.parse_value()?;
        Ok((value, &input[parser.pos..]))
    }

    /// Numeric value as `f64`. Booleans are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integral value; floats qualify only when they have no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Tuple(_) | Self::List(_))
    }

    /// Name of the literal's type, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
            Self::None => "NoneType",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write_float(f, *v),
            Self::Str(s) => write_str_repr(f, s),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::None => f.write_str("None"),
            Self::Tuple(items) => write_sequence(f, SequenceKind::Tuple, items),
            Self::List(items) => write_sequence(f, SequenceKind::List, items),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

// ---------------------------------------------------------------------------
// Value ranges
// ---------------------------------------------------------------------------

/// Which bracket style a sequence literal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceKind {
    Tuple,
    List,
}

/// The new domain of a hyperparameter: `(lower, upper)` for numerical
/// hyperparameters, or the set of choices for categorical ones.
///
/// Always a sequence; scalars are rejected by `TryFrom<Literal>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    kind: SequenceKind,
    items: Vec<Literal>,
}

impl ValueRange {
    pub fn tuple(items: Vec<Literal>) -> Self {
        Self {
            kind: SequenceKind::Tuple,
            items,
        }
    }

    pub fn list(items: Vec<Literal>) -> Self {
        Self {
            kind: SequenceKind::List,
            items,
        }
    }

    /// A `(lower, upper)` tuple.
    pub fn numeric(lower: impl Into<Literal>, upper: impl Into<Literal>) -> Self {
        Self::tuple(vec![lower.into(), upper.into()])
    }

    /// A tuple of categorical choices.
    pub fn choices<I, T>(choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self::tuple(choices.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn items(&self) -> &[Literal] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(lower, upper)` when the range has exactly two entries.
    pub fn bounds(&self) -> Option<(&Literal, &Literal)> {
        match self.items.as_slice() {
            [lower, upper] => Some((lower, upper)),
            _ => None,
        }
    }

    pub fn contains(&self, value: &Literal) -> bool {
        self.items.contains(value)
    }

    pub fn to_literal(&self) -> Literal {
        match self.kind {
            SequenceKind::Tuple => Literal::Tuple(self.items.clone()),
            SequenceKind::List => Literal::List(self.items.clone()),
        }
    }
}

impl TryFrom<Literal> for ValueRange {
    /// The rejected scalar is handed back unchanged.
    type Error = Literal;

    fn try_from(value: Literal) -> Result<Self, Self::Error> {
        match value {
            Literal::Tuple(items) => Ok(Self::tuple(items)),
            Literal::List(items) => Ok(Self::list(items)),
            other => Err(other),
        }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, self.kind, &self.items)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn write_sequence(f: &mut fmt::Formatter<'_>, kind: SequenceKind, items: &[Literal]) -> fmt::Result {
    let (open, close) = match kind {
        SequenceKind::Tuple => ('(', ')'),
        SequenceKind::List => ('[', ']'),
    };
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    // A one-element tuple needs its trailing comma to stay a tuple.
    if kind == SequenceKind::Tuple && items.len() == 1 {
        f.write_str(",")?;
    }
    write!(f, "{close}")
}

/// Shortest round-trip digits, switching to exponent notation outside
/// `[1e-4, 1e16)` with a signed two-digit exponent (`3.0517578125e-05`).
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        return f.write_str("nan");
    }
    if v.is_infinite() {
        return f.write_str(if v > 0.0 { "inf" } else { "-inf" });
    }

    let scientific = format!("{v:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return write!(f, "{v}"),
    };

    if (-4..16).contains(&exponent) {
        let plain = format!("{v}");
        if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exponent.abs())
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c if (c as u32) < 0x20 || c as u32 == 0x7f => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Deepest tuple/list nesting the decoder accepts.
pub const MAX_NESTING_DEPTH: usize = 100;

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_value(&mut self) -> Result<Literal, LiteralError> {
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd {
                expected: "a literal".to_string(),
            }),
            Some('(') => self.parse_parenthesised(),
            Some('[') => self.parse_list(),
            Some(quote @ ('\'' | '"')) => self.parse_string(quote).map(Literal::Str),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(found) => Err(LiteralError::UnexpectedChar {
                found,
                offset: self.pos,
            }),
        }
    }

    /// Comma-separated items up to `close`; returns the items and whether a
    /// comma was seen (which distinguishes `(x,)` from `(x)`).
    fn parse_items(&mut self, close: char) -> Result<(Vec<Literal>, bool), LiteralError> {
        if self.depth == MAX_NESTING_DEPTH {
            // the opening bracket was already consumed
            return Err(LiteralError::TooDeep {
                max: MAX_NESTING_DEPTH,
                offset: self.pos - 1,
            });
        }
        self.depth += 1;
        let items = self.parse_item_list(close);
        self.depth -= 1;
        items
    }

    fn parse_item_list(&mut self, close: char) -> Result<(Vec<Literal>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut saw_comma = false;

        self.skip_whitespace();
        if self.peek() == Some(close) {
            self.bump();
            return Ok((items, saw_comma));
        }

        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {
                    saw_comma = true;
                    self.skip_whitespace();
                    if self.peek() == Some(close) {
                        self.bump();
                        break;
                    }
                }
                Some(c) if c == close => break,
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - found.len_utf8(),
                    })
                }
                None => {
                    return Err(LiteralError::UnexpectedEnd {
                        expected: format!("',' or '{close}'"),
                    })
                }
            }
        }

        Ok((items, saw_comma))
    }

    fn parse_parenthesised(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        let (mut items, saw_comma) = self.parse_items(')')?;
        if items.len() == 1 && !saw_comma {
            // `(x)` is just a parenthesised `x`
            return Ok(items.remove(0));
        }
        Ok(Literal::Tuple(items))
    }

    fn parse_list(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        let (items, _) = self.parse_items(']')?;
        Ok(Literal::List(items))
    }

    fn parse_number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }

        let mut previous = None;
        while let Some(c) = self.peek() {
            let is_exponent_sign = matches!(c, '+' | '-') && matches!(previous, Some('e' | 'E'));
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') || is_exponent_sign {
                previous = self.bump();
            } else {
                break;
            }
        }

        let text = &self.src[start..self.pos];
        let digits: String = text.chars().filter(|c| *c != '_').collect();
        let malformed = || LiteralError::MalformedNumber {
            text: text.to_string(),
        };

        if digits.contains(['.', 'e', 'E']) {
            digits.parse::<f64>().map(Literal::Float).map_err(|_| malformed())
        } else {
            digits.parse::<i64>().map(Literal::Int).map_err(|_| malformed())
        }
    }

    fn parse_name(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            other => Err(LiteralError::Unsupported {
                text: other.to_string(),
            }),
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            let c = self
                .bump()
                .ok_or(LiteralError::UnterminatedString { offset: start })?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let escape_offset = self.pos - 1;
            let escaped = self
                .bump()
                .ok_or(LiteralError::UnterminatedString { offset: start })?;
            match escaped {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                'a' => out.push('\x07'),
                'b' => out.push('\x08'),
                'f' => out.push('\x0c'),
                'v' => out.push('\x0b'),
                '\\' | '\'' | '"' => out.push(escaped),
                '\n' => {}
                'x' => out.push(self.parse_hex_escape(escaped, 2, escape_offset)?),
                'u' => out.push(self.parse_hex_escape(escaped, 4, escape_offset)?),
                'U' => out.push(self.parse_hex_escape(escaped, 8, escape_offset)?),
                // unknown escapes keep their backslash
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn parse_hex_escape(&mut self, marker: char, width: usize, offset: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        for _ in 0..width {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump();
                }
                _ => break,
            }
        }
        let hex = &self.src[start..self.pos];
        let invalid = || LiteralError::InvalidEscape {
            sequence: format!("{marker}{hex}"),
            offset,
        };
        if hex.len() != width {
            return Err(invalid());
        }
        u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(invalid)
    }
}
