use std::fmt::{Display, Formatter};
use std::rc::Rc;

use bstr::{BString, ByteVec};

use crate::symbols::Symbol;
use crate::tokens::TokenId;

/// The value held by a [`Literal`].
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    String(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Reference to a symbol, used by identifiers that were resolved during
    /// parsing (module names, structure fields, loop variables).
    Symbol(Rc<Symbol>),
    /// The literal is an alias of the literal owned by another token in the
    /// same stream. Reads go through the aliased token, which is how renaming
    /// a rule or a string propagates to every place where it is referenced.
    Alias(TokenId),
}

/// A scalar value owned by a token.
///
/// Besides the value itself, a literal may keep the exact text it had in
/// the source code (e.g. `0x10` or `1KB` for integers), so that it is
/// rendered back unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    value: LiteralValue,
    formatted: Option<String>,
    escaped: bool,
}

impl Literal {
    /// Creates a string literal from its plain (unescaped) value.
    pub fn string<S: Into<String>>(s: S) -> Self {
        Self {
            value: LiteralValue::String(s.into()),
            formatted: None,
            escaped: false,
        }
    }

    /// Creates a string literal whose value is already written the way it
    /// appears in source code, escape sequences included.
    pub fn escaped_string<S: Into<String>>(s: S) -> Self {
        Self {
            value: LiteralValue::String(s.into()),
            formatted: None,
            escaped: true,
        }
    }

    pub fn bool(b: bool) -> Self {
        Self { value: LiteralValue::Bool(b), formatted: None, escaped: false }
    }

    pub fn int(i: i64) -> Self {
        Self { value: LiteralValue::Int(i), formatted: None, escaped: false }
    }

    pub fn uint(u: u64) -> Self {
        Self { value: LiteralValue::UInt(u), formatted: None, escaped: false }
    }

    pub fn float(f: f64) -> Self {
        Self { value: LiteralValue::Float(f), formatted: None, escaped: false }
    }

    pub fn symbol(symbol: Rc<Symbol>) -> Self {
        Self {
            value: LiteralValue::Symbol(symbol),
            formatted: None,
            escaped: false,
        }
    }

    pub fn alias(target: TokenId) -> Self {
        Self {
            value: LiteralValue::Alias(target),
            formatted: None,
            escaped: false,
        }
    }

    /// Attaches the text that must be used when rendering this literal.
    pub fn with_formatted<S: Into<String>>(mut self, formatted: S) -> Self {
        self.formatted = Some(formatted.into());
        self
    }

    #[inline]
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    #[inline]
    pub fn formatted(&self) -> Option<&str> {
        self.formatted.as_deref()
    }

    /// True if the string value is stored as written in the source, with
    /// its escape sequences still in place.
    #[inline]
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    /// Replaces the value. The formatted text is dropped, it belonged to the
    /// old value.
    pub fn set_value(&mut self, value: LiteralValue) {
        self.value = value;
        self.formatted = None;
        self.escaped = false;
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.value, LiteralValue::Alias(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            LiteralValue::Int(i) => Some(i),
            LiteralValue::UInt(u) => i64::try_from(u).ok(),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Rc<Symbol>> {
        match &self.value {
            LiteralValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of this literal as it must appear in source code,
    /// without the surrounding quotes in the case of strings.
    ///
    /// Aliases have no text on their own, they are resolved by the stream
    /// that owns the aliased token, this returns an empty string for them.
    pub fn text(&self) -> String {
        if let Some(formatted) = &self.formatted {
            return formatted.clone();
        }
        match &self.value {
            LiteralValue::String(s) if self.escaped => s.clone(),
            LiteralValue::String(s) => escape(s),
            LiteralValue::Bool(b) => b.to_string(),
            LiteralValue::Int(i) => i.to_string(),
            LiteralValue::UInt(u) => u.to_string(),
            LiteralValue::Float(f) => format!("{:?}", f),
            LiteralValue::Symbol(s) => s.name().to_string(),
            LiteralValue::Alias(_) => String::new(),
        }
    }

    /// Returns the string value with every escape sequence decoded. The
    /// result may contain bytes that are not valid UTF-8.
    pub fn pure_text(&self) -> BString {
        match &self.value {
            LiteralValue::String(s) if self.escaped => {
                unescape(s).unwrap_or_else(|_| BString::from(s.as_str()))
            }
            LiteralValue::String(s) => BString::from(s.as_str()),
            _ => BString::from(self.text()),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Escapes a plain string so it can be written between double quotes.
pub fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str(r"\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str(r"\n"),
            '\t' => result.push_str(r"\t"),
            '\r' => result.push_str(r"\r"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                result.push_str(&format!("\\x{:02x}", c as u32))
            }
            c => result.push(c),
        }
    }
    result
}

/// Decodes the escape sequences in a string written as in source code.
///
/// On failure returns the byte offset of the invalid escape sequence.
pub fn unescape(s: &str) -> Result<BString, usize> {
    let bytes = s.as_bytes();
    let mut result = BString::from(Vec::with_capacity(bytes.len()));
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            result.push_byte(bytes[i]);
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'\\') => result.push_byte(b'\\'),
            Some(b'"') => result.push_byte(b'"'),
            Some(b'n') => result.push_byte(b'\n'),
            Some(b't') => result.push_byte(b'\t'),
            Some(b'r') => result.push_byte(b'\r'),
            Some(b'x') => {
                let hex = bytes
                    .get(i + 2..i + 4)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or(i)?;
                result.push_byte(hex);
                i += 4;
                continue;
            }
            _ => return Err(i),
        }
        i += 2;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{escape, unescape, Literal};

    #[test]
    fn integers_keep_their_format() {
        let lit = Literal::int(16).with_formatted("0x10");
        assert_eq!(lit.text(), "0x10");
        assert_eq!(lit.as_int(), Some(16));

        let mut lit = Literal::int(1024).with_formatted("1KB");
        lit.set_value(super::LiteralValue::Int(2048));
        assert_eq!(lit.text(), "2048");
    }

    #[test]
    fn strings() {
        let lit = Literal::string("a\"b\n");
        assert_eq!(lit.text(), r#"a\"b\n"#);
        assert_eq!(lit.pure_text(), "a\"b\n");

        let lit = Literal::escaped_string(r"\x41\x00\\");
        assert_eq!(lit.text(), r"\x41\x00\\");
        assert_eq!(lit.pure_text().as_slice(), b"A\x00\\");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("tab\there"), r"tab\there");
        assert_eq!(escape("\x01"), r"\x01");
        assert_eq!(unescape(r"\xff").unwrap().as_slice(), b"\xff");
        assert_eq!(unescape(r"abc\q"), Err(3));
        assert_eq!(unescape(r"\x4"), Err(0));
    }

    #[test]
    fn floats_and_bools() {
        assert_eq!(Literal::float(1.0).text(), "1.0");
        assert_eq!(Literal::float(1.5).with_formatted("1.50").text(), "1.50");
        assert_eq!(Literal::bool(false).text(), "false");
    }
}
