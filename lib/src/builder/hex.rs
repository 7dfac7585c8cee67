use crate::ast::{HexAlternation, HexJump, HexString, HexUnit};
use crate::builder::BuilderError;
use crate::literal::Literal;
use crate::tokens::{Detached, Remap, Token, TokenId, TokenKind, TokenStream};

/// Builds hex strings like `{ 4D 5A [2-4] ( 00 | 01 ) }`.
///
/// ```
/// use yaramod::builder::YaraHexStringBuilder;
///
/// let hex = YaraHexStringBuilder::new()
///     .bytes(&[0x4d, 0x5a])
///     .jump_range(2, 4)
///     .alt(vec![
///         YaraHexStringBuilder::new().byte(0x00),
///         YaraHexStringBuilder::new().wildcard(),
///     ])
///     .get()
///     .unwrap();
///
/// assert_eq!(hex.node().text(hex.tokens()), "{ 4D 5A [2-4] ( 00 | ?? ) }");
/// ```
#[derive(Debug, Default)]
pub struct YaraHexStringBuilder {
    tokens: TokenStream,
    units: Vec<HexUnit>,
    error: Option<BuilderError>,
}

impl YaraHexStringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: TokenKind, literal: Literal) -> TokenId {
        self.tokens.push_back(Token::synthetic(kind, literal))
    }

    fn push_byte(mut self, text: String) -> Self {
        let token =
            self.push(TokenKind::HexByte, Literal::escaped_string(text));
        self.units.push(HexUnit::Byte(token));
        self
    }

    pub fn byte(self, value: u8) -> Self {
        self.push_byte(format!("{:02X}", value))
    }

    pub fn bytes(self, values: &[u8]) -> Self {
        values.iter().fold(self, |builder, value| builder.byte(*value))
    }

    /// `??`
    pub fn wildcard(self) -> Self {
        self.push_byte("??".to_string())
    }

    /// A byte whose high nibble is a wildcard, like `?A`.
    pub fn wildcard_high(self, low: u8) -> Self {
        self.push_byte(format!("?{:X}", low & 0x0f))
    }

    /// A byte whose low nibble is a wildcard, like `A?`.
    pub fn wildcard_low(self, high: u8) -> Self {
        self.push_byte(format!("{:X}?", high & 0x0f))
    }

    /// Any byte except `value`, like `~00`.
    pub fn not_byte(self, value: u8) -> Self {
        self.push_byte(format!("~{:02X}", value))
    }

    fn push_jump(
        mut self,
        low: Option<u64>,
        dash: bool,
        high: Option<u64>,
    ) -> Self {
        if let (Some(low), Some(high)) = (low, high) {
            if low > high {
                self.error
                    .get_or_insert(BuilderError::InvalidHexJump { low, high });
                return self;
            }
        }
        let lsqb =
            self.push(TokenKind::HexJumpLeft, Literal::escaped_string("["));
        let low =
            low.map(|v| self.push(TokenKind::IntLiteral, Literal::uint(v)));
        let dash = dash
            .then(|| self.push(TokenKind::Dash, Literal::escaped_string("-")));
        let high =
            high.map(|v| self.push(TokenKind::IntLiteral, Literal::uint(v)));
        let rsqb =
            self.push(TokenKind::HexJumpRight, Literal::escaped_string("]"));
        self.units.push(HexUnit::Jump(HexJump {
            lsqb,
            low,
            dash,
            high,
            rsqb,
        }));
        self
    }

    /// `[n]`
    pub fn jump(self, n: u64) -> Self {
        self.push_jump(Some(n), false, None)
    }

    /// `[low-high]`
    pub fn jump_range(self, low: u64, high: u64) -> Self {
        self.push_jump(Some(low), true, Some(high))
    }

    /// `[low-]`
    pub fn jump_from(self, low: u64) -> Self {
        self.push_jump(Some(low), true, None)
    }

    /// `[-]`
    pub fn jump_any(self) -> Self {
        self.push_jump(None, true, None)
    }

    /// `( <alternative> | <alternative> ... )`
    pub fn alt(mut self, alternatives: Vec<YaraHexStringBuilder>) -> Self {
        if alternatives.len() < 2
            || alternatives.iter().any(|a| a.units.is_empty())
        {
            self.error.get_or_insert(BuilderError::InvalidHexAlternation);
            return self;
        }
        let lparen =
            self.push(TokenKind::HexAltLeft, Literal::escaped_string("("));
        let mut units = Vec::with_capacity(alternatives.len());
        for (i, alternative) in alternatives.into_iter().enumerate() {
            if i > 0 {
                self.push(TokenKind::HexAltOr, Literal::escaped_string("|"));
            }
            match self.append(alternative) {
                Ok(alternative) => units.push(alternative),
                Err(err) => {
                    self.error.get_or_insert(err);
                    return self;
                }
            }
        }
        let rparen =
            self.push(TokenKind::HexAltRight, Literal::escaped_string(")"));
        self.units.push(HexUnit::Alternation(HexAlternation {
            lparen,
            alternatives: units,
            rparen,
        }));
        self
    }

    /// Moves the tokens of another builder to the end of this one and
    /// returns its units.
    fn append(
        &mut self,
        other: YaraHexStringBuilder,
    ) -> Result<Vec<HexUnit>, BuilderError> {
        let YaraHexStringBuilder { mut tokens, mut units, error } = other;
        if let Some(err) = error {
            return Err(err);
        }
        let map = self.tokens.move_all_before(None, &mut tokens)?;
        units.remap(&map);
        Ok(units)
    }

    /// Returns the hex string, or the first error found while building it.
    pub fn get(self) -> Result<Detached<HexString>, BuilderError> {
        if self.units.is_empty() && self.error.is_none() {
            return Err(BuilderError::EmptyHexString);
        }
        let mut result = YaraHexStringBuilder::new();
        let lbrace =
            result.push(TokenKind::HexStart, Literal::escaped_string("{"));
        let units = result.append(self)?;
        let rbrace =
            result.push(TokenKind::HexEnd, Literal::escaped_string("}"));
        Ok(Detached::new(result.tokens, HexString { lbrace, units, rbrace }))
    }
}
