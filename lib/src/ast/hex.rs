use crate::tokens::{Remap, TokenId, TokenMap, TokenStream};

/// A hex string, like `{ 4D 5A [2-4] ( 00 | 01 ) }`.
#[derive(Debug, Clone, PartialEq)]
pub struct HexString {
    pub lbrace: TokenId,
    pub units: Vec<HexUnit>,
    pub rbrace: TokenId,
}

/// One of the elements a hex string is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum HexUnit {
    /// A byte, possibly with wildcard nibbles or negated (e.g. `4D`, `?A`,
    /// `~00`). The token text is the byte as written.
    Byte(TokenId),
    Jump(HexJump),
    Alternation(HexAlternation),
}

/// A jump like `[2]`, `[2-4]`, `[2-]` or `[-]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HexJump {
    pub lsqb: TokenId,
    pub low: Option<TokenId>,
    pub dash: Option<TokenId>,
    pub high: Option<TokenId>,
    pub rsqb: TokenId,
}

/// Alternatives like `( 00 | 01 02 )`.
#[derive(Debug, Clone, PartialEq)]
pub struct HexAlternation {
    pub lparen: TokenId,
    pub alternatives: Vec<Vec<HexUnit>>,
    pub rparen: TokenId,
}

/// A nibble in a hex byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nibble {
    Value(u8),
    Wildcard,
}

/// The decoded form of a hex byte token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexByte {
    pub negated: bool,
    pub high: Nibble,
    pub low: Nibble,
}

impl HexByte {
    /// Decodes a byte as written in a hex string. Returns `None` if the
    /// text is not a valid byte. A negated byte can't be a full wildcard.
    pub fn parse(text: &str) -> Option<Self> {
        let (negated, digits) = match text.strip_prefix('~') {
            Some(digits) => (true, digits),
            None => (false, text),
        };
        let mut chars = digits.chars();
        let high = nibble(chars.next()?)?;
        let low = nibble(chars.next()?)?;
        if chars.next().is_some()
            || (negated && high == Nibble::Wildcard && low == Nibble::Wildcard)
        {
            return None;
        }
        Some(Self { negated, high, low })
    }
}

fn nibble(c: char) -> Option<Nibble> {
    match c {
        '?' => Some(Nibble::Wildcard),
        c => c.to_digit(16).map(|d| Nibble::Value(d as u8)),
    }
}

impl HexString {
    pub fn text(&self, tokens: &TokenStream) -> String {
        if self.units.is_empty() {
            return "{ }".to_string();
        }
        format!("{{ {} }}", units_text(&self.units, tokens))
    }
}

impl HexUnit {
    pub fn text(&self, tokens: &TokenStream) -> String {
        match self {
            HexUnit::Byte(token) => tokens.text(*token),
            HexUnit::Jump(jump) => {
                let bound = |t: Option<TokenId>| {
                    t.map(|t| tokens.text(t)).unwrap_or_default()
                };
                match jump.dash {
                    Some(_) => {
                        format!("[{}-{}]", bound(jump.low), bound(jump.high))
                    }
                    None => format!("[{}]", bound(jump.low)),
                }
            }
            HexUnit::Alternation(alt) => {
                let alternatives: Vec<String> = alt
                    .alternatives
                    .iter()
                    .map(|units| units_text(units, tokens))
                    .collect();
                format!("( {} )", alternatives.join(" | "))
            }
        }
    }

    pub fn first_token(&self) -> TokenId {
        match self {
            HexUnit::Byte(token) => *token,
            HexUnit::Jump(jump) => jump.lsqb,
            HexUnit::Alternation(alt) => alt.lparen,
        }
    }

    pub fn last_token(&self) -> TokenId {
        match self {
            HexUnit::Byte(token) => *token,
            HexUnit::Jump(jump) => jump.rsqb,
            HexUnit::Alternation(alt) => alt.rparen,
        }
    }
}

fn units_text(units: &[HexUnit], tokens: &TokenStream) -> String {
    let texts: Vec<String> = units.iter().map(|u| u.text(tokens)).collect();
    texts.join(" ")
}

impl Remap for HexString {
    fn remap(&mut self, map: &TokenMap) {
        self.lbrace.remap(map);
        self.units.remap(map);
        self.rbrace.remap(map);
    }
}

impl Remap for HexUnit {
    fn remap(&mut self, map: &TokenMap) {
        match self {
            HexUnit::Byte(token) => token.remap(map),
            HexUnit::Jump(jump) => {
                jump.lsqb.remap(map);
                jump.low.remap(map);
                jump.dash.remap(map);
                jump.high.remap(map);
                jump.rsqb.remap(map);
            }
            HexUnit::Alternation(alt) => {
                alt.lparen.remap(map);
                alt.alternatives.remap(map);
                alt.rparen.remap(map);
            }
        }
    }
}
