use std::mem;

use crate::ast::{
    rule_symbol, HexAlternation, HexByte, HexJump, HexString, HexUnit, Meta,
    ModifierKind, Regexp, RegexpString, Rule, Section, StringKind,
    StringModifier, StringsTrie, YaraString,
};
use crate::literal::{unescape, Literal, LiteralValue};
use crate::parser::{ErrorInfo, Parser, ParserError};
use crate::symbols::StackedSymbolTable;
use crate::tokens::{TokenId, TokenKind};

impl<'a> Parser<'a> {
    /// Parses a rule, from its modifiers to the closing brace.
    pub(super) fn rule(&mut self) -> Result<Rule, ParserError> {
        let mut modifiers = Vec::new();
        while let Some(kind @ (TokenKind::Private | TokenKind::Global)) =
            self.peek()
        {
            let token = self.bump()?;
            if modifiers
                .iter()
                .any(|m| self.tokens().get(*m).map(|t| t.kind()) == Some(kind))
            {
                return Err(self.error_at(
                    token,
                    ErrorInfo::DuplicateModifier {
                        modifier: self.text_of(token),
                    },
                ));
            }
            modifiers.push(token);
        }

        let rule_kw = self.expect(TokenKind::Rule)?;
        let name = self.expect(TokenKind::Ident)?;
        self.refine(name, TokenKind::RuleName);

        let rule_name = self.text_of(name);
        if self.rule_names.contains_key(&rule_name) {
            return Err(self.error_at(
                name,
                ErrorInfo::DuplicateRule { name: rule_name },
            ));
        }

        let (tags_colon, tags) = self.tags()?;

        let lbrace = self.expect(TokenKind::LBrace)?;
        self.refine(lbrace, TokenKind::RuleBegin);

        // Every rule starts with a clean slate.
        self.strings = StringsTrie::new();
        self.loop_vars = StackedSymbolTable::default();
        self.for_of_depth = 0;

        let (meta_section, metas) = match self.peek() {
            Some(TokenKind::Meta) => {
                let (section, metas) = self.metas()?;
                (Some(section), metas)
            }
            _ => (None, Vec::new()),
        };

        let strings_section = match self.peek() {
            Some(TokenKind::Strings) => Some(self.strings_section()?),
            _ => None,
        };

        let keyword = self.expect(TokenKind::Condition)?;
        let colon = self.expect(TokenKind::Colon)?;
        let condition_section = Section { keyword, colon };
        let condition = self.boolean_expr()?;

        let rbrace = self.expect(TokenKind::RBrace)?;
        self.refine(rbrace, TokenKind::RuleEnd);

        let first = modifiers.first().copied().unwrap_or(rule_kw);
        let location =
            self.ctx.location(first).combine(&self.ctx.location(rbrace));
        let symbol = rule_symbol(&rule_name);

        self.rule_names.insert(rule_name, (name, symbol.clone()));

        Ok(Rule {
            modifiers,
            rule_kw,
            name,
            tags_colon,
            tags,
            lbrace,
            meta_section,
            metas,
            strings_section,
            strings: mem::take(&mut self.strings),
            condition_section,
            condition,
            rbrace,
            location,
            symbol,
        })
    }

    fn tags(
        &mut self,
    ) -> Result<(Option<TokenId>, Vec<TokenId>), ParserError> {
        let colon = match self.accept(TokenKind::Colon) {
            Some(colon) => colon,
            None => return Ok((None, Vec::new())),
        };
        let mut tags: Vec<TokenId> = Vec::new();
        while self.peek() == Some(TokenKind::Ident) {
            let tag = self.bump()?;
            self.refine(tag, TokenKind::Tag);
            let text = self.text_of(tag);
            if tags.iter().any(|t| self.text_of(*t) == text) {
                return Err(
                    self.error_at(tag, ErrorInfo::DuplicateTag { tag: text })
                );
            }
            tags.push(tag);
        }
        if tags.is_empty() {
            return Err(self.unexpected("tag"));
        }
        Ok((Some(colon), tags))
    }

    fn metas(&mut self) -> Result<(Section, Vec<Meta>), ParserError> {
        let keyword = self.expect(TokenKind::Meta)?;
        let colon = self.expect(TokenKind::Colon)?;
        let mut metas = Vec::new();
        while self.peek() == Some(TokenKind::Ident) {
            let key = self.bump()?;
            self.refine(key, TokenKind::MetaKey);
            let assign = self.expect(TokenKind::Assign)?;
            let value = self.meta_value()?;
            metas.push(Meta { key, assign, value });
        }
        Ok((Section { keyword, colon }, metas))
    }

    fn meta_value(&mut self) -> Result<TokenId, ParserError> {
        match self.peek() {
            Some(TokenKind::StringLiteral) => {
                let value = self.bump()?;
                self.check_escapes(value)?;
                Ok(value)
            }
            Some(TokenKind::IntLiteral | TokenKind::BoolLiteral) => {
                self.bump()
            }
            // Negative integers are merged into a single token.
            Some(TokenKind::Minus)
                if self.peek_nth(1) == Some(TokenKind::IntLiteral) =>
            {
                let minus = self.bump()?;
                let value = self.bump()?;
                let literal = self
                    .tokens()
                    .get(value)
                    .map(|t| t.literal().clone())
                    .unwrap_or_else(|| Literal::int(0));
                let negated = match literal.value() {
                    LiteralValue::Int(i) => Literal::int(-i),
                    _ => {
                        return Err(self.error_at(
                            value,
                            ErrorInfo::IntegerOutOfRange {
                                text: format!("-{}", literal.text()),
                            },
                        ))
                    }
                };
                let negated = match literal.formatted() {
                    Some(formatted) => {
                        negated.with_formatted(format!("-{}", formatted))
                    }
                    None => negated,
                };
                self.set_literal(value, negated);
                self.tokens_mut().erase_one(minus).map_err(|err| {
                    self.error_at(
                        value,
                        ErrorInfo::SyntaxError {
                            found: err.to_string(),
                            expected: "integer".to_string(),
                        },
                    )
                })?;
                Ok(value)
            }
            _ => Err(self.unexpected("string, integer or boolean")),
        }
    }

    fn strings_section(&mut self) -> Result<Section, ParserError> {
        let keyword = self.expect(TokenKind::Strings)?;
        let colon = self.expect(TokenKind::Colon)?;
        if self.peek() != Some(TokenKind::StringId) {
            return Err(self.unexpected("string identifier"));
        }
        while self.peek() == Some(TokenKind::StringId) {
            let string = self.string_def()?;
            let id = self.text_of(string.id);
            if id == "$" {
                self.strings.insert_duplicate(&id, string);
            } else if let Err(string) = self.strings.insert(&id, string) {
                return Err(self
                    .error_at(string.id, ErrorInfo::DuplicateString { id }));
            }
        }
        Ok(Section { keyword, colon })
    }

    fn string_def(&mut self) -> Result<YaraString, ParserError> {
        let id = self.expect(TokenKind::StringId)?;
        self.refine(id, TokenKind::StringIdDef);
        let assign = self.expect(TokenKind::Assign)?;

        let kind = match self.peek() {
            Some(TokenKind::StringLiteral) => {
                let token = self.bump()?;
                self.check_escapes(token)?;
                StringKind::Plain(token)
            }
            Some(TokenKind::HexStart) => StringKind::Hex(self.hex_string()?),
            Some(TokenKind::Regexp) => {
                let token = self.bump()?;
                StringKind::Regexp(RegexpString {
                    token,
                    regexp: self.regexp(token)?,
                })
            }
            _ => return Err(self.unexpected("string, hex string or regexp")),
        };

        let modifiers = self.string_modifiers(&kind)?;
        Ok(YaraString { id, assign, kind, modifiers })
    }

    pub(super) fn regexp(
        &self,
        token: TokenId,
    ) -> Result<Regexp, ParserError> {
        Regexp::parse(&self.text_of(token)).map_err(|reason| {
            self.error_at(token, ErrorInfo::InvalidRegexp { reason })
        })
    }

    /// Verifies that the escape sequences in a string literal are valid.
    pub(super) fn check_escapes(
        &self,
        token: TokenId,
    ) -> Result<(), ParserError> {
        let literal = self.tokens().get(token).map(|t| t.literal());
        if let Some(text) = literal.and_then(|l| l.as_str()) {
            if unescape(text).is_err() {
                return Err(self.error_at(
                    token,
                    ErrorInfo::InvalidEscapeSequence {
                        text: self.text_of(token),
                    },
                ));
            }
        }
        Ok(())
    }

    fn string_modifiers(
        &mut self,
        kind: &StringKind,
    ) -> Result<Vec<StringModifier>, ParserError> {
        let mut modifiers: Vec<StringModifier> = Vec::new();
        loop {
            let first = match self.peek() {
                Some(
                    TokenKind::Ascii
                    | TokenKind::Wide
                    | TokenKind::Nocase
                    | TokenKind::Fullword
                    | TokenKind::Private
                    | TokenKind::Xor
                    | TokenKind::Base64
                    | TokenKind::Base64Wide,
                ) => self.bump()?,
                _ => break,
            };
            let (modifier, last) = self.string_modifier(first)?;

            let keyword = modifier.keyword();
            let allowed = match kind {
                StringKind::Plain(_) => true,
                StringKind::Hex(_) => {
                    matches!(modifier, ModifierKind::Private)
                }
                StringKind::Regexp(_) => !matches!(
                    modifier,
                    ModifierKind::Xor(_)
                        | ModifierKind::Base64(_)
                        | ModifierKind::Base64Wide(_)
                ),
            };
            if !allowed {
                let kind = match kind {
                    StringKind::Hex(_) => "hex strings",
                    _ => "regular expressions",
                };
                return Err(self.error_at(
                    first,
                    ErrorInfo::InvalidModifier {
                        modifier: keyword.to_string(),
                        kind: kind.to_string(),
                    },
                ));
            }

            for existing in &modifiers {
                let other = existing.kind.keyword();
                if other == keyword {
                    return Err(self.error_at(
                        first,
                        ErrorInfo::DuplicateModifier {
                            modifier: keyword.to_string(),
                        },
                    ));
                }
                if incompatible(other, keyword) {
                    return Err(self.error_at(
                        first,
                        ErrorInfo::IncompatibleModifiers {
                            first: other.to_string(),
                            second: keyword.to_string(),
                        },
                    ));
                }
            }

            modifiers.push(StringModifier { kind: modifier, first, last });
        }
        Ok(modifiers)
    }

    /// Parses the arguments of the modifier whose keyword is `first`.
    /// Returns the modifier and its last token.
    fn string_modifier(
        &mut self,
        first: TokenId,
    ) -> Result<(ModifierKind, TokenId), ParserError> {
        let kind = self.tokens().get(first).map(|t| t.kind());
        let modifier = match kind {
            Some(TokenKind::Ascii) => ModifierKind::Ascii,
            Some(TokenKind::Wide) => ModifierKind::Wide,
            Some(TokenKind::Nocase) => ModifierKind::Nocase,
            Some(TokenKind::Fullword) => ModifierKind::Fullword,
            Some(TokenKind::Private) => {
                self.refine(first, TokenKind::PrivateModifier);
                ModifierKind::Private
            }
            Some(TokenKind::Xor) => {
                if self.peek() != Some(TokenKind::LParen) {
                    return Ok((ModifierKind::Xor(None), first));
                }
                self.bump()?;
                let low_token = self.expect(TokenKind::IntLiteral)?;
                let low = self.xor_key(low_token)?;
                let high = match self.accept(TokenKind::Minus) {
                    Some(dash) => {
                        self.refine(dash, TokenKind::Dash);
                        let high_token = self.expect(TokenKind::IntLiteral)?;
                        let high = self.xor_key(high_token)?;
                        if low > high {
                            return Err(self.error_at(
                                high_token,
                                ErrorInfo::InvalidXorRange,
                            ));
                        }
                        high
                    }
                    None => low,
                };
                let rparen = self.expect(TokenKind::RParen)?;
                return Ok((ModifierKind::Xor(Some((low, high))), rparen));
            }
            Some(TokenKind::Base64 | TokenKind::Base64Wide) => {
                let alphabet = if self.peek() == Some(TokenKind::LParen) {
                    self.bump()?;
                    let token = self.expect(TokenKind::StringLiteral)?;
                    self.check_escapes(token)?;
                    let alphabet = self
                        .tokens()
                        .get(token)
                        .map(|t| t.literal().pure_text())
                        .unwrap_or_default();
                    if alphabet.len() != 64 {
                        return Err(self.error_at(
                            token,
                            ErrorInfo::InvalidBase64Alphabet,
                        ));
                    }
                    Some(alphabet.to_string())
                } else {
                    None
                };
                let last = match alphabet {
                    Some(_) => self.expect(TokenKind::RParen)?,
                    None => first,
                };
                let modifier = if kind == Some(TokenKind::Base64) {
                    ModifierKind::Base64(alphabet)
                } else {
                    ModifierKind::Base64Wide(alphabet)
                };
                return Ok((modifier, last));
            }
            _ => return Err(self.unexpected("string modifier")),
        };
        Ok((modifier, first))
    }

    fn xor_key(&self, token: TokenId) -> Result<u8, ParserError> {
        self.tokens()
            .get(token)
            .and_then(|t| t.literal().as_int())
            .and_then(|value| u8::try_from(value).ok())
            .ok_or_else(|| self.error_at(token, ErrorInfo::XorKeyOutOfBounds))
    }

    fn hex_string(&mut self) -> Result<HexString, ParserError> {
        let lbrace = self.expect(TokenKind::HexStart)?;
        let units = self.hex_units()?;
        if units.is_empty() {
            return Err(self.unexpected("hex byte"));
        }
        let rbrace = self.expect(TokenKind::HexEnd)?;
        if self.ctx.spans_lines(lbrace, rbrace) {
            if let Some(token) = self.tokens_mut().get_mut(lbrace) {
                token.set_force_newline(true);
            }
        }
        Ok(HexString { lbrace, units, rbrace })
    }

    /// Parses hex units until something that can't start a unit is found.
    fn hex_units(&mut self) -> Result<Vec<HexUnit>, ParserError> {
        let mut units = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::HexByte) => {
                    let token = self.bump()?;
                    if HexByte::parse(&self.text_of(token)).is_none() {
                        return Err(self.error_at(
                            token,
                            ErrorInfo::UnknownToken {
                                text: self.text_of(token),
                            },
                        ));
                    }
                    units.push(HexUnit::Byte(token));
                }
                Some(TokenKind::HexJumpLeft) => {
                    units.push(HexUnit::Jump(self.hex_jump()?))
                }
                Some(TokenKind::HexAltLeft) => {
                    units.push(HexUnit::Alternation(self.hex_alternation()?))
                }
                _ => return Ok(units),
            }
        }
    }

    fn hex_jump(&mut self) -> Result<HexJump, ParserError> {
        let lsqb = self.expect(TokenKind::HexJumpLeft)?;
        let low = self.accept(TokenKind::IntLiteral);
        let dash = self.accept(TokenKind::Dash);
        let high = match dash {
            Some(_) => self.accept(TokenKind::IntLiteral),
            None => None,
        };
        if low.is_none() && dash.is_none() {
            return Err(self.unexpected("integer or '-'"));
        }
        let rsqb = self.expect(TokenKind::HexJumpRight)?;

        let value = |t: TokenId| {
            self.tokens().get(t).and_then(|t| t.literal().as_int())
        };
        if let (Some(l), Some(h)) = (low.and_then(value), high.and_then(value))
        {
            if l > h {
                return Err(self.error_at(
                    lsqb,
                    ErrorInfo::InvalidHexJump { low: l, high: h },
                ));
            }
        }
        Ok(HexJump { lsqb, low, dash, high, rsqb })
    }

    fn hex_alternation(&mut self) -> Result<HexAlternation, ParserError> {
        let lparen = self.expect(TokenKind::HexAltLeft)?;
        let mut alternatives = Vec::new();
        loop {
            let units = self.hex_units()?;
            if units.is_empty() {
                return Err(self.unexpected("hex byte"));
            }
            alternatives.push(units);
            if self.accept(TokenKind::HexAltOr).is_none() {
                break;
            }
        }
        if alternatives.len() < 2 {
            return Err(self.unexpected("'|'"));
        }
        let rparen = self.expect(TokenKind::HexAltRight)?;
        Ok(HexAlternation { lparen, alternatives, rparen })
    }
}

/// Modifiers that can't be used together.
fn incompatible(a: &str, b: &str) -> bool {
    let base64 = |m: &str| m == "base64" || m == "base64wide";
    let pair = |x: &str, y: &str| x == "nocase" && (y == "xor" || base64(y));
    pair(a, b)
        || pair(b, a)
        || (base64(a) && (b == "xor" || b == "fullword"))
        || (base64(b) && (a == "xor" || a == "fullword"))
}
