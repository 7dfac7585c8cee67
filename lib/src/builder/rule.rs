use std::mem;

use crate::ast::{
    rule_symbol, Expression, HexString, Meta, ModifierKind, Regexp,
    RegexpString, Rule, Section, StringKind, StringModifier, StringsTrie,
    YaraString,
};
use crate::builder::{
    bool_val, is_identifier, is_string_identifier, BuilderError,
};
use crate::literal::Literal;
use crate::location::Location;
use crate::tokens::{Detached, Token, TokenId, TokenKind, TokenStream};

/// Builds rules.
///
/// Methods can be chained, and [`YaraRuleBuilder::get`] leaves the builder
/// empty so that it can be used for the next rule. String modifiers apply
/// to the last string added.
///
/// ```
/// use yaramod::builder::{string_ref, YaraRuleBuilder};
///
/// let mut builder = YaraRuleBuilder::new();
/// let rule = builder
///     .with_name("foo")
///     .with_tag("bar")
///     .with_int_meta("score", 10)
///     .with_plain_string("$s", "text")
///     .wide()
///     .nocase()
///     .with_condition(string_ref("$s").get().unwrap())
///     .get()
///     .unwrap();
///
/// assert_eq!(
///     rule.node().text(rule.tokens()),
///     "rule foo : bar {\n\tmeta:\n\t\tscore = 10\n\tstrings:\n\t\t\
///      $s = \"text\" wide nocase\n\tcondition:\n\t\t$s\n}"
/// );
/// ```
#[derive(Debug, Default)]
pub struct YaraRuleBuilder {
    name: Option<String>,
    global: bool,
    private: bool,
    tags: Vec<String>,
    comments: Vec<String>,
    metas: Vec<(String, TokenKind, Literal)>,
    strings: Vec<PendingString>,
    condition: Option<Detached<Expression>>,
    error: Option<BuilderError>,
}

#[derive(Debug)]
struct PendingString {
    id: String,
    value: PendingValue,
    modifiers: Vec<ModifierKind>,
}

#[derive(Debug)]
enum PendingValue {
    Plain(String),
    Hex(Detached<HexString>),
    Regexp { text: String, regexp: Regexp },
}

impl YaraRuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, error: BuilderError) -> &mut Self {
        self.error.get_or_insert(error);
        self
    }

    pub fn with_name(&mut self, name: &str) -> &mut Self {
        if !is_identifier(name) {
            return self
                .fail(BuilderError::InvalidIdentifier(name.to_string()));
        }
        self.name = Some(name.to_string());
        self
    }

    pub fn private_rule(&mut self) -> &mut Self {
        self.private = true;
        self
    }

    pub fn global_rule(&mut self) -> &mut Self {
        self.global = true;
        self
    }

    pub fn with_tag(&mut self, tag: &str) -> &mut Self {
        if !is_identifier(tag) {
            return self.fail(BuilderError::InvalidIdentifier(tag.to_string()));
        }
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
        self
    }

    /// Adds a single line comment. The first one goes right after the
    /// opening brace of the rule, the rest on their own lines below it.
    pub fn with_comment(&mut self, text: &str) -> &mut Self {
        self.comments.push(text.replace(['\r', '\n'], " "));
        self
    }

    fn with_meta(
        &mut self,
        key: &str,
        kind: TokenKind,
        value: Literal,
    ) -> &mut Self {
        if !is_identifier(key) {
            return self.fail(BuilderError::InvalidIdentifier(key.to_string()));
        }
        self.metas.push((key.to_string(), kind, value));
        self
    }

    pub fn with_string_meta(&mut self, key: &str, value: &str) -> &mut Self {
        self.with_meta(key, TokenKind::StringLiteral, Literal::string(value))
    }

    pub fn with_int_meta(&mut self, key: &str, value: i64) -> &mut Self {
        self.with_meta(key, TokenKind::IntLiteral, Literal::int(value))
    }

    pub fn with_uint_meta(&mut self, key: &str, value: u64) -> &mut Self {
        self.with_meta(key, TokenKind::IntLiteral, Literal::uint(value))
    }

    /// An integer meta written in hexadecimal, like `0x1F`.
    pub fn with_hex_int_meta(&mut self, key: &str, value: u64) -> &mut Self {
        self.with_meta(
            key,
            TokenKind::IntLiteral,
            Literal::uint(value).with_formatted(format!("0x{:X}", value)),
        )
    }

    pub fn with_bool_meta(&mut self, key: &str, value: bool) -> &mut Self {
        self.with_meta(key, TokenKind::BoolLiteral, Literal::bool(value))
    }

    fn with_string(&mut self, id: &str, value: PendingValue) -> &mut Self {
        if !is_string_identifier(id) {
            return self
                .fail(BuilderError::InvalidStringIdentifier(id.to_string()));
        }
        if id != "$" && self.strings.iter().any(|s| s.id == id) {
            return self.fail(BuilderError::DuplicateString(id.to_string()));
        }
        self.strings.push(PendingString {
            id: id.to_string(),
            value,
            modifiers: Vec::new(),
        });
        self
    }

    /// Adds a text string. `value` is the plain text, it is escaped when
    /// written.
    pub fn with_plain_string(&mut self, id: &str, value: &str) -> &mut Self {
        self.with_string(id, PendingValue::Plain(value.to_string()))
    }

    pub fn with_hex_string(
        &mut self,
        id: &str,
        hex: Detached<HexString>,
    ) -> &mut Self {
        self.with_string(id, PendingValue::Hex(hex))
    }

    /// Adds a regular expression, `pattern` is what goes between the
    /// slashes.
    pub fn with_regexp(
        &mut self,
        id: &str,
        pattern: &str,
        modifiers: &str,
    ) -> &mut Self {
        let text = format!("/{}/{}", pattern, modifiers);
        match Regexp::parse(&text) {
            Ok(regexp) => {
                self.with_string(id, PendingValue::Regexp { text, regexp })
            }
            Err(reason) => {
                self.fail(BuilderError::InvalidRegexp { text, reason })
            }
        }
    }

    fn with_modifier(&mut self, modifier: ModifierKind) -> &mut Self {
        match self.strings.last_mut() {
            Some(string) => {
                if !string.modifiers.contains(&modifier) {
                    string.modifiers.push(modifier);
                }
                self
            }
            None => self.fail(BuilderError::ModifierWithoutString),
        }
    }

    pub fn ascii(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Ascii)
    }

    pub fn wide(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Wide)
    }

    pub fn nocase(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Nocase)
    }

    pub fn fullword(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Fullword)
    }

    /// The `private` string modifier.
    pub fn private(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Private)
    }

    pub fn xor(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Xor(None))
    }

    /// `xor(low-high)`, or `xor(low)` if both are the same.
    pub fn xor_range(&mut self, low: u8, high: u8) -> &mut Self {
        if low > high {
            return self.fail(BuilderError::InvalidXorRange { low, high });
        }
        self.with_modifier(ModifierKind::Xor(Some((low, high))))
    }

    pub fn base64(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Base64(None))
    }

    pub fn base64_alphabet(&mut self, alphabet: &str) -> &mut Self {
        if alphabet.len() != 64 {
            return self.fail(BuilderError::InvalidBase64Alphabet);
        }
        self.with_modifier(ModifierKind::Base64(Some(alphabet.to_string())))
    }

    pub fn base64wide(&mut self) -> &mut Self {
        self.with_modifier(ModifierKind::Base64Wide(None))
    }

    pub fn base64wide_alphabet(&mut self, alphabet: &str) -> &mut Self {
        if alphabet.len() != 64 {
            return self.fail(BuilderError::InvalidBase64Alphabet);
        }
        self.with_modifier(ModifierKind::Base64Wide(Some(
            alphabet.to_string(),
        )))
    }

    /// Sets the condition. Rules without one get `true`.
    pub fn with_condition(
        &mut self,
        condition: Detached<Expression>,
    ) -> &mut Self {
        self.condition = Some(condition);
        self
    }

    /// Returns the rule and resets the builder.
    pub fn get(&mut self) -> Result<Detached<Rule>, BuilderError> {
        let builder = mem::take(self);
        if let Some(error) = builder.error {
            return Err(error);
        }
        let name = builder.name.ok_or(BuilderError::MissingName)?;
        let condition = match builder.condition {
            Some(condition) => condition,
            None => bool_val(true).get()?,
        };

        let mut out = Emitter::default();

        let mut modifiers = Vec::new();
        if builder.global {
            modifiers.push(out.push(TokenKind::Global));
        }
        if builder.private {
            modifiers.push(out.push(TokenKind::Private));
        }
        let rule_kw = out.push(TokenKind::Rule);
        let name_token = out.push_literal(
            TokenKind::RuleName,
            Literal::escaped_string(name.as_str()),
        );

        let tags_colon =
            (!builder.tags.is_empty()).then(|| out.push(TokenKind::Colon));
        let tags: Vec<TokenId> = builder
            .tags
            .iter()
            .map(|tag| {
                out.push_literal(
                    TokenKind::Tag,
                    Literal::escaped_string(tag.as_str()),
                )
            })
            .collect();

        let lbrace = out.push(TokenKind::RuleBegin);
        for comment in &builder.comments {
            out.push_literal(
                TokenKind::OneLineComment,
                Literal::escaped_string(format!("// {}", comment)),
            );
            out.newline();
        }
        if builder.comments.is_empty() {
            out.newline();
        }

        let mut meta_section = None;
        let mut metas = Vec::with_capacity(builder.metas.len());
        if !builder.metas.is_empty() {
            meta_section = Some(out.section(TokenKind::Meta));
            for (key, kind, value) in builder.metas {
                let key = out.push_literal(
                    TokenKind::MetaKey,
                    Literal::escaped_string(key),
                );
                let assign = out.push(TokenKind::Assign);
                let value = out.push_literal(kind, value);
                out.newline();
                metas.push(Meta { key, assign, value });
            }
        }

        let mut strings_section = None;
        let mut strings = StringsTrie::new();
        if !builder.strings.is_empty() {
            strings_section = Some(out.section(TokenKind::Strings));
            for pending in builder.strings {
                let id = pending.id.clone();
                let string = out.string(pending)?;
                if id == "$" {
                    strings.insert_duplicate(&id, string);
                } else if strings.insert(&id, string).is_err() {
                    return Err(BuilderError::DuplicateString(id));
                }
                out.newline();
            }
        }

        let condition_section = out.section(TokenKind::Condition);
        let condition = condition.attach(&mut out.tokens, None)?;
        out.newline();
        let rbrace = out.push(TokenKind::RuleEnd);

        let rule = Rule {
            modifiers,
            rule_kw,
            name: name_token,
            tags_colon,
            tags,
            lbrace,
            meta_section,
            metas,
            strings_section,
            strings,
            condition_section,
            condition,
            rbrace,
            location: Location::default(),
            symbol: rule_symbol(&name),
        };
        Ok(Detached::new(out.tokens, rule))
    }
}

/// Writes the tokens of a rule in canonical layout.
#[derive(Default)]
struct Emitter {
    tokens: TokenStream,
}

impl Emitter {
    fn push(&mut self, kind: TokenKind) -> TokenId {
        self.tokens.push_back(Token::fixed(kind))
    }

    fn push_literal(&mut self, kind: TokenKind, literal: Literal) -> TokenId {
        self.tokens.push_back(Token::synthetic(kind, literal))
    }

    fn newline(&mut self) {
        self.push(TokenKind::NewLine);
    }

    fn section(&mut self, keyword: TokenKind) -> Section {
        let keyword = self.push(keyword);
        let colon = self.push(TokenKind::Colon);
        self.newline();
        Section { keyword, colon }
    }

    fn string(
        &mut self,
        pending: PendingString,
    ) -> Result<YaraString, BuilderError> {
        let id = self.push_literal(
            TokenKind::StringIdDef,
            Literal::escaped_string(pending.id),
        );
        let assign = self.push(TokenKind::Assign);
        let kind = match pending.value {
            PendingValue::Plain(text) => StringKind::Plain(self.push_literal(
                TokenKind::StringLiteral,
                Literal::string(text),
            )),
            PendingValue::Hex(hex) => {
                StringKind::Hex(hex.attach(&mut self.tokens, None)?)
            }
            PendingValue::Regexp { text, regexp } => {
                let token = self.push_literal(
                    TokenKind::Regexp,
                    Literal::escaped_string(text),
                );
                StringKind::Regexp(RegexpString { token, regexp })
            }
        };
        let modifiers: Vec<StringModifier> = pending
            .modifiers
            .into_iter()
            .map(|modifier| self.modifier(modifier))
            .collect();
        Ok(YaraString { id, assign, kind, modifiers })
    }

    fn modifier(&mut self, kind: ModifierKind) -> StringModifier {
        let (first, last) = match &kind {
            ModifierKind::Ascii => self.single(TokenKind::Ascii),
            ModifierKind::Wide => self.single(TokenKind::Wide),
            ModifierKind::Nocase => self.single(TokenKind::Nocase),
            ModifierKind::Fullword => self.single(TokenKind::Fullword),
            ModifierKind::Private => self.single(TokenKind::PrivateModifier),
            ModifierKind::Xor(None) => self.single(TokenKind::Xor),
            ModifierKind::Xor(Some((low, high))) => {
                let first = self.push(TokenKind::Xor);
                self.push(TokenKind::LParen);
                self.push_literal(
                    TokenKind::IntLiteral,
                    Literal::int(i64::from(*low)),
                );
                if low != high {
                    self.push(TokenKind::Dash);
                    self.push_literal(
                        TokenKind::IntLiteral,
                        Literal::int(i64::from(*high)),
                    );
                }
                (first, self.push(TokenKind::RParen))
            }
            ModifierKind::Base64(alphabet) => {
                self.base64(TokenKind::Base64, alphabet.as_deref())
            }
            ModifierKind::Base64Wide(alphabet) => {
                self.base64(TokenKind::Base64Wide, alphabet.as_deref())
            }
        };
        StringModifier { kind, first, last }
    }

    fn single(&mut self, kind: TokenKind) -> (TokenId, TokenId) {
        let token = self.push(kind);
        (token, token)
    }

    fn base64(
        &mut self,
        kind: TokenKind,
        alphabet: Option<&str>,
    ) -> (TokenId, TokenId) {
        let first = self.push(kind);
        match alphabet {
            Some(alphabet) => {
                self.push(TokenKind::LParen);
                self.push_literal(
                    TokenKind::StringLiteral,
                    Literal::string(alphabet),
                );
                (first, self.push(TokenKind::RParen))
            }
            None => (first, first),
        }
    }
}
