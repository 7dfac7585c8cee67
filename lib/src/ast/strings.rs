use bstr::BString;

use crate::ast::hex::HexString;
use crate::ast::regexp::Regexp;
use crate::tokens::{Remap, TokenId, TokenMap, TokenStream};

/// A string defined in the `strings:` section of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct YaraString {
    /// The `$name` token. References to the string in the condition are
    /// aliases of this token.
    pub id: TokenId,
    pub assign: TokenId,
    pub kind: StringKind,
    pub modifiers: Vec<StringModifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringKind {
    /// A text string like `"foo"`, the token is the string literal.
    Plain(TokenId),
    Hex(HexString),
    Regexp(RegexpString),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexpString {
    pub token: TokenId,
    pub regexp: Regexp,
}

/// A string modifier, which spans from `first` to `last` (e.g. `xor`,
/// `(`, `1`, `-`, `255`, `)`).
#[derive(Debug, Clone, PartialEq)]
pub struct StringModifier {
    pub kind: ModifierKind,
    pub first: TokenId,
    pub last: TokenId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierKind {
    Ascii,
    Wide,
    Nocase,
    Fullword,
    Private,
    /// The range of keys, `None` when all of them are used.
    Xor(Option<(u8, u8)>),
    /// The custom alphabet, if any.
    Base64(Option<String>),
    Base64Wide(Option<String>),
}

impl ModifierKind {
    /// The keyword that introduces the modifier.
    pub fn keyword(&self) -> &'static str {
        match self {
            ModifierKind::Ascii => "ascii",
            ModifierKind::Wide => "wide",
            ModifierKind::Nocase => "nocase",
            ModifierKind::Fullword => "fullword",
            ModifierKind::Private => "private",
            ModifierKind::Xor(_) => "xor",
            ModifierKind::Base64(_) => "base64",
            ModifierKind::Base64Wide(_) => "base64wide",
        }
    }
}

impl YaraString {
    /// The identifier of the string, including the `$`.
    pub fn identifier(&self, tokens: &TokenStream) -> String {
        tokens.text(self.id)
    }

    pub fn is_anonymous(&self, tokens: &TokenStream) -> bool {
        self.identifier(tokens) == "$"
    }

    pub fn is_plain(&self) -> bool {
        matches!(self.kind, StringKind::Plain(_))
    }

    pub fn is_hex(&self) -> bool {
        matches!(self.kind, StringKind::Hex(_))
    }

    pub fn is_regexp(&self) -> bool {
        matches!(self.kind, StringKind::Regexp(_))
    }

    pub fn has_modifier(&self, keyword: &str) -> bool {
        self.modifiers.iter().any(|m| m.kind.keyword() == keyword)
    }

    /// The value of a plain string with escape sequences decoded, `None`
    /// for other kinds of strings.
    pub fn pure_text(&self, tokens: &TokenStream) -> Option<BString> {
        match &self.kind {
            StringKind::Plain(token) => {
                tokens.get(*token).map(|t| t.literal().pure_text())
            }
            _ => None,
        }
    }

    /// The text of the value, like `"foo"`, `{ 01 02 }` or `/foo/i`.
    pub fn value_text(&self, tokens: &TokenStream) -> String {
        match &self.kind {
            StringKind::Plain(token) => tokens.text(*token),
            StringKind::Hex(hex) => hex.text(tokens),
            StringKind::Regexp(regexp) => tokens.text(regexp.token),
        }
    }

    /// The modifiers separated by spaces, in the order they were written.
    pub fn modifiers_text(&self, tokens: &TokenStream) -> String {
        let texts: Vec<String> =
            self.modifiers.iter().map(|m| m.text(tokens)).collect();
        texts.join(" ")
    }

    /// The whole definition, like `$a = "foo" ascii wide`.
    pub fn text(&self, tokens: &TokenStream) -> String {
        let mut text = format!(
            "{} = {}",
            self.identifier(tokens),
            self.value_text(tokens)
        );
        if !self.modifiers.is_empty() {
            text.push(' ');
            text.push_str(&self.modifiers_text(tokens));
        }
        text
    }

    pub fn first_token(&self) -> TokenId {
        self.id
    }

    pub fn last_token(&self) -> TokenId {
        match self.modifiers.last() {
            Some(modifier) => modifier.last,
            None => match &self.kind {
                StringKind::Plain(token) => *token,
                StringKind::Hex(hex) => hex.rbrace,
                StringKind::Regexp(regexp) => regexp.token,
            },
        }
    }
}

impl StringModifier {
    pub fn text(&self, tokens: &TokenStream) -> String {
        match tokens.range(self.first, self.last) {
            Ok(range) => range.map(|(id, _)| tokens.text(id)).collect(),
            Err(_) => String::new(),
        }
    }
}

impl Remap for YaraString {
    fn remap(&mut self, map: &TokenMap) {
        self.id.remap(map);
        self.assign.remap(map);
        match &mut self.kind {
            StringKind::Plain(token) => token.remap(map),
            StringKind::Hex(hex) => hex.remap(map),
            StringKind::Regexp(regexp) => regexp.token.remap(map),
        }
        self.modifiers.remap(map);
    }
}

impl Remap for StringModifier {
    fn remap(&mut self, map: &TokenMap) {
        self.first.remap(map);
        self.last.remap(map);
    }
}
