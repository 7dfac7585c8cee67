use std::rc::Rc;

use crate::ast::expr::Expression;
use crate::ast::strings::YaraString;
use crate::ast::trie::StringsTrie;
use crate::ast::visitor::{self, Modifier, Visitor};
use crate::ast::{EditError, ExprKind};
use crate::literal::{Literal, LiteralValue};
use crate::location::Location;
use crate::symbols::Symbol;
use crate::tokenizer;
use crate::tokens::{
    Detached, Remap, Token, TokenId, TokenKind, TokenMap, TokenStream,
};
use crate::types::ExprType;

/// A YARA rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The `private` and `global` tokens, in the order they were written.
    pub modifiers: Vec<TokenId>,
    pub rule_kw: TokenId,
    pub name: TokenId,
    /// The colon that precedes the tags, if the rule has tags.
    pub tags_colon: Option<TokenId>,
    pub tags: Vec<TokenId>,
    pub lbrace: TokenId,
    pub meta_section: Option<Section>,
    pub metas: Vec<Meta>,
    pub strings_section: Option<Section>,
    pub strings: StringsTrie<YaraString>,
    pub condition_section: Section,
    pub condition: Expression,
    pub rbrace: TokenId,
    pub location: Location,
    pub(crate) symbol: Rc<Symbol>,
}

/// A section keyword and its colon, like `meta:`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub keyword: TokenId,
    pub colon: TokenId,
}

/// A `key = value` entry in the `meta:` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub key: TokenId,
    pub assign: TokenId,
    pub value: TokenId,
}

impl Meta {
    pub fn key(&self, tokens: &TokenStream) -> String {
        tokens.text(self.key)
    }

    /// The value of the entry, `None` if the token is gone.
    pub fn value<'a>(&self, tokens: &'a TokenStream) -> Option<&'a Literal> {
        tokens.get(self.value).map(|t| t.literal())
    }

    pub fn text(&self, tokens: &TokenStream) -> String {
        format!("{} = {}", tokens.text(self.key), tokens.text(self.value))
    }
}

impl Rule {
    pub fn name(&self, tokens: &TokenStream) -> String {
        tokens.text(self.name)
    }

    pub fn is_private(&self, tokens: &TokenStream) -> bool {
        self.has_modifier(tokens, TokenKind::Private)
    }

    pub fn is_global(&self, tokens: &TokenStream) -> bool {
        self.has_modifier(tokens, TokenKind::Global)
    }

    fn has_modifier(&self, tokens: &TokenStream, kind: TokenKind) -> bool {
        self.modifiers
            .iter()
            .any(|m| tokens.get(*m).map_or(false, |t| t.kind() == kind))
    }

    pub fn tags(&self, tokens: &TokenStream) -> Vec<String> {
        self.tags.iter().map(|t| tokens.text(*t)).collect()
    }

    /// Returns the first meta with the given key.
    pub fn meta(&self, tokens: &TokenStream, key: &str) -> Option<&Meta> {
        self.metas.iter().find(|m| m.key(tokens) == key)
    }

    /// The symbol that represents the rule in the conditions of other rules.
    pub fn symbol(&self) -> &Rc<Symbol> {
        &self.symbol
    }

    pub fn first_token(&self) -> TokenId {
        self.modifiers.first().copied().unwrap_or(self.rule_kw)
    }

    pub fn last_token(&self) -> TokenId {
        self.rbrace
    }

    /// Walks the condition with a read-only visitor.
    pub fn visit_condition<V: Visitor + ?Sized>(
        &self,
        tokens: &TokenStream,
        visitor: &mut V,
    ) {
        visitor::walk(&self.condition, tokens, visitor)
    }

    /// True if the condition references the string with the given
    /// identifier, directly or through `#`, `@` and `!`.
    pub fn is_string_referenced(
        &self,
        tokens: &TokenStream,
        id: &str,
    ) -> bool {
        let name = id.trim_start_matches('$');
        let mut found = false;
        visitor::walk(
            &self.condition,
            tokens,
            &mut visitor::from_fn(|expr: &Expression, tokens: &TokenStream| {
                let token = match &expr.kind {
                    ExprKind::StringRef(t) | ExprKind::StringCount(t) => *t,
                    ExprKind::StringAt(e) => e.id,
                    ExprKind::StringInRange(e)
                    | ExprKind::StringCountInRange(e) => e.id,
                    ExprKind::StringOffset(e) | ExprKind::StringLength(e) => {
                        e.id
                    }
                    _ => return,
                };
                if tokens.text(token).get(1..) == Some(name) {
                    found = true;
                }
            }),
        );
        found
    }

    /// Returns the text of the rule in a normalized layout.
    pub fn text(&self, tokens: &TokenStream) -> String {
        let mut text = String::new();
        for modifier in &self.modifiers {
            text.push_str(&tokens.text(*modifier));
            text.push(' ');
        }
        text.push_str("rule ");
        text.push_str(&self.name(tokens));
        if !self.tags.is_empty() {
            text.push_str(" : ");
            text.push_str(&self.tags(tokens).join(" "));
        }
        text.push_str(" {\n");
        if !self.metas.is_empty() {
            text.push_str("\tmeta:\n");
            for meta in &self.metas {
                text.push_str(&format!("\t\t{}\n", meta.text(tokens)));
            }
        }
        if !self.strings.is_empty() {
            text.push_str("\tstrings:\n");
            for string in self.strings.values() {
                text.push_str(&format!("\t\t{}\n", string.text(tokens)));
            }
        }
        text.push_str("\tcondition:\n\t\t");
        text.push_str(&self.condition.text(tokens));
        text.push_str("\n}");
        text
    }
}

impl Remap for Rule {
    fn remap(&mut self, map: &TokenMap) {
        self.modifiers.remap(map);
        self.rule_kw.remap(map);
        self.name.remap(map);
        self.tags_colon.remap(map);
        self.tags.remap(map);
        self.lbrace.remap(map);
        if let Some(section) = &mut self.meta_section {
            section.remap(map);
        }
        for meta in &mut self.metas {
            meta.key.remap(map);
            meta.assign.remap(map);
            meta.value.remap(map);
        }
        if let Some(section) = &mut self.strings_section {
            section.remap(map);
        }
        for string in self.strings.values_mut() {
            string.remap(map);
        }
        self.condition_section.remap(map);
        self.condition.remap(map);
        self.rbrace.remap(map);
    }
}

impl Remap for Section {
    fn remap(&mut self, map: &TokenMap) {
        self.keyword.remap(map);
        self.colon.remap(map);
    }
}

/// Edits a rule that belongs to a [`crate::YaraFile`].
///
/// Every change is made on the tokens of the file, so both the exact and
/// the formatted text of the file reflect it right away.
pub struct RuleEditor<'a> {
    pub(crate) tokens: &'a mut TokenStream,
    pub(crate) rule: &'a mut Rule,
}

impl<'a> RuleEditor<'a> {
    pub fn rule(&self) -> &Rule {
        self.rule
    }

    pub fn tokens(&self) -> &TokenStream {
        self.tokens
    }

    pub fn set_private(&mut self, yes: bool) -> Result<(), EditError> {
        self.set_modifier(TokenKind::Private, yes)
    }

    pub fn set_global(&mut self, yes: bool) -> Result<(), EditError> {
        self.set_modifier(TokenKind::Global, yes)
    }

    fn set_modifier(
        &mut self,
        kind: TokenKind,
        yes: bool,
    ) -> Result<(), EditError> {
        let existing = self.rule.modifiers.iter().position(|m| {
            self.tokens.get(*m).map_or(false, |t| t.kind() == kind)
        });
        match (existing, yes) {
            (None, true) => {
                let token = self
                    .tokens
                    .insert_before(self.rule.rule_kw, Token::fixed(kind))?;
                // `global` goes first if both are present.
                if kind == TokenKind::Global {
                    if let Some(&private) = self.rule.modifiers.first() {
                        self.tokens.erase_one(token)?;
                        let token = self
                            .tokens
                            .insert_before(private, Token::fixed(kind))?;
                        self.rule.modifiers.insert(0, token);
                        return Ok(());
                    }
                }
                self.rule.modifiers.push(token);
            }
            (Some(index), false) => {
                let token = self.rule.modifiers.remove(index);
                self.tokens.erase_one(token)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Adds a tag at the end of the tag list.
    pub fn add_tag(&mut self, tag: &str) -> Result<(), EditError> {
        if !tokenizer::is_identifier(tag) {
            return Err(EditError::InvalidIdentifier(tag.to_string()));
        }
        if self.rule.tags(self.tokens).iter().any(|t| t == tag) {
            return Err(EditError::DuplicateTag(tag.to_string()));
        }
        let last = match self.rule.tags.last() {
            Some(last) => *last,
            None => {
                let colon = self.tokens.insert_after(
                    self.rule.name,
                    Token::fixed(TokenKind::Colon),
                )?;
                self.rule.tags_colon = Some(colon);
                colon
            }
        };
        let token = self.tokens.insert_after(
            last,
            Token::synthetic(TokenKind::Tag, Literal::escaped_string(tag)),
        )?;
        self.rule.tags.push(token);
        Ok(())
    }

    /// Removes a tag, returns false if the rule didn't have it.
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, EditError> {
        let index = match self
            .rule
            .tags
            .iter()
            .position(|t| self.tokens.text(*t) == tag)
        {
            Some(index) => index,
            None => return Ok(false),
        };
        let token = self.rule.tags.remove(index);
        self.tokens.erase_one(token)?;
        if self.rule.tags.is_empty() {
            if let Some(colon) = self.rule.tags_colon.take() {
                self.tokens.erase_one(colon)?;
            }
        }
        Ok(true)
    }

    /// Adds a meta entry at the end of the `meta:` section, creating the
    /// section if needed.
    pub fn add_meta(
        &mut self,
        key: &str,
        value: Literal,
    ) -> Result<(), EditError> {
        if !tokenizer::is_identifier(key) {
            return Err(EditError::InvalidIdentifier(key.to_string()));
        }
        let anchor = match (self.rule.metas.last(), self.rule.meta_section) {
            (Some(meta), _) => meta.value,
            (None, Some(section)) => section.colon,
            (None, None) => {
                let next = self.rule.strings_section.map_or(
                    self.rule.condition_section.keyword,
                    |s| s.keyword,
                );
                let keyword = self
                    .tokens
                    .insert_before(next, Token::fixed(TokenKind::Meta))?;
                let colon = self
                    .tokens
                    .insert_after(keyword, Token::fixed(TokenKind::Colon))?;
                self.rule.meta_section = Some(Section { keyword, colon });
                colon
            }
        };
        let kind = meta_value_kind(&value);
        let key = self.tokens.insert_after(
            anchor,
            Token::synthetic(TokenKind::MetaKey, Literal::escaped_string(key)),
        )?;
        let assign =
            self.tokens.insert_after(key, Token::fixed(TokenKind::Assign))?;
        let value = self
            .tokens
            .insert_after(assign, Token::synthetic(kind, value))?;
        self.rule.metas.push(Meta { key, assign, value });
        Ok(())
    }

    /// Changes the value of the first meta with the given key.
    pub fn set_meta_value(
        &mut self,
        key: &str,
        value: Literal,
    ) -> Result<(), EditError> {
        let meta = self
            .rule
            .meta(self.tokens, key)
            .cloned()
            .ok_or_else(|| EditError::MetaNotFound(key.to_string()))?;
        let token = self
            .tokens
            .get_mut(meta.value)
            .ok_or_else(|| EditError::MetaNotFound(key.to_string()))?;
        token.set_kind(meta_value_kind(&value));
        token.set_literal(value);
        Ok(())
    }

    /// Removes every meta with the given key, returns how many were removed.
    /// The section is removed when it becomes empty.
    pub fn remove_meta(&mut self, key: &str) -> Result<usize, EditError> {
        let (removed, kept): (Vec<Meta>, Vec<Meta>) =
            std::mem::take(&mut self.rule.metas)
                .into_iter()
                .partition(|m| m.key(self.tokens) == key);
        self.rule.metas = kept;
        for meta in &removed {
            self.erase_line(meta.key, meta.value)?;
        }
        if self.rule.metas.is_empty() {
            if let Some(section) = self.rule.meta_section.take() {
                self.erase_line(section.keyword, section.colon)?;
            }
        }
        Ok(removed.len())
    }

    /// Renames a string. References to the string in the condition are
    /// renamed too.
    pub fn rename_string(
        &mut self,
        old: &str,
        new: &str,
    ) -> Result<(), EditError> {
        if !new.starts_with('$') || new == "$" || old == "$" {
            return Err(EditError::InvalidStringIdentifier(new.to_string()));
        }
        if self.rule.strings.contains(new) {
            return Err(EditError::DuplicateString(new.to_string()));
        }
        let id = self
            .rule
            .strings
            .get(old)
            .map(|s| s.id)
            .ok_or_else(|| EditError::StringNotFound(old.to_string()))?;
        if let Some(token) = self.tokens.get_mut(id) {
            token.set_literal(Literal::escaped_string(new));
        }
        self.rule.strings.rename(old, new);
        Ok(())
    }

    /// Removes a string. Fails if the string is referenced in the condition.
    pub fn remove_string(&mut self, id: &str) -> Result<(), EditError> {
        if !self.rule.strings.contains(id) {
            return Err(EditError::StringNotFound(id.to_string()));
        }
        if self.rule.is_string_referenced(self.tokens, id) {
            return Err(EditError::StringInUse(id.to_string()));
        }
        for string in self.rule.strings.remove(id) {
            self.erase_line(string.first_token(), string.last_token())?;
        }
        if self.rule.strings.is_empty() {
            if let Some(section) = self.rule.strings_section.take() {
                self.erase_line(section.keyword, section.colon)?;
            }
        }
        Ok(())
    }

    /// Replaces the condition.
    pub fn set_condition(
        &mut self,
        condition: Detached<Expression>,
    ) -> Result<(), EditError> {
        let (mut new_tokens, mut condition) = condition.into_parts();
        let map = self.tokens.exchange(
            self.rule.condition.first_token(),
            self.rule.condition.last_token(),
            &mut new_tokens,
        )?;
        condition.remap(&map);
        self.rule.condition = condition;
        Ok(())
    }

    /// Rewrites the condition with a [`Modifier`].
    pub fn modify_condition<M: Modifier + ?Sized>(
        &mut self,
        modifier: &mut M,
    ) -> Result<(), EditError> {
        visitor::modify(&mut self.rule.condition, self.tokens, modifier)?;
        Ok(())
    }

    /// Erases the tokens from `first` to `last`, and the line break that
    /// follows them if any.
    fn erase_line(
        &mut self,
        first: TokenId,
        last: TokenId,
    ) -> Result<(), EditError> {
        let mut last = last;
        if let Some(next) = self.tokens.next(last) {
            if self.tokens.get(next).map(|t| t.kind())
                == Some(TokenKind::NewLine)
            {
                last = next;
            }
        }
        self.tokens.erase(first, last)?;
        Ok(())
    }
}

fn meta_value_kind(value: &Literal) -> TokenKind {
    match value.value() {
        LiteralValue::Bool(_) => TokenKind::BoolLiteral,
        LiteralValue::Int(_) | LiteralValue::UInt(_) => TokenKind::IntLiteral,
        LiteralValue::Float(_) => TokenKind::FloatLiteral,
        _ => TokenKind::StringLiteral,
    }
}

/// Creates the symbol of a rule, which is used when other rules refer to
/// it by name.
pub(crate) fn rule_symbol(name: &str) -> Rc<Symbol> {
    Rc::new(Symbol::value(name, ExprType::Bool))
}
