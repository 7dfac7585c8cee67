use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::literal::{Literal, LiteralValue};
use crate::tokens::{Token, TokenKind};

static NEXT_STREAM_ID: AtomicU32 = AtomicU32::new(0);

/// Identifies a [`TokenStream`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u32);

/// A handle to a token stored in a [`TokenStream`].
///
/// Handles remain valid while the token stays in its stream, no matter how
/// many tokens are inserted or removed around it. A handle to a token that
/// was erased, or that was moved into another stream, is detected as stale
/// instead of silently pointing to a different token.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId {
    stream: StreamId,
    index: u32,
    generation: u32,
}

impl TokenId {
    /// The stream the token belongs to.
    #[inline]
    pub fn stream(&self) -> StreamId {
        self.stream
    }
}

impl Debug for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}:{}.{}", self.stream.0, self.index, self.generation)
    }
}

/// Errors returned by operations that receive token handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenStreamError {
    #[error("token {0:?} is not part of this stream")]
    InvalidHandle(TokenId),

    #[error("token {last:?} doesn't follow {first:?}")]
    InvalidRange { first: TokenId, last: TokenId },
}

/// Maps the handles tokens had in their old stream to the handles they got
/// after being moved into a new one.
#[derive(Default, Debug)]
pub struct TokenMap {
    map: FxHashMap<TokenId, TokenId>,
}

impl TokenMap {
    #[inline]
    pub fn get(&self, old: TokenId) -> Option<TokenId> {
        self.map.get(&old).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Implemented by everything holding token handles, so that the handles can
/// be updated when the tokens move to a different stream.
pub trait Remap {
    fn remap(&mut self, map: &TokenMap);
}

impl Remap for TokenId {
    fn remap(&mut self, map: &TokenMap) {
        if let Some(new) = map.get(*self) {
            *self = new;
        }
    }
}

impl<T: Remap> Remap for Option<T> {
    fn remap(&mut self, map: &TokenMap) {
        if let Some(inner) = self {
            inner.remap(map)
        }
    }
}

impl<T: Remap> Remap for Vec<T> {
    fn remap(&mut self, map: &TokenMap) {
        for item in self {
            item.remap(map)
        }
    }
}

impl<T: Remap> Remap for Box<T> {
    fn remap(&mut self, map: &TokenMap) {
        self.as_mut().remap(map)
    }
}

struct Slot {
    generation: u32,
    token: Option<Token>,
    prev: Option<u32>,
    next: Option<u32>,
}

/// An ordered sequence of tokens.
///
/// Tokens live in an arena and are chained in order, which makes inserting
/// and erasing tokens at any position cheap while keeping the handles of the
/// remaining tokens valid. Every rule, string and expression in a
/// [`crate::YaraFile`] refers to ranges of tokens in a stream, and their
/// text is always derived from these tokens.
///
/// Tokens corresponding to `include` directives may own a nested stream with
/// the tokens of the included file. Handles to tokens in nested streams are
/// accepted by [`TokenStream::get`] and [`TokenStream::text`].
pub struct TokenStream {
    id: StreamId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    /// Slots holding tokens that own a nested stream.
    nested: Vec<u32>,
}

impl Default for TokenStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TokenStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.iter().map(|(_, t)| (t.kind(), self.literal_text(t))),
            )
            .finish()
    }
}

impl TokenStream {
    pub fn new() -> Self {
        Self {
            id: StreamId(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed)),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            nested: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Number of tokens in the stream, not counting nested streams.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn first(&self) -> Option<TokenId> {
        self.head.map(|index| self.handle(index))
    }

    #[inline]
    pub fn last(&self) -> Option<TokenId> {
        self.tail.map(|index| self.handle(index))
    }

    /// True if `id` refers to a token currently stored in this stream. Tokens
    /// in nested streams are not taken into account.
    pub fn contains(&self, id: TokenId) -> bool {
        self.slot_index(id).is_some()
    }

    /// Returns the token following `id`, which may be in a nested stream.
    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        let stream = self.owner(id.stream)?;
        let index = stream.slot_index(id)?;
        stream.slots[index as usize].next.map(|next| stream.handle(next))
    }

    /// Returns the token preceding `id`, which may be in a nested stream.
    pub fn prev(&self, id: TokenId) -> Option<TokenId> {
        let stream = self.owner(id.stream)?;
        let index = stream.slot_index(id)?;
        stream.slots[index as usize].prev.map(|prev| stream.handle(prev))
    }

    /// Returns the token identified by `id`, looking into nested streams if
    /// the token is not in this one.
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        let stream = self.owner(id.stream)?;
        let index = stream.slot_index(id)?;
        stream.slots[index as usize].token.as_ref()
    }

    /// Mutable version of [`TokenStream::get`].
    pub fn get_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        let stream = self.owner_mut(id.stream)?;
        let index = stream.slot_index(id)?;
        stream.slots[index as usize].token.as_mut()
    }

    /// Returns the stream identified by `id`, which can be this stream or
    /// any of its nested streams.
    pub fn owner(&self, id: StreamId) -> Option<&TokenStream> {
        if self.id == id {
            return Some(self);
        }
        self.nested_streams().find_map(|stream| stream.owner(id))
    }

    /// Mutable version of [`TokenStream::owner`].
    pub fn owner_mut(&mut self, id: StreamId) -> Option<&mut TokenStream> {
        if self.id == id {
            return Some(self);
        }
        let index = self.nested.iter().copied().find(|&index| {
            self.sub_stream_at(index)
                .map_or(false, |stream| stream.owner(id).is_some())
        })?;
        self.slots[index as usize]
            .token
            .as_mut()?
            .sub_stream
            .as_deref_mut()?
            .owner_mut(id)
    }

    /// Iterates over the streams nested in this one, not recursively.
    pub fn nested_streams(&self) -> impl Iterator<Item = &TokenStream> + '_ {
        self.nested.iter().filter_map(|&index| self.sub_stream_at(index))
    }

    /// Iterates over the tokens in this stream, in order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stream: self, current: self.head, last: None, done: false }
    }

    /// Iterates over the tokens from `first` to `last`, both included. The
    /// range may be in a nested stream.
    pub fn range(
        &self,
        first: TokenId,
        last: TokenId,
    ) -> Result<Iter<'_>, TokenStreamError> {
        let stream = self
            .owner(first.stream)
            .ok_or(TokenStreamError::InvalidHandle(first))?;
        let first_index = stream.checked_index(first)?;
        let last_index = stream.checked_index(last)?;
        Ok(Iter {
            stream,
            current: Some(first_index),
            last: Some(last_index),
            done: false,
        })
    }

    /// Handles of the tokens from `first` to `last`, both included.
    pub fn range_ids(
        &self,
        first: TokenId,
        last: TokenId,
    ) -> Result<Vec<TokenId>, TokenStreamError> {
        let ids: Vec<TokenId> =
            self.range(first, last)?.map(|(id, _)| id).collect();
        if ids.last() != Some(&last) {
            return Err(TokenStreamError::InvalidRange { first, last });
        }
        Ok(ids)
    }

    /// Appends a token at the end of the stream.
    pub fn push_back(&mut self, token: Token) -> TokenId {
        let index = self.allocate(token);
        self.link_before(index, None);
        self.handle(index)
    }

    /// Inserts a token right before `before`.
    pub fn insert_before(
        &mut self,
        before: TokenId,
        token: Token,
    ) -> Result<TokenId, TokenStreamError> {
        if before.stream != self.id {
            return self
                .owner_mut(before.stream)
                .ok_or(TokenStreamError::InvalidHandle(before))?
                .insert_before(before, token);
        }
        let before = self.checked_index(before)?;
        let index = self.allocate(token);
        self.link_before(index, Some(before));
        Ok(self.handle(index))
    }

    /// Inserts a token right after `after`.
    pub fn insert_after(
        &mut self,
        after: TokenId,
        token: Token,
    ) -> Result<TokenId, TokenStreamError> {
        if after.stream != self.id {
            return self
                .owner_mut(after.stream)
                .ok_or(TokenStreamError::InvalidHandle(after))?
                .insert_after(after, token);
        }
        let after = self.checked_index(after)?;
        let next = self.slots[after as usize].next;
        let index = self.allocate(token);
        self.link_before(index, next);
        Ok(self.handle(index))
    }

    /// Removes the tokens from `first` to `last`, both included. The tokens
    /// may belong to a nested stream, but both must belong to the same one.
    ///
    /// Tokens outside the range that are aliases of erased tokens take a
    /// copy of the literal they were pointing to.
    pub fn erase(
        &mut self,
        first: TokenId,
        last: TokenId,
    ) -> Result<(), TokenStreamError> {
        let ids = self
            .owner(first.stream)
            .ok_or(TokenStreamError::InvalidHandle(first))?
            .range_ids(first, last)?;
        let erased: FxHashSet<TokenId> = ids.iter().copied().collect();
        self.detach_aliases_to(&erased);
        let owner = self
            .owner_mut(first.stream)
            .ok_or(TokenStreamError::InvalidHandle(first))?;
        for id in ids {
            owner.take(id);
        }
        Ok(())
    }

    /// Removes a single token.
    pub fn erase_one(&mut self, id: TokenId) -> Result<(), TokenStreamError> {
        self.erase(id, id)
    }

    /// Returns the literal of a token, following aliases.
    pub fn resolve(&self, id: TokenId) -> Option<&Literal> {
        let mut literal = self.get(id)?.literal();
        // Aliases always point to tokens that are not aliases themselves,
        // the bound only protects from corrupted streams.
        for _ in 0..8 {
            match literal.value() {
                LiteralValue::Alias(target) => {
                    literal = self.get(*target)?.literal();
                }
                _ => return Some(literal),
            }
        }
        None
    }

    /// Returns the text of a token as it must appear in source code.
    pub fn text(&self, id: TokenId) -> String {
        match self.get(id) {
            Some(token) => self.literal_text(token),
            None => String::new(),
        }
    }

    pub(crate) fn literal_text(&self, token: &Token) -> String {
        let text = match token.literal().value() {
            LiteralValue::Alias(target) => {
                self.resolve(*target).map(|l| l.text()).unwrap_or_default()
            }
            _ => token.literal().text(),
        };
        match token.kind() {
            TokenKind::StringLiteral => format!("\"{}\"", text),
            TokenKind::StringCount => with_sigil('#', &text),
            TokenKind::StringOffset => with_sigil('@', &text),
            TokenKind::StringLength => with_sigil('!', &text),
            _ => text,
        }
    }

    /// Creates a token whose literal aliases the one of `target`.
    ///
    /// If `target` is itself an alias, the new token points to the final
    /// target, so that chains of aliases are never formed.
    pub fn alias_of(&self, target: TokenId) -> Literal {
        match self.get(target).map(|t| t.literal().value()) {
            Some(LiteralValue::Alias(final_target)) => {
                Literal::alias(*final_target)
            }
            _ => Literal::alias(target),
        }
    }

    /// Attaches the stream of an included file to the token of the
    /// `include` directive.
    pub fn attach_sub_stream(
        &mut self,
        id: TokenId,
        stream: TokenStream,
    ) -> Result<(), TokenStreamError> {
        let index = self.checked_index(id)?;
        if let Some(token) = self.slots[index as usize].token.as_mut() {
            token.sub_stream = Some(Box::new(stream));
        }
        if !self.nested.contains(&index) {
            self.nested.push(index);
        }
        Ok(())
    }

    /// Moves the tokens from `first` to `last` out of `other` and inserts
    /// them into this stream right before `before`, or at the end if
    /// `before` is `None`.
    ///
    /// The returned map translates the handles the tokens had in `other` to
    /// their new handles in this stream.
    pub fn move_range_before(
        &mut self,
        before: Option<TokenId>,
        other: &mut TokenStream,
        first: TokenId,
        last: TokenId,
    ) -> Result<TokenMap, TokenStreamError> {
        let before = before.map(|b| self.checked_index(b)).transpose()?;
        let ids = other.range_ids(first, last)?;
        let moved: FxHashSet<TokenId> = ids.iter().copied().collect();

        // Aliases that cross the boundary of the moved range can't survive
        // the move, the tokens take a copy of the aliased literal instead.
        for &id in &ids {
            let target = match other.get(id).map(|t| t.literal().value()) {
                Some(LiteralValue::Alias(target))
                    if !moved.contains(target) =>
                {
                    *target
                }
                _ => continue,
            };
            let copy = other.resolve(target).cloned();
            if let (Some(copy), Some(token)) = (copy, other.get_mut(id)) {
                token.literal = copy;
            }
        }
        other.detach_aliases_to(&moved);

        let mut map = TokenMap::default();
        for id in ids {
            let nested_stream = other.nested_position(id);
            let token = match other.take(id) {
                Some(token) => token,
                None => continue,
            };
            let index = self.allocate(token);
            self.link_before(index, before);
            if nested_stream {
                self.nested.push(index);
            }
            map.map.insert(id, self.handle(index));
        }

        for new_id in map.map.values().copied().collect::<Vec<_>>() {
            if let Some(token) = self.get_mut(new_id) {
                if let LiteralValue::Alias(target) = token.literal().value() {
                    if let Some(new_target) = map.get(*target) {
                        token.literal = Literal::alias(new_target);
                    }
                }
            }
        }

        Ok(map)
    }

    /// Creates a new stream with a copy of the tokens from `first` to `last`.
    ///
    /// Aliases between copied tokens point to the copies. Aliases to tokens
    /// outside the range keep pointing to the original tokens.
    pub fn copy_range(
        &self,
        first: TokenId,
        last: TokenId,
    ) -> Result<(TokenStream, TokenMap), TokenStreamError> {
        let mut copy = TokenStream::new();
        let mut map = TokenMap::default();
        for (id, token) in self.range(first, last)? {
            let new_id = copy.push_back(Token {
                kind: token.kind,
                literal: token.literal.clone(),
                location: token.location.clone(),
                force_newline: token.force_newline,
                indentation: token.indentation,
                sub_stream: None,
            });
            map.map.insert(id, new_id);
        }
        if map.get(last).is_none() {
            return Err(TokenStreamError::InvalidRange { first, last });
        }
        for new_id in map.map.values().copied().collect::<Vec<_>>() {
            if let Some(token) = copy.get_mut(new_id) {
                if let LiteralValue::Alias(target) = token.literal().value() {
                    if let Some(new_target) = map.get(*target) {
                        token.literal = Literal::alias(new_target);
                    }
                }
            }
        }
        Ok((copy, map))
    }

    /// Moves every token of `other` into this stream, right before `before`
    /// or at the end if `before` is `None`.
    pub fn move_all_before(
        &mut self,
        before: Option<TokenId>,
        other: &mut TokenStream,
    ) -> Result<TokenMap, TokenStreamError> {
        // Moved line breaks take the newline sequence of this stream.
        if let Some(newline) = self.first_newline() {
            other.set_newlines(newline);
        }
        match (other.first(), other.last()) {
            (Some(first), Some(last)) => {
                self.move_range_before(before, other, first, last)
            }
            _ => Ok(TokenMap::default()),
        }
    }

    /// Replaces the tokens from `first` to `last` with every token in
    /// `other`, which ends up empty.
    ///
    /// This is how a node built on its own stream takes the place of an
    /// existing node: after the exchange the new node's tokens are in this
    /// stream, at the position the old tokens were, and the old tokens are
    /// gone.
    pub fn exchange(
        &mut self,
        first: TokenId,
        last: TokenId,
        other: &mut TokenStream,
    ) -> Result<TokenMap, TokenStreamError> {
        self.range_ids(first, last)?;
        let map = self.move_all_before(Some(first), other)?;
        self.erase(first, last)?;
        Ok(map)
    }

    /// The newline sequence used by this stream, `\n` if it has no newlines.
    pub(crate) fn newline_text(&self) -> &str {
        self.first_newline().unwrap_or("\n")
    }

    /// A line break token that uses the newline sequence of this stream.
    pub(crate) fn newline(&self) -> Token {
        Token::synthetic(
            TokenKind::NewLine,
            Literal::escaped_string(self.newline_text()),
        )
    }

    fn first_newline(&self) -> Option<&str> {
        self.iter()
            .find(|(_, t)| t.kind() == TokenKind::NewLine)
            .and_then(|(_, t)| t.literal().as_str())
    }

    fn set_newlines(&mut self, newline: &str) {
        for slot in &mut self.slots {
            if let Some(token) = slot.token.as_mut() {
                if token.kind() == TokenKind::NewLine {
                    token.set_literal(Literal::escaped_string(newline));
                }
            }
        }
    }
}

impl TokenStream {
    #[inline]
    fn handle(&self, index: u32) -> TokenId {
        TokenId {
            stream: self.id,
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    fn slot_index(&self, id: TokenId) -> Option<u32> {
        if id.stream != self.id {
            return None;
        }
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation == id.generation && slot.token.is_some() {
            Some(id.index)
        } else {
            None
        }
    }

    fn checked_index(&self, id: TokenId) -> Result<u32, TokenStreamError> {
        self.slot_index(id).ok_or(TokenStreamError::InvalidHandle(id))
    }

    fn allocate(&mut self, token: Token) -> u32 {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.token = Some(token);
                slot.prev = None;
                slot.next = None;
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    token: Some(token),
                    prev: None,
                    next: None,
                });
                (self.slots.len() - 1) as u32
            }
        }
    }

    /// Links the slot `index` right before `before`, or at the end.
    fn link_before(&mut self, index: u32, before: Option<u32>) {
        let prev = match before {
            Some(before) => self.slots[before as usize].prev,
            None => self.tail,
        };
        self.slots[index as usize].prev = prev;
        self.slots[index as usize].next = before;
        match prev {
            Some(prev) => self.slots[prev as usize].next = Some(index),
            None => self.head = Some(index),
        }
        match before {
            Some(before) => self.slots[before as usize].prev = Some(index),
            None => self.tail = Some(index),
        }
    }

    /// Unlinks a token and frees its slot.
    fn take(&mut self, id: TokenId) -> Option<Token> {
        let index = self.slot_index(id)?;
        let (prev, next) = {
            let slot = &self.slots[index as usize];
            (slot.prev, slot.next)
        };
        match prev {
            Some(prev) => self.slots[prev as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next as usize].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[index as usize];
        let token = slot.token.take();
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = None;
        slot.next = None;
        self.free.push(index);
        self.nested.retain(|&n| n != index);
        self.len -= 1;
        token
    }

    fn nested_position(&self, id: TokenId) -> bool {
        self.slot_index(id).map_or(false, |index| self.nested.contains(&index))
    }

    fn sub_stream_at(&self, index: u32) -> Option<&TokenStream> {
        self.slots[index as usize].token.as_ref()?.sub_stream.as_deref()
    }

    /// Calls `f` for every token in this stream and in its nested streams.
    fn for_each_deep<'a>(&'a self, f: &mut dyn FnMut(TokenId, &'a Token)) {
        for (id, token) in self.iter() {
            f(id, token);
            if let Some(sub_stream) = token.sub_stream.as_deref() {
                sub_stream.for_each_deep(f);
            }
        }
    }

    /// Tokens that are aliases of any of the `targets` get a copy of the
    /// aliased literal. Nested streams are updated too.
    fn detach_aliases_to(&mut self, targets: &FxHashSet<TokenId>) {
        let mut copies = Vec::new();
        self.for_each_deep(&mut |id, token| {
            if targets.contains(&id) {
                return;
            }
            if let LiteralValue::Alias(target) = token.literal().value() {
                if targets.contains(target) {
                    copies.push((id, *target));
                }
            }
        });
        for (id, target) in copies {
            let literal = self.resolve(target).cloned();
            if let (Some(literal), Some(token)) = (literal, self.get_mut(id)) {
                token.literal = literal;
            }
        }
    }
}

fn with_sigil(sigil: char, text: &str) -> String {
    let mut chars = text.chars();
    chars.next();
    format!("{}{}", sigil, chars.as_str())
}

/// Iterator over the tokens of a [`TokenStream`].
pub struct Iter<'a> {
    stream: &'a TokenStream,
    current: Option<u32>,
    last: Option<u32>,
    done: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (TokenId, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let index = self.current?;
        let slot = &self.stream.slots[index as usize];
        if Some(index) == self.last {
            self.done = true;
        }
        self.current = slot.next;
        let token = slot.token.as_ref()?;
        Some((self.stream.handle(index), token))
    }
}
