/*! Tokens and token streams.

Every piece of text in a YARA file, including comments and newlines, is
represented by a [`Token`] stored in a [`TokenStream`]. The syntax tree
doesn't store text at all, it holds [`TokenId`] handles to the tokens it was
built from. This makes it possible to modify the tree while preserving the
original formatting and comments around the modified parts.
*/

use crate::literal::Literal;
use crate::location::Location;

pub use kind::TokenKind;
pub use stream::*;

mod kind;
mod stream;

#[cfg(test)]
mod tests;

/// A token in a [`TokenStream`].
#[derive(Debug)]
pub struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) literal: Literal,
    pub(crate) location: Location,
    /// The token must be followed by a line break when the stream is
    /// formatted. Used by parentheses and hex strings that span multiple
    /// lines.
    pub(crate) force_newline: bool,
    /// Column where the token started in the source file. Only kept for
    /// comments, whose indentation is preserved in some cases.
    pub(crate) indentation: Option<usize>,
    /// Tokens of the included file, for `include` directives.
    pub(crate) sub_stream: Option<Box<TokenStream>>,
}

impl Token {
    pub fn new(kind: TokenKind, literal: Literal, location: Location) -> Self {
        Self {
            kind,
            literal,
            location,
            force_newline: false,
            indentation: None,
            sub_stream: None,
        }
    }

    /// Creates a token that doesn't come from any source file.
    pub fn synthetic(kind: TokenKind, literal: Literal) -> Self {
        Self::new(kind, literal, Location::default())
    }

    /// Creates a synthetic token for a kind with a fixed text, like
    /// keywords and operators. Kinds without a fixed text get an empty
    /// string as their literal.
    pub fn fixed(kind: TokenKind) -> Self {
        Self::synthetic(
            kind,
            Literal::escaped_string(kind.fixed_text().unwrap_or_default()),
        )
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn literal(&self) -> &Literal {
        &self.literal
    }

    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[inline]
    pub fn force_newline(&self) -> bool {
        self.force_newline
    }

    #[inline]
    pub fn sub_stream(&self) -> Option<&TokenStream> {
        self.sub_stream.as_deref()
    }

    pub(crate) fn set_kind(&mut self, kind: TokenKind) {
        self.kind = kind;
    }

    pub(crate) fn set_literal(&mut self, literal: Literal) {
        self.literal = literal;
    }

    pub(crate) fn set_force_newline(&mut self, yes: bool) {
        self.force_newline = yes;
    }

    pub(crate) fn with_indentation(mut self, column: usize) -> Self {
        self.indentation = Some(column);
        self
    }
}

/// A syntax node together with the tokens it refers to, living in a stream
/// of their own.
///
/// Builders produce detached nodes. Attaching the node moves its tokens into
/// the target stream and updates the handles held by the node.
#[derive(Debug)]
pub struct Detached<T> {
    pub(crate) tokens: TokenStream,
    pub(crate) node: T,
}

impl<T: Remap> Detached<T> {
    pub fn new(tokens: TokenStream, node: T) -> Self {
        Self { tokens, node }
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn node(&self) -> &T {
        &self.node
    }

    pub fn into_parts(self) -> (TokenStream, T) {
        (self.tokens, self.node)
    }

    /// Creates a detached copy of a node whose tokens go from `first` to
    /// `last` in `tokens`. The original node is left untouched.
    pub fn copy_of(
        node: &T,
        first: TokenId,
        last: TokenId,
        tokens: &TokenStream,
    ) -> Result<Self, TokenStreamError>
    where
        T: Clone,
    {
        let (copy, map) = tokens.copy_range(first, last)?;
        let mut node = node.clone();
        node.remap(&map);
        Ok(Self { tokens: copy, node })
    }

    /// Moves the tokens into `target`, right before `before` or at the end
    /// if `before` is `None`, and returns the node with its handles
    /// pointing to `target`.
    pub fn attach(
        self,
        target: &mut TokenStream,
        before: Option<TokenId>,
    ) -> Result<T, TokenStreamError> {
        let Detached { mut tokens, mut node } = self;
        let map = target.move_all_before(before, &mut tokens)?;
        node.remap(&map);
        Ok(node)
    }
}
