use std::path::PathBuf;
use std::rc::Rc;

use crate::location::Location;
use crate::parser::ParserError;
use crate::tokenizer::Tokenizer;
use crate::tokens::{TokenId, TokenKind, TokenStream};

/// The tokens of a source file being parsed, and the parser's position
/// within them.
///
/// The whole file is tokenized up front. The grammar only looks at the
/// significant tokens, comments and newlines stay in the stream untouched.
pub(crate) struct FileContext {
    pub tokens: TokenStream,
    significant: Vec<TokenId>,
    pos: usize,
    /// Path of the file, `None` for sources that don't come from a file.
    pub path: Option<PathBuf>,
}

impl FileContext {
    pub fn new(
        source: &[u8],
        path: Option<PathBuf>,
    ) -> Result<Self, ParserError> {
        let name: Option<Rc<str>> =
            path.as_ref().map(|p| Rc::from(p.to_string_lossy().as_ref()));
        let mut tokenizer = Tokenizer::new(source, name);
        let mut tokens = TokenStream::new();
        let mut significant = Vec::new();
        while let Some(token) = tokenizer.next_token() {
            let token = token?;
            let trivia = token.kind().is_trivia();
            let id = tokens.push_back(token);
            if !trivia {
                significant.push(id);
            }
        }
        Ok(Self { tokens, significant, pos: 0, path })
    }

    /// The `n`-th significant token from the current position.
    #[inline]
    pub fn peek_id(&self, n: usize) -> Option<TokenId> {
        self.significant.get(self.pos + n).copied()
    }

    #[inline]
    pub fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.peek_id(n).and_then(|id| self.tokens.get(id)).map(|t| t.kind())
    }

    /// Moves past the current significant token and returns it.
    pub fn advance(&mut self) -> Option<TokenId> {
        let id = self.peek_id(0)?;
        self.pos += 1;
        Some(id)
    }

    pub fn location(&self, id: TokenId) -> Location {
        self.tokens.get(id).map(|t| t.location().clone()).unwrap_or_default()
    }

    /// Location used for errors found at the end of the file.
    pub fn end_location(&self) -> Location {
        match self.tokens.last() {
            Some(last) => self.location(last),
            None => Location::default(),
        }
    }

    /// True if a line break follows `id` before the next significant token.
    /// Comments in between are ignored.
    pub fn newline_after(&self, id: TokenId) -> bool {
        let mut next = self.tokens.next(id);
        while let Some(current) = next {
            match self.tokens.get(current).map(|t| t.kind()) {
                Some(TokenKind::NewLine) => return true,
                Some(kind) if kind.is_comment() => {}
                _ => return false,
            }
            next = self.tokens.next(current);
        }
        false
    }

    /// True if there's a line break anywhere between `first` and `last`.
    pub fn spans_lines(&self, first: TokenId, last: TokenId) -> bool {
        match self.tokens.range(first, last) {
            Ok(mut range) => {
                range.any(|(_, t)| t.kind() == TokenKind::NewLine)
            }
            Err(_) => false,
        }
    }
}
