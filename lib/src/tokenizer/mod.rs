/*! Implements the YARA tokenizer.

The tokenizer takes YARA source code and produces the sequence of [`Token`]s
that the parser stores in a [`crate::tokens::TokenStream`]. Unlike tokenizers
that only feed a grammar, this one doesn't discard anything but whitespace:
comments and newlines are tokens too, because they must survive a round trip
through the parser and the formatter.
*/

use std::rc::Rc;

use logos::Logos;

use crate::literal::Literal;
use crate::location::{Location, Position};
use crate::parser::{ErrorInfo, ParserError};
use crate::tokens::{Token, TokenKind};

#[cfg(test)]
mod tests;

/// Takes YARA source code and produces a sequence of tokens.
///
/// The tokenizer has three modes of operation: normal mode, hex pattern mode,
/// and hex jump mode.
///
/// In normal mode the tokenizer recognizes most of the tokens in YARA's
/// syntax, like keywords, identifiers, string literals, etc. In hex pattern
/// mode, the tokenizer only recognizes the tokens that can appear in a hex
/// pattern, and in hex jump mode only the tokens that can appear inside a
/// hex jump. This is necessary because `a0` is an identifier in normal mode
/// but a byte in hex pattern mode, and `10` is an integer in normal mode but
/// a byte in hex pattern mode.
///
/// An opening brace that follows an equal sign starts a hex pattern, as in
/// `$a = { 01 02 }`, so the tokenizer switches modes on its own. The closing
/// brace returns to normal mode. Inside a hex pattern, `[` enters hex jump
/// mode and `]` goes back to hex pattern mode.
///
/// The input doesn't need to be valid UTF-8. Invalid bytes inside string
/// literals, regular expressions and comments are kept as `\xNN` escape
/// sequences. Anywhere else they produce an error.
pub(crate) struct Tokenizer<'src> {
    source: &'src [u8],
    mode: Mode<'src>,
    /// Absolute offset within the source code where the current lexer
    /// started. The spans reported by the lexer are relative to it.
    lexer_starting_pos: usize,
    /// Offset and position right after the last token returned.
    offset: usize,
    position: Position,
    file: Option<Rc<str>>,
    last_significant: Option<TokenKind>,
}

impl<'src> Tokenizer<'src> {
    /// Creates a new [`Tokenizer`]. `file` is the name used in the locations
    /// of the returned tokens.
    pub fn new(source: &'src [u8], file: Option<Rc<str>>) -> Self {
        Self {
            source,
            mode: Mode::Normal(Logos::lexer(source)),
            lexer_starting_pos: 0,
            offset: 0,
            position: Position::default(),
            file,
            last_significant: None,
        }
    }

    /// Returns the next token, or `None` at the end of the input.
    pub fn next_token(&mut self) -> Option<Result<Token, ParserError>> {
        let (kind, span) = loop {
            let base = self.lexer_starting_pos;
            match &mut self.mode {
                Mode::Normal(lexer) => match lexer.next()? {
                    Ok(NormalToken::Whitespace) => continue,
                    Ok(token) => {
                        break (
                            convert_normal_token(token),
                            absolute(lexer.span(), base),
                        );
                    }
                    Err(()) => {
                        break (
                            TokenKind::Unknown,
                            absolute(lexer.span(), base),
                        );
                    }
                },
                Mode::HexPattern(lexer) => match lexer.next()? {
                    Ok(HexPatternToken::Whitespace) => continue,
                    Ok(token) => {
                        break (
                            convert_hex_pattern_token(token),
                            absolute(lexer.span(), base),
                        );
                    }
                    Err(()) => {
                        // Something that can't appear in a hex pattern,
                        // switch back to normal mode and try again from the
                        // position where it was found.
                        let start = lexer.span().start;
                        self.restart(start, Mode::normal);
                    }
                },
                Mode::HexJump(lexer) => match lexer.next()? {
                    Ok(HexJumpToken::Whitespace) => continue,
                    Ok(token) => {
                        break (
                            convert_hex_jump_token(token),
                            absolute(lexer.span(), base),
                        );
                    }
                    Err(()) => {
                        let start = lexer.span().start;
                        self.restart(start, Mode::hex_pattern);
                    }
                },
            }
        };

        let kind = match kind {
            TokenKind::LBrace
                if self.last_significant == Some(TokenKind::Assign) =>
            {
                TokenKind::HexStart
            }
            TokenKind::Unknown => {
                let span = self.extend_unknown(span.0);
                return Some(Err(self.unknown_token(span)));
            }
            kind => kind,
        };

        // Switch modes if needed. The new lexer starts right after the
        // current token.
        match kind {
            TokenKind::HexStart | TokenKind::HexJumpRight => {
                self.restart_at(span.1, Mode::hex_pattern)
            }
            TokenKind::HexJumpLeft => self.restart_at(span.1, Mode::hex_jump),
            TokenKind::HexEnd => self.restart_at(span.1, Mode::normal),
            _ => {}
        }

        if !kind.is_trivia() {
            self.last_significant = Some(kind);
        }

        Some(self.make_token(kind, span))
    }
}

impl<'src> Tokenizer<'src> {
    /// Restarts lexing at `relative_start`, which is relative to the current
    /// lexer, using a lexer of a different mode.
    fn restart(
        &mut self,
        relative_start: usize,
        mode: fn(&'src [u8]) -> Mode<'src>,
    ) {
        let start = self.lexer_starting_pos + relative_start;
        self.restart_at(start, mode);
    }

    fn restart_at(
        &mut self,
        start: usize,
        mode: fn(&'src [u8]) -> Mode<'src>,
    ) {
        self.lexer_starting_pos = start;
        self.mode = mode(&self.source[start..]);
    }

    /// Unknown tokens extend up to the next whitespace, so that the error
    /// shows something meaningful. The lexer is moved past them.
    fn extend_unknown(&mut self, start: usize) -> (usize, usize) {
        let end = self.source[start..]
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .map_or(self.source.len(), |len| start + len.max(1));
        self.restart_at(end, Mode::normal);
        (start, end)
    }

    fn location(&mut self, span: (usize, usize)) -> Location {
        let begin = self.position.after(&self.source[self.offset..span.0]);
        let after = begin.after(&self.source[span.0..span.1]);
        let end = if after.line == begin.line {
            Position {
                line: begin.line,
                column: after.column.saturating_sub(1),
            }
        } else {
            begin
        };
        self.offset = span.1;
        self.position = after;
        Location::new(self.file.clone(), begin, end.max(begin))
    }

    fn unknown_token(&mut self, span: (usize, usize)) -> ParserError {
        let text = lossless_text(&self.source[span.0..span.1]);
        let location = self.location(span);
        ParserError::new(ErrorInfo::UnknownToken { text }, location)
    }

    fn make_token(
        &mut self,
        kind: TokenKind,
        span: (usize, usize),
    ) -> Result<Token, ParserError> {
        let source = self.source;
        let bytes = &source[span.0..span.1];
        let location = self.location(span);

        let literal = match kind {
            TokenKind::StringLiteral => {
                let inner = &bytes[1..bytes.len() - 1];
                Literal::escaped_string(lossless_text(inner))
            }
            TokenKind::Regexp
            | TokenKind::Comment
            | TokenKind::OneLineComment => {
                Literal::escaped_string(lossless_text(bytes))
            }
            TokenKind::IntLiteral => {
                // Integers are always ASCII, the regexps that match them
                // guarantee it.
                let text = String::from_utf8_lossy(bytes);
                parse_integer(&text).ok_or_else(|| {
                    ParserError::new(
                        ErrorInfo::IntegerOutOfRange {
                            text: text.to_string(),
                        },
                        location.clone(),
                    )
                })?
            }
            TokenKind::FloatLiteral => {
                let text = String::from_utf8_lossy(bytes);
                let value = text.parse::<f64>().map_err(|_| {
                    ParserError::new(
                        ErrorInfo::UnknownToken { text: text.to_string() },
                        location.clone(),
                    )
                })?;
                Literal::float(value).with_formatted(text)
            }
            TokenKind::BoolLiteral => Literal::bool(bytes == b"true"),
            _ => Literal::escaped_string(lossless_text(bytes)),
        };

        let column = location.begin().column;
        let token = Token::new(kind, literal, location);
        if kind.is_comment() {
            return Ok(token.with_indentation(column - 1));
        }
        Ok(token)
    }
}

fn absolute(span: logos::Span, base: usize) -> (usize, usize) {
    (span.start + base, span.end + base)
}

/// Parses an integer literal, which can be a decimal number optionally
/// followed by `KB` or `MB`, an hexadecimal number prefixed by `0x` or an
/// octal number prefixed by `0o`. The returned literal keeps the original
/// text unless it is the plain decimal representation of the value.
pub(crate) fn parse_integer(text: &str) -> Option<Literal> {
    let value: u64 = if let Some(hex) = text.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = text.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()?
    } else if let Some(kb) = text.strip_suffix("KB") {
        kb.parse::<u64>().ok()?.checked_mul(1024)?
    } else if let Some(mb) = text.strip_suffix("MB") {
        mb.parse::<u64>().ok()?.checked_mul(1024 * 1024)?
    } else {
        text.parse::<u64>().ok()?
    };

    let literal = match i64::try_from(value) {
        Ok(value) => Literal::int(value),
        Err(_) => Literal::uint(value),
    };

    if text == value.to_string() {
        Some(literal)
    } else {
        Some(literal.with_formatted(text))
    }
}

/// Converts a sequence of bytes into a string, replacing the bytes that are
/// not valid UTF-8 with `\xNN` escape sequences.
fn lossless_text(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        result.push_str(chunk.valid());
        for b in chunk.invalid() {
            result.push_str(&format!("\\x{:02x}", b));
        }
    }
    result
}

/// True if `name` is lexed as a single identifier. Keywords are not
/// identifiers.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut lexer = NormalToken::lexer(name.as_bytes());
    matches!(lexer.next(), Some(Ok(NormalToken::Ident)))
        && lexer.span().len() == name.len()
}

/// Describes the current mode of operation for a tokenizer.
///
/// [`Tokenizer`] uses the [`logos`] crate under the hood for doing the actual
/// work. It uses three different logos lexers, one for each of the three
/// modes of operation: normal, hex pattern and hex jump.
enum Mode<'src> {
    Normal(logos::Lexer<'src, NormalToken>),
    HexPattern(logos::Lexer<'src, HexPatternToken>),
    HexJump(logos::Lexer<'src, HexJumpToken>),
}

impl<'src> Mode<'src> {
    fn normal(source: &'src [u8]) -> Self {
        Mode::Normal(Logos::lexer(source))
    }

    fn hex_pattern(source: &'src [u8]) -> Self {
        Mode::HexPattern(Logos::lexer(source))
    }

    fn hex_jump(source: &'src [u8]) -> Self {
        Mode::HexJump(Logos::lexer(source))
    }
}

/// Tokens recognized in normal mode.
#[derive(logos::Logos, Debug, PartialEq)]
#[logos(source = [u8])]
enum NormalToken {
    // Keywords
    #[token("all")]
    All,
    #[token("and")]
    And,
    #[token("any")]
    Any,
    #[token("ascii")]
    Ascii,
    #[token("at")]
    At,
    #[token("base64")]
    Base64,
    #[token("base64wide")]
    Base64Wide,
    #[token("condition")]
    Condition,
    #[token("contains")]
    Contains,
    #[token("defined")]
    Defined,
    #[token("endswith")]
    EndsWith,
    #[token("entrypoint")]
    Entrypoint,
    #[token("false")]
    False,
    #[token("filesize")]
    Filesize,
    #[token("for")]
    For,
    #[token("fullword")]
    Fullword,
    #[token("global")]
    Global,
    #[token("icontains")]
    IContains,
    #[token("iendswith")]
    IEndsWith,
    #[token("iequals")]
    IEquals,
    #[token("import")]
    Import,
    #[token("in")]
    In,
    #[token("include")]
    Include,
    #[token("istartswith")]
    IStartsWith,
    #[token("matches")]
    Matches,
    #[token("meta")]
    Meta,
    #[token("nocase")]
    Nocase,
    #[token("none")]
    None,
    #[token("not")]
    Not,
    #[token("of")]
    Of,
    #[token("or")]
    Or,
    #[token("private")]
    Private,
    #[token("rule")]
    Rule,
    #[token("startswith")]
    StartsWith,
    #[token("strings")]
    Strings,
    #[token("them")]
    Them,
    #[token("true")]
    True,
    #[token("wide")]
    Wide,
    #[token("xor")]
    Xor,

    // Bitwise
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,

    // Comparison
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Punctuation
    #[token("&")]
    Ampersand,
    #[token("*")]
    Asterisk,
    #[token("\\")]
    Backslash,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("..")]
    DoubleDot,
    #[token("=")]
    Equal,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("%")]
    Percent,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // String identifiers (i.e: $, $a, $b, $foo, $bar).
    #[regex(
        r#"(?x)                         # allow comments in the regexp
            \$                          # first character is $
            ([[:alpha:]]|\d|_)*         # any number of letters, digits, or _
        "#)
    ]
    StringIdent,

    // String wildcards (i.e: $*, $a*, $foo*).
    #[regex(
        r#"(?x)
            \$
            ([[:alpha:]]|\d|_)*
            \*                          # ends with *
        "#)
    ]
    StringWildcard,

    // String count (i.e: #a, #b, #foo, #bar).
    #[regex(
        r#"(?x)
            \#                          # first character is #
            ([[:alpha:]]|\d|_)*
        "#)
    ]
    StringCount,

    // String offset (i.e: @a, @b, @foo, @bar).
    #[regex(
        r#"(?x)
            @                           # first character is @
            ([[:alpha:]]|\d|_)*
        "#)
    ]
    StringOffset,

    // String length (i.e: !a, !b, !foo, !bar).
    #[regex(
        r#"(?x)
            !                           # first character is !
            ([[:alpha:]]|\d|_)*
        "#)
    ]
    StringLength,

    // Identifiers must start with underscore or letter, followed by any
    // number of underscores, letters, or digits.
    #[regex(
        r#"(?x)
            ([[:alpha:]]|_)             # first character is letter or _
            ([[:alpha:]]|\d|_)*         # any number of letters, digits, or _
        "#)
    ]
    Ident,

    // Float literals
    #[regex(
        r#"(?x)
            [0-9]+                      # one or more digits
            \.                          # a dot
            [0-9]+                      # one more digits
        "#)
    ]
    FloatLit,

    // Integer literals.
    #[regex(
        r#"(?x)
           (
             0x[a-fA-F0-9]+ |           # hexadecimal number
             0o[0-7]+       |           # octal number
             [0-9]+(KB|MB)?             # decimal number, optional KB or MB
           )
        "#)
    ]
    IntegerLit,

    // String literals start and ends with double quotes, in-between the
    // quotes they contain either an escape sequence, or anything that is not
    // a quote newline or backslash, including non UTF-8 characters.
    #[regex(
        r#"(?x)
        "                               # starts with double quotes
        (                               # any number of
          \\.                           #   escape sequence
          |                             #   or ..
          [^"\n\\]                      #   not a quote, newline or backslash
        )*
        "                               # ends with double quotes
        "#)
    ]
    StringLit,

    // Regular expression.
    #[regex(
        r#"(?x)
        /                               # starts with /
        (\\.|[^*/])                     # followed by escape sequence or
                                        # anything that is not * or /, so
                                        # that comments don't match.
        (                               # one or more..
          \\.                           #   escape sequence
          |                             #   or ..
          [^\\/\n]                      #   anything except \, / and newlines
        )*
        /                               # ends with /
        [[:alpha:]]{0,2}                # up to 2 modifiers like "s" and "i"
        "#)
    ]
    Regexp,

    // Block comment.
    #[regex(
        r#"(?x)
        /\*                            # starts with /*
        [^*]*                          # zero or more characters except *
        \*+                            # one or more *
        (                              # zero or more..
            [^/*]                      #   anything except / and *
            [^*]*                      #   zero or more characters except *
            \*+                        #   one or more *
        )*
        /                              # ends with /
        "#
    )]
    BlockComment,

    // Single-line comment
    #[regex(r#"//[^\n\r]*"#)]
    Comment,

    #[regex("[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r")]
    #[token("\r\n")]
    NewLine,
}

/// Tokens recognized in hex pattern mode.
#[derive(logos::Logos, Debug, PartialEq)]
#[logos(source = [u8])]
enum HexPatternToken {
    // A hex byte is an optional tilde ~, followed by two hex digits or
    // question marks. The following are valid tokens:
    //
    // 10, A0, ef, 3?, ?3, ??, ~AB, ~A?
    #[regex("~?[?0-9a-fA-F]{2}")]
    Byte,

    #[token("|")]
    Pipe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("}")]
    RBrace,

    #[regex("[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r")]
    #[token("\r\n")]
    NewLine,

    // Block comment.
    #[regex(r#"(?x)
        /\*                            # starts with /*
        (                              # one or more..
            [^*]                       #   anything except asterisk
            |                          #   or..
            \*[^/]                     #   asterisk not followed by /
        )*
        \*/                            # ends with */
        "#)
    ]
    BlockComment,

    // Single-line comment
    #[regex(r#"//[^\n\r]*"#)]
    Comment,
}

/// Tokens recognized in hex jump mode.
#[derive(logos::Logos, Debug, PartialEq)]
#[logos(source = [u8])]
enum HexJumpToken {
    #[token("-")]
    Hyphen,

    // Integer literals.
    #[regex(
        r#"(?x)
           (
             0x[a-fA-F0-9]+ |           # hexadecimal number
             0o[0-7]+       |           # octal number
             [0-9]+                     # decimal number
           )
        "#)
    ]
    IntegerLit,

    #[token("]")]
    RBracket,

    #[regex("[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r")]
    #[token("\r\n")]
    NewLine,
}

fn convert_normal_token(token: NormalToken) -> TokenKind {
    match token {
        // Keywords.
        NormalToken::All => TokenKind::All,
        NormalToken::And => TokenKind::And,
        NormalToken::Any => TokenKind::Any,
        NormalToken::Ascii => TokenKind::Ascii,
        NormalToken::At => TokenKind::At,
        NormalToken::Base64 => TokenKind::Base64,
        NormalToken::Base64Wide => TokenKind::Base64Wide,
        NormalToken::Condition => TokenKind::Condition,
        NormalToken::Contains => TokenKind::Contains,
        NormalToken::Defined => TokenKind::Defined,
        NormalToken::EndsWith => TokenKind::EndsWith,
        NormalToken::Entrypoint => TokenKind::Entrypoint,
        NormalToken::False | NormalToken::True => TokenKind::BoolLiteral,
        NormalToken::Filesize => TokenKind::Filesize,
        NormalToken::For => TokenKind::For,
        NormalToken::Fullword => TokenKind::Fullword,
        NormalToken::Global => TokenKind::Global,
        NormalToken::IContains => TokenKind::IContains,
        NormalToken::IEndsWith => TokenKind::IEndsWith,
        NormalToken::IEquals => TokenKind::IEquals,
        NormalToken::Import => TokenKind::Import,
        NormalToken::In => TokenKind::In,
        NormalToken::Include => TokenKind::Include,
        NormalToken::IStartsWith => TokenKind::IStartsWith,
        NormalToken::Matches => TokenKind::Matches,
        NormalToken::Meta => TokenKind::Meta,
        NormalToken::Nocase => TokenKind::Nocase,
        NormalToken::None => TokenKind::None,
        NormalToken::Not => TokenKind::Not,
        NormalToken::Of => TokenKind::Of,
        NormalToken::Or => TokenKind::Or,
        NormalToken::Private => TokenKind::Private,
        NormalToken::Rule => TokenKind::Rule,
        NormalToken::StartsWith => TokenKind::StartsWith,
        NormalToken::Strings => TokenKind::Strings,
        NormalToken::Them => TokenKind::Them,
        NormalToken::Wide => TokenKind::Wide,
        NormalToken::Xor => TokenKind::Xor,

        // Bitwise.
        NormalToken::Shl => TokenKind::ShiftLeft,
        NormalToken::Shr => TokenKind::ShiftRight,

        // Comparison.
        NormalToken::Eq => TokenKind::Eq,
        NormalToken::Ne => TokenKind::Neq,
        NormalToken::Lt => TokenKind::Lt,
        NormalToken::Gt => TokenKind::Gt,
        NormalToken::Le => TokenKind::Le,
        NormalToken::Ge => TokenKind::Ge,

        // Punctuation.
        NormalToken::Ampersand => TokenKind::BitwiseAnd,
        NormalToken::Asterisk => TokenKind::Multiply,
        NormalToken::Backslash => TokenKind::Divide,
        NormalToken::Caret => TokenKind::BitwiseXor,
        NormalToken::Comma => TokenKind::Comma,
        NormalToken::Colon => TokenKind::Colon,
        NormalToken::Dot => TokenKind::Dot,
        NormalToken::DoubleDot => TokenKind::DoubleDot,
        NormalToken::Equal => TokenKind::Assign,
        NormalToken::Minus => TokenKind::Minus,
        NormalToken::Percent => TokenKind::Modulo,
        NormalToken::Pipe => TokenKind::BitwiseOr,
        NormalToken::Plus => TokenKind::Plus,
        NormalToken::Tilde => TokenKind::BitwiseNot,

        NormalToken::LBrace => TokenKind::LBrace,
        NormalToken::RBrace => TokenKind::RBrace,
        NormalToken::LParen => TokenKind::LParen,
        NormalToken::RParen => TokenKind::RParen,
        NormalToken::LBracket => TokenKind::LSqb,
        NormalToken::RBracket => TokenKind::RSqb,

        NormalToken::StringIdent => TokenKind::StringId,
        NormalToken::StringWildcard => TokenKind::StringIdWildcard,
        NormalToken::StringCount => TokenKind::StringCount,
        NormalToken::StringOffset => TokenKind::StringOffset,
        NormalToken::StringLength => TokenKind::StringLength,
        NormalToken::Ident => TokenKind::Ident,
        NormalToken::FloatLit => TokenKind::FloatLiteral,
        NormalToken::IntegerLit => TokenKind::IntLiteral,
        NormalToken::StringLit => TokenKind::StringLiteral,
        NormalToken::Regexp => TokenKind::Regexp,
        NormalToken::BlockComment => TokenKind::Comment,
        NormalToken::Comment => TokenKind::OneLineComment,
        NormalToken::NewLine => TokenKind::NewLine,
        NormalToken::Whitespace => unreachable!(),
    }
}

fn convert_hex_pattern_token(token: HexPatternToken) -> TokenKind {
    match token {
        HexPatternToken::Byte => TokenKind::HexByte,
        HexPatternToken::Pipe => TokenKind::HexAltOr,
        HexPatternToken::LParen => TokenKind::HexAltLeft,
        HexPatternToken::RParen => TokenKind::HexAltRight,
        HexPatternToken::LBracket => TokenKind::HexJumpLeft,
        HexPatternToken::RBrace => TokenKind::HexEnd,
        HexPatternToken::NewLine => TokenKind::NewLine,
        HexPatternToken::BlockComment => TokenKind::Comment,
        HexPatternToken::Comment => TokenKind::OneLineComment,
        HexPatternToken::Whitespace => unreachable!(),
    }
}

fn convert_hex_jump_token(token: HexJumpToken) -> TokenKind {
    match token {
        HexJumpToken::Hyphen => TokenKind::Dash,
        HexJumpToken::IntegerLit => TokenKind::IntLiteral,
        HexJumpToken::RBracket => TokenKind::HexJumpRight,
        HexJumpToken::NewLine => TokenKind::NewLine,
        HexJumpToken::Whitespace => unreachable!(),
    }
}
