use std::fmt::{Display, Formatter};

/// The kind of a [`crate::tokens::Token`].
///
/// Some kinds are produced directly by the tokenizer, others are assigned by
/// the parser once it knows the role the token plays. For instance, the
/// tokenizer produces [`TokenKind::Ident`] for every identifier, and the
/// parser turns it into [`TokenKind::RuleName`], [`TokenKind::Tag`],
/// [`TokenKind::MetaKey`] and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    NewLine,
    Comment,
    OneLineComment,

    Import,
    Include,
    Rule,
    Private,
    Global,
    RuleName,
    Tag,
    Colon,
    LBrace,
    RBrace,
    RuleBegin,
    RuleEnd,
    Meta,
    Strings,
    Condition,
    MetaKey,
    Assign,

    StringLiteral,
    IntLiteral,
    FloatLiteral,
    BoolLiteral,
    Regexp,

    StringIdDef,
    HexStart,
    HexEnd,
    HexByte,
    HexAltLeft,
    HexAltRight,
    HexAltOr,
    HexJumpLeft,
    HexJumpRight,
    Dash,
    Ascii,
    Wide,
    Nocase,
    Fullword,
    PrivateModifier,
    Xor,
    Base64,
    Base64Wide,

    StringId,
    StringIdWildcard,
    StringCount,
    StringOffset,
    StringLength,
    Ident,
    Id,
    IntFunction,
    Dot,
    DoubleDot,
    Comma,
    LParen,
    RParen,
    LSqb,
    RSqb,

    And,
    Or,
    Not,
    Defined,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Neq,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    IEquals,
    Matches,
    Plus,
    Minus,
    UnaryMinus,
    Multiply,
    Divide,
    Modulo,
    Percent,
    BitwiseNot,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    For,
    Of,
    In,
    At,
    All,
    Any,
    None,
    Them,
    Filesize,
    Entrypoint,

    /// Something the tokenizer could not recognize.
    Unknown,
}

impl TokenKind {
    /// Newlines and comments, which the grammar ignores.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self, Self::NewLine | Self::Comment | Self::OneLineComment)
    }

    #[inline]
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment | Self::OneLineComment)
    }

    /// Text of the kinds that are always written the same way.
    pub fn fixed_text(&self) -> Option<&'static str> {
        let text = match self {
            Self::Import => "import",
            Self::Include => "include",
            Self::Rule => "rule",
            Self::Private | Self::PrivateModifier => "private",
            Self::Global => "global",
            Self::Colon => ":",
            Self::LBrace | Self::RuleBegin | Self::HexStart => "{",
            Self::RBrace | Self::RuleEnd | Self::HexEnd => "}",
            Self::Meta => "meta",
            Self::Strings => "strings",
            Self::Condition => "condition",
            Self::Assign => "=",
            Self::HexAltLeft | Self::LParen => "(",
            Self::HexAltRight | Self::RParen => ")",
            Self::HexAltOr | Self::BitwiseOr => "|",
            Self::HexJumpLeft | Self::LSqb => "[",
            Self::HexJumpRight | Self::RSqb => "]",
            Self::Dash | Self::Minus | Self::UnaryMinus => "-",
            Self::Ascii => "ascii",
            Self::Wide => "wide",
            Self::Nocase => "nocase",
            Self::Fullword => "fullword",
            Self::Xor => "xor",
            Self::Base64 => "base64",
            Self::Base64Wide => "base64wide",
            Self::Dot => ".",
            Self::DoubleDot => "..",
            Self::Comma => ",",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Defined => "defined",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::EndsWith => "endswith",
            Self::IEndsWith => "iendswith",
            Self::IEquals => "iequals",
            Self::Matches => "matches",
            Self::Plus => "+",
            Self::Multiply => "*",
            Self::Divide => "\\",
            Self::Modulo | Self::Percent => "%",
            Self::BitwiseNot => "~",
            Self::BitwiseAnd => "&",
            Self::BitwiseXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::For => "for",
            Self::Of => "of",
            Self::In => "in",
            Self::At => "at",
            Self::All => "all",
            Self::Any => "any",
            Self::None => "none",
            Self::Them => "them",
            Self::Filesize => "filesize",
            Self::Entrypoint => "entrypoint",
            Self::NewLine => "\n",
            _ => return None,
        };
        Some(text)
    }

    /// Opening brackets whose contents may be laid out on their own lines.
    #[inline]
    pub fn is_opening_bracket(&self) -> bool {
        matches!(
            self,
            Self::LParen | Self::HexStart | Self::HexAltLeft | Self::LSqb
        )
    }

    #[inline]
    pub fn is_closing_bracket(&self) -> bool {
        matches!(
            self,
            Self::RParen | Self::HexEnd | Self::HexAltRight | Self::RSqb
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Self::NewLine => "newline",
            Self::Comment | Self::OneLineComment => "comment",
            Self::RuleName
            | Self::Tag
            | Self::MetaKey
            | Self::Ident
            | Self::Id
            | Self::IntFunction => "identifier",
            Self::StringLiteral => "string literal",
            Self::IntLiteral => "integer",
            Self::FloatLiteral => "float",
            Self::BoolLiteral => "boolean",
            Self::Regexp => "regular expression",
            Self::StringIdDef | Self::StringId => "string identifier",
            Self::StringIdWildcard => "string identifier wildcard",
            Self::StringCount => "string count",
            Self::StringOffset => "string offset",
            Self::StringLength => "string length",
            Self::HexByte => "hex byte",
            Self::Unknown => "unknown token",
            other => {
                return write!(f, "'{}'", other.fixed_text().unwrap_or("?"))
            }
        };
        write!(f, "{}", description)
    }
}
