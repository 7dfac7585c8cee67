use std::fmt::{Debug, Display, Formatter};

use thiserror::Error;

use crate::location::Location;

/// Error returned when a YARA source can't be parsed.
///
/// The error carries the location where the problem was detected and the
/// reason. Its [`Display`] implementation renders both as
/// `"<location>: <reason>"`.
#[derive(Clone, PartialEq)]
pub struct ParserError(Box<ErrorDetails>);

#[derive(Clone, Debug, PartialEq)]
struct ErrorDetails {
    info: ErrorInfo,
    location: Location,
}

impl ParserError {
    pub(crate) fn new(info: ErrorInfo, location: Location) -> Self {
        Self(Box::new(ErrorDetails { info, location }))
    }

    /// The kind of error and its details.
    #[inline]
    pub fn info(&self) -> &ErrorInfo {
        &self.0.info
    }

    /// Location in the source code where the error was found.
    #[inline]
    pub fn location(&self) -> &Location {
        &self.0.location
    }

    /// A short code that identifies the kind of error (e.g. `E005`).
    #[inline]
    pub fn code(&self) -> &'static str {
        self.0.info.code()
    }
}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.location, self.0.info)
    }
}

impl std::error::Error for ParserError {}

impl Debug for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self, self.code())
    }
}

/// Every kind of error the parser can produce.
#[derive(Error, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ErrorInfo {
    #[error("syntax error, unexpected {found}, expected {expected}")]
    SyntaxError { found: String, expected: String },

    #[error("unknown token '{text}'")]
    UnknownToken { text: String },

    #[error("invalid escape sequence in '{text}'")]
    InvalidEscapeSequence { text: String },

    #[error("integer literal '{text}' is out of range")]
    IntegerOutOfRange { text: String },

    #[error("Redefinition of rule '{name}'")]
    DuplicateRule { name: String },

    #[error("Redefinition of string '{id}'")]
    DuplicateString { id: String },

    #[error("Duplicate tag '{tag}'")]
    DuplicateTag { tag: String },

    #[error("Reference to undefined string '{id}'")]
    UndefinedString { id: String },

    #[error("Reference to anonymous string '{id}' outside of for-of loop")]
    AnonymousStringOutsideLoop { id: String },

    #[error("No string matched with wildcard '{pattern}'")]
    UnmatchedStringWildcard { pattern: String },

    #[error("Reference to strings using 'them' while no strings are defined")]
    ThemWithoutStrings,

    #[error("Unrecognized module '{name}' imported")]
    UnrecognizedModule { name: String },

    #[error("Unrecognized identifier '{name}' referenced")]
    UnrecognizedIdentifier { name: String },

    #[error("Redefinition of identifier '{name}'")]
    RedefinedIdentifier { name: String },

    #[error("operator '{operator}' expects {expected} on the {side}")]
    InvalidOperand { operator: String, expected: String, side: String },

    #[error("'{expr}' is not {expected}")]
    InvalidAccess { expr: String, expected: String },

    #[error(
        "No matching overload of function '{function}' for arguments {given}"
    )]
    WrongArguments { function: String, given: String },

    #[error("XOR string modifier key is out of allowed range")]
    XorKeyOutOfBounds,

    #[error("XOR string modifier key range has lower bound above upper bound")]
    InvalidXorRange,

    #[error("Base64 alphabet must be 64 characters long")]
    InvalidBase64Alphabet,

    #[error("Duplicate modifier '{modifier}'")]
    DuplicateModifier { modifier: String },

    #[error("Modifiers '{first}' and '{second}' can't be used together")]
    IncompatibleModifiers { first: String, second: String },

    #[error("Modifier '{modifier}' can't be used with {kind}")]
    InvalidModifier { modifier: String, kind: String },

    #[error("Invalid range ({low}..{high})")]
    InvalidRange { low: i64, high: i64 },

    #[error("Invalid hex string jump [{low}-{high}]")]
    InvalidHexJump { low: i64, high: i64 },

    #[error("Invalid regular expression: {reason}")]
    InvalidRegexp { reason: String },

    #[error("Unable to include file '{path}': {reason}")]
    IncludeError { path: String, reason: String },

    #[error("Include of '{path}' creates a cycle")]
    IncludeCycle { path: String },
}

impl ErrorInfo {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SyntaxError { .. } => "E001",
            Self::UnknownToken { .. } => "E002",
            Self::InvalidEscapeSequence { .. } => "E003",
            Self::IntegerOutOfRange { .. } => "E004",
            Self::DuplicateRule { .. } => "E005",
            Self::DuplicateString { .. } => "E006",
            Self::DuplicateTag { .. } => "E007",
            Self::UndefinedString { .. } => "E008",
            Self::AnonymousStringOutsideLoop { .. } => "E009",
            Self::UnmatchedStringWildcard { .. } => "E010",
            Self::ThemWithoutStrings => "E011",
            Self::UnrecognizedModule { .. } => "E012",
            Self::UnrecognizedIdentifier { .. } => "E013",
            Self::RedefinedIdentifier { .. } => "E014",
            Self::InvalidOperand { .. } => "E015",
            Self::InvalidAccess { .. } => "E016",
            Self::WrongArguments { .. } => "E017",
            Self::XorKeyOutOfBounds => "E018",
            Self::InvalidXorRange => "E019",
            Self::InvalidBase64Alphabet => "E020",
            Self::DuplicateModifier { .. } => "E021",
            Self::IncompatibleModifiers { .. } => "E022",
            Self::InvalidModifier { .. } => "E023",
            Self::InvalidRange { .. } => "E024",
            Self::InvalidHexJump { .. } => "E025",
            Self::InvalidRegexp { .. } => "E026",
            Self::IncludeError { .. } => "E027",
            Self::IncludeCycle { .. } => "E028",
        }
    }
}
