use std::fmt::{Debug, Display, Formatter};

pub use func::*;

mod func;

/// The type of a YARA expression or identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExprType {
    #[default]
    Undefined,
    Bool,
    Int,
    String,
    Regexp,
    Object,
    Float,
}

impl ExprType {
    /// True for the types that can be used in arithmetic expressions.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// True if an expression of this type can be used where a boolean is
    /// expected. Integers, floats and strings are casted to bool implicitly.
    #[inline]
    pub fn is_boolean_compatible(&self) -> bool {
        !matches!(self, Self::Regexp | Self::Object)
    }

    /// Character that identifies this type in a mangled function name.
    pub(crate) fn mangled_char(&self) -> char {
        match self {
            Self::Int => 'i',
            Self::Float => 'f',
            Self::Bool => 'b',
            Self::String => 's',
            Self::Regexp => 'r',
            Self::Object => 'o',
            Self::Undefined => 'u',
        }
    }
}

impl Display for ExprType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for ExprType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Bool => write!(f, "boolean"),
            Self::Int => write!(f, "integer"),
            Self::String => write!(f, "string"),
            Self::Regexp => write!(f, "regexp"),
            Self::Object => write!(f, "object"),
            Self::Float => write!(f, "float"),
        }
    }
}
