use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::types::ExprType;

/// Represents a mangled function name.
///
/// A mangled name is a function name decorated with additional information
/// about the function's arguments and return type.
///
/// Mangled names have the format `<func name>@<arguments>@<return type>`,
/// where `<arguments>` is a sequence of characters, one per argument,
/// that specify the argument's type. Allowed types are:
///
/// ```text
///  i: integer
///  f: float
///  b: bool
///  s: string
///  r: regexp
/// ```
///
/// `<return type>` is a single character from the set above, except `r`.
/// For example, a function `hash.md5` receiving an offset and a size and
/// returning a string has the mangled name `md5@ii@s`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MangledFnName(String);

impl MangledFnName {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the types of arguments and return value for the function.
    ///
    /// # Panics
    ///
    /// If the mangled name is malformed. Mangled names are part of the
    /// module definitions, a malformed one is a bug in this crate.
    pub fn unmangle(&self) -> (Vec<ExprType>, ExprType) {
        let (_name, arg_types, ret) =
            self.0.split('@').collect_tuple().unwrap_or_else(|| {
                panic!("invalid mangled name: `{}`", self.0)
            });

        let args = arg_types.chars().map(type_from_char).collect();

        let result = match ret.chars().next() {
            Some('r') => {
                panic!("functions can't return regexps: `{}`", self.0)
            }
            Some(c) => type_from_char(c),
            None => ExprType::Undefined,
        };

        (args, result)
    }
}

fn type_from_char(c: char) -> ExprType {
    match c {
        'i' => ExprType::Int,
        'f' => ExprType::Float,
        'b' => ExprType::Bool,
        's' => ExprType::String,
        'r' => ExprType::Regexp,
        _ => panic!("unexpected type in mangled name: `{}`", c),
    }
}

impl<S> From<S> for MangledFnName
where
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// Represents a function's signature.
///
/// YARA modules allow function overloading, therefore functions can have the
/// same name but different arguments.
#[derive(Clone, Debug)]
pub struct FuncSignature {
    pub mangled_name: MangledFnName,
    pub args: Vec<ExprType>,
    pub result: ExprType,
}

impl FuncSignature {
    /// True if arguments of the given types can be passed to a function with
    /// this signature. Integers are accepted where floats are expected.
    pub fn accepts(&self, args: &[ExprType]) -> bool {
        self.args.len() == args.len()
            && self.args.iter().zip(args).all(|(expected, actual)| {
                expected == actual
                    || (*expected == ExprType::Float
                        && *actual == ExprType::Int)
                    || *actual == ExprType::Undefined
            })
    }
}

impl Display for FuncSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({})",
            self.args.iter().map(|a| a.mangled_char()).join(", ")
        )
    }
}

impl Ord for FuncSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mangled_name.as_str().cmp(other.mangled_name.as_str())
    }
}

impl PartialOrd for FuncSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for FuncSignature {}

impl PartialEq for FuncSignature {
    fn eq(&self, other: &Self) -> bool {
        self.mangled_name == other.mangled_name
    }
}

impl<T: Into<String>> From<T> for FuncSignature {
    fn from(value: T) -> Self {
        let mangled_name = MangledFnName::from(value.into());
        let (args, result) = mangled_name.unmangle();
        Self { mangled_name, args, result }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::types::{ExprType, FuncSignature, MangledFnName};

    #[test]
    fn mangled_name() {
        assert_eq!(
            MangledFnName::from("foo@@i").unmangle(),
            (vec![], ExprType::Int)
        );

        assert_eq!(
            MangledFnName::from("foo@sr@b").unmangle(),
            (vec![ExprType::String, ExprType::Regexp], ExprType::Bool)
        );

        assert_eq!(
            MangledFnName::from("foo@f@").unmangle(),
            (vec![ExprType::Float], ExprType::Undefined)
        );
    }

    #[test]
    #[should_panic]
    fn invalid_mangled_name() {
        MangledFnName::from("foo@x").unmangle();
    }

    #[test]
    fn accepts() {
        let sig = FuncSignature::from("log@f@f");
        assert!(sig.accepts(&[ExprType::Int]));
        assert!(sig.accepts(&[ExprType::Float]));
        assert!(!sig.accepts(&[ExprType::String]));
        assert!(!sig.accepts(&[]));
        assert_eq!(FuncSignature::from("f@is@b").to_string(), "(i, s)");
    }
}
