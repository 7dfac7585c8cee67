/*! Builders for creating YARA rules programmatically.

Each builder produces a node in a [`TokenStream`] of its own, returned as a
[`Detached`] value. Building a file is a matter of nesting builders:

```
use yaramod::builder::*;

let condition = string_ref("$a").and(filesize().lt(int_val(100)));

let rule = YaraRuleBuilder::new()
    .with_name("test")
    .with_string_meta("author", "me")
    .with_plain_string("$a", "hello")
    .ascii()
    .with_condition(condition.get().unwrap())
    .get()
    .unwrap();

let file = YaraFileBuilder::default().with_rule(rule).get(true).unwrap();

assert_eq!(
    file.get_text_formatted(false),
    r#"rule test
{
	meta:
		author = "me"
	strings:
		$a = "hello" ascii
	condition:
		$a and filesize < 100
}
"#
);
```

[`TokenStream`]: crate::tokens::TokenStream
[`Detached`]: crate::tokens::Detached
*/

use thiserror::Error;

use crate::ast::EditError;
use crate::parser::ParserError;
use crate::tokenizer;
use crate::tokens::TokenStreamError;

pub use expression::*;
pub use file::YaraFileBuilder;
pub use hex::YaraHexStringBuilder;
pub use rule::YaraRuleBuilder;

mod expression;
mod file;
mod hex;
mod rule;

#[cfg(test)]
mod tests;

/// Errors returned by the builders.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BuilderError {
    #[error("the rule has no name")]
    MissingName,

    #[error("'{0}' is not a valid string identifier")]
    InvalidStringIdentifier(String),

    #[error("string '{0}' already exists")]
    DuplicateString(String),

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("invalid regular expression '{text}': {reason}")]
    InvalidRegexp { text: String, reason: String },

    #[error("invalid hex string jump [{low}-{high}]")]
    InvalidHexJump { low: u64, high: u64 },

    #[error("hex string is empty")]
    EmptyHexString,

    #[error("hex alternation needs at least two non-empty alternatives")]
    InvalidHexAlternation,

    #[error("invalid XOR range ({low}-{high})")]
    InvalidXorRange { low: u8, high: u8 },

    #[error("base64 alphabet must be 64 characters long")]
    InvalidBase64Alphabet,

    #[error("a modifier was added before any string")]
    ModifierWithoutString,

    #[error("`{operation}` can't be applied to '{expr}'")]
    InvalidOperand { operation: &'static str, expr: String },

    /// The generated text was parsed again and the parser rejected it.
    #[error("generated code is invalid: {error}\n{text}")]
    Recheck { error: ParserError, text: String },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    TokenStream(#[from] TokenStreamError),
}

/// True if `name` can be used as an identifier.
fn is_identifier(name: &str) -> bool {
    tokenizer::is_identifier(name)
}

/// True if `id` is a valid string identifier (`$`, `$a`, `$foo_1`, ...).
fn is_string_identifier(id: &str) -> bool {
    match id.strip_prefix('$') {
        Some(rest) => {
            rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}
