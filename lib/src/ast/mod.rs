/*! Syntax tree of YARA files.

The tree doesn't own any text. Every node holds [`TokenId`] handles into the
[`TokenStream`] of the [`YaraFile`] it belongs to, and its text is derived
from the tokens each time it's requested. Nodes built outside a file, by the
builders in [`crate::builder`], come as [`Detached`] values carrying their
own stream.

[`TokenId`]: crate::tokens::TokenId
[`TokenStream`]: crate::tokens::TokenStream
[`Detached`]: crate::tokens::Detached
*/

use thiserror::Error;

use crate::tokens::TokenStreamError;

pub use expr::*;
pub use file::*;
pub use hex::*;
pub use regexp::*;
pub use rule::{Meta, Rule, RuleEditor, Section};
pub use strings::*;
pub use trie::StringsTrie;

mod expr;
mod file;
mod hex;
mod regexp;
mod rule;
mod strings;
mod trie;

pub mod visitor;

pub(crate) use rule::rule_symbol;

#[cfg(test)]
mod tests;

/// Errors returned when editing a [`YaraFile`] or a [`Rule`].
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EditError {
    #[error("rule '{0}' already exists")]
    DuplicateRule(String),

    #[error("rule '{0}' not found")]
    RuleNotFound(String),

    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("module '{0}' is still referenced")]
    ModuleInUse(String),

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("tag '{0}' already exists")]
    DuplicateTag(String),

    #[error("meta '{0}' not found")]
    MetaNotFound(String),

    #[error("'{0}' is not a valid string identifier")]
    InvalidStringIdentifier(String),

    #[error("string '{0}' already exists")]
    DuplicateString(String),

    #[error("string '{0}' not found")]
    StringNotFound(String),

    #[error("string '{0}' is referenced in the condition")]
    StringInUse(String),

    #[error(transparent)]
    TokenStream(#[from] TokenStreamError),
}
