/*! A parser, formatter and builder for YARA rules.

YARA files are parsed into a [`YaraFile`], which keeps every token of the
source, comments and line breaks included, next to the abstract syntax
tree of its imports and rules. Edits made through the tree are applied to
the tokens, so the file can be written back either as it is, or in a
canonical format with [`YaraFile::get_text_formatted`].

New rules and conditions are created with the builders in [`builder`].

# Example

```rust
use yaramod::{parse, ParserConfig};

let mut file = parse(
    r#"
import "pe"

rule dummy : tag   // keep me
{
  condition: pe.number_of_sections > 2
}
"#,
    &ParserConfig::default(),
)
.unwrap();

file.edit_rule("dummy").unwrap().set_private(true).unwrap();

assert_eq!(
    file.get_text_formatted(false),
    r#"import "pe"

private rule dummy : tag // keep me
{
	condition:
		pe.number_of_sections > 2
}
"#
);
```
*/

pub use ast::EditError;
pub use ast::Rule;
pub use ast::RuleEditor;
pub use ast::YaraFile;

pub use config::Config;

pub use formatter::FormatConfig;
pub use formatter::Formatter;

pub use literal::Literal;
pub use location::Location;

pub use modules::ImportFeatures;

pub use parser::parse;
pub use parser::ErrorInfo;
pub use parser::IncludeResult;
pub use parser::ParserConfig;
pub use parser::ParserDriver;
pub use parser::ParserError;
pub use parser::ParserMode;

pub use tokens::Token;
pub use tokens::TokenId;
pub use tokens::TokenKind;
pub use tokens::TokenStream;

pub mod ast;
pub mod builder;
pub mod config;
pub mod formatter;
pub mod literal;
pub mod location;
pub mod modules;
pub mod parser;
pub mod symbols;
pub mod tokens;
pub mod types;

mod tokenizer;
