/*! Parses YARA source code into a [`YaraFile`].

The parser is a handwritten recursive-descent parser working on the tokens
produced by the tokenizer. Semantic checks are performed while parsing, as
soon as each construct is recognized: referencing an undefined string,
redefining a rule, or using an identifier that no imported module provides
are reported at the location where they happen, and stop the parsing.

The tokens are never discarded, comments and newlines included, they end up
in the [`TokenStream`] of the parsed file. The syntax tree refers to them by
handle.

[`TokenStream`]: crate::tokens::TokenStream
 */

use std::mem;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

pub use errors::*;

use crate::ast::{Import, Rule, StringsTrie, YaraFile, YaraString};
use crate::literal::Literal;
use crate::location::Location;
use crate::modules::{
    virus_total_symbols, ImportFeatures, Module, ModulesPool,
};
use crate::parser::context::FileContext;
use crate::symbols::{StackedSymbolTable, Symbol, SymbolTable};
use crate::tokens::{TokenId, TokenKind, TokenStream};

mod context;
mod errors;
mod expr;
mod rule;

#[cfg(test)]
mod tests;

/// How `include` directives are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserMode {
    /// Every `include` is processed, including the same file more than once
    /// produces duplicate rules.
    #[default]
    Regular,
    /// Files that were already included are skipped.
    IncludeGuarded,
}

/// Settings for a single parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Which modules and module attributes are available.
    pub features: ImportFeatures,
    pub mode: ParserMode,
}

impl ParserConfig {
    pub fn new(features: ImportFeatures, mode: ParserMode) -> Self {
        Self { features, mode }
    }
}

/// Outcome of an `include` directive that didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeResult {
    Included,
    /// The file was skipped because it had been included before, only with
    /// [`ParserMode::IncludeGuarded`].
    AlreadyIncluded,
}

/// Parses YARA sources.
///
/// A driver can be reused for parsing any number of sources one after the
/// other. Nothing is carried from one parse to the next, except the result
/// of the last successful one, which is available through
/// [`ParserDriver::parsed_file`].
///
/// ```
/// # use yaramod::{ParserConfig, ParserDriver};
/// let mut driver = ParserDriver::new();
/// let file = driver
///     .parse_str("rule test { condition: true }", &ParserConfig::default())
///     .unwrap();
/// assert_eq!(file.rules().len(), 1);
/// ```
#[derive(Default)]
pub struct ParserDriver {
    parsed: Option<YaraFile>,
}

impl ParserDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses YARA source code that doesn't come from a file. Relative
    /// `include` paths are resolved from the current directory.
    pub fn parse_str<S: AsRef<[u8]>>(
        &mut self,
        src: S,
        config: &ParserConfig,
    ) -> Result<&mut YaraFile, ParserError> {
        self.parsed = None;
        let file = parse(src, config)?;
        Ok(self.parsed.insert(file))
    }

    /// Parses a YARA file. Relative `include` paths are resolved from the
    /// directory where the file is.
    pub fn parse_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        config: &ParserConfig,
    ) -> Result<&mut YaraFile, ParserError> {
        self.parsed = None;
        let path = path.as_ref();
        let src = std::fs::read(path).map_err(|err| {
            ParserError::new(
                ErrorInfo::IncludeError {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                },
                Location::default(),
            )
        })?;
        let context = FileContext::new(&src, Some(path.to_path_buf()))?;
        let mut parser = Parser::new(config, context);
        if let Ok(canonical) = path.canonicalize() {
            parser.include_stack.push(canonical.clone());
            parser.included.insert(canonical);
        }
        let file = parser.parse()?;
        Ok(self.parsed.insert(file))
    }

    /// The file produced by the last successful parse.
    pub fn parsed_file(&self) -> Option<&YaraFile> {
        self.parsed.as_ref()
    }

    pub fn parsed_file_mut(&mut self) -> Option<&mut YaraFile> {
        self.parsed.as_mut()
    }

    /// Takes the file produced by the last successful parse, leaving the
    /// driver empty.
    pub fn take_parsed_file(&mut self) -> Option<YaraFile> {
        self.parsed.take()
    }
}

/// Parses YARA source code and returns the file. Relative `include` paths
/// are resolved from the current directory.
pub fn parse<S: AsRef<[u8]>>(
    src: S,
    config: &ParserConfig,
) -> Result<YaraFile, ParserError> {
    let context = FileContext::new(src.as_ref(), None)?;
    Parser::new(config, context).parse()
}

/// State of a single parse.
pub(crate) struct Parser<'a> {
    config: &'a ParserConfig,
    /// Tokens of the file being parsed. While an included file is parsed
    /// this holds the included file, and the including one waits in the
    /// call stack.
    ctx: FileContext,
    /// Canonical paths of the files currently being parsed, from the
    /// outermost to the innermost. Used for detecting include cycles.
    include_stack: Vec<PathBuf>,
    /// Every file included so far.
    included: FxHashSet<PathBuf>,
    modules: ModulesPool,
    imports: Vec<Import>,
    /// Modules that can be referenced from conditions.
    imported: FxHashMap<&'static str, Rc<Module>>,
    rules: Vec<Rule>,
    /// Rules defined so far, by name. Holds the token with the rule name.
    rule_names: FxHashMap<String, (TokenId, Rc<Symbol>)>,
    vt_symbols: SymbolTable,
    /// Strings of the rule being parsed.
    strings: StringsTrie<YaraString>,
    /// Variables of the `for` loops that enclose the current expression.
    loop_vars: StackedSymbolTable,
    /// Number of `for .. of` loops that enclose the current expression.
    /// Anonymous strings can be referenced only inside them.
    for_of_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(config: &'a ParserConfig, ctx: FileContext) -> Self {
        let mut vt_symbols = SymbolTable::new();
        if config.features.contains(ImportFeatures::VIRUS_TOTAL_ONLY) {
            for symbol in virus_total_symbols() {
                vt_symbols.insert(symbol);
            }
        }
        Self {
            config,
            ctx,
            include_stack: Vec::new(),
            included: FxHashSet::default(),
            modules: ModulesPool::new(config.features),
            imports: Vec::new(),
            imported: FxHashMap::default(),
            rules: Vec::new(),
            rule_names: FxHashMap::default(),
            vt_symbols,
            strings: StringsTrie::new(),
            loop_vars: StackedSymbolTable::default(),
            for_of_depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<YaraFile, ParserError> {
        let start = Instant::now();
        self.items()?;
        info!(
            "parsed {} rules and {} imports in {:?}",
            self.rules.len(),
            self.imports.len(),
            start.elapsed()
        );
        Ok(YaraFile {
            tokens: self.ctx.tokens,
            imports: self.imports,
            rules: self.rules,
            modules: self.modules,
            features: self.config.features,
        })
    }

    /// Parses the top-level items of the current file: imports, includes
    /// and rules.
    fn items(&mut self) -> Result<(), ParserError> {
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Import => self.import()?,
                TokenKind::Include => {
                    self.include()?;
                }
                TokenKind::Rule | TokenKind::Private | TokenKind::Global => {
                    let rule = self.rule()?;
                    self.rules.push(rule);
                }
                _ => return Err(self.unexpected("import, include or rule")),
            }
        }
        Ok(())
    }

    fn import(&mut self) -> Result<(), ParserError> {
        let import_kw = self.expect(TokenKind::Import)?;
        let name = self.expect(TokenKind::StringLiteral)?;
        let module_name = self.text_of(name);
        let module_name = module_name.trim_matches('"');

        let module = self
            .modules
            .load(module_name, self.config.features)
            .ok_or_else(|| {
                self.error_at(
                    name,
                    ErrorInfo::UnrecognizedModule {
                        name: module_name.to_string(),
                    },
                )
            })?;

        debug!("imported module `{}`", module.name());

        if self.imported.insert(module.name(), module.clone()).is_none() {
            self.imports.push(Import { import_kw, name, module });
        }
        Ok(())
    }

    /// Parses an `include` directive, and the included file unless it's
    /// skipped. The tokens of the included file become a stream nested in
    /// the `include` token.
    fn include(&mut self) -> Result<IncludeResult, ParserError> {
        let include_kw = self.expect(TokenKind::Include)?;
        let path_token = self.expect(TokenKind::StringLiteral)?;
        let written = self.text_of(path_token);
        let written = written.trim_matches('"');

        let path = match self.ctx.path.as_ref().and_then(|p| p.parent()) {
            Some(dir) => dir.join(written),
            None => PathBuf::from(written),
        };

        let include_error = |reason: String| ErrorInfo::IncludeError {
            path: written.to_string(),
            reason,
        };

        let canonical = path.canonicalize().map_err(|err| {
            self.error_at(path_token, include_error(err.to_string()))
        })?;

        if self.include_stack.contains(&canonical) {
            return Err(self.error_at(
                path_token,
                ErrorInfo::IncludeCycle { path: written.to_string() },
            ));
        }

        if self.config.mode == ParserMode::IncludeGuarded
            && self.included.contains(&canonical)
        {
            warn!("skipping `{}`, it was already included", path.display());
            return Ok(IncludeResult::AlreadyIncluded);
        }

        debug!("including `{}`", path.display());

        let src = std::fs::read(&path).map_err(|err| {
            self.error_at(path_token, include_error(err.to_string()))
        })?;

        let child = FileContext::new(&src, Some(path))?;
        let parent = mem::replace(&mut self.ctx, child);
        self.include_stack.push(canonical.clone());
        self.included.insert(canonical);

        let result = self.items();

        self.include_stack.pop();
        let child = mem::replace(&mut self.ctx, parent);
        result?;

        self.ctx
            .tokens
            .attach_sub_stream(include_kw, child.tokens)
            .map_err(|err| {
                self.error_at(include_kw, include_error(err.to_string()))
            })?;

        Ok(IncludeResult::Included)
    }
}

// Helpers used by the grammar rules.
impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<TokenKind> {
        self.ctx.peek_kind(0)
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.ctx.peek_kind(n)
    }

    #[inline]
    fn tokens(&self) -> &TokenStream {
        &self.ctx.tokens
    }

    #[inline]
    fn tokens_mut(&mut self) -> &mut TokenStream {
        &mut self.ctx.tokens
    }

    /// Text of a token in the current file.
    fn text_of(&self, id: TokenId) -> String {
        self.ctx.tokens.text(id)
    }

    /// Consumes the current token, which must be of the given kind.
    fn expect(&mut self, kind: TokenKind) -> Result<TokenId, ParserError> {
        match self.peek() {
            Some(k) if k == kind => self.bump(),
            _ => Err(self.unexpected(&kind.to_string())),
        }
    }

    /// Consumes the current token if it is of the given kind.
    fn accept(&mut self, kind: TokenKind) -> Option<TokenId> {
        if self.peek() == Some(kind) {
            self.ctx.advance()
        } else {
            None
        }
    }

    /// Consumes the current token, whatever it is.
    fn bump(&mut self) -> Result<TokenId, ParserError> {
        match self.ctx.advance() {
            Some(id) => Ok(id),
            None => Err(self.unexpected("more input")),
        }
    }

    /// Changes the kind of a token once its role is known.
    fn refine(&mut self, id: TokenId, kind: TokenKind) {
        if let Some(token) = self.ctx.tokens.get_mut(id) {
            token.set_kind(kind);
        }
    }

    fn set_literal(&mut self, id: TokenId, literal: Literal) {
        if let Some(token) = self.ctx.tokens.get_mut(id) {
            token.set_literal(literal);
        }
    }

    fn error_at(&self, id: TokenId, info: ErrorInfo) -> ParserError {
        ParserError::new(info, self.ctx.location(id))
    }

    /// Error for an unexpected token at the current position.
    fn unexpected(&self, expected: &str) -> ParserError {
        match self.ctx.peek_id(0) {
            Some(id) => {
                let found = match self.tokens().get(id) {
                    Some(token) if token.kind().fixed_text().is_some() => {
                        format!("'{}'", self.text_of(id))
                    }
                    Some(token) => token.kind().to_string(),
                    None => String::from("token"),
                };
                self.error_at(
                    id,
                    ErrorInfo::SyntaxError {
                        found,
                        expected: expected.to_string(),
                    },
                )
            }
            None => ParserError::new(
                ErrorInfo::SyntaxError {
                    found: "end of file".to_string(),
                    expected: expected.to_string(),
                },
                self.ctx.end_location(),
            ),
        }
    }
}
