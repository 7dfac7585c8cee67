use std::rc::Rc;

use crate::ast::expr::{ExprKind, Expression};
use crate::ast::rule::{rule_symbol, Rule, RuleEditor};
use crate::ast::visitor;
use crate::ast::EditError;
use crate::formatter::{FormatConfig, Formatter};
use crate::literal::Literal;
use crate::modules::{ImportFeatures, Module, ModulesPool};
use crate::tokenizer;
use crate::tokens::{Detached, Token, TokenId, TokenKind, TokenStream};

/// An `import` statement.
#[derive(Debug, Clone)]
pub struct Import {
    pub import_kw: TokenId,
    /// The string literal with the module name.
    pub name: TokenId,
    pub(crate) module: Rc<Module>,
}

impl Import {
    pub fn module_name(&self) -> &'static str {
        self.module.name()
    }

    pub fn module(&self) -> &Rc<Module> {
        &self.module
    }
}

/// A parsed or built YARA source file.
///
/// The file owns the token stream every rule and import refers to. Rules
/// that come from included files are listed here too, but their tokens live
/// in a stream nested in the `include` token.
#[derive(Debug)]
pub struct YaraFile {
    pub(crate) tokens: TokenStream,
    pub(crate) imports: Vec<Import>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) modules: ModulesPool,
    pub(crate) features: ImportFeatures,
}

impl Default for YaraFile {
    fn default() -> Self {
        Self::new(ImportFeatures::default())
    }
}

impl YaraFile {
    /// Creates an empty file whose imports are resolved with `features`.
    pub fn new(features: ImportFeatures) -> Self {
        Self {
            tokens: TokenStream::new(),
            imports: Vec::new(),
            rules: Vec::new(),
            modules: ModulesPool::new(features),
            features,
        }
    }

    #[inline]
    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    #[inline]
    pub fn features(&self) -> ImportFeatures {
        self.features
    }

    #[inline]
    pub fn imports(&self) -> &[Import] {
        self.imports.as_slice()
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        self.rules.as_slice()
    }

    pub fn has_import(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.module_name() == name)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name(&self.tokens) == name)
    }

    fn rule_position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name(&self.tokens) == name)
    }

    /// Returns an editor for the rule with the given name.
    pub fn edit_rule(&mut self, name: &str) -> Option<RuleEditor<'_>> {
        let index = self.rule_position(name)?;
        Some(RuleEditor {
            tokens: &mut self.tokens,
            rule: &mut self.rules[index],
        })
    }

    /// The text of the file with normalized layout, without comments.
    ///
    /// Imports go first, one per line, followed by the rules separated by
    /// blank lines.
    pub fn get_text(&self) -> String {
        let mut text = String::new();
        for import in &self.imports {
            text.push_str(&format!("import \"{}\"\n", import.module_name()));
        }
        if !self.imports.is_empty() && !self.rules.is_empty() {
            text.push('\n');
        }
        let rules: Vec<String> =
            self.rules.iter().map(|r| r.text(&self.tokens)).collect();
        text.push_str(&rules.join("\n\n"));
        text
    }

    /// The text of the file in canonical format, including comments.
    ///
    /// With `with_includes` the tokens of included files are rendered in
    /// place of the `include` directives.
    pub fn get_text_formatted(&self, with_includes: bool) -> String {
        self.get_text_formatted_with(&FormatConfig::default(), with_includes)
    }

    pub fn get_text_formatted_with(
        &self,
        config: &FormatConfig,
        with_includes: bool,
    ) -> String {
        Formatter::new(config, with_includes).format(&self.tokens)
    }

    /// Adds an import for the given module. Returns false if the module was
    /// already imported.
    pub fn add_import(&mut self, name: &str) -> Result<bool, EditError> {
        if self.has_import(name) {
            return Ok(false);
        }
        let module = self
            .modules
            .load(name, self.features)
            .ok_or_else(|| EditError::UnknownModule(name.to_string()))?;

        let new_tokens = [
            Token::fixed(TokenKind::Import),
            Token::synthetic(
                TokenKind::StringLiteral,
                Literal::escaped_string(name),
            ),
            self.tokens.newline(),
        ];
        // New imports go on the line that follows the last one.
        let anchor = match self.imports.last() {
            Some(last) => match self.tokens.next(last.name) {
                Some(next)
                    if self.tokens.get(next).map(|t| t.kind())
                        == Some(TokenKind::NewLine) =>
                {
                    self.tokens.next(next)
                }
                next => next,
            },
            None => self.tokens.first(),
        };
        let mut ids = Vec::with_capacity(new_tokens.len());
        for token in new_tokens {
            let id = match anchor {
                Some(anchor) => self.tokens.insert_before(anchor, token)?,
                None => self.tokens.push_back(token),
            };
            ids.push(id);
        }
        self.imports.push(Import { import_kw: ids[0], name: ids[1], module });
        Ok(true)
    }

    /// Removes the import of a module. Fails if a rule condition still
    /// references the module.
    pub fn remove_import(&mut self, name: &str) -> Result<bool, EditError> {
        let index =
            match self.imports.iter().position(|i| i.module_name() == name) {
                Some(index) => index,
                None => return Ok(false),
            };
        if self
            .rules
            .iter()
            .any(|r| references_id(&r.condition, &self.tokens, name))
        {
            return Err(EditError::ModuleInUse(name.to_string()));
        }
        let import = self.imports.remove(index);
        self.erase_line(import.import_kw, import.name)?;
        Ok(true)
    }

    /// Appends a rule at the end of the file.
    pub fn add_rule(&mut self, rule: Detached<Rule>) -> Result<(), EditError> {
        self.insert_rule(self.rules.len(), rule)
    }

    /// Inserts a rule before the rule at position `index`, or at the end if
    /// `index` is the number of rules.
    pub fn insert_rule(
        &mut self,
        index: usize,
        rule: Detached<Rule>,
    ) -> Result<(), EditError> {
        let name = rule.node().name(rule.tokens());
        if self.rule(&name).is_some() {
            return Err(EditError::DuplicateRule(name));
        }
        let before = match self.rules.get(index) {
            Some(next) => Some(next.first_token()),
            None if index == self.rules.len() => None,
            None => return Err(EditError::RuleNotFound(index.to_string())),
        };
        let rule = rule.attach(&mut self.tokens, before)?;
        self.rules.insert(index, rule);
        Ok(())
    }

    /// Removes a rule. References to the rule from other conditions keep
    /// their text.
    pub fn remove_rule(&mut self, name: &str) -> Result<bool, EditError> {
        let index = match self.rule_position(name) {
            Some(index) => index,
            None => return Ok(false),
        };
        let rule = self.rules.remove(index);
        self.erase_line(rule.first_token(), rule.last_token())?;
        Ok(true)
    }

    /// Renames a rule. Conditions that reference the rule are updated too.
    pub fn rename_rule(
        &mut self,
        old: &str,
        new: &str,
    ) -> Result<(), EditError> {
        if !tokenizer::is_identifier(new) {
            return Err(EditError::InvalidIdentifier(new.to_string()));
        }
        if self.rule(new).is_some() {
            return Err(EditError::DuplicateRule(new.to_string()));
        }
        let index = self
            .rule_position(old)
            .ok_or_else(|| EditError::RuleNotFound(old.to_string()))?;
        let rule = &mut self.rules[index];
        if let Some(token) = self.tokens.get_mut(rule.name) {
            token.set_literal(Literal::escaped_string(new));
        }
        rule.symbol = rule_symbol(new);
        Ok(())
    }

    fn erase_line(
        &mut self,
        first: TokenId,
        last: TokenId,
    ) -> Result<(), EditError> {
        let mut last = last;
        if let Some(next) = self.tokens.next(last) {
            if self.tokens.get(next).map(|t| t.kind())
                == Some(TokenKind::NewLine)
            {
                last = next;
            }
        }
        self.tokens.erase(first, last)?;
        Ok(())
    }
}

/// True if `expr` contains an identifier with the given name.
fn references_id(expr: &Expression, tokens: &TokenStream, name: &str) -> bool {
    let mut found = false;
    visitor::walk(
        expr,
        tokens,
        &mut visitor::from_fn(|expr: &Expression, tokens: &TokenStream| {
            if let ExprKind::Id(id) = &expr.kind {
                found |= tokens.text(*id) == name;
            }
        }),
    );
    found
}
