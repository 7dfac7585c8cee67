use std::collections::BTreeSet;
use std::mem;

use log::debug;

use crate::ast::{Rule, YaraFile};
use crate::builder::BuilderError;
use crate::modules::ImportFeatures;
use crate::parser::{parse, ParserConfig, ParserMode};
use crate::tokens::Detached;

/// Builds a [`YaraFile`] out of imports and rules.
#[derive(Debug, Default)]
pub struct YaraFileBuilder {
    features: ImportFeatures,
    modules: BTreeSet<String>,
    rules: Vec<Detached<Rule>>,
}

impl YaraFileBuilder {
    /// Creates a builder for files whose imports are resolved with
    /// `features`.
    pub fn new(features: ImportFeatures) -> Self {
        Self { features, ..Default::default() }
    }

    /// Adds an import. Imports are emitted sorted by module name, and
    /// importing the same module twice has no effect.
    pub fn with_module(&mut self, name: &str) -> &mut Self {
        self.modules.insert(name.to_string());
        self
    }

    pub fn with_rule(&mut self, rule: Detached<Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Returns the file and resets the builder, which keeps its features.
    ///
    /// With `recheck` the formatted text of the file is parsed again, and
    /// the parsed file is returned instead. This verifies that every rule
    /// references existing strings, rules and module attributes, which the
    /// builders alone don't check.
    pub fn get(&mut self, recheck: bool) -> Result<YaraFile, BuilderError> {
        let builder = mem::take(self);
        self.features = builder.features;

        let mut file = YaraFile::new(builder.features);
        for module in &builder.modules {
            file.add_import(module)?;
        }
        for rule in builder.rules {
            if !file.tokens.is_empty() {
                let newline = file.tokens.newline();
                file.tokens.push_back(newline);
            }
            file.add_rule(rule)?;
            let newline = file.tokens.newline();
            file.tokens.push_back(newline);
        }

        if !recheck {
            return Ok(file);
        }

        let text = file.get_text_formatted(false);
        debug!("rechecking generated code:\n{}", text);
        let config = ParserConfig::new(builder.features, ParserMode::Regular);
        parse(text.as_bytes(), &config)
            .map_err(|error| BuilderError::Recheck { error, text })
    }
}
