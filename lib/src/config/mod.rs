/*! Configuration files.

Settings for the parser and the formatter can be read from a TOML file.
Every setting is optional, missing ones take their default value:

```toml
[parser]
features = "avast"
mode = "include-guarded"

[fmt]
indent = "    "
align-trailing-comments = false
```
*/

use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::formatter::FormatConfig;
use crate::modules::ImportFeatures;
use crate::parser::{ParserConfig, ParserMode};

/// Settings for parsing and formatting YARA files.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub parser: ParserSettings,
    pub fmt: FormatConfig,
}

/// Parser specific settings.
#[derive(Deserialize, Serialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ParserSettings {
    /// The set of modules available to `import`.
    pub features: FeatureSet,
    pub mode: ParserMode,
}

/// Named sets of [`ImportFeatures`], as written in configuration files.
#[derive(Deserialize, Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureSet {
    Basic,
    Avast,
    VirusTotal,
    #[default]
    AllCurrent,
    Everything,
}

impl From<FeatureSet> for ImportFeatures {
    fn from(set: FeatureSet) -> Self {
        match set {
            FeatureSet::Basic => ImportFeatures::BASIC,
            FeatureSet::Avast => ImportFeatures::AVAST,
            FeatureSet::VirusTotal => ImportFeatures::VIRUS_TOTAL,
            FeatureSet::AllCurrent => ImportFeatures::ALL_CURRENT,
            FeatureSet::Everything => ImportFeatures::EVERYTHING,
        }
    }
}

impl From<ParserSettings> for ParserConfig {
    fn from(settings: ParserSettings) -> Self {
        ParserConfig::new(settings.features.into(), settings.mode)
    }
}

impl Config {
    /// The [`ParserConfig`] described by the `[parser]` table.
    pub fn parser_config(&self) -> ParserConfig {
        self.parser.into()
    }
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
}

/// Load config file from a given path. Path must contain a valid TOML file or
/// this function will propagate the error.
pub fn load_config_from_file(
    config_file: &Path,
) -> Result<Config, figment::Error> {
    let config: Config =
        defaults().merge(Toml::file_exact(config_file)).extract()?;
    Ok(config)
}

/// Same as [`load_config_from_file`], but the TOML document is given as a
/// string.
pub fn load_config_from_str(toml: &str) -> Result<Config, figment::Error> {
    defaults().merge(Toml::string(toml)).extract()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.parser_config(), ParserConfig::default());
        assert_eq!(config.fmt.indent, "\t");
    }

    #[test]
    fn partial_config() -> anyhow::Result<()> {
        let config = load_config_from_str(
            r#"
[parser]
features = "virus-total"

[fmt]
align-trailing-comments = false
"#,
        )?;

        assert_eq!(
            config.parser_config(),
            ParserConfig::new(ImportFeatures::VIRUS_TOTAL, ParserMode::Regular)
        );
        assert_eq!(
            config.fmt,
            FormatConfig {
                indent: "\t".to_string(),
                align_trailing_comments: false
            }
        );
        Ok(())
    }

    #[test]
    fn parser_mode() {
        let config =
            load_config_from_str("[parser]\nmode = \"include-guarded\"")
                .unwrap();
        assert_eq!(config.parser.mode, ParserMode::IncludeGuarded);
        assert_eq!(config.parser.features, FeatureSet::AllCurrent);
    }

    #[test]
    fn invalid_config() {
        assert!(load_config_from_str("[parser]\nfeatures = \"foo\"").is_err());
        assert!(
            load_config_from_file(Path::new("does/not/exist.toml")).is_err()
        );
    }
}
