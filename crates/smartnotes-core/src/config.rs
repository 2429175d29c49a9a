//! SmartNotes Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with defaults that reproduce the built-in extraction behavior.
//!
//! The extraction engine never reads the environment itself; hosts load an
//! [`AppConfig`] and hand the [`EngineConfig`] to the engine at construction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction engine configuration
    pub engine: EngineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        EnvOverrides::from_env()?.apply(&mut config);
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        EnvOverrides::from_env()?.apply(&mut self);
        Ok(self)
    }
}

/// Settings taken from environment variables.
///
/// A field is `Some` exactly when its variable is set, so a variable set to
/// the default value still overrides a file that chose otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `SMARTNOTES_PROFILE`
    pub profile: Option<Profile>,
    /// `SMARTNOTES_RELATIONS`
    pub relations: Option<bool>,
    /// `LOG_LEVEL`
    pub log_level: Option<String>,
    /// `LOG_JSON`
    pub log_json: Option<bool>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            profile: lookup("SMARTNOTES_PROFILE")
                .map(|v| v.parse::<Profile>())
                .transpose()?,
            relations: lookup("SMARTNOTES_RELATIONS")
                .map(|v| parse_bool("SMARTNOTES_RELATIONS", &v))
                .transpose()?,
            log_level: lookup("LOG_LEVEL"),
            log_json: lookup("LOG_JSON")
                .map(|v| parse_bool("LOG_JSON", &v))
                .transpose()?,
        })
    }

    /// Overwrite every setting that has a value
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(profile) = self.profile {
            config.engine.profile = profile;
        }
        if let Some(relations) = self.relations {
            config.engine.relations = relations;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(json) = self.log_json {
            config.logging.json_format = json;
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Extraction engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Built-in rule ordering to use
    pub profile: Profile,

    /// Run the relationship pass after term extraction
    pub relations: bool,

    /// Word lists used by the term validator and normalizer
    pub lexicon: LexiconConfig,

    /// Additional rules appended after the profile's rules
    pub extra_rules: Vec<RuleDef>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            relations: true,
            lexicon: LexiconConfig::default(),
            extra_rules: Vec::new(),
        }
    }
}

/// Named orderings of the built-in rule set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Every built-in rule, general rules before history rules
    #[default]
    Unified,
    /// Rules tuned for science, math and literature notes
    General,
    /// Rules tuned for history notes (titled events, "The X was ...")
    History,
}

impl Profile {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::General => "general",
            Self::History => "history",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unified" => Ok(Self::Unified),
            "general" => Ok(Self::General),
            "history" => Ok(Self::History),
            _ => Err(ConfigError::InvalidValue {
                key: "SMARTNOTES_PROFILE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Word lists consulted during validation and normalization.
///
/// All entries are matched case-insensitively against whole words.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Pronouns, demonstratives and interrogatives that never name a concept
    pub blacklist: Vec<String>,

    /// Leading words that make a term too generic ("most cells")
    pub generic_leads: Vec<String>,

    /// Verbs that mark a term span as a sentence fragment
    pub copulas: Vec<String>,

    /// Leading determiners stripped when computing term identity
    pub determiners: Vec<String>,

    /// Function and filler words never ranked as key concepts
    pub stop_words: Vec<String>,

    /// Words that disqualify a capitalized phrase as a concept ("Chapter One")
    pub generic_concepts: Vec<String>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            blacklist: to_strings(&[
                "he", "she", "it", "they", "them", "their", "his", "her", "hers", "its", "him",
                "we", "us", "our", "you", "your", "me", "my", "this", "that", "these", "those",
                "what", "which", "who", "whom", "whose", "when", "where", "why", "how",
            ]),
            generic_leads: to_strings(&["most", "some", "many", "all", "several", "each", "every"]),
            copulas: to_strings(&["is", "are", "was", "were"]),
            determiners: to_strings(&["the", "a", "an"]),
            stop_words: to_strings(&[
                "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of",
                "with", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
                "do", "does", "did", "will", "would", "should", "could", "may", "might", "must",
                "can", "this", "that", "these", "those", "there", "then", "i", "you", "he",
                "she", "it", "we", "they", "what", "which", "who", "when", "where", "why", "how",
                "all",
                "each", "both", "some", "such", "said", "came", "just", "also", "once",
                "class", "summary", "powered", "first", "last", "given", "common", "general",
                "different", "most", "upon", "time", "book", "english", "chapter", "page",
            ]),
            generic_concepts: to_strings(&["summary", "class", "chapter", "book"]),
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

// ============================================================================
// Rule Definitions
// ============================================================================

/// Capitalization shape a rule expects of its terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCase {
    /// Single-word terms must start with an uppercase letter
    #[default]
    Capitalized,
    /// Lowercase technical terms ("a derivative is ...") are allowed
    Lowercase,
}

/// How a rule renders its term for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayCase {
    /// Keep the casing found in the note
    #[default]
    AsWritten,
    /// Capitalize every word ("chain rule" -> "Chain Rule")
    Title,
}

/// Declarative description of one extraction rule.
///
/// `pattern` must contain exactly two capture groups: the term and the
/// definition, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDef {
    /// Unique tag reported as the term's `pattern`
    pub tag: String,

    /// Regex with (term, definition) capture groups
    pub pattern: String,

    /// Minimum definition length in characters, after trimming
    pub min_definition_len: usize,

    /// Minimum term length in characters, after trimming
    #[serde(default = "default_min_term_len")]
    pub min_term_len: usize,

    /// Capitalization the rule expects
    #[serde(default)]
    pub term_case: TermCase,

    /// Display casing of accepted terms
    #[serde(default)]
    pub display: DisplayCase,

    /// Term must contain at least one of these (substring, case-insensitive)
    #[serde(default)]
    pub required_keywords: Vec<String>,

    /// Rule-local words that disqualify a term
    #[serde(default)]
    pub excluded_words: Vec<String>,
}

fn default_min_term_len() -> usize {
    3
}

impl RuleDef {
    /// Create a rule with default shape settings
    pub fn new(tag: impl Into<String>, pattern: impl Into<String>, min_definition_len: usize) -> Self {
        Self {
            tag: tag.into(),
            pattern: pattern.into(),
            min_definition_len,
            min_term_len: default_min_term_len(),
            term_case: TermCase::default(),
            display: DisplayCase::default(),
            required_keywords: Vec::new(),
            excluded_words: Vec::new(),
        }
    }

    /// Accept lowercase single-word terms
    pub fn lowercase_terms(mut self) -> Self {
        self.term_case = TermCase::Lowercase;
        self
    }

    /// Render accepted terms in title case
    pub fn title_case(mut self) -> Self {
        self.display = DisplayCase::Title;
        self
    }

    /// Set the minimum term length
    pub fn with_min_term_len(mut self, len: usize) -> Self {
        self.min_term_len = len;
        self
    }

    /// Require one of the given keywords in the term
    pub fn with_required_keywords(mut self, keywords: &[&str]) -> Self {
        self.required_keywords = to_strings(keywords);
        self
    }

    /// Reject terms containing any of the given words
    pub fn with_excluded_words(mut self, words: &[&str]) -> Self {
        self.excluded_words = to_strings(words);
        self
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.profile, Profile::Unified);
        assert!(config.engine.relations);
        assert!(config.engine.extra_rules.is_empty());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("unified".parse::<Profile>().unwrap(), Profile::Unified);
        assert_eq!(" History ".parse::<Profile>().unwrap(), Profile::History);
        assert!("biology".parse::<Profile>().is_err());
    }

    #[test]
    fn test_default_lexicon() {
        let lexicon = LexiconConfig::default();
        assert!(lexicon.blacklist.contains(&"they".to_string()));
        assert!(lexicon.generic_leads.contains(&"most".to_string()));
        assert_eq!(lexicon.determiners, vec!["the", "a", "an"]);
    }

    #[test]
    fn test_parse_toml_with_extra_rule() {
        let toml = r#"
            [engine]
            profile = "history"
            relations = false

            [[engine.extra_rules]]
            tag = "defined_as"
            pattern = '([A-Z][a-z]+) is defined as (.+?)(?:\.|$)'
            min_definition_len = 8
            term_case = "lowercase"

            [logging]
            level = "debug"
        "#;

        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.engine.profile, Profile::History);
        assert!(!config.engine.relations);
        assert_eq!(config.engine.extra_rules.len(), 1);

        let rule = &config.engine.extra_rules[0];
        assert_eq!(rule.tag, "defined_as");
        assert_eq!(rule.min_term_len, 3);
        assert_eq!(rule.term_case, TermCase::Lowercase);
        assert_eq!(rule.display, DisplayCase::AsWritten);

        // Unspecified sections fall back to defaults
        assert_eq!(config.engine.lexicon.copulas.len(), 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parse_toml_rejects_unknown_profile() {
        let err = AppConfig::from_toml_str("[engine]\nprofile = \"biology\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_rule_def_builder() {
        let rule = RuleDef::new("a_an_is", r"(x) is (y)", 10)
            .lowercase_terms()
            .title_case()
            .with_min_term_len(4)
            .with_excluded_words(&["key"]);

        assert_eq!(rule.term_case, TermCase::Lowercase);
        assert_eq!(rule.display, DisplayCase::Title);
        assert_eq!(rule.min_term_len, 4);
        assert_eq!(rule.excluded_words, vec!["key"]);
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_unset_leave_config_alone() {
        let overrides = EnvOverrides::from_lookup(lookup(&[])).unwrap();
        assert_eq!(overrides, EnvOverrides::default());

        let mut config = AppConfig::from_toml_str("[engine]\nprofile = \"general\"\n").unwrap();
        overrides.apply(&mut config);
        assert_eq!(config.engine.profile, Profile::General);
    }

    #[test]
    fn test_env_overrides_can_restore_defaults() {
        let mut config = AppConfig::from_toml_str(
            "[engine]\nprofile = \"history\"\nrelations = false\n\n[logging]\nlevel = \"debug\"\njson_format = true\n",
        )
        .unwrap();

        let overrides = EnvOverrides::from_lookup(lookup(&[
            ("SMARTNOTES_PROFILE", "unified"),
            ("SMARTNOTES_RELATIONS", "true"),
            ("LOG_LEVEL", "warn"),
            ("LOG_JSON", "false"),
        ]))
        .unwrap();
        overrides.apply(&mut config);

        assert_eq!(config.engine.profile, Profile::Unified);
        assert!(config.engine.relations);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_unknown_profile_is_invalid_value_from_env() {
        let err = EnvOverrides::from_lookup(lookup(&[("SMARTNOTES_PROFILE", "biology")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, ref value } if key == "SMARTNOTES_PROFILE" && value == "biology"
        ));

        let err = EnvOverrides::from_lookup(lookup(&[("LOG_JSON", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "LOG_JSON"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartnotes.toml");
        std::fs::write(&path, "[engine]\nprofile = \"history\"\nrelations = false\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.engine.profile, Profile::History);
        assert!(!config.engine.relations);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_from_file_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.toml");
        let err = AppConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { ref path, .. } if *path == missing));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[engine]\nprofile = \"biology\"\n").unwrap();
        let err = AppConfig::from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref path, .. } if *path == bad));
    }

    /// The only test that touches the process environment
    #[test]
    fn test_from_env_and_with_env_override() {
        std::env::set_var("SMARTNOTES_PROFILE", "unified");
        std::env::set_var("SMARTNOTES_RELATIONS", "true");

        let env_only = AppConfig::from_env();
        let file = AppConfig::from_toml_str("[engine]\nprofile = \"history\"\nrelations = false\n")
            .unwrap()
            .with_env_override();

        std::env::remove_var("SMARTNOTES_PROFILE");
        std::env::remove_var("SMARTNOTES_RELATIONS");

        let env_only = env_only.unwrap();
        assert_eq!(env_only.engine.profile, Profile::Unified);
        assert!(env_only.engine.relations);

        let merged = file.unwrap();
        assert_eq!(merged.engine.profile, Profile::Unified);
        assert!(merged.engine.relations);
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("LOG_JSON", "true").unwrap());
        assert!(!parse_bool("LOG_JSON", "0").unwrap());
        assert!(parse_bool("LOG_JSON", "maybe").is_err());
    }
}
