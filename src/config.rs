//! Feed configuration: which JSON file backs each (theme, topic) pair, plus
//! display tunables.
//!
//! The configuration is a TOML file; every key is optional and falls back
//! to the built-in data set (see `topic-feed.toml` at the repository root,
//! which is the same data written out).

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::paginate::PAGE_SIZE;
use crate::read_more::DEFAULT_COLLAPSED_ROWS;
use crate::render::CardTemplate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// A category of posts, e.g. `expats`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Topic {
    pub key: String,
    pub label: String,
}

/// A named mapping from topic key to data URL.  An empty URL means the
/// theme has no data for that topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Theme {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Base that relative source URLs are resolved against.  `None` means
    /// the current directory.
    pub base_url: Option<String>,
    pub default_theme: String,
    pub default_topic: String,
    pub page_size: usize,
    /// Terminal rows a post body may take before "Leer Mas" kicks in.
    pub collapsed_rows: u16,
    pub template: CardTemplate,
    pub topics: Vec<Topic>,
    pub themes: Vec<Theme>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let topic = |key: &str, label: &str| Topic {
            key: key.to_string(),
            label: label.to_string(),
        };
        let theme = |key: &str, label: &str, sources: &[(&str, &str)]| Theme {
            key: key.to_string(),
            label: label.to_string(),
            sources: sources
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };

        Self {
            base_url: None,
            default_theme: "crba".to_string(),
            default_topic: "expats".to_string(),
            page_size: PAGE_SIZE,
            collapsed_rows: DEFAULT_COLLAPSED_ROWS,
            template: CardTemplate::default(),
            topics: vec![
                topic("expats", "Expats"),
                topic("expatsmexico", "Expats México"),
                topic("immigration", "Immigration"),
                topic("uscis", "USCIS"),
                topic("complete", "Completo"),
            ],
            themes: vec![
                theme(
                    "crba",
                    "CRBA",
                    &[
                        ("expats", "data/Topic_CRBA/Expats/expats_CRBA_latest_28_posts.json"),
                        ("expatsmexico", ""),
                        ("immigration", "data/Topic_CRBA/Immigration/Immigration_CRBA.json"),
                        ("uscis", "data/Topic_CRBA/USCIS/USCIS_CRBA_latest.json"),
                        ("complete", "data/Topic_CRBA/Complete/complete_CRBA.json"),
                    ],
                ),
                theme(
                    "givenBirth",
                    "Given Birth",
                    &[
                        ("expats", "data/Topic_GivenBirth/Expats/expats_givenBirth.json"),
                        ("expatsmexico", "data/Topic_GivenBirth/ExpatsMexico/expatsmexico_givenBirth.json"),
                        ("immigration", ""),
                        ("uscis", "data/Topic_GivenBirth/USCIS/USCIS_givenBirth.json"),
                    ],
                ),
            ],
        }
    }
}

impl FeedConfig {
    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FeedConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate that the configuration is usable.
    ///
    /// A malformed card template is only warned about here: the renderer
    /// reports it per card and the rest of the UI keeps working.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(invalid("page_size", "must be at least 1"));
        }
        if self.collapsed_rows == 0 {
            return Err(invalid("collapsed_rows", "must be at least 1"));
        }
        if self.topics.is_empty() {
            return Err(invalid("topics", "at least one topic is required"));
        }
        if self.themes.is_empty() {
            return Err(invalid("themes", "at least one theme is required"));
        }

        let mut topic_keys = HashSet::new();
        for topic in &self.topics {
            if !topic_keys.insert(topic.key.as_str()) {
                return Err(invalid("topics", format!("duplicate topic `{}`", topic.key)));
            }
        }
        let mut theme_keys = HashSet::new();
        for theme in &self.themes {
            if !theme_keys.insert(theme.key.as_str()) {
                return Err(invalid("themes", format!("duplicate theme `{}`", theme.key)));
            }
            if let Some(unknown) = theme.sources.keys().find(|k| !topic_keys.contains(k.as_str())) {
                return Err(invalid(
                    "themes",
                    format!("theme `{}` maps unknown topic `{unknown}`", theme.key),
                ));
            }
        }

        if self.theme(&self.default_theme).is_none() {
            return Err(invalid("default_theme", format!("no theme `{}`", self.default_theme)));
        }
        if self.topic(&self.default_topic).is_none() {
            return Err(invalid("default_topic", format!("no topic `{}`", self.default_topic)));
        }

        if let Err(e) = self.template.validate() {
            warn!(error = %e, "card template is malformed; posts will not render");
        }
        Ok(())
    }

    pub fn topic(&self, key: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.key == key)
    }

    pub fn theme(&self, key: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.key == key)
    }

    /// The data URL for `topic` under `theme`, or `None` when the pair has
    /// no data source (missing key or empty string).
    pub fn source_url(&self, theme: &str, topic: &str) -> Option<&str> {
        self.theme(theme)?
            .sources
            .get(topic)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

fn invalid(name: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        FeedConfig::default().validate().unwrap();
    }

    #[test]
    fn shipped_file_matches_built_in_defaults() {
        let shipped = FeedConfig::from_toml_str(include_str!("../topic-feed.toml")).unwrap();
        assert_eq!(shipped, FeedConfig::default());
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(FeedConfig::from_toml_str("").unwrap(), FeedConfig::default());
    }

    #[test]
    fn source_url_lookup() {
        let config = FeedConfig::default();
        assert_eq!(
            config.source_url("crba", "uscis"),
            Some("data/Topic_CRBA/USCIS/USCIS_CRBA_latest.json")
        );
        assert_eq!(config.source_url("crba", "expatsmexico"), None, "empty string");
        assert_eq!(config.source_url("givenBirth", "complete"), None, "missing key");
        assert_eq!(config.source_url("nope", "expats"), None, "unknown theme");
    }

    #[test]
    fn partial_file_overrides_tunables() {
        let config = FeedConfig::from_toml_str(
            r#"
            page_size = 5
            collapsed_rows = 3
            base_url = "https://example.com/site/"
            "#,
        )
        .unwrap();

        assert_eq!(config.page_size, 5);
        assert_eq!(config.collapsed_rows, 3);
        assert_eq!(config.base_url.as_deref(), Some("https://example.com/site/"));
        assert_eq!(config.topics, FeedConfig::default().topics);
    }

    #[test]
    fn custom_mapping_replaces_defaults() {
        let config = FeedConfig::from_toml_str(
            r#"
            default_theme = "alpha"
            default_topic = "one"
            template = ["title", "body"]

            [[topics]]
            key = "one"
            label = "One"

            [[themes]]
            key = "alpha"
            label = "Alpha"
            sources = { one = "one.json" }
            "#,
        )
        .unwrap();

        assert_eq!(config.topics.len(), 1);
        assert_eq!(config.source_url("alpha", "one"), Some("one.json"));
        assert_eq!(config.template.slots.len(), 2);
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = FeedConfig::from_toml_str("page_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "page_size"));
    }

    #[test]
    fn rejects_unknown_default_theme() {
        let err = FeedConfig::from_toml_str(r#"default_theme = "missing""#).unwrap_err();
        assert!(err.to_string().contains("no theme `missing`"));
    }

    #[test]
    fn rejects_sources_for_unknown_topics() {
        let err = FeedConfig::from_toml_str(
            r#"
            default_theme = "a"
            default_topic = "one"

            [[topics]]
            key = "one"
            label = "One"

            [[themes]]
            key = "a"
            label = "A"
            sources = { two = "two.json" }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown topic `two`"));
    }

    #[test]
    fn rejects_duplicate_topics() {
        let err = FeedConfig::from_toml_str(
            r#"
            default_topic = "expats"

            [[topics]]
            key = "expats"
            label = "A"

            [[topics]]
            key = "expats"
            label = "B"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate topic"));
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(matches!(
            FeedConfig::from_toml_str("page_size = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "collapsed_rows = 9").unwrap();

        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.collapsed_rows, 9);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeedConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
