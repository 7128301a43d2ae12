use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

fn default_environment() -> String {
    "master".to_string()
}

fn default_persist() -> bool {
    true
}

/// Settings of one client instance.
///
/// ```toml
/// space_id = "cfexampleapi"
/// environment = "master"
/// locale = "en-US"
///
/// [cache]
/// warm_up = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    pub space_id: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Locale requested when a call names none; the space default otherwise.
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    /// Load the space and content types from the durable cache on construction.
    #[serde(default)]
    pub warm_up: bool,
    /// Write built spaces and content types through to the durable cache.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            warm_up: false,
            persist: default_persist(),
        }
    }
}

impl ClientConfig {
    pub fn new(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            environment: default_environment(),
            locale: None,
            cache: CacheConfig::default(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.cache.warm_up = warm_up;
        self
    }

    pub fn from_toml(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml(r#"space_id = "cfexampleapi""#).unwrap();
        assert_eq!(config, ClientConfig::new("cfexampleapi"));
        assert_eq!(config.environment, "master");
        assert!(config.cache.persist);
        assert!(!config.cache.warm_up);
    }

    #[test]
    fn full_toml() {
        let config = ClientConfig::from_toml(
            r#"
            space_id = "cfexampleapi"
            environment = "staging"
            locale = "tlh"

            [cache]
            warm_up = true
            persist = false
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, "staging");
        assert_eq!(config.locale.as_deref(), Some("tlh"));
        assert!(config.cache.warm_up);
        assert!(!config.cache.persist);
    }

    #[test]
    fn missing_space_id_rejected() {
        assert!(matches!(
            ClientConfig::from_toml("locale = \"en-US\""),
            Err(Error::Config(_))
        ));
    }
}
