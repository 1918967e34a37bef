//! Client settings read from a TOML file.
//!
//! ```toml
//! url = "https://psg.gsfc.nasa.gov/api.php"
//! api_key = "..."
//! timeout_secs = 60
//! syntax = "tagged"
//! unknown_keys = "collect"
//! ```
//!
//! Every key is optional. The engine never reads this file itself; callers
//! turn it into [`TextFormat`], [`ParseOptions`] and a [`Catalog`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::field::UnknownTokenPolicy;
use crate::format::{Syntax, TextFormat};
use crate::root::{ParseOptions, UnknownKeyPolicy};

pub const DEFAULT_URL: &str = "https://psg.gsfc.nasa.gov/api.php";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_line_terminator() -> String {
    "\n".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_line_terminator")]
    pub line_terminator: String,
    #[serde(default)]
    pub syntax: Syntax,
    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,
    #[serde(default)]
    pub unknown_tokens: UnknownTokenPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            line_terminator: default_line_terminator(),
            syntax: Syntax::default(),
            unknown_keys: UnknownKeyPolicy::default(),
            unknown_tokens: UnknownTokenPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(text)?;
        if settings.line_terminator.is_empty() {
            return Err(SettingsError::Invalid("line_terminator may not be empty".into()));
        }
        if settings.line_terminator.contains('=') {
            return Err(SettingsError::Invalid(
                "line_terminator may not contain `=`".into(),
            ));
        }
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn text_format(&self) -> TextFormat {
        TextFormat::new()
            .with_syntax(self.syntax)
            .with_terminator(self.line_terminator.clone())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new()
            .with_format(self.text_format())
            .with_unknown_keys(self.unknown_keys)
    }

    /// The standard catalog with this token policy applied.
    pub fn catalog(&self) -> Catalog {
        Catalog::psg().with_token_policy(self.unknown_tokens)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::from_toml_str("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.url, DEFAULT_URL);
        assert_eq!(s.timeout(), Duration::from_secs(120));
        assert_eq!(s.text_format(), TextFormat::default());
    }

    #[test]
    fn explicit_values_are_read() {
        let s = Settings::from_toml_str(
            r#"
            api_key = "abc"
            timeout_secs = 30
            line_terminator = "\r\n"
            syntax = "tagged"
            unknown_keys = "collect"
            unknown_tokens = "passthrough"
            "#,
        )
        .unwrap();
        assert_eq!(s.api_key.as_deref(), Some("abc"));
        assert_eq!(s.timeout_secs, 30);
        assert_eq!(s.text_format().syntax, Syntax::Tagged);
        assert_eq!(s.text_format().terminator, "\r\n");
        assert_eq!(s.parse_options().unknown_keys, UnknownKeyPolicy::Collect);
        assert_eq!(s.catalog().token_policy(), UnknownTokenPolicy::Passthrough);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            Settings::from_toml_str("syntax = \"xml\""),
            Err(SettingsError::Toml(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("colour = \"red\""),
            Err(SettingsError::Toml(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("line_terminator = \"\""),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Settings::load("/nonexistent/psg.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/psg.toml"));
    }
}
