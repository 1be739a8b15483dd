//! CLI configuration, loaded from `~/.config/hyperdoc/config.ron`.
//!
//! ```ron
//! (
//!     gateway_url: "https://hyper.media",
//!     log_filter: Some("hyperdoc_activity=debug,info"),
//!     resolver: (max_concurrency: 4),
//! )
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use hyperdoc_activity::ResolverConfig;

pub const DEFAULT_GATEWAY_URL: &str = "https://hyper.media";

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Web gateway used for `https://` forms of identifiers.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            log_filter: None,
            resolver: ResolverConfig::default(),
        }
    }
}

/// `~/.config/hyperdoc/config.ron`, if there is a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hyperdoc").join("config.ron"))
}

impl CliConfig {
    /// Load from `explicit`, or from the default location.
    ///
    /// A missing default file yields defaults. A missing explicit file or a
    /// malformed one is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"(log_filter: Some("debug"), resolver: (max_concurrency: 2))"#).unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
        assert_eq!(config.resolver.max_concurrency, 2);
        assert_eq!(config.resolver.page_size, 30);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(gateway_url: 42").unwrap();
        assert!(CliConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(CliConfig::load(Some(&missing)).is_err());
    }
}
