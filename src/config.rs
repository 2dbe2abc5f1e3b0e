use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AutorelError, Result};
use crate::publish::{SourceFilter, DEFAULT_GIT_FILTER};

/// Configuration for the tag publisher.
///
/// Loaded once at process start and passed by reference; there is no
/// reload and no fallback default, so an unreadable file fails loud
/// before any history work begins.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub pagure: PagureConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PagureConfig {
    /// Base URL of the repository-hosting API.
    pub url: String,
    /// API token sent as `Authorization: token <token>`.
    pub token: String,
    /// Optional override of the source-URL pattern; must expose the
    /// `repo` and `commit` named capture groups.
    #[serde(default)]
    pub git_filter: Option<String>,
}

impl PagureConfig {
    /// The compiled source-URL filter, falling back to the default
    /// pattern when none is configured.
    pub fn source_filter(&self) -> Result<SourceFilter> {
        match &self.git_filter {
            Some(pattern) => SourceFilter::from_pattern(pattern),
            None => SourceFilter::from_pattern(DEFAULT_GIT_FILTER),
        }
    }
}

/// Loads publisher configuration.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `autorel.toml` in the current directory
/// 3. `autorel.toml` in the user config directory
///
/// # Arguments
/// * `config_path` - Optional path to a custom configuration file
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)
            .map_err(|e| AutorelError::config(format!("cannot read {}: {}", path, e)))?
    } else if Path::new("./autorel.toml").exists() {
        fs::read_to_string("./autorel.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("autorel.toml");
        if config_path.exists() {
            fs::read_to_string(&config_path)?
        } else {
            return Err(AutorelError::config(
                "no autorel.toml found; the publisher needs pagure.url and pagure.token",
            ));
        }
    } else {
        return Err(AutorelError::config(
            "no autorel.toml found; the publisher needs pagure.url and pagure.token",
        ));
    };

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| AutorelError::config(format!("invalid configuration: {}", e)))?;
    // Surface a bad filter pattern now rather than on first use.
    config.pagure.source_filter()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_load_minimal_config() {
        let file = write_config(
            "[pagure]\nurl = \"https://pagure.example\"\ntoken = \"secret\"\n",
        );
        let config =
            load_config(file.path().to_str()).expect("config should load");
        assert_eq!(config.pagure.url, "https://pagure.example");
        assert_eq!(config.pagure.token, "secret");
        assert_eq!(config.pagure.git_filter, None);
    }

    #[test]
    fn test_load_config_with_filter_override() {
        let file = write_config(
            "[pagure]\nurl = \"https://pagure.example\"\ntoken = \"secret\"\ngit_filter = \".*example.org/(?P<repo>.*)\\\\.git#(?P<commit>[a-f0-9]{40})$\"\n",
        );
        let config = load_config(file.path().to_str()).expect("config should load");
        assert!(config.pagure.git_filter.is_some());
    }

    #[test]
    fn test_load_config_rejects_bad_filter() {
        let file = write_config(
            "[pagure]\nurl = \"https://pagure.example\"\ntoken = \"secret\"\ngit_filter = \"(?P<repo>.*)\"\n",
        );
        let err = load_config(file.path().to_str()).expect_err("filter should be rejected");
        assert!(err.to_string().contains("commit"));
    }

    #[test]
    fn test_load_config_missing_file_fails() {
        assert!(load_config(Some("/nonexistent/autorel.toml")).is_err());
    }

    #[test]
    fn test_load_config_missing_token_fails() {
        let file = write_config("[pagure]\nurl = \"https://pagure.example\"\n");
        assert!(load_config(file.path().to_str()).is_err());
    }
}
