//! Loads the adapter configuration for one CLI invocation.

use std::path::Path;

use anyhow::{Context, Result};
use ccd_core::DialerConfig;
use tracing::debug;

/// Loads `path` if given, otherwise searches for a config file. Environment
/// overrides apply either way.
pub fn load(path: Option<&Path>) -> Result<DialerConfig> {
    match path {
        Some(path) => load_explicit(path, |name| std::env::var(name).ok()),
        None => DialerConfig::from_env().context("failed to load configuration"),
    }
}

fn load_explicit(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<DialerConfig> {
    let config = DialerConfig::load(path)
        .with_context(|| format!("failed to load config file: {}", path.display()))?
        .with_overrides(lookup);
    config.validate().context("invalid configuration")?;

    debug!(path = %path.display(), server = config.has_server(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_explicit_applies_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ccd.toml");
        fs::write(&path, "base_url = \"http://10.0.0.5\"\napi_key = \"from-file\"\n").unwrap();

        let config = load_explicit(&path, |name| {
            (name == "CCD_VICIDIAL_API_KEY").then(|| "from-env".to_string())
        })
        .unwrap();

        assert_eq!(config.base_url.as_deref(), Some("http://10.0.0.5"));
        assert_eq!(config.api_key, "from-env");
    }

    #[test]
    fn test_load_explicit_missing_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.toml");

        let err = load_explicit(&path, |_| None).unwrap_err();

        assert!(format!("{err:#}").contains("missing.toml"));
    }
}
