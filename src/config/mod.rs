//! File-backed configuration store: `~/.cognito-cli/config.json`.
//!
//! The file is read once at startup. When it does not exist yet, a default
//! example is scaffolded and the process is expected to exit cleanly so the
//! operator can fill in real credentials.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::{env, fs, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const CONFIG_DIR_NAME: &str = ".cognito-cli";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Overrides the default config location, mainly for tests and scripting.
pub const CONFIG_PATH_ENV: &str = "COGNITO_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, rename = "defaultRegion")]
    pub default_region: Option<String>,
}

/// Parsed configuration file.
///
/// Pool objects stay as raw JSON maps here because their stage keys are
/// dynamic; `Registry::from_config` gives them structure. `serde_json`'s
/// `preserve_order` feature keeps pools and stages in file order.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: Settings,
    pub pools: Vec<Map<String, Value>>,
}

/// Resolve the config file path, honoring the `COGNITO_CONFIG` override.
///
/// # Errors
/// Returns an error if the home directory cannot be determined.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the configuration, scaffolding a default file on first run.
///
/// Returns `None` after scaffolding: the caller should print nothing more
/// and exit with status 0, matching first-run behavior.
///
/// # Errors
/// Returns an error if the file cannot be read, written, or parsed.
pub fn load_or_scaffold() -> Result<Option<ConfigFile>> {
    let path = config_path()?;

    if !path.exists() {
        scaffold(&path)?;
        println!("\nCreated default configuration file at {}", path.display());
        println!("Edit it with your pool credentials, then run 'cognito' again to generate tokens.\n");
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(Some(config))
}

fn scaffold(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(&default_config())?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

fn default_config() -> Value {
    json!({
        "settings": {
            "port": DEFAULT_PORT,
        },
        "pools": [
            {
                "name": "Example",
                "dev": {
                    "poolId": "eu-west-1_1234567",
                    "region": "eu-west-1",
                    "clientId": "abc123456",
                    "username": "user",
                    "password": "passwd",
                    "otpSecret": null,
                },
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scaffold_creates_parseable_default() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        temp_env::with_var(
            CONFIG_PATH_ENV,
            Some(path.to_string_lossy().to_string()),
            || -> Result<()> {
                let first = load_or_scaffold()?;
                assert!(first.is_none(), "first run should scaffold and stop");
                assert!(path.exists());

                let second = load_or_scaffold()?;
                let config = second.expect("second run should load the scaffold");
                assert_eq!(config.settings.port, Some(DEFAULT_PORT));
                assert_eq!(config.pools.len(), 1);
                assert_eq!(
                    config.pools[0].get("name").and_then(Value::as_str),
                    Some("Example")
                );
                Ok(())
            },
        )
    }

    #[test]
    fn settings_are_optional() -> Result<()> {
        let config: ConfigFile = serde_json::from_str(r#"{ "pools": [] }"#)?;
        assert!(config.settings.port.is_none());
        assert!(config.settings.default_region.is_none());
        Ok(())
    }

    #[test]
    fn parse_error_mentions_path() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "not json")?;

        temp_env::with_var(
            CONFIG_PATH_ENV,
            Some(path.to_string_lossy().to_string()),
            || {
                let err = load_or_scaffold().expect_err("malformed config should fail");
                assert!(err.to_string().contains(CONFIG_FILE_NAME));
            },
        );
        Ok(())
    }
}
