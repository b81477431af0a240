//! Layered client configuration for MemU.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. TOML file at `$MEMU_CONFIG`, else `<config dir>/memu/config.toml`
//! 3. `MEMU_API_KEY`, `MEMU_BASE_URL`, `MEMU_TIMEOUT_SECS`, `MEMU_MAX_RETRIES`
//! 4. explicit [`ConfigOverrides`] (e.g. CLI flags)
//!
//! A missing file is normal. An unreadable or malformed file, or an
//! unparsable numeric variable, is logged and skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use memu_types::config::ClientConfig;
use memu_types::error::MemuError;

pub const CONFIG_PATH_ENV: &str = "MEMU_CONFIG";
pub const API_KEY_ENV: &str = "MEMU_API_KEY";
pub const BASE_URL_ENV: &str = "MEMU_BASE_URL";
pub const TIMEOUT_ENV: &str = "MEMU_TIMEOUT_SECS";
pub const MAX_RETRIES_ENV: &str = "MEMU_MAX_RETRIES";

/// One partial layer of settings. `None` means "not set at this layer".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<f64>,
    pub max_retries: Option<u32>,
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            api_key: other.api_key.or(self.api_key),
            base_url: other.base_url.or(self.base_url),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            max_retries: other.max_retries.or(self.max_retries),
        }
    }
}

/// Caller-supplied values that beat every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl From<&ConfigOverrides> for ConfigLayer {
    fn from(overrides: &ConfigOverrides) -> Self {
        ConfigLayer {
            api_key: overrides.api_key.clone(),
            base_url: overrides.base_url.clone(),
            timeout_secs: overrides.timeout.map(|t| t.as_secs_f64()),
            max_retries: overrides.max_retries,
        }
    }
}

/// Where the config file is looked up when `$MEMU_CONFIG` is unset.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("memu").join("config.toml"))
}

/// Resolve the config file path from the environment lookup.
pub fn config_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    match env(CONFIG_PATH_ENV) {
        Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => default_config_path(),
    }
}

/// Read the file layer.
///
/// - Missing file: empty layer.
/// - Unreadable or malformed file: logs a warning and returns an empty layer.
pub async fn load_file_layer(path: &Path) -> ConfigLayer {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No MemU config at {}, skipping", path.display());
            return ConfigLayer::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, ignoring it", path.display());
            return ConfigLayer::default();
        }
    };

    match toml::from_str::<ConfigLayer>(&content) {
        Ok(layer) => layer,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, ignoring it", path.display());
            ConfigLayer::default()
        }
    }
}

/// Build the environment layer from a variable lookup.
pub fn env_layer(env: impl Fn(&str) -> Option<String>) -> ConfigLayer {
    let non_blank = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    ConfigLayer {
        api_key: non_blank(API_KEY_ENV),
        base_url: non_blank(BASE_URL_ENV),
        timeout_secs: non_blank(TIMEOUT_ENV).and_then(|raw| parse_env(TIMEOUT_ENV, &raw)),
        max_retries: non_blank(MAX_RETRIES_ENV).and_then(|raw| parse_env(MAX_RETRIES_ENV, &raw)),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

/// Turn a fully merged layer into a validated [`ClientConfig`].
pub fn resolve(layer: ConfigLayer) -> Result<ClientConfig, MemuError> {
    let api_key = layer.api_key.ok_or_else(|| {
        MemuError::InvalidArgument(format!(
            "API key is required (pass --api-key, set {API_KEY_ENV}, or add api_key to the config file)"
        ))
    })?;

    let mut config = ClientConfig::new(api_key)?;
    if let Some(base_url) = layer.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = layer.timeout_secs {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(MemuError::InvalidArgument(format!(
                "timeout must be a positive number of seconds, got {secs}"
            )));
        }
        config = config.with_timeout(Duration::from_secs_f64(secs));
    }
    if let Some(max_retries) = layer.max_retries {
        config = config.with_max_retries(max_retries)?;
    }
    Ok(config)
}

/// Load the client configuration from an explicit file path and env lookup.
pub async fn load_client_config_from(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &ConfigOverrides,
) -> Result<ClientConfig, MemuError> {
    let file = match path {
        Some(path) => load_file_layer(path).await,
        None => ConfigLayer::default(),
    };
    let merged = file.merge(env_layer(env)).merge(ConfigLayer::from(overrides));
    resolve(merged)
}

/// Load the client configuration from the process environment and the
/// default file location.
pub async fn load_client_config(overrides: &ConfigOverrides) -> Result<ClientConfig, MemuError> {
    let env = |name: &str| std::env::var(name).ok();
    let path = config_path(env);
    load_client_config_from(path.as_deref(), env, overrides).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use memu_types::config::{DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
    use tempfile::TempDir;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    async fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");

        let config = load_client_config_from(
            Some(path.as_path()),
            env_from(&[(API_KEY_ENV, "env-key")]),
            &ConfigOverrides::default(),
        )
        .await
        .unwrap();

        assert_eq!(config.api_key().expose(), "env-key");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
    }

    #[tokio::test]
    async fn file_values_are_applied() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
api_key = "file-key"
base_url = "https://memu.internal.example/"
timeout_secs = 12.5
max_retries = 5
"#,
        )
        .await;

        let config = load_client_config_from(Some(path.as_path()), env_from(&[]), &ConfigOverrides::default())
            .await
            .unwrap();

        assert_eq!(config.api_key().expose(), "file-key");
        assert_eq!(config.base_url(), "https://memu.internal.example");
        assert_eq!(config.timeout(), Duration::from_millis(12_500));
        assert_eq!(config.max_retries(), 5);
    }

    #[tokio::test]
    async fn precedence_is_file_then_env_then_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "api_key = \"file-key\"\nbase_url = \"https://file.example\"\nmax_retries = 2\n",
        )
        .await;
        let env = env_from(&[(API_KEY_ENV, "env-key"), (BASE_URL_ENV, "https://env.example")]);
        let overrides = ConfigOverrides {
            api_key: Some("flag-key".to_string()),
            ..Default::default()
        };

        let config = load_client_config_from(Some(path.as_path()), env, &overrides).await.unwrap();

        assert_eq!(config.api_key().expose(), "flag-key");
        assert_eq!(config.base_url(), "https://env.example");
        assert_eq!(config.max_retries(), 2);
    }

    #[tokio::test]
    async fn malformed_file_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "this is not { valid toml !!!").await;

        let config = load_client_config_from(
            Some(path.as_path()),
            env_from(&[(API_KEY_ENV, "env-key")]),
            &ConfigOverrides::default(),
        )
        .await
        .unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn missing_api_key_is_invalid_argument() {
        let err = load_client_config_from(None, env_from(&[]), &ConfigOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MemuError::InvalidArgument(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn env_layer_skips_blank_and_unparsable_values() {
        let layer = env_layer(env_from(&[
            (API_KEY_ENV, "   "),
            (TIMEOUT_ENV, "soon"),
            (MAX_RETRIES_ENV, " 4 "),
        ]));
        assert_eq!(
            layer,
            ConfigLayer {
                api_key: None,
                base_url: None,
                timeout_secs: None,
                max_retries: Some(4),
            }
        );
    }

    #[test]
    fn zero_retries_and_bad_timeout_are_rejected() {
        let base = ConfigLayer {
            api_key: Some("k".to_string()),
            ..Default::default()
        };

        let err = resolve(base.clone().merge(ConfigLayer {
            max_retries: Some(0),
            ..Default::default()
        }))
        .unwrap_err();
        assert!(matches!(err, MemuError::InvalidArgument(_)));

        let err = resolve(base.merge(ConfigLayer {
            timeout_secs: Some(-1.0),
            ..Default::default()
        }))
        .unwrap_err();
        assert!(matches!(err, MemuError::InvalidArgument(_)));
    }

    #[test]
    fn config_path_prefers_env_override() {
        let path = config_path(env_from(&[(CONFIG_PATH_ENV, "/etc/memu.toml")]));
        assert_eq!(path, Some(PathBuf::from("/etc/memu.toml")));
    }
}
