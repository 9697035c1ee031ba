//! Application configuration for kbsync.
//!
//! User config lives at `~/.kbsync/kbsync.toml`. It names the environment
//! variables holding credentials — never the credentials themselves.
//! A missing config file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KbSyncError, Result};
use crate::types::VectorStoreId;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "kbsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".kbsync";

/// Production API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ---------------------------------------------------------------------------
// Config structs (matching kbsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the assistant id.
    #[serde(default = "default_assistant_id_env")]
    pub assistant_id_env: String,

    /// Name of the env var holding an existing vector store id (optional at runtime).
    #[serde(default = "default_vector_store_id_env")]
    pub vector_store_id_env: String,

    /// API base URL. Overridable for self-hosted gateways and tests.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            assistant_id_env: default_assistant_id_env(),
            vector_store_id_env: default_vector_store_id_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_assistant_id_env() -> String {
    "OPENAI_ASSISTANT_ID".into()
}
fn default_vector_store_id_env() -> String {
    "OPENAI_VECTOR_STORE_ID".into()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// Resolved runtime settings
// ---------------------------------------------------------------------------

/// Runtime settings — resolved from config file + environment + CLI flags.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Bearer token for the remote API.
    pub api_key: String,
    /// Assistant the vector store is attached to.
    pub assistant_id: String,
    /// Existing vector store id, if any. `None` means create-and-attach.
    pub vector_store_id: Option<VectorStoreId>,
    /// API base URL.
    pub base_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Directory holding the required documentation files.
    pub working_dir: PathBuf,
}

/// Resolve runtime settings from the config's named env vars.
///
/// Fails with a [`KbSyncError::Config`] if the API key or assistant id
/// env var is unset or empty. The vector store id is optional.
pub fn resolve_settings(config: &AppConfig, working_dir: PathBuf) -> Result<SyncSettings> {
    let api_key = require_env(&config.openai.api_key_env, "API key")?;
    let assistant_id = require_env(&config.openai.assistant_id_env, "assistant id")?;

    let vector_store_id = match std::env::var(&config.openai.vector_store_id_env) {
        Ok(val) if !val.is_empty() => Some(VectorStoreId::from(val)),
        _ => None,
    };

    Ok(SyncSettings {
        api_key,
        assistant_id,
        vector_store_id,
        base_url: config.openai.base_url.clone(),
        timeout_secs: config.openai.timeout_secs,
        working_dir,
    })
}

/// Read a required env var, failing with a descriptive config error.
fn require_env(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(KbSyncError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.kbsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| KbSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.kbsync/kbsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KbSyncError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| KbSyncError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| KbSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KbSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KbSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("OPENAI_ASSISTANT_ID"));
        assert!(toml_str.contains("api.openai.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(parsed.openai.timeout_secs, 60);
    }

    #[test]
    fn custom_env_var_names() {
        let toml_str = r#"
[openai]
api_key_env = "MY_KEY"
assistant_id_env = "MY_ASSISTANT"
base_url = "https://gateway.internal/v1"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.openai.api_key_env, "MY_KEY");
        assert_eq!(config.openai.base_url, "https://gateway.internal/v1");
        // Unspecified fields fall back to defaults
        assert_eq!(config.openai.vector_store_id_env, "OPENAI_VECTOR_STORE_ID");
    }

    #[test]
    fn resolve_fails_without_api_key() {
        let mut config = AppConfig::default();
        // Use unique env var names to avoid interfering with other tests
        config.openai.api_key_env = "KBSYNC_TEST_NONEXISTENT_KEY_19388".into();
        config.openai.assistant_id_env = "KBSYNC_TEST_NONEXISTENT_ASST_19388".into();

        let result = resolve_settings(&config, PathBuf::from("."));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("KBSYNC_TEST_NONEXISTENT_KEY_19388")
        );
    }

    #[test]
    fn resolve_store_id_optional() {
        let mut config = AppConfig::default();
        config.openai.api_key_env = "KBSYNC_TEST_KEY_55101".into();
        config.openai.assistant_id_env = "KBSYNC_TEST_ASST_55101".into();
        config.openai.vector_store_id_env = "KBSYNC_TEST_STORE_55101".into();

        // SAFETY: unique var names, set-before-read within this test only.
        unsafe {
            std::env::set_var("KBSYNC_TEST_KEY_55101", "sk-test");
            std::env::set_var("KBSYNC_TEST_ASST_55101", "asst_test");
        }

        let settings = resolve_settings(&config, PathBuf::from(".")).expect("resolve");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.assistant_id, "asst_test");
        assert!(settings.vector_store_id.is_none());
    }
}
