use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use composer_engine::{ApiSettings, EngineConfig, StorageSettings};
use composer_logging::{composer_info, composer_warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILENAME: &str = "composer.ron";

/// Settings read from the RON config file. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub api_base: String,
    /// Raw `Cookie` header, e.g. `access_token=...`.
    pub session_cookie: Option<String>,
    pub storage_endpoint: String,
    pub bucket: String,
    pub storage_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub upload_chunk_bytes: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        let storage = StorageSettings::default();
        let api = ApiSettings::default();
        Self {
            api_base: api.base_url,
            session_cookie: None,
            storage_endpoint: storage.endpoint,
            bucket: storage.bucket,
            storage_token: None,
            connect_timeout_secs: storage.connect_timeout.as_secs(),
            upload_chunk_bytes: storage.chunk_bytes,
        }
    }
}

impl ComposerConfig {
    pub fn engine_config(&self) -> EngineConfig {
        let connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        EngineConfig::new(
            StorageSettings {
                endpoint: self.storage_endpoint.clone(),
                bucket: self.bucket.clone(),
                auth_token: self.storage_token.clone(),
                connect_timeout,
                chunk_bytes: self.upload_chunk_bytes,
            },
            ApiSettings {
                base_url: self.api_base.clone(),
                session_cookie: self.session_cookie.clone(),
                connect_timeout,
            },
        )
    }
}

/// Loads the config at `path`. A missing file yields defaults; an unreadable
/// or malformed one is an error.
pub fn load(path: &Path) -> anyhow::Result<ComposerConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            composer_warn!("No config at {:?}; using defaults", path);
            return Ok(ComposerConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };

    let config: ComposerConfig = ron::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    composer_info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Writes the default config to `path`, refusing to overwrite.
pub fn write_default(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&ComposerConfig::default(), pretty)
        .context("serializing default config")?;
    fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
    composer_info!("Wrote default config to {:?}", path);
    Ok(())
}
