//! Memory configuration loader.
//!
//! Reads `config.toml` from the memory data directory and deserializes it
//! into [`MemoryLayerConfig`]. Falls back to defaults when the file is
//! missing or cannot be parsed; values that parse but are out of range are
//! reported to the caller.

use std::path::Path;

use aml_types::config::MemoryLayerConfig;
use aml_types::error::ConfigurationError;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Load memory configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`MemoryLayerConfig::default()`] (pruning disabled).
/// - Unreadable or unparsable file: a warning, then the default.
/// - Parsed file: validated; out-of-range thresholds are an error.
pub async fn load_memory_config(data_dir: &Path) -> Result<MemoryLayerConfig, ConfigurationError> {
    let config_path = data_dir.join(CONFIG_FILE_NAME);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %config_path.display(), "no memory config found, using defaults");
            return Ok(MemoryLayerConfig::default());
        }
        Err(err) => {
            tracing::warn!(path = %config_path.display(), error = %err, "failed to read memory config, using defaults");
            return Ok(MemoryLayerConfig::default());
        }
    };

    let config = match toml::from_str::<MemoryLayerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %config_path.display(), error = %err, "failed to parse memory config, using defaults");
            return Ok(MemoryLayerConfig::default());
        }
    };

    config.validate()?;
    tracing::debug!(
        path = %config_path.display(),
        enabled = config.pruning.enabled,
        schedule = %config.pruning.schedule,
        "loaded memory config"
    );
    Ok(config)
}
