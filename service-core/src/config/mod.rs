use crate::error::CoreError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Logging settings shared by every binary in the workspace.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// OTLP gRPC endpoint (e.g. http://tempo:4317). Spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve `<crate>/config` whether the process runs from the workspace root
/// or from inside the crate directory.
pub fn configuration_directory(crate_dir: &str) -> PathBuf {
    let base_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if base_path.ends_with(crate_dir) {
        base_path.join("config")
    } else {
        base_path.join(crate_dir).join("config")
    }
}

/// Load settings from `base.yaml` in `config_dir` (optional), then `APP_`
/// prefixed environment variables, e.g. `APP_API__BASE_URL`. Binaries load
/// `.env` themselves before calling this.
pub fn load<T: DeserializeOwned>(config_dir: &Path) -> Result<T, CoreError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}
