use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, LoggingSettings};
use service_core::CoreError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApiSettings {
    /// Server root, e.g. http://localhost:5000. The API lives under /api.
    pub base_url: String,
    /// Account used to open the cookie session. Login is skipped when unset.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct PreviewSettings {
    /// Page scale; 1.0 renders at 72 dpi.
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_pdfinfo")]
    pub pdfinfo_bin: String,
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm_bin: String,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Scratch directory for render input/output. Defaults to the OS temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl PreviewSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            pdfinfo_bin: default_pdfinfo(),
            pdftoppm_bin: default_pdftoppm(),
            command_timeout_secs: default_command_timeout_secs(),
            temp_dir: None,
        }
    }
}

fn default_scale() -> f32 {
    1.2
}

fn default_pdfinfo() -> String {
    "pdfinfo".to_string()
}

fn default_pdftoppm() -> String {
    "pdftoppm".to_string()
}

fn default_command_timeout_secs() -> u64 {
    30
}

pub fn get_configuration() -> Result<Settings, CoreError> {
    let configuration_directory = core_config::configuration_directory("ack-frontend");
    core_config::load(&configuration_directory)
}
