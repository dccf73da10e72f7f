//! TOML-based configuration system for Homeroom.

use crate::error::{HomeroomError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of concurrent upstream requests.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 15;

/// Default poll interval in minutes.
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 10;

/// File name of the persisted tracking memory inside the data directory.
pub const DEFAULT_STATE_FILE_NAME: &str = "canvas.canvas_homework_state.json";

/// Top-level Homeroom configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeroomConfig {
    pub homeroom: HomeroomSection,
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

/// Core instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeroomSection {
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
    pub data_dir: String,
}

fn default_instance_name() -> String {
    "Homeroom".into()
}

/// Canvas LMS connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub base_url: String,
    pub token: String,
    /// Maximum number of in-flight course/assignment/submission requests.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            concurrency_limit: default_concurrency_limit(),
            per_page: default_per_page(),
        }
    }
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}

fn default_per_page() -> u32 {
    100
}

/// Change tracking and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub disable_persistence: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
    /// Overrides `<data_dir>/canvas.canvas_homework_state.json`.
    #[serde(default)]
    pub state_file: Option<String>,
    /// Where the CLI host writes sensor states after every cycle.
    #[serde(default)]
    pub sensor_file: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            disable_persistence: false,
            poll_interval_minutes: default_poll_interval(),
            state_file: None,
            sensor_file: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MINUTES
}

/// A webhook endpoint that receives homework notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_webhook_enabled")]
    pub enabled: bool,
}

fn default_webhook_enabled() -> bool {
    true
}

impl HomeroomConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| HomeroomError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.homeroom.data_dir.is_empty() {
            return Err(HomeroomError::Config(
                "homeroom.data_dir must not be empty".into(),
            ));
        }

        if self.canvas.base_url.is_empty() {
            return Err(HomeroomError::Config(
                "canvas.base_url must not be empty".into(),
            ));
        }

        if self.canvas.token.is_empty() {
            return Err(HomeroomError::Config(
                "canvas.token must not be empty".into(),
            ));
        }

        if self.canvas.concurrency_limit == 0 {
            return Err(HomeroomError::Config(
                "canvas.concurrency_limit must be at least 1".into(),
            ));
        }

        if self.tracking.poll_interval_minutes == 0 {
            return Err(HomeroomError::Config(
                "tracking.poll_interval_minutes must be at least 1".into(),
            ));
        }

        for webhook in &self.webhooks {
            if webhook.url.is_empty() {
                return Err(HomeroomError::Config(format!(
                    "webhook '{}' must have a url",
                    webhook.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a sensible default configuration.
    pub fn generate_default() -> Self {
        Self {
            homeroom: HomeroomSection {
                instance_name: default_instance_name(),
                data_dir: "/var/lib/homeroom".into(),
            },
            canvas: CanvasConfig {
                base_url: "https://your-school.instructure.com".into(),
                token: "replace-with-an-observer-access-token".into(),
                ..Default::default()
            },
            tracking: TrackingConfig::default(),
            webhooks: Vec::new(),
        }
    }

    /// Path of the persisted tracking memory.
    pub fn state_path(&self) -> PathBuf {
        match &self.tracking.state_file {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.homeroom.data_dir).join(DEFAULT_STATE_FILE_NAME),
        }
    }

    /// Path of the sensor file, if the host should write one.
    pub fn sensor_path(&self) -> Option<PathBuf> {
        self.tracking.sensor_file.as_ref().map(PathBuf::from)
    }

    /// The fixed interval between update cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.tracking.poll_interval_minutes * 60)
    }
}
