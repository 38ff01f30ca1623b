use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};

const OUTPUT_FILE_NAME: &str = "current_weather_data_mumbai.json";

/// Weather endpoint and the query it is called with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub endpoint: String,
    pub lat: f64,
    pub lon: f64,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org".to_string(),
            endpoint: "/data/2.5/weather".to_string(),
            lat: 19.0760,
            lon: 72.8777,
            api_key: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub timeout_secs: u64,
    pub poke_interval_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self { timeout_secs: 20, poke_interval_secs: 5 }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poke_interval(&self) -> Duration {
        Duration::from_secs(self.poke_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retries: usize,
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { retries: 2, retry_delay_secs: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the report goes; defaults to the platform data directory.
    pub path: Option<PathBuf>,
    /// Fail the run when the report cannot be written.
    pub fail_on_write_error: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { path: None, fail_on_write_error: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression (seconds field first) or a shorthand such as `@daily`.
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { cron: "@daily".to_string() }
    }
}

/// SMTP settings for failure emails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub to: String,
    pub from: String,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    465
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    pub email: Option<EmailConfig>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [api]
/// api_key = "..."
///
/// [output]
/// path = "/var/lib/weather/current.json"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub readiness: ReadinessConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    pub schedule: ScheduleConfig,
    pub notify: NotifyConfig,
}

impl Config {
    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// API key, or an error telling the user how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `weather-etl configure` and enter your OpenWeather API key."
                )
            })
    }

    /// Where the report is written: the configured path or the data directory default.
    pub fn output_path(&self) -> Result<PathBuf> {
        match &self.output.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(OUTPUT_FILE_NAME)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-etl", "weather-etl")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
