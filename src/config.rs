use anyhow::{Context, Result};
use std::{env, path::PathBuf, sync::OnceLock};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// UI server configuration
    pub ui: UiConfig,

    /// Remote network configuration service
    pub backend: BackendConfig,

    /// Local key-value storage
    pub storage: StorageConfig,
}

#[derive(Clone, Debug)]
pub struct UiConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    /// Also send the submitted setup to the backend
    pub forward_config: bool,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Get or load the application configuration
    ///
    /// # Panics
    /// Panics if configuration loading fails. The service cannot do anything
    /// useful without a valid configuration.
    pub fn get() -> &'static Self {
        static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
        APP_CONFIG
            .get_or_init(|| Self::load().expect("failed to load application configuration"))
    }

    pub fn load() -> Result<Self> {
        Ok(Self {
            ui: UiConfig::load()?,
            backend: BackendConfig::load()?,
            storage: StorageConfig::load()?,
        })
    }
}

impl UiConfig {
    fn load() -> Result<Self> {
        let port = env::var("UI_PORT")
            .unwrap_or_else(|_| "1977".to_string())
            .parse::<u16>()
            .context("failed to parse UI_PORT: invalid format")?;

        let static_dir = env::var("STATIC_DIR")
            .unwrap_or_else(|_| "static".to_string())
            .into();

        Ok(Self { port, static_dir })
    }
}

impl BackendConfig {
    const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

    fn load() -> Result<Self> {
        let base_url = env::var("BACKEND_URL")
            .or_else(|_| env::var("REACT_APP_BACKEND_URL"))
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());

        let forward_config = match env::var("FORWARD_CONFIG") {
            Ok(value) => parse_flag(&value)
                .context(format!("failed to parse FORWARD_CONFIG: {value}"))?,
            Err(_) => false,
        };

        Ok(Self {
            base_url,
            forward_config,
        })
    }
}

impl StorageConfig {
    fn load() -> Result<Self> {
        let data_dir = env::var("DATA_DIR")
            .unwrap_or_else(|_| "/data/setup".to_string())
            .into();

        Ok(Self { data_dir })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
