//! Skin analysis service configuration

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub render: RenderConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the bundled web viewer, served at `/`
    pub static_dir: Option<PathBuf>,
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub url: String,
    /// Environment variable the API key is read from
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub face_stroke: u32,
    pub region_stroke: u32,
    pub legend_height: u32,
    pub jpeg_quality: u8,
    /// TrueType font for labels and the report panel
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_path() -> &'static str {
        "config.toml"
    }

    /// Resolve the upstream API key from the environment.
    ///
    /// A missing key is not fatal here; analyses fail individually instead.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.upstream.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8000,
                static_dir: Some(PathBuf::from("web")),
                body_limit_mb: 20,
            },
            upstream: UpstreamConfig {
                url: "https://www.ailabapi.com/api/portrait/analysis/skin-analysis-pro".to_string(),
                api_key_env: "AILABAPI_API_KEY".to_string(),
                timeout_secs: 60,
            },
            render: RenderConfig::default(),
            storage: StorageConfig {
                uploads_dir: PathBuf::from("uploads"),
            },
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            face_stroke: 4,
            region_stroke: 2,
            legend_height: 50,
            jpeg_quality: 95,
            font_path: None,
        }
    }
}
