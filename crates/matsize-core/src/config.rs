//! matsize.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bounds::InputBounds;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatsizeConfig {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub prediction: PredictionConfig,
    pub models: ModelsConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Reported by the health endpoint.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: "standalone".to_string(),
        }
    }
}

/// The model-backed prediction service tried before falling back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub predict_path: String,
    /// Upper bound on the whole remote exchange, retries included.
    pub timeout: String,
    pub retries: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mat-prediction.onrender.com".to_string(),
            predict_path: "/predict".to_string(),
            timeout: "10s".to_string(),
            retries: 2,
        }
    }
}

impl RemoteConfig {
    pub fn predict_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.predict_path)
    }

    /// Parsed `timeout`, 10s when unparseable.
    pub fn timeout(&self) -> Duration {
        parse_duration(&self.timeout).unwrap_or(Duration::from_secs(10))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Try the remote predictor before synthesizing locally.
    pub remote_enabled: bool,
    pub bounds: InputBounds,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            bounds: InputBounds::default(),
        }
    }
}

/// Model artifacts whose presence the health endpoint reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub artifacts: Vec<PathBuf>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifacts: vec![
                PathBuf::from("models/model1_random_forest.joblib"),
                PathBuf::from("models/model2_ridge.joblib"),
                PathBuf::from("models/scaler1.joblib"),
            ],
        }
    }
}

impl ModelsConfig {
    /// Whether every configured artifact exists on disk.
    pub fn all_present(&self) -> bool {
        self.artifacts.iter().all(|p| p.exists())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
            allowed_headers: vec!["Content-Type".to_string()],
        }
    }
}

impl MatsizeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MatsizeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
