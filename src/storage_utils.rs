use crate::indicators::IndicatorPeriods;
use crate::llm::LlmConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

// CONFIGURATION STRUCTS
// Loaded once in `main` and passed down by reference.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KlineConfig {
    pub base_url: String, // e.g., "https://fapi.binance.com"
    pub path: String,     // e.g., "/fapi/v1/klines"
    pub interval: String, // e.g., "1h", "4h", "1d"
    pub limit: u32,       // e.g., 500 candles
    /// Exchange REQUEST_WEIGHT budget per minute.
    pub request_weight_limit: u32,
}

impl Default for KlineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.binance.com".to_string(),
            path: "/fapi/v1/klines".to_string(),
            interval: "4h".to_string(),
            limit: 500,
            request_weight_limit: 2400,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub klines: KlineConfig,
    #[serde(default)]
    pub indicators: IndicatorPeriods,
    /// Commentary is skipped when absent.
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            klines: KlineConfig::default(),
            indicators: IndicatorPeriods::default(),
            llm: None,
        }
    }
}

// STORAGE MANAGER

pub struct AsyncStorageManager {
    // Absolute path to the storage directory (e.g., ".../target/debug/storage")
    pub base_dir: PathBuf,
}

impl AsyncStorageManager {
    /// Storage directory relative to the running executable, created if missing.
    pub async fn new_relative<P: AsRef<Path>>(relative_path: P) -> anyhow::Result<Self> {
        let exe_path = std::env::current_exe()?;

        let base_dir = exe_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Could not find binary directory"))?
            .join(relative_path);

        Self::at(base_dir).await
    }

    pub async fn at<P: Into<PathBuf>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir).await?;
        }
        Ok(Self { base_dir })
    }

    /// Writes `<filename>.json` through a temp file and a rename so readers
    /// never see a half-written file.
    pub async fn save<T: Serialize>(&self, filename: &str, data: &T) -> anyhow::Result<()> {
        let file_name = format!("{}.json", filename);
        let final_path = self.base_dir.join(&file_name);
        let tmp_path = self.base_dir.join(format!("{}.tmp", file_name));

        let json_bytes = serde_json::to_vec_pretty(data)?;

        fs::write(&tmp_path, json_bytes).await?;
        fs::rename(tmp_path, final_path).await?;

        Ok(())
    }

    pub async fn load<T: DeserializeOwned>(&self, filename: &str) -> anyhow::Result<T> {
        let path = self.base_dir.join(format!("{}.json", filename));

        // serde_json validates UTF-8 itself, so skip read_to_string.
        let content = fs::read(path).await?;

        let data = serde_json::from_slice(&content)?;
        Ok(data)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.base_dir.join(format!("{}.json", filename)).exists()
    }

    /// Loads `config.json`, writing the defaults first if it does not exist yet.
    pub async fn load_config(&self) -> anyhow::Result<AppConfig> {
        if !self.exists("config") {
            let config = AppConfig::default();
            self.save("config", &config).await?;
            info!(path = ?self.base_dir.join("config.json"), "wrote default config");
            return Ok(config);
        }
        self.load("config").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::at(dir.path()).await.unwrap();

        let config = AppConfig {
            symbols: vec!["SOLUSDT".to_string()],
            ..AppConfig::default()
        };
        storage.save("config", &config).await.unwrap();

        let loaded: AppConfig = storage.load("config").await.unwrap();
        assert_eq!(loaded, config);
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::at(dir.path().join("storage")).await.unwrap();

        let config = storage.load_config().await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(storage.exists("config"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"symbols":["BNBUSDT"],"klines":{"interval":"1d"}}"#).unwrap();
        assert_eq!(config.symbols, vec!["BNBUSDT"]);
        assert_eq!(config.klines.interval, "1d");
        assert_eq!(config.klines.limit, 500);
        assert_eq!(config.indicators.rsi_period, 14);
        assert!(config.llm.is_none());
    }
}
