use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "THERMEX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "thermex.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Character device, e.g. /dev/ttyUSB0; serial ingest is off when unset
    pub device: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub base_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    pub quiet_period_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub storage: Option<StorageConfig>,
    pub serial: Option<SerialConfig>,
    pub weather: Option<WeatherConfig>,
    pub debounce: Option<DebounceConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from THERMEX_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// Missing file means all defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Get HTTP bind address (default 0.0.0.0:3000)
    pub fn http_bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
    }

    /// SQLite file path (default ac_data.db)
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| PathBuf::from("ac_data.db"))
    }

    pub fn serial_device(&self) -> Option<PathBuf> {
        self.serial.as_ref().and_then(|s| s.device.clone())
    }

    /// Quiet period before a burst of readings settles (default 5s)
    pub fn quiet_period(&self) -> Duration {
        let ms = self
            .debounce
            .as_ref()
            .and_then(|d| d.quiet_period_ms)
            .unwrap_or(5_000);
        Duration::from_millis(ms)
    }

    pub fn weather_base_url(&self) -> String {
        self.weather
            .as_ref()
            .and_then(|w| w.base_url.clone())
            .unwrap_or_else(|| "https://api.open-meteo.com/v1/forecast".to_string())
    }

    /// (latitude, longitude); defaults to Franca-SP
    pub fn weather_coordinate(&self) -> (f64, f64) {
        let w = self.weather.as_ref();
        (
            w.and_then(|w| w.latitude).unwrap_or(-20.5382),
            w.and_then(|w| w.longitude).unwrap_or(-47.4009),
        )
    }

    pub fn weather_timezone(&self) -> String {
        self.weather
            .as_ref()
            .and_then(|w| w.timezone.clone())
            .unwrap_or_else(|| "America/Sao_Paulo".to_string())
    }

    pub fn weather_timeout(&self) -> Duration {
        let secs = self
            .weather
            .as_ref()
            .and_then(|w| w.timeout_secs)
            .unwrap_or(15);
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http_bind(), "0.0.0.0:3000");
        assert_eq!(cfg.db_path(), PathBuf::from("ac_data.db"));
        assert_eq!(cfg.serial_device(), None);
        assert_eq!(cfg.quiet_period(), Duration::from_secs(5));
        assert_eq!(cfg.weather_coordinate(), (-20.5382, -47.4009));
        assert_eq!(cfg.weather_timezone(), "America/Sao_Paulo");
        assert_eq!(cfg.weather_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.http_bind(), "0.0.0.0:3000");
    }

    #[test]
    fn partial_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "127.0.0.1:8081"

[serial]
device = "/dev/ttyACM0"

[weather]
latitude = 52.37

[debounce]
quiet_period_ms = 250
"#
        )
        .unwrap();

        let cfg = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.http_bind(), "127.0.0.1:8081");
        assert_eq!(cfg.serial_device(), Some(PathBuf::from("/dev/ttyACM0")));
        assert_eq!(cfg.weather_coordinate(), (52.37, -47.4009));
        assert_eq!(cfg.quiet_period(), Duration::from_millis(250));
        assert_eq!(cfg.db_path(), PathBuf::from("ac_data.db"));
    }

    #[test]
    fn invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = 1").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::Toml(_))
        ));
    }
}
