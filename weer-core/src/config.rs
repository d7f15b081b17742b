use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{gateway::openweather::DEFAULT_BASE_URL, map::DEFAULT_TILE_URL, model::Coordinates};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Fixed position reported when no device location service is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Name returned by reverse geocoding for this position.
    pub city: Option<String>,
}

impl LocationConfig {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [location]
/// latitude = 52.37
/// longitude = 4.89
/// city = "Amsterdam"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    pub location: Option<LocationConfig>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_tile_url() -> String {
    DEFAULT_TILE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            tile_url: default_tile_url(),
            location: None,
        }
    }
}

impl Config {
    /// Load config from the platform config directory, or defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
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
        let dirs = ProjectDirs::from("dev", "weer", "weer")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment if set there, else from the file.
    pub fn resolved_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn is_configured(&self) -> bool {
        self.resolved_api_key().is_some()
    }
}

fn pick_api_key(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| file.filter(|k| !k.trim().is_empty()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openweather() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(cfg.tile_url, "https://tile.openweathermap.org/map");
        assert!(cfg.api_key.is_none());
        assert!(cfg.location.is_none());
    }

    #[test]
    fn environment_key_wins_over_file_key() {
        assert_eq!(pick_api_key(Some("ENV".into()), Some("FILE")), Some("ENV".into()));
        assert_eq!(pick_api_key(None, Some("FILE")), Some("FILE".into()));
        assert_eq!(pick_api_key(Some("  ".into()), Some("FILE")), Some("FILE".into()));
        assert_eq!(pick_api_key(None, Some("")), None);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("OPEN_KEY".into());
        cfg.location =
            Some(LocationConfig { latitude: 52.37, longitude: 4.89, city: Some("Amsterdam".into()) });
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_in_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"K\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("K"));
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
