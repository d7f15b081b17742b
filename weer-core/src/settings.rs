//! User preferences persisted as one JSON blob in a key-value store.
//!
//! Reads never fail: a missing or unreadable blob yields locale-derived defaults.
//! Writes report success as a plain `bool`, matching how the settings screens
//! consume them.

use anyhow::anyhow;
use async_trait::async_trait;
use directories::ProjectDirs;
use serde_json::Value;
use std::{collections::HashMap, fmt::Debug, io, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    error::SettingsError,
    model::{Language, Preferences, TemperatureUnit, WindUnit},
};

/// Storage key holding the serialized [`Preferences`].
pub const SETTINGS_KEY: &str = "weatherSettings";

/// Location used until the user picks one.
pub const DEFAULT_LOCATION: &str = "Amsterdam";

/// Flat async key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> io::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted in the platform data directory.
    pub fn in_data_dir() -> anyhow::Result<Self> {
        let dirs = ProjectDirs::from("dev", "weer", "weer")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(Self::new(dirs.data_dir()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(key), value).await
    }
}

/// In-process store, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let entries = HashMap::from([(key.to_string(), value.to_string())]);
        Self { entries: Mutex::new(entries) }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Source of the device locale, as a BCP 47 tag such as `en-US`.
pub trait LocaleSource: Send + Sync + Debug {
    fn locale(&self) -> String;
}

/// Reads the locale from `LC_ALL`, `LC_MESSAGES` or `LANG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocale;

impl LocaleSource for SystemLocale {
    fn locale(&self) -> String {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
            .map(|v| normalize_locale(&v))
            .unwrap_or_else(|| "en".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct FixedLocale(pub String);

impl LocaleSource for FixedLocale {
    fn locale(&self) -> String {
        self.0.clone()
    }
}

/// Turns a POSIX locale like `nl_NL.UTF-8@euro` into `nl-NL`.
pub fn normalize_locale(raw: &str) -> String {
    let tag = raw.trim().split(['.', '@']).next().unwrap_or_default();
    match tag {
        "" | "C" | "POSIX" => "en".to_string(),
        tag => tag.replace('_', "-"),
    }
}

/// Defaults for a first run on a device with the given locale.
pub fn default_settings(locale: &str) -> Preferences {
    let us = locale == "en-US";

    Preferences {
        use_gps: false,
        default_location: DEFAULT_LOCATION.to_string(),
        temperature_unit: if us { TemperatureUnit::Fahrenheit } else { TemperatureUnit::Celsius },
        wind_unit: if us { WindUnit::Mph } else { WindUnit::KmH },
        dark_mode: false,
        language: if locale.starts_with("nl") { Language::Dutch } else { Language::English },
    }
}

/// A single-field change to [`Preferences`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingUpdate {
    UseGps(bool),
    DefaultLocation(String),
    TemperatureUnit(TemperatureUnit),
    WindUnit(WindUnit),
    DarkMode(bool),
    Language(Language),
}

impl SettingUpdate {
    /// Storage field name this update writes.
    pub fn key(&self) -> &'static str {
        match self {
            SettingUpdate::UseGps(_) => "useGPS",
            SettingUpdate::DefaultLocation(_) => "defaultLocation",
            SettingUpdate::TemperatureUnit(_) => "temperatureUnit",
            SettingUpdate::WindUnit(_) => "windUnit",
            SettingUpdate::DarkMode(_) => "darkMode",
            SettingUpdate::Language(_) => "language",
        }
    }

    /// Parses a textual `key = value` pair, keyed by the stored field name.
    pub fn parse(key: &str, value: &str) -> Result<Self, SettingsError> {
        let invalid = |e: anyhow::Error| SettingsError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        };

        let update = match key {
            "useGPS" => SettingUpdate::UseGps(parse_bool(value).map_err(invalid)?),
            "defaultLocation" if value.trim().is_empty() => {
                return Err(invalid(anyhow!("location cannot be empty")));
            }
            "defaultLocation" => SettingUpdate::DefaultLocation(value.trim().to_string()),
            "temperatureUnit" => {
                SettingUpdate::TemperatureUnit(TemperatureUnit::try_from(value).map_err(invalid)?)
            }
            "windUnit" => SettingUpdate::WindUnit(WindUnit::try_from(value).map_err(invalid)?),
            "darkMode" => SettingUpdate::DarkMode(parse_bool(value).map_err(invalid)?),
            "language" => SettingUpdate::Language(Language::try_from(value).map_err(invalid)?),
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        };

        Ok(update)
    }

    pub fn apply(self, prefs: &mut Preferences) {
        match self {
            SettingUpdate::UseGps(v) => prefs.use_gps = v,
            SettingUpdate::DefaultLocation(v) => prefs.default_location = v,
            SettingUpdate::TemperatureUnit(v) => prefs.temperature_unit = v,
            SettingUpdate::WindUnit(v) => prefs.wind_unit = v,
            SettingUpdate::DarkMode(v) => prefs.dark_mode = v,
            SettingUpdate::Language(v) => prefs.language = v,
        }
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(anyhow!("expected true or false, got '{other}'")),
    }
}

/// Handle to the persisted preferences. Cheap to clone; pass it to whatever needs settings.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStore>,
    locale: Arc<dyn LocaleSource>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, locale: Arc<dyn LocaleSource>) -> Self {
        Self { storage, locale }
    }

    pub fn default_settings(&self) -> Preferences {
        default_settings(&self.locale.locale())
    }

    /// Stored preferences, or defaults when nothing usable is stored.
    ///
    /// A blob missing some fields keeps the stored ones and fills the rest from defaults.
    pub async fn load_settings(&self) -> Preferences {
        let defaults = self.default_settings();

        let blob = match self.storage.get(SETTINGS_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return defaults,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read settings, using defaults");
                return defaults;
            }
        };

        match merge_over_defaults(&blob, &defaults) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(error = %e, "stored settings are malformed, using defaults");
                defaults
            }
        }
    }

    /// Overwrites the stored blob with `prefs`.
    pub async fn save_settings(&self, prefs: &Preferences) -> bool {
        match self.try_save(prefs).await {
            Ok(()) => {
                tracing::debug!(?prefs, "settings saved");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save settings");
                false
            }
        }
    }

    /// Loads, changes one field and saves. Concurrent updates may overwrite each other.
    pub async fn update_setting(&self, update: SettingUpdate) -> bool {
        let key = update.key();
        let mut prefs = self.load_settings().await;
        update.apply(&mut prefs);

        let saved = self.save_settings(&prefs).await;
        if !saved {
            tracing::warn!(setting = key, "failed to update setting");
        }
        saved
    }

    async fn try_save(&self, prefs: &Preferences) -> Result<(), SettingsError> {
        let blob = serde_json::to_string(prefs)?;
        self.storage.set(SETTINGS_KEY, &blob).await?;
        Ok(())
    }
}

fn merge_over_defaults(blob: &str, defaults: &Preferences) -> Result<Preferences, SettingsError> {
    let stored: Value = serde_json::from_str(blob)?;
    let Value::Object(stored) = stored else {
        return Err(SettingsError::InvalidValue {
            key: SETTINGS_KEY.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };

    let mut merged = serde_json::to_value(defaults)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(stored);
    }

    Ok(serde_json::from_value(merged)?)
}
