use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
            TemperatureUnit::Kelvin => "Kelvin",
        }
    }

    /// Unit system the provider must be queried with so that temperatures come back in `self`.
    pub fn unit_system(&self) -> UnitSystem {
        match self {
            TemperatureUnit::Celsius => UnitSystem::Metric,
            TemperatureUnit::Fahrenheit => UnitSystem::Imperial,
            TemperatureUnit::Kelvin => UnitSystem::Standard,
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, TemperatureUnit::Kelvin]
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" => Ok(TemperatureUnit::Kelvin),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported: Celsius, Fahrenheit, Kelvin."
            )),
        }
    }
}

/// Wind speed unit chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindUnit {
    #[serde(rename = "km/h")]
    KmH,
    #[serde(rename = "mph")]
    Mph,
    #[serde(rename = "knots")]
    Knots,
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::KmH => "km/h",
            WindUnit::Mph => "mph",
            WindUnit::Knots => "knots",
        }
    }

    pub const fn all() -> &'static [WindUnit] {
        &[WindUnit::KmH, WindUnit::Mph, WindUnit::Knots]
    }
}

impl std::fmt::Display for WindUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WindUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "km/h" | "kmh" | "kph" => Ok(WindUnit::KmH),
            "mph" => Ok(WindUnit::Mph),
            "knots" | "kn" => Ok(WindUnit::Knots),
            _ => Err(anyhow::anyhow!("Unknown wind unit '{value}'. Supported: km/h, mph, knots.")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Dutch,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Dutch => "Dutch",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Language {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "dutch" | "nl" | "nederlands" => Ok(Language::Dutch),
            _ => Err(anyhow::anyhow!("Unknown language '{value}'. Supported: English, Dutch.")),
        }
    }
}

/// Provider-side value encoding, sent as the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Celsius, wind in m/s.
    Metric,
    /// Fahrenheit, wind in mph.
    Imperial,
    /// Kelvin, wind in m/s.
    Standard,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Standard => "standard",
        }
    }

    /// Label of the wind speed unit the provider reports in this system.
    pub fn wind_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "mph",
            UnitSystem::Metric | UnitSystem::Standard => "m/s",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User preferences, persisted as a single JSON blob.
///
/// Field names on disk keep the camelCase spelling used by earlier releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "useGPS")]
    pub use_gps: bool,
    #[serde(rename = "defaultLocation")]
    pub default_location: String,
    #[serde(rename = "temperatureUnit")]
    pub temperature_unit: TemperatureUnit,
    #[serde(rename = "windUnit")]
    pub wind_unit: WindUnit,
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Current conditions, in the units of the request that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub place_name: String,
    pub country: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub pressure_hpa: f64,
    pub icon: String,
    pub description: String,
    pub observation_time: DateTime<Utc>,
    pub temperature_unit: TemperatureUnit,
    pub unit_system: UnitSystem,
}

/// One forecast sample per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub icon: String,
    pub description: String,
    pub temperature_unit: TemperatureUnit,
    pub unit_system: UnitSystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_unit_maps_to_unit_system() {
        assert_eq!(TemperatureUnit::Celsius.unit_system(), UnitSystem::Metric);
        assert_eq!(TemperatureUnit::Fahrenheit.unit_system(), UnitSystem::Imperial);
        assert_eq!(TemperatureUnit::Kelvin.unit_system(), UnitSystem::Standard);
    }

    #[test]
    fn temperature_unit_parses_its_own_name() {
        for unit in TemperatureUnit::all() {
            assert_eq!(TemperatureUnit::try_from(unit.as_str()).unwrap(), *unit);
        }
        let err = TemperatureUnit::try_from("rankine").unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit 'rankine'"));
    }

    #[test]
    fn wind_unit_serializes_with_display_label() {
        let json = serde_json::to_string(&WindUnit::KmH).unwrap();
        assert_eq!(json, "\"km/h\"");
        for unit in WindUnit::all() {
            assert_eq!(WindUnit::try_from(unit.as_str()).unwrap(), *unit);
        }
    }

    #[test]
    fn preferences_use_legacy_field_names() {
        let prefs = Preferences {
            use_gps: true,
            default_location: "Utrecht".into(),
            temperature_unit: TemperatureUnit::Kelvin,
            wind_unit: WindUnit::Knots,
            dark_mode: false,
            language: Language::Dutch,
        };

        let value = serde_json::to_value(&prefs).unwrap();
        assert_eq!(value["useGPS"], true);
        assert_eq!(value["defaultLocation"], "Utrecht");
        assert_eq!(value["temperatureUnit"], "Kelvin");
        assert_eq!(value["windUnit"], "knots");
        assert_eq!(value["darkMode"], false);
        assert_eq!(value["language"], "Dutch");
    }
}
