//! Core library for the Weer weather app.
//!
//! This crate defines:
//! - User preferences and their persistence (`settings`)
//! - Device location with accuracy fallbacks (`location`)
//! - Weather lookups normalized to current conditions plus a daily forecast (`gateway`)
//! - Display formatting of raw values (`units`)
//!
//! Presentation code (the `weer` CLI, or any other front end) wires these together
//! and renders the results.

pub mod config;
pub mod error;
pub mod gateway;
pub mod location;
pub mod map;
pub mod model;
pub mod search;
pub mod settings;
pub mod units;

pub use config::{Config, LocationConfig};
pub use error::{DeviceError, LocationError, SettingsError, WeatherError};
pub use gateway::{WeatherGateway, gateway_from_config, openweather::OpenWeatherGateway};
pub use location::{LocationResolver, LocationService, PermissionSession};
pub use model::{
    Coordinates, CurrentWeather, ForecastDay, Language, Preferences, TemperatureUnit,
    UnitSystem, WeatherReport, WindUnit,
};
pub use settings::{SettingUpdate, SettingsStore};
