use crate::{
    Config,
    error::WeatherError,
    gateway::openweather::OpenWeatherGateway,
    model::{Coordinates, TemperatureUnit, WeatherReport},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Samples per day in a 3-hour forecast feed.
pub const FORECAST_STRIDE: usize = 8;

/// Maximum number of forecast days returned.
pub const FORECAST_DAYS: usize = 5;

/// Spacing the stride assumes between consecutive forecast samples.
pub const FORECAST_INTERVAL_SECS: i64 = 3 * 60 * 60;

/// Current conditions plus daily forecast, in one call.
///
/// Both lookups return the same normalized [`WeatherReport`], so callers never see
/// the provider's wire format.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    /// Fails with [`WeatherError::InvalidInput`] for a blank name, before any request.
    async fn by_city(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError>;

    async fn by_coordinates(
        &self,
        at: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError>;
}

/// One sample per day out of a fixed-interval feed: indices 0, 8, 16, 24, 32.
pub fn daily_samples<T>(samples: impl IntoIterator<Item = T>) -> Vec<T> {
    samples.into_iter().step_by(FORECAST_STRIDE).take(FORECAST_DAYS).collect()
}

/// Indices of samples whose distance to the previous one is not [`FORECAST_INTERVAL_SECS`].
///
/// Any hit means stride bucketing no longer lands on one sample per calendar day.
pub fn misaligned_samples(timestamps: &[i64]) -> Vec<usize> {
    timestamps
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1] - pair[0] != FORECAST_INTERVAL_SECS)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Provider icon image for a condition code such as `10d`.
pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Construct the gateway described by the configuration.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherGateway>> {
    gateway_from_key(config.resolved_api_key(), config)
}

/// Construct the gateway for `config`'s endpoint with an already resolved API key.
pub fn gateway_from_key(
    api_key: Option<String>,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherGateway>> {
    let api_key = api_key.ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weer configure` or set WEATHER_API_KEY."
        )
    })?;

    Ok(Box::new(OpenWeatherGateway::with_base_url(api_key, &config.base_url)))
}
