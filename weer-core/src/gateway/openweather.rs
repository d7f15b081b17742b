use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::WeatherError,
    gateway::{daily_samples, misaligned_samples},
    model::{
        Coordinates, CurrentWeather, ForecastDay, TemperatureUnit, UnitSystem, WeatherReport,
    },
};

use super::WeatherGateway;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone, Copy)]
enum Query<'a> {
    City(&'a str),
    Coordinates(Coordinates),
}

impl Query<'_> {
    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Query::City(city) => vec![("q", city.to_string())],
            Query::Coordinates(at) => {
                vec![("lat", at.latitude.to_string()), ("lon", at.longitude.to_string())]
            }
        }
    }
}

impl OpenWeatherGateway {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Gateway talking to another deployment of the API, e.g. a mock server in tests.
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn fetch_report(&self, query: Query<'_>, unit: TemperatureUnit) -> Result<WeatherReport> {
        let system = unit.unit_system();
        tracing::debug!(?query, units = %system, temperature_unit = %unit, "fetching weather");

        let (current, forecast) = tokio::try_join!(
            self.fetch::<OwCurrentResponse>("weather", query, system),
            self.fetch::<OwForecastResponse>("forecast", query, system),
        )?;

        Ok(WeatherReport {
            current: current.into_current(unit, system),
            forecast: process_forecast(forecast.list, unit, system),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Query<'_>,
        system: UnitSystem,
    ) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut params = query.params();
        params.push(("units", system.as_str().to_string()));
        params.push(("appid", self.api_key.clone()));

        let res = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({endpoint})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {endpoint} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                endpoint,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {endpoint} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.icon.clone(), w.description.clone()))
        .unwrap_or_else(|| (String::new(), "Unknown".to_string()))
}

impl OwCurrentResponse {
    fn into_current(self, unit: TemperatureUnit, system: UnitSystem) -> CurrentWeather {
        let (icon, description) = condition(&self.weather);

        CurrentWeather {
            place_name: self.name,
            country: self.sys.and_then(|s| s.country),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            humidity_pct: self.main.humidity,
            wind_speed: self.wind.speed,
            pressure_hpa: self.main.pressure,
            icon,
            description,
            observation_time: unix_to_utc(self.dt).unwrap_or_else(Utc::now),
            temperature_unit: unit,
            unit_system: system,
        }
    }
}

/// Reduces the 3-hourly feed to one entry per day, tagged with the request's units.
pub(crate) fn process_forecast(
    list: Vec<OwForecastEntry>,
    unit: TemperatureUnit,
    system: UnitSystem,
) -> Vec<ForecastDay> {
    let timestamps: Vec<i64> = list.iter().map(|e| e.dt).collect();
    let misaligned = misaligned_samples(&timestamps);
    if !misaligned.is_empty() {
        tracing::warn!(?misaligned, "forecast feed is not 3-hourly, daily buckets may skew");
    }

    daily_samples(list)
        .into_iter()
        .map(|entry| {
            let (icon, description) = condition(&entry.weather);
            ForecastDay {
                timestamp: unix_to_utc(entry.dt).unwrap_or_else(Utc::now),
                temperature: entry.main.temp,
                temp_min: entry.main.temp_min,
                temp_max: entry.main.temp_max,
                humidity_pct: entry.main.humidity,
                wind_speed: entry.wind.speed,
                icon,
                description,
                temperature_unit: unit,
                unit_system: system,
            }
        })
        .collect()
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn by_city(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidInput);
        }

        self.fetch_report(Query::City(city), unit).await.map_err(|e| {
            tracing::warn!(city, error = %e, "weather lookup failed");
            WeatherError::lookup_failed(format!("Could not find weather data for \"{city}\"."), e)
        })
    }

    async fn by_coordinates(
        &self,
        at: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError> {
        self.fetch_report(Query::Coordinates(at), unit).await.map_err(|e| {
            tracing::warn!(%at, error = %e, "weather lookup failed");
            WeatherError::lookup_failed("Could not fetch weather for this location", e)
        })
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dt: i64, temp: f64) -> OwForecastEntry {
        OwForecastEntry {
            dt,
            main: OwMain {
                temp,
                feels_like: temp,
                temp_min: temp - 1.0,
                temp_max: temp + 1.0,
                pressure: 1012.0,
                humidity: 70,
            },
            weather: vec![OwWeather { description: "light rain".into(), icon: "10d".into() }],
            wind: OwWind { speed: 4.0 },
        }
    }

    fn feed(n: usize) -> Vec<OwForecastEntry> {
        (0..n).map(|i| entry(1_700_000_000 + i as i64 * 10_800, i as f64)).collect()
    }

    #[test]
    fn forecast_keeps_one_sample_per_day() {
        let days = process_forecast(feed(40), TemperatureUnit::Celsius, UnitSystem::Metric);

        assert_eq!(days.len(), 5);
        let temps: Vec<f64> = days.iter().map(|d| d.temperature).collect();
        assert_eq!(temps, vec![0.0, 8.0, 16.0, 24.0, 32.0]);
        assert!(days.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(
            days.windows(2)
                .all(|w| w[0].timestamp.date_naive() != w[1].timestamp.date_naive())
        );
    }

    #[test]
    fn forecast_entries_are_tagged_with_request_units() {
        let days = process_forecast(feed(9), TemperatureUnit::Kelvin, UnitSystem::Standard);

        assert_eq!(days.len(), 2);
        for day in &days {
            assert_eq!(day.temperature_unit, TemperatureUnit::Kelvin);
            assert_eq!(day.unit_system, UnitSystem::Standard);
            assert_eq!(day.icon, "10d");
            assert_eq!(day.description, "light rain");
        }
    }

    #[test]
    fn short_and_empty_feeds() {
        assert!(process_forecast(vec![], TemperatureUnit::Celsius, UnitSystem::Metric).is_empty());
        assert_eq!(
            process_forecast(feed(1), TemperatureUnit::Celsius, UnitSystem::Metric).len(),
            1
        );
    }

    #[test]
    fn missing_condition_is_unknown() {
        let mut e = entry(1_700_000_000, 12.0);
        e.weather.clear();
        let days = process_forecast(vec![e], TemperatureUnit::Celsius, UnitSystem::Metric);
        assert_eq!(days[0].description, "Unknown");
        assert_eq!(days[0].icon, "");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let gw = OpenWeatherGateway::with_base_url("KEY".into(), "http://localhost:1234/");
        assert_eq!(gw.base_url, "http://localhost:1234");
    }
}
