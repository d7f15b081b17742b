use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, Text};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use weer_core::{
    Config, Coordinates, LocationConfig, LocationResolver, PermissionSession, Preferences,
    SettingUpdate, SettingsStore, WeatherGateway, gateway_from_config,
    location::StaticLocationService,
    map::{MapLayer, Tile, tile_url},
    search::{self, SearchInput},
    settings::{FileStore, SystemLocale},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weer", version, about = "Weather lookups from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional fixed location.
    Configure,

    /// Show current weather and the 5-day forecast.
    ///
    /// Without arguments, uses device location when `useGPS` is on, else the default location.
    Show {
        /// City name.
        city: Option<String>,

        /// Latitude; requires --lon.
        #[arg(long, requires = "lon", allow_negative_numbers = true, conflicts_with = "city")]
        lat: Option<f64>,

        /// Longitude; requires --lat.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Use the device location regardless of the `useGPS` setting.
        #[arg(long, conflicts_with_all = ["city", "lat"])]
        here: bool,
    },

    /// Read search text from stdin, one edit per line, and look up each settled query.
    Search {
        /// Quiet period in milliseconds before a query is looked up.
        #[arg(long, default_value_t = 600)]
        quiet_ms: u64,
    },

    /// Inspect or change preferences.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Print the weather overlay tile URL covering a location.
    Map {
        /// clouds, precipitation, temperature, wind or pressure.
        layer: String,

        #[arg(long, default_value_t = 6)]
        zoom: u8,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the current preferences.
    Show,

    /// Change one preference, e.g. `set temperatureUnit Kelvin`.
    Set { key: String, value: String },

    /// Overwrite stored preferences with the defaults for this locale.
    Reset,
}

/// Collaborators shared by the commands.
struct App {
    config: Config,
    settings: SettingsStore,
    resolver: LocationResolver,
}

impl App {
    fn load() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let settings =
            SettingsStore::new(Arc::new(FileStore::in_data_dir()?), Arc::new(SystemLocale));

        let service = match &config.location {
            Some(loc) => StaticLocationService::new(Some(loc.coordinates()), loc.city.clone()),
            None => StaticLocationService::default(),
        };
        let resolver = LocationResolver::new(Arc::new(service));

        Ok(Self { config, settings, resolver })
    }

    fn gateway(&self) -> anyhow::Result<Box<dyn WeatherGateway>> {
        gateway_from_config(&self.config)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon, here } => {
                let app = App::load()?;
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(&app, city, coords, here).await
            }
            Command::Search { quiet_ms } => {
                let app = App::load()?;
                search_stdin(&app, Duration::from_millis(quiet_ms)).await
            }
            Command::Settings { action } => {
                let app = App::load()?;
                settings(&app.settings, action).await
            }
            Command::Map { layer, zoom, lat, lon } => {
                let app = App::load()?;
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                map(&app.config, &layer, zoom, coords)
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key cannot be empty"));
    }
    config.set_api_key(api_key.trim().to_string());

    let fixed = Confirm::new("Set a fixed location for \"use my location\"?")
        .with_default(config.location.is_some())
        .prompt()?;

    config.location = if fixed {
        let latitude = CustomType::<f64>::new("Latitude:").prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:").prompt()?;
        let city = Text::new("City name (optional):").prompt()?;
        let city = Some(city.trim().to_string()).filter(|c| !c.is_empty());
        Some(LocationConfig { latitude, longitude, city })
    } else {
        None
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    app: &App,
    city: Option<String>,
    coords: Option<Coordinates>,
    here: bool,
) -> anyhow::Result<()> {
    let prefs = app.settings.load_settings().await;
    let gateway = app.gateway()?;
    let unit = prefs.temperature_unit;

    let report = if let Some(at) = coords {
        gateway.by_coordinates(at, unit).await?
    } else if let Some(city) = city {
        gateway.by_city(&city, unit).await?
    } else if here || prefs.use_gps {
        match locate(app).await {
            Some(at) => gateway.by_coordinates(at, unit).await?,
            None => gateway.by_city(&prefs.default_location, unit).await?,
        }
    } else {
        gateway.by_city(&prefs.default_location, unit).await?
    };

    print!("{}", render::report(&report, prefs.wind_unit));
    Ok(())
}

/// Device coordinates, or `None` after telling the user why the default location is used instead.
async fn locate(app: &App) -> Option<Coordinates> {
    let mut session = PermissionSession::new();

    match app.resolver.get_current_location(&mut session).await {
        Ok(at) => {
            match app.resolver.city_from_coordinates(at).await {
                Ok(city) => tracing::info!(%city, "resolved device location"),
                Err(e) => tracing::debug!(error = %e, "reverse geocoding failed"),
            }
            Some(at)
        }
        Err(e) => {
            eprintln!("{e}\nUsing your default location instead.");
            None
        }
    }
}

async fn search_stdin(app: &App, quiet: Duration) -> anyhow::Result<()> {
    let gateway = app.gateway()?;
    let (input, mut queries) = search::debounced(quiet);

    tokio::spawn(feed_lines(BufReader::new(tokio::io::stdin()), input));

    while let Some(query) = queries.next().await {
        let prefs = app.settings.load_settings().await;
        match gateway.by_city(&query, prefs.temperature_unit).await {
            Ok(report) => print!("{}", render::report(&report, prefs.wind_unit)),
            Err(e) => eprintln!("{e}"),
        }
    }

    Ok(())
}

/// Pushes each line of `reader` as one search edit until EOF or the receiver is gone.
async fn feed_lines<R: AsyncBufRead + Unpin>(reader: R, input: SearchInput) {
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !input.push(line) {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read search input");
                break;
            }
        }
    }
}

async fn settings(store: &SettingsStore, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::Show => {
            print!("{}", render::preferences(&store.load_settings().await));
        }
        SettingsAction::Set { key, value } => {
            let update = SettingUpdate::parse(&key, &value)?;
            if !store.update_setting(update).await {
                return Err(anyhow!("Failed to save setting '{key}'"));
            }
            print!("{}", render::preferences(&store.load_settings().await));
        }
        SettingsAction::Reset => {
            let defaults: Preferences = store.default_settings();
            if !store.save_settings(&defaults).await {
                return Err(anyhow!("Failed to reset settings"));
            }
            print!("{}", render::preferences(&defaults));
        }
    }

    Ok(())
}

fn map(config: &Config, layer: &str, zoom: u8, coords: Option<Coordinates>) -> anyhow::Result<()> {
    let layer = MapLayer::try_from(layer)?;
    let at = coords
        .or_else(|| config.location.as_ref().map(LocationConfig::coordinates))
        .ok_or_else(|| {
            anyhow!(
                "No location given.\n\
                 Hint: pass --lat and --lon, or run `weer configure` to set a fixed location."
            )
        })?;
    let api_key = config
        .resolved_api_key()
        .ok_or_else(|| anyhow!("No OpenWeather API key configured.\nHint: run `weer configure`."))?;

    println!("{}", tile_url(&config.tile_url, layer, Tile::containing(at, zoom), &api_key));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weer_core::{TemperatureUnit, settings::{FixedLocale, MemoryStore}};

    #[test]
    fn show_accepts_coordinates() {
        let cli = Cli::try_parse_from(["weer", "show", "--lat", "-33.9", "--lon", "151.2"]).unwrap();
        let Command::Show { lat, lon, city, here } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(lat, Some(-33.9));
        assert_eq!(lon, Some(151.2));
        assert!(city.is_none());
        assert!(!here);
    }

    #[test]
    fn show_rejects_half_a_coordinate() {
        assert!(Cli::try_parse_from(["weer", "show", "--lat", "52.3"]).is_err());
        assert!(Cli::try_parse_from(["weer", "show", "Utrecht", "--here"]).is_err());
    }

    #[test]
    fn map_requires_location() {
        let err = map(&Config::default(), "clouds", 6, None).unwrap_err();
        assert!(err.to_string().contains("No location given"));

        let err = map(&Config::default(), "snow", 6, None).unwrap_err();
        assert!(err.to_string().contains("Unknown map layer"));
    }

    #[tokio::test(start_paused = true)]
    async fn piped_lines_become_debounced_searches() {
        let (input, mut queries) = search::debounced(Duration::from_millis(600));

        feed_lines(&b"Ut\nUtr\nUtrecht\n"[..], input).await;

        assert_eq!(queries.next().await.as_deref(), Some("Utrecht"));
        assert_eq!(queries.next().await, None);
    }

    #[tokio::test]
    async fn settings_set_updates_store() {
        let store = SettingsStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedLocale("en-US".into())),
        );

        let action = SettingsAction::Set { key: "temperatureUnit".into(), value: "Kelvin".into() };
        settings(&store, action).await.unwrap();
        assert_eq!(store.load_settings().await.temperature_unit, TemperatureUnit::Kelvin);

        settings(&store, SettingsAction::Reset).await.unwrap();
        assert_eq!(store.load_settings().await.temperature_unit, TemperatureUnit::Fahrenheit);

        let action = SettingsAction::Set { key: "colour".into(), value: "red".into() };
        assert!(settings(&store, action).await.is_err());
    }
}
