use weer_core::{
    CurrentWeather, ForecastDay, Preferences, WeatherReport, WindUnit, gateway::icon_url,
    units::{format_day, format_humidity, format_pressure, format_temp, format_wind_speed},
};

pub fn report(report: &WeatherReport, wind_unit: WindUnit) -> String {
    let mut out = current(&report.current, wind_unit);
    if !report.forecast.is_empty() {
        out.push_str("\n5-day forecast\n");
        for day in &report.forecast {
            out.push_str(&forecast_row(day));
            out.push('\n');
        }
    }
    out
}

fn current(weather: &CurrentWeather, wind_unit: WindUnit) -> String {
    let unit = weather.temperature_unit;
    let place = match &weather.country {
        Some(country) => format!("{}, {}", weather.place_name, country),
        None => weather.place_name.clone(),
    };

    let mut out = format!("{place}\n");
    out.push_str(&format!(
        "  {}  {}\n",
        format_temp(weather.temperature, unit),
        weather.description
    ));
    out.push_str(&format!("  Feels like  {}\n", format_temp(weather.feels_like, unit)));
    out.push_str(&format!(
        "  Min / max   {} / {}\n",
        format_temp(weather.temp_min, unit),
        format_temp(weather.temp_max, unit)
    ));
    out.push_str(&format!("  Humidity    {}\n", format_humidity(weather.humidity_pct)));
    out.push_str(&format!(
        "  Wind        {}\n",
        format_wind_speed(weather.wind_speed, wind_unit, weather.unit_system)
    ));
    out.push_str(&format!("  Pressure    {}\n", format_pressure(weather.pressure_hpa)));
    if !weather.icon.is_empty() {
        out.push_str(&format!("  Icon        {}\n", icon_url(&weather.icon)));
    }
    out
}

fn forecast_row(day: &ForecastDay) -> String {
    format!(
        "  {}  {:>6} {:>6}  {}",
        format_day(day.timestamp),
        format_temp(day.temp_max, day.temperature_unit),
        format_temp(day.temp_min, day.temperature_unit),
        day.description
    )
}

pub fn preferences(prefs: &Preferences) -> String {
    [
        ("useGPS", prefs.use_gps.to_string()),
        ("defaultLocation", prefs.default_location.clone()),
        ("temperatureUnit", prefs.temperature_unit.to_string()),
        ("windUnit", prefs.wind_unit.to_string()),
        ("darkMode", prefs.dark_mode.to_string()),
        ("language", prefs.language.to_string()),
    ]
    .iter()
    .map(|(key, value)| format!("{key:<16}{value}\n"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use weer_core::{Language, TemperatureUnit, UnitSystem};

    fn sample() -> WeatherReport {
        let ts = Utc.with_ymd_and_hms(2024, 5, 13, 12, 0, 0).unwrap();
        WeatherReport {
            current: CurrentWeather {
                place_name: "Amsterdam".into(),
                country: Some("NL".into()),
                temperature: 20.6,
                feels_like: 19.2,
                temp_min: 18.0,
                temp_max: 22.4,
                humidity_pct: 81,
                wind_speed: 5.0,
                pressure_hpa: 1013.0,
                icon: "10d".into(),
                description: "light rain".into(),
                observation_time: ts,
                temperature_unit: TemperatureUnit::Celsius,
                unit_system: UnitSystem::Metric,
            },
            forecast: vec![ForecastDay {
                timestamp: ts,
                temperature: 20.0,
                temp_min: 14.6,
                temp_max: 21.5,
                humidity_pct: 60,
                wind_speed: 3.0,
                icon: "03d".into(),
                description: "scattered clouds".into(),
                temperature_unit: TemperatureUnit::Celsius,
                unit_system: UnitSystem::Metric,
            }],
        }
    }

    #[test]
    fn report_uses_display_units() {
        let out = report(&sample(), WindUnit::KmH);

        assert!(out.starts_with("Amsterdam, NL\n"));
        assert!(out.contains("21°C  light rain"));
        assert!(out.contains("Wind        18 km/h"));
        assert!(out.contains("Humidity    81%"));
        assert!(out.contains("Pressure    1013 hPa"));
        assert!(out.contains("https://openweathermap.org/img/wn/10d@2x.png"));
        assert!(out.contains("Mon"));
        assert!(out.contains("22°C"));
        assert!(out.contains("15°C"));
    }

    #[test]
    fn preferences_list_every_field() {
        let prefs = Preferences {
            use_gps: false,
            default_location: "Amsterdam".into(),
            temperature_unit: TemperatureUnit::Fahrenheit,
            wind_unit: WindUnit::Mph,
            dark_mode: true,
            language: Language::English,
        };

        let out = preferences(&prefs);
        assert_eq!(out.lines().count(), 6);
        assert!(out.contains("temperatureUnit Fahrenheit"));
        assert!(out.contains("windUnit        mph"));
    }
}
