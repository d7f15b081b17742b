//! Display formatting for raw provider values.

use chrono::{DateTime, Utc};

use crate::model::{TemperatureUnit, UnitSystem, WindUnit};

/// m/s to km/h.
pub const MPS_TO_KMH: f64 = 3.6;
/// m/s to mph.
pub const MPS_TO_MPH: f64 = 2.23694;
/// mph to km/h.
pub const MPH_TO_KMH: f64 = 1.60934;

/// Nearest integer, halves rounded toward positive infinity.
fn round_display(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Formats a temperature already expressed in `unit`, e.g. `21°C` or `294 K`.
pub fn format_temp(value: f64, unit: TemperatureUnit) -> String {
    let rounded = round_display(value);
    match unit {
        TemperatureUnit::Celsius => format!("{rounded}°C"),
        TemperatureUnit::Fahrenheit => format!("{rounded}°F"),
        TemperatureUnit::Kelvin => format!("{rounded} K"),
    }
}

/// Formats a wind speed reported in `source`'s native unit for display in `display`.
///
/// Knots has no conversion path: the value is shown unconverted in the source unit.
pub fn format_wind_speed(speed: f64, display: WindUnit, source: UnitSystem) -> String {
    let converted = match (source, display) {
        (UnitSystem::Imperial, WindUnit::KmH) => speed * MPH_TO_KMH,
        (UnitSystem::Imperial, WindUnit::Mph) => speed,
        (UnitSystem::Metric | UnitSystem::Standard, WindUnit::KmH) => speed * MPS_TO_KMH,
        (UnitSystem::Metric | UnitSystem::Standard, WindUnit::Mph) => speed * MPS_TO_MPH,
        (_, WindUnit::Knots) => {
            tracing::debug!(%source, "no knots conversion defined, showing source unit");
            return format!("{} {}", round_display(speed), source.wind_label());
        }
    };

    format!("{} {}", round_display(converted), display.as_str())
}

/// Short weekday name used for forecast rows, e.g. `Mon`.
pub fn format_day(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a").to_string()
}

pub fn format_humidity(humidity_pct: u8) -> String {
    format!("{humidity_pct}%")
}

pub fn format_pressure(pressure_hpa: f64) -> String {
    format!("{} hPa", round_display(pressure_hpa))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn temperatures_round_and_carry_unit_suffix() {
        assert_eq!(format_temp(20.6, TemperatureUnit::Celsius), "21°C");
        assert_eq!(format_temp(293.5, TemperatureUnit::Kelvin), "294 K");
        assert_eq!(format_temp(68.4, TemperatureUnit::Fahrenheit), "68°F");
    }

    #[test]
    fn small_negative_temperatures_do_not_render_negative_zero() {
        assert_eq!(format_temp(-0.3, TemperatureUnit::Celsius), "0°C");
        assert_eq!(format_temp(-4.7, TemperatureUnit::Celsius), "-5°C");
    }

    #[test]
    fn halves_round_toward_positive_infinity() {
        assert_eq!(format_temp(-2.5, TemperatureUnit::Celsius), "-2°C");
        assert_eq!(format_temp(-0.5, TemperatureUnit::Celsius), "0°C");
        assert_eq!(format_temp(2.5, TemperatureUnit::Fahrenheit), "3°F");
    }

    #[test]
    fn metric_wind_is_converted_from_meters_per_second() {
        assert_eq!(format_wind_speed(5.0, WindUnit::KmH, UnitSystem::Metric), "18 km/h");
        assert_eq!(format_wind_speed(10.0, WindUnit::Mph, UnitSystem::Metric), "22 mph");
        assert_eq!(format_wind_speed(5.0, WindUnit::KmH, UnitSystem::Standard), "18 km/h");
    }

    #[test]
    fn imperial_wind_is_only_converted_when_units_differ() {
        assert_eq!(format_wind_speed(10.0, WindUnit::Mph, UnitSystem::Imperial), "10 mph");
        assert_eq!(format_wind_speed(10.0, WindUnit::KmH, UnitSystem::Imperial), "16 km/h");
    }

    #[test]
    fn knots_falls_back_to_source_unit() {
        assert_eq!(format_wind_speed(4.4, WindUnit::Knots, UnitSystem::Metric), "4 m/s");
        assert_eq!(format_wind_speed(12.6, WindUnit::Knots, UnitSystem::Imperial), "13 mph");
    }

    #[test]
    fn weekday_labels_are_short() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 13, 12, 0, 0).unwrap();
        assert_eq!(format_day(ts), "Mon");
    }

    #[test]
    fn humidity_and_pressure() {
        assert_eq!(format_humidity(81), "81%");
        assert_eq!(format_pressure(1013.4), "1013 hPa");
    }
}
