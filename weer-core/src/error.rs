//! Error types surfaced by the core.
//!
//! Every failure is terminal for the call that produced it; nothing here is retried.

/// Failures of a weather lookup.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// Rejected before any network call.
    #[error("City name cannot be empty")]
    InvalidInput,

    /// Provider error, unknown place, or an unreadable response.
    #[error("{message}")]
    LookupFailed {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WeatherError {
    pub(crate) fn lookup_failed(message: impl Into<String>, source: anyhow::Error) -> Self {
        WeatherError::LookupFailed { message: message.into(), source }
    }
}

/// Failures of device location resolution, each with its own user-facing copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location access denied. Enter a location manually in settings.")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Location request timed out. Try again or check your device settings.")]
    Timeout,
}

/// Errors reported by a [`crate::location::LocationService`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("location request timed out")]
    TimedOut,

    #[error("location services are disabled")]
    ServicesDisabled,

    #[error("{0}")]
    Other(String),
}

/// Errors from the settings layer. `load_settings` never lets these escape.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Unknown setting '{0}'. Supported: useGPS, defaultLocation, temperatureUnit, windUnit, darkMode, language.")]
    UnknownKey(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Settings storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Settings could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}
