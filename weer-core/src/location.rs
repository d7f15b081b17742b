//! Device location with progressively cheaper accuracy tiers.
//!
//! The resolver prefers a fast, imprecise answer over blocking: cached position
//! first, then a low-accuracy fix, then a balanced one, each with its own time budget.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    error::{DeviceError, LocationError},
    model::Coordinates,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Precision/speed tradeoff requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Low,
    Balanced,
}

/// One reverse-geocoding result. Which fields are filled depends on the place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    pub city: Option<String>,
    pub district: Option<String>,
    pub subregion: Option<String>,
    pub region: Option<String>,
}

impl Placemark {
    /// Most specific non-empty place name.
    pub fn place_name(&self) -> Option<&str> {
        [&self.city, &self.district, &self.subregion, &self.region]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .find(|s| !s.trim().is_empty())
    }
}

/// The device's location service.
#[async_trait]
pub trait LocationService: Send + Sync + Debug {
    async fn permission_status(&self) -> PermissionStatus;

    /// Prompts the user if the platform allows it.
    async fn request_permission(&self) -> PermissionStatus;

    /// Cached position, without waiting for a new fix.
    async fn last_known_position(&self) -> Result<Option<Coordinates>, DeviceError>;

    /// Fresh fix. `time_budget` is a hint; the resolver enforces it regardless.
    async fn current_position(
        &self,
        accuracy: Accuracy,
        time_budget: Duration,
    ) -> Result<Coordinates, DeviceError>;

    async fn reverse_geocode(&self, at: Coordinates) -> Result<Vec<Placemark>, DeviceError>;
}

/// Permission state for one app session. Once granted, the device is not asked again.
#[derive(Debug, Default)]
pub struct PermissionSession {
    granted: bool,
}

impl PermissionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Forget the grant, e.g. after the user changed it in system settings.
    pub fn reset(&mut self) {
        self.granted = false;
    }
}

/// Time allowed for each accuracy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverBudgets {
    pub low: Duration,
    pub balanced: Duration,
}

impl Default for ResolverBudgets {
    fn default() -> Self {
        Self { low: Duration::from_secs(5), balanced: Duration::from_secs(10) }
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    service: Arc<dyn LocationService>,
    budgets: ResolverBudgets,
}

impl LocationResolver {
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        Self::with_budgets(service, ResolverBudgets::default())
    }

    pub fn with_budgets(service: Arc<dyn LocationService>, budgets: ResolverBudgets) -> Self {
        Self { service, budgets }
    }

    /// Best-effort device coordinates.
    pub async fn get_current_location(
        &self,
        session: &mut PermissionSession,
    ) -> Result<Coordinates, LocationError> {
        self.ensure_permission(session).await?;

        match self.service.last_known_position().await {
            Ok(Some(coords)) => {
                tracing::info!(%coords, "using cached location");
                return Ok(coords);
            }
            Ok(None) => tracing::debug!("no cached location available"),
            Err(e) => tracing::debug!(error = %e, "cached location lookup failed"),
        }

        match self.fix(Accuracy::Low, self.budgets.low).await {
            Ok(coords) => {
                tracing::info!(%coords, "using low accuracy location");
                return Ok(coords);
            }
            Err(e) => tracing::debug!(error = %e, "low accuracy failed, trying balanced accuracy"),
        }

        let coords = self.fix(Accuracy::Balanced, self.budgets.balanced).await.map_err(|e| {
            tracing::warn!(error = %e, "location lookup failed");
            classify(e)
        })?;

        tracing::info!(%coords, "using balanced accuracy location");
        Ok(coords)
    }

    /// City name for `at`, falling back to district, subregion and region.
    pub async fn city_from_coordinates(&self, at: Coordinates) -> Result<String, LocationError> {
        let placemarks = self.service.reverse_geocode(at).await.map_err(classify)?;

        placemarks
            .first()
            .and_then(Placemark::place_name)
            .map(str::to_string)
            .ok_or_else(|| {
                LocationError::LocationUnavailable(
                    "Could not determine city name from location".to_string(),
                )
            })
    }

    async fn ensure_permission(&self, session: &mut PermissionSession) -> Result<(), LocationError> {
        if session.granted {
            return Ok(());
        }

        let mut status = self.service.permission_status().await;
        if status != PermissionStatus::Granted {
            status = self.service.request_permission().await;
        }

        if status != PermissionStatus::Granted {
            return Err(LocationError::PermissionDenied);
        }

        session.granted = true;
        Ok(())
    }

    async fn fix(&self, accuracy: Accuracy, budget: Duration) -> Result<Coordinates, DeviceError> {
        tokio::time::timeout(budget, self.service.current_position(accuracy, budget))
            .await
            .unwrap_or(Err(DeviceError::TimedOut))
    }
}

fn classify(error: DeviceError) -> LocationError {
    match error {
        DeviceError::TimedOut => LocationError::Timeout,
        DeviceError::Other(msg) if msg.contains("timed out") => LocationError::Timeout,
        DeviceError::ServicesDisabled => LocationError::LocationUnavailable(
            "Please enable location services in your device settings".to_string(),
        ),
        DeviceError::Other(msg) => LocationError::LocationUnavailable(msg),
    }
}

/// A location service for hosts without one: always granted, answers with a fixed position.
#[derive(Debug, Clone, Default)]
pub struct StaticLocationService {
    position: Option<Coordinates>,
    city: Option<String>,
}

impl StaticLocationService {
    pub fn new(position: Option<Coordinates>, city: Option<String>) -> Self {
        Self { position, city }
    }
}

#[async_trait]
impl LocationService for StaticLocationService {
    async fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn last_known_position(&self) -> Result<Option<Coordinates>, DeviceError> {
        Ok(self.position)
    }

    async fn current_position(
        &self,
        _accuracy: Accuracy,
        _time_budget: Duration,
    ) -> Result<Coordinates, DeviceError> {
        self.position.ok_or_else(|| DeviceError::Other("no location configured".to_string()))
    }

    async fn reverse_geocode(&self, _at: Coordinates) -> Result<Vec<Placemark>, DeviceError> {
        Ok(self
            .city
            .iter()
            .map(|city| Placemark { city: Some(city.clone()), ..Placemark::default() })
            .collect())
    }
}
