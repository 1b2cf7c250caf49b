//! Address → coordinates resolution.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeocoderConfig;
use crate::database::models::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

impl GeoPoint {
    pub fn into_location(self) -> Location {
        Location {
            kind: "Point".to_string(),
            coordinates: [self.lng, self.lat],
            formatted_address: self.formatted_address,
            street: self.street,
            city: self.city,
            state: self.state,
            zipcode: self.zipcode,
            country: self.country,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoder configuration missing: {0}")]
    MissingConfig(String),

    #[error("Geocoder request failed: {0}")]
    Request(String),

    #[error("Geocoder response was invalid: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the address resolves to nothing
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// MapQuest geocoding API client
#[derive(Debug, Clone)]
pub struct MapQuestGeocoder {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: MapQuestLatLng,
    #[serde(default)]
    street: String,
    /// City
    #[serde(default)]
    admin_area5: String,
    /// State
    #[serde(default)]
    admin_area3: String,
    /// Country
    #[serde(default)]
    admin_area1: String,
    #[serde(default)]
    postal_code: String,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

impl MapQuestGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        if config.api_key.trim().is_empty() {
            return Err(GeocodeError::MissingConfig("GEOCODER_API_KEY".to_string()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GeocodeError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        })
    }
}

impl MapQuestLocation {
    fn into_point(self) -> GeoPoint {
        let region = [self.admin_area3.as_str(), self.postal_code.as_str()]
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let formatted_address = [self.street.as_str(), self.admin_area5.as_str(), region.as_str(), self.admin_area1.as_str()]
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        GeoPoint {
            lat: self.lat_lng.lat,
            lng: self.lat_lng.lng,
            formatted_address,
            street: self.street,
            city: self.admin_area5,
            state: self.admin_area3,
            zipcode: self.postal_code,
            country: self.admin_area1,
        }
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = format!("{}/geocoding/v1/address", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("location", address)])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Request(format!("status {}", response.status())));
        }

        let body: MapQuestResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let point = body
            .results
            .into_iter()
            .flat_map(|r| r.locations)
            .next()
            .map(MapQuestLocation::into_point);
        debug!(address, found = point.is_some(), "geocoded address");
        Ok(point)
    }
}

/// Stand-in used when no API key is configured; every lookup reports the gap
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredGeocoder;

#[async_trait]
impl Geocoder for UnconfiguredGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        Err(GeocodeError::MissingConfig("GEOCODER_API_KEY".to_string()))
    }
}

/// MapQuest when configured, otherwise the unconfigured stand-in
pub fn geocoder_from_config(config: &GeocoderConfig) -> Result<Arc<dyn Geocoder>, GeocodeError> {
    match MapQuestGeocoder::new(config) {
        Ok(geocoder) => Ok(Arc::new(geocoder)),
        Err(GeocodeError::MissingConfig(key)) => {
            warn!("{} not set; bootcamp geocoding is unavailable", key);
            Ok(Arc::new(UnconfiguredGeocoder))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_location_and_formats_address() {
        let body: MapQuestResponse = serde_json::from_value(json!({
            "results": [{
                "locations": [{
                    "latLng": {"lat": 42.350846, "lng": -71.104028},
                    "street": "233 Bay State Rd",
                    "adminArea5": "Boston",
                    "adminArea3": "MA",
                    "adminArea1": "US",
                    "postalCode": "02215-1405"
                }]
            }]
        }))
        .unwrap();
        let point = body.results.into_iter().flat_map(|r| r.locations).next().unwrap().into_point();
        assert_eq!(point.formatted_address, "233 Bay State Rd, Boston, MA 02215-1405, US");
        assert_eq!(point.zipcode, "02215-1405");

        let location = point.into_location();
        assert_eq!(location.coordinates, [-71.104028, 42.350846]);
        assert_eq!(location.kind, "Point");
    }

    #[test]
    fn requires_api_key() {
        let config = GeocoderConfig {
            base_url: "https://www.mapquestapi.com".into(),
            api_key: String::new(),
        };
        assert!(matches!(MapQuestGeocoder::new(&config), Err(GeocodeError::MissingConfig(_))));
    }
}
