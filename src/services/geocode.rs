use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Reverse-geocoding client for the Nominatim HTTP API. Failures surface
/// as request-level validation errors; the caller never retries.
#[derive(Clone)]
pub struct GeocodeService {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseGeocode {
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    country: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
}

impl GeocodeService {
    pub fn from_env() -> Self {
        let base_url =
            env::var("NOMINATIM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let enabled = env::var("GEOCODING_ENABLED")
            .ok()
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            })
            .unwrap_or(true);

        let timeout: u64 = env::var("GEOCODING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .user_agent(concat!("enviroalerts/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build geocoding HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve (lat, lng) to country/city/county. Disabled deployments get
    /// empty enrichment instead of an error.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> AppResult<ReverseGeocode> {
        if !self.enabled {
            return Ok(ReverseGeocode::default());
        }

        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}&accept-language=en",
            self.base_url, latitude, longitude
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Geocoding failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Geocoding failed: upstream returned {}",
                response.status()
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Geocoding failed: {e}")))?;

        let address = body.address;
        Ok(ReverseGeocode {
            country: address.country,
            // Nominatim reports smaller places as town or village.
            city: address.city.or(address.town).or(address.village),
            county: address.county,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_falls_back_to_town_then_village() {
        let parse = |raw: &str| -> ReverseGeocode {
            let body: NominatimResponse = serde_json::from_str(raw).unwrap();
            ReverseGeocode {
                country: body.address.country,
                city: body.address.city.or(body.address.town).or(body.address.village),
                county: body.address.county,
            }
        };

        let with_city = parse(r#"{"address":{"country":"Greece","city":"Athens"}}"#);
        assert_eq!(with_city.city.as_deref(), Some("Athens"));

        let with_town = parse(r#"{"address":{"country":"Greece","town":"Nafplio"}}"#);
        assert_eq!(with_town.city.as_deref(), Some("Nafplio"));

        let with_village = parse(r#"{"address":{"village":"Oia"}}"#);
        assert_eq!(with_village.city.as_deref(), Some("Oia"));
    }

    #[test]
    fn missing_address_block_is_empty() {
        let body: NominatimResponse = serde_json::from_str("{}").unwrap();
        assert!(body.address.country.is_none());
        assert!(body.address.county.is_none());
    }
}
