use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::time::Duration;

use crate::model::settings::GeoPoint;

/// Resolved addresses, keyed by rounded coordinates. 24h TTL.
static ADDRESS_CACHE: Lazy<Cache<String, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(86400))
        .build()
});

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, point: GeoPoint) -> Result<String>;
}

/// Nominatim-compatible reverse geocoding endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: String,
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, point: GeoPoint) -> Result<String> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("format", "jsonv2")])
            .query(&[("lat", point.latitude), ("lon", point.longitude)])
            .header("User-Agent", "geoattend/0.1")
            .send()
            .await?
            .error_for_status()?;

        let body: ReverseResponse = response.json().await?;
        Ok(body.display_name)
    }
}

/// Geocoding switched off; entries keep raw coordinates only.
pub struct NoopGeocoder;

#[async_trait]
impl ReverseGeocoder for NoopGeocoder {
    async fn reverse(&self, _point: GeoPoint) -> Result<String> {
        anyhow::bail!("reverse geocoding disabled")
    }
}

/// Best-effort address lookup with its own timeout. Any failure degrades to
/// `None`; the attendance operation itself must never fail here.
pub async fn resolve_address(geocoder: &dyn ReverseGeocoder, point: GeoPoint) -> Option<String> {
    let key = cache_key(point);
    if let Some(hit) = ADDRESS_CACHE.get(&key).await {
        return Some(hit);
    }

    match tokio::time::timeout(GEOCODE_TIMEOUT, geocoder.reverse(point)).await {
        Ok(Ok(address)) => {
            ADDRESS_CACHE.insert(key, address.clone()).await;
            Some(address)
        }
        Ok(Err(e)) => {
            log::debug!("reverse geocoding failed: {:#}", e);
            None
        }
        Err(_) => {
            log::debug!("reverse geocoding timed out after {:?}", GEOCODE_TIMEOUT);
            None
        }
    }
}

/// Rounded to 4 decimals (~11 m grid) so nearby fixes share one lookup.
fn cache_key(point: GeoPoint) -> String {
    format!("{:.4},{:.4}", point.latitude, point.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_fixes_share_a_cache_key() {
        let a = GeoPoint {
            latitude: 23.81031,
            longitude: 90.41251,
        };
        let b = GeoPoint {
            latitude: 23.81033,
            longitude: 90.41254,
        };
        assert_eq!(cache_key(a), cache_key(b));
    }

    #[tokio::test]
    async fn noop_geocoder_degrades_to_none() {
        let point = GeoPoint {
            latitude: 1.0,
            longitude: 2.0,
        };
        assert_eq!(resolve_address(&NoopGeocoder, point).await, None);
    }
}
