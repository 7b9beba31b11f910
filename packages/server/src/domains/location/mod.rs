//! Location collaborator: reverse geocoding behind a trait.
//!
//! Resolving coordinates to a human-readable address is best-effort. A
//! resolver failure is logged and degrades to `None` at the call site; it
//! never fails session creation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reverse-geocoded address, denormalized onto the session at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub city: String,
    pub zip_code: String,
}

/// Trait for reverse-geocoding providers.
///
/// This allows swapping between a real HTTP provider and test stubs.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolve coordinates to an address in the given language.
    ///
    /// `Ok(None)` means the provider had no address for the point.
    async fn reverse_geocode(&self, lat: f64, lng: f64, language: &str)
        -> Result<Option<Address>>;
}

// =============================================================================
// HTTP provider
// =============================================================================

/// Provider response shape: the first entry of `addresses` carries the
/// municipality and postal code.
#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    addresses: Vec<ReverseGeocodeEntry>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeEntry {
    address: ProviderAddress,
}

#[derive(Debug, Deserialize)]
struct ProviderAddress {
    municipality: Option<String>,
    #[serde(rename = "postalCode")]
    postal_code: Option<String>,
}

/// Reverse geocoder backed by an HTTP maps provider.
pub struct HttpLocationResolver {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpLocationResolver {
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to create reverse-geocode HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl LocationResolver for HttpLocationResolver {
    async fn reverse_geocode(
        &self,
        lat: f64,
        lng: f64,
        language: &str,
    ) -> Result<Option<Address>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", format!("{lat},{lng}")),
                ("language", language.to_string()),
                ("subscription-key", self.api_key.clone()),
            ])
            .send()
            .await
            .context("Reverse-geocode request failed")?
            .error_for_status()
            .context("Reverse-geocode provider returned an error status")?
            .json::<ReverseGeocodeResponse>()
            .await
            .context("Reverse-geocode response was not valid JSON")?;

        let Some(entry) = response.addresses.into_iter().next() else {
            return Ok(None);
        };

        match (entry.address.municipality, entry.address.postal_code) {
            (Some(city), Some(zip_code)) => Ok(Some(Address { city, zip_code })),
            _ => Ok(None),
        }
    }
}

// =============================================================================
// Test / fallback resolvers
// =============================================================================

/// Resolver that always returns the same address. Used in tests.
#[derive(Default)]
pub struct StaticLocationResolver {
    pub address: Option<Address>,
}

impl StaticLocationResolver {
    pub fn with_address(city: &str, zip_code: &str) -> Self {
        Self {
            address: Some(Address {
                city: city.to_string(),
                zip_code: zip_code.to_string(),
            }),
        }
    }
}

#[async_trait]
impl LocationResolver for StaticLocationResolver {
    async fn reverse_geocode(
        &self,
        _lat: f64,
        _lng: f64,
        _language: &str,
    ) -> Result<Option<Address>> {
        Ok(self.address.clone())
    }
}

/// Resolver used when no provider is configured: every lookup is unresolved.
pub struct NullLocationResolver;

#[async_trait]
impl LocationResolver for NullLocationResolver {
    async fn reverse_geocode(
        &self,
        _lat: f64,
        _lng: f64,
        _language: &str,
    ) -> Result<Option<Address>> {
        Ok(None)
    }
}
