use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub reverse_geocode_endpoint: Option<String>,
    pub reverse_geocode_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "courtside".to_string()),
            // Reverse geocoding is best-effort: without an endpoint the server
            // runs with unresolved addresses.
            reverse_geocode_endpoint: env::var("REVERSE_GEOCODE_ENDPOINT").ok(),
            reverse_geocode_api_key: env::var("REVERSE_GEOCODE_API_KEY").ok(),
        })
    }
}
