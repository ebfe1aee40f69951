//! Thin HTTP wrapper over the PokeAPI REST service.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub const API_BASE: &str = "https://pokeapi.co/api/v2";
pub const IMAGE_BASE: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Read-only access to the upstream service.
///
/// Aggregators only talk to this trait, so tests can serve fixtures from
/// memory instead of the network.
#[async_trait]
pub trait Upstream: Send + Sync {
    fn base_url(&self) -> &str;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Upstream for HttpClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.to_string()));
        }
        let response = response.error_for_status()?;
        let bytes = response.bytes().await?.to_vec();
        Ok(bytes)
    }
}

/// Fetch and decode a JSON document. Accepts either an absolute URL (as
/// returned inside upstream payloads) or a path relative to the base URL.
pub async fn fetch_json<T: DeserializeOwned>(
    upstream: &dyn Upstream,
    path_or_url: &str,
) -> Result<T, ApiError> {
    let url = resolve_url(upstream.base_url(), path_or_url);
    let bytes = upstream.get_bytes(&url).await?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::Upstream(format!("{url}: response parse error: {err}")))
}

pub fn resolve_url(base_url: &str, path_or_url: &str) -> String {
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        return path_or_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path_or_url.trim_start_matches('/')
    )
}

/// Numeric id at the end of a resource URL such as
/// `https://pokeapi.co/api/v2/pokemon-species/4/`.
pub fn id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u32>().ok())
        .filter(|id| *id > 0)
}

pub fn image_url(image_base: &str, id: u32) -> String {
    format!("{}/{id}.png", image_base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_paths_against_base() {
        assert_eq!(
            resolve_url("https://pokeapi.co/api/v2/", "/pokemon?limit=905"),
            "https://pokeapi.co/api/v2/pokemon?limit=905"
        );
        assert_eq!(
            resolve_url(API_BASE, "https://pokeapi.co/api/v2/pokemon/4/"),
            "https://pokeapi.co/api/v2/pokemon/4/"
        );
    }

    #[test]
    fn parses_trailing_ids() {
        assert_eq!(
            id_from_url("https://pokeapi.co/api/v2/pokemon-species/4/"),
            Some(4)
        );
        assert_eq!(id_from_url("https://pokeapi.co/api/v2/evolution-chain/2"), Some(2));
        assert_eq!(id_from_url("https://pokeapi.co/api/v2/pokemon-species/"), None);
        assert_eq!(id_from_url("https://pokeapi.co/api/v2/pokemon/0/"), None);
    }

    #[test]
    fn builds_image_urls() {
        assert_eq!(
            image_url(IMAGE_BASE, 25),
            "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/25.png"
        );
    }
}
