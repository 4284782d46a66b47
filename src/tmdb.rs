use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{CatalogRecord, MediaKind};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

/// Search side of the media catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// First page of search results, in provider relevance order.
    async fn search_by_title(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<CatalogRecord>>;

    /// Provider names (subscription, rent, buy) offering a title in a region.
    async fn watch_availability(&self, kind: MediaKind, id: i32, region: &str)
        -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Result<Self> {
        let user_agent = format!("reelpick/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self { client, api_key })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut url = format!("{TMDB_BASE}{endpoint}?api_key={}", self.api_key);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("TMDB request to {endpoint} failed: {}", e.without_url()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| anyhow!("reading body failed: {}", e.without_url()))?;
        // The URL carries the API key, so errors only name the endpoint.
        if !status.is_success() {
            return Err(anyhow!("TMDB request failed ({status}) for {endpoint}"));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn search_by_title(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<CatalogRecord>> {
        let mut params = vec![
            ("query", title.to_string()),
            ("include_adult", "false".to_string()),
        ];
        if let Some(year) = year.filter(|y| *y > 0) {
            let key = match kind {
                MediaKind::Movie => "year",
                MediaKind::Series => "first_air_date_year",
            };
            params.push((key, year.to_string()));
        }
        let endpoint = format!("/search/{}", kind.as_path());
        let data: SearchResponse = self.get_json(&endpoint, &params).await?;
        Ok(data
            .results
            .into_iter()
            .map(|raw| raw.into_record(kind))
            .collect())
    }

    async fn watch_availability(
        &self,
        kind: MediaKind,
        id: i32,
        region: &str,
    ) -> Result<Vec<String>> {
        let endpoint = format!("/{}/{id}/watch/providers", kind.as_path());
        let data: WatchProvidersResponse = self.get_json(&endpoint, &[]).await?;
        Ok(provider_names(&data, region))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawMedia>,
}

/// Movie and TV search results share one shape with different field names.
#[derive(Debug, Deserialize)]
struct RawMedia {
    id: i32,
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
    genre_ids: Option<Vec<i32>>,
    original_language: Option<String>,
}

impl RawMedia {
    fn into_record(self, kind: MediaKind) -> CatalogRecord {
        CatalogRecord {
            id: self.id,
            media_kind: kind,
            title: self.title.or(self.name).unwrap_or_default().trim().to_string(),
            original_title: self
                .original_title
                .or(self.original_name)
                .unwrap_or_default()
                .trim()
                .to_string(),
            overview: self.overview.unwrap_or_default(),
            poster_ref: self.poster_path.filter(|p| !p.is_empty()),
            backdrop_ref: self.backdrop_path.filter(|p| !p.is_empty()),
            release_date: self
                .release_date
                .or(self.first_air_date)
                .unwrap_or_default(),
            vote_average: self.vote_average.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
            genre_ids: self.genre_ids.unwrap_or_default(),
            original_language: self
                .original_language
                .unwrap_or_default()
                .to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WatchProvidersResponse {
    #[serde(default)]
    results: HashMap<String, RegionProviders>,
}

#[derive(Debug, Default, Deserialize)]
struct RegionProviders {
    #[serde(default)]
    flatrate: Vec<ProviderEntry>,
    #[serde(default)]
    rent: Vec<ProviderEntry>,
    #[serde(default)]
    buy: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider_name: String,
}

fn provider_names(data: &WatchProvidersResponse, region: &str) -> Vec<String> {
    let Some(providers) = data.results.get(&region.to_ascii_uppercase()) else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for entry in providers
        .flatrate
        .iter()
        .chain(&providers.rent)
        .chain(&providers.buy)
    {
        if !names.contains(&entry.provider_name) {
            names.push(entry.provider_name.clone());
        }
    }
    names
}
