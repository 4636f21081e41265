/// OMDb movie lookup (IMDB data)
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    services::providers::MovieLookup,
};

const LOOKUP_CACHE_TTL: u64 = 86400; // 1 day

/// Subset of the OMDb title record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieInfo {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: Option<String>,
}

impl MovieInfo {
    /// One field per line, skipping OMDb's "N/A" placeholders
    pub fn summary(&self) -> String {
        let fields = [
            ("Title", Some(&self.title)),
            ("Year", self.year.as_ref()),
            ("Genre", self.genre.as_ref()),
            ("Director", self.director.as_ref()),
            ("Actors", self.actors.as_ref()),
            ("Plot", self.plot.as_ref()),
            ("IMDB rating", self.imdb_rating.as_ref()),
        ];

        fields
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.is_empty() && v.as_str() != "N/A")
                    .map(|v| format!("{}: {}", label, v))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// OMDb answers 200 for misses too, flagging them in the body
#[derive(Debug, Deserialize)]
#[serde(tag = "Response")]
enum OmdbResponse {
    True(MovieInfo),
    False {
        #[serde(rename = "Error", default)]
        error: Option<String>,
    },
}

#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl OmdbClient {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String, cache: Cache) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
            cache,
        }
    }

    async fn fetch(&self, title: &str) -> AppResult<MovieInfo> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(query = %title, status = %response.status(), "OMDb API error");
            return Err(AppError::ExternalService(format!(
                "OMDb API returned status {}",
                response.status()
            )));
        }

        let body: OmdbResponse = response.json().await?;
        let info = Self::into_movie(body)?;

        tracing::info!(query = %title, imdb_id = ?info.imdb_id, "OMDb lookup succeeded");

        Ok(info)
    }

    fn into_movie(body: OmdbResponse) -> AppResult<MovieInfo> {
        match body {
            OmdbResponse::True(info) => Ok(info),
            OmdbResponse::False { error } => Err(AppError::ExternalService(
                error.unwrap_or_else(|| "Movie not found!".to_string()),
            )),
        }
    }
}

#[async_trait::async_trait]
impl MovieLookup for OmdbClient {
    async fn lookup(&self, title: &str) -> AppResult<MovieInfo> {
        let key = CacheKey::MovieLookup(title.to_string());
        cached!(self.cache, key, LOOKUP_CACHE_TTL, self.fetch(title))
    }
}
