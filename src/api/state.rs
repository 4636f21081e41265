use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::db::{create_redis_client, Cache, CacheWriterHandle};
use crate::services::{
    providers::{DuckDuckGoSearch, GeminiClient, OmdbClient, TextGenerator},
    Catalog, ChatAgent, Describer, FactorModel, Recommender,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
///
/// Everything inside is immutable after startup, so handlers share it through
/// cheap clones without locking.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    pub agent: ChatAgent,
}

impl AppState {
    pub fn new(recommender: Recommender, agent: ChatAgent) -> Self {
        Self { recommender, agent }
    }

    /// Loads the catalog and model and wires the external clients.
    ///
    /// Fails if the catalog or model cannot be loaded; the service does not
    /// start without them. The returned handle, if any, flushes the cache
    /// writer on shutdown.
    pub async fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let catalog = Catalog::load(&config.movies_path, &config.ratings_path)
            .context("Failed to load movie catalog")?;
        let model = FactorModel::load(&config.model_path).context("Failed to load rating model")?;

        let (cache, cache_handle) = match &config.redis_url {
            Some(url) => {
                let client = create_redis_client(url).context("Invalid REDIS_URL")?;
                let (cache, handle) = Cache::new(client).await;
                tracing::info!("Redis cache enabled");
                (cache, Some(handle))
            }
            None => {
                tracing::info!("REDIS_URL not set, caching disabled");
                (Cache::disabled(), None)
            }
        };

        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let generator: Option<Arc<dyn TextGenerator>> = match &config.gemini_api_key {
            Some(key) if !key.trim().is_empty() => Some(Arc::new(GeminiClient::new(
                http_client.clone(),
                key.clone(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            ))),
            _ => {
                tracing::warn!("GEMINI_API_KEY not set; descriptions and chat are disabled");
                None
            }
        };

        let describer = Describer::new(
            generator.clone(),
            cache.clone(),
            Duration::from_secs(config.enrichment_timeout_secs),
            config.enrichment_concurrency,
        );
        let recommender = Recommender::new(Arc::new(catalog), Arc::new(model), describer);

        let agent = ChatAgent::new(
            generator,
            Arc::new(DuckDuckGoSearch::new(
                http_client.clone(),
                config.search_api_url.clone(),
            )),
            Arc::new(OmdbClient::new(
                http_client,
                config.imdb_api_key.clone(),
                config.omdb_api_url.clone(),
                cache,
            )),
            config.agent_max_steps,
        );

        Ok((Self::new(recommender, agent), cache_handle))
    }
}
