use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::{
    db::{Cache, CacheKey},
    services::providers::TextGenerator,
};

/// Returned when no text generator is configured
pub const DESCRIPTION_UNCONFIGURED: &str = "Description unavailable (LLM not configured).";
/// Returned when the generator fails or times out
pub const DESCRIPTION_FALLBACK: &str = "Description unavailable (error).";

const DESCRIPTION_CACHE_TTL: u64 = 604800; // 1 week

pub fn description_prompt(title: &str) -> String {
    format!(
        "Give a concise, engaging description of the movie '{}'. Limit to 2-3 sentences.",
        title
    )
}

/// Best-effort movie blurbs. Never fails; every error becomes a fixed
/// placeholder string.
#[derive(Clone)]
pub struct Describer {
    generator: Option<Arc<dyn TextGenerator>>,
    cache: Cache,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl Describer {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        cache: Cache,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            generator,
            cache,
            timeout,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Describes one title
    pub async fn describe(&self, title: &str) -> String {
        let Some(generator) = &self.generator else {
            return DESCRIPTION_UNCONFIGURED.to_string();
        };

        let key = CacheKey::Description(title.to_string());
        match self.cache.get_from_cache::<String>(&key).await {
            Ok(Some(description)) => return description,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, title = %title, "Description cache read failed"),
        }

        let prompt = description_prompt(title);
        match tokio::time::timeout(self.timeout, generator.generate(&prompt)).await {
            Ok(Ok(description)) => {
                self.cache
                    .set_in_background(&key, &description, DESCRIPTION_CACHE_TTL);
                description
            }
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    title = %title,
                    provider = generator.name(),
                    "Failed to get description"
                );
                DESCRIPTION_FALLBACK.to_string()
            }
            Err(_) => {
                tracing::error!(
                    title = %title,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Description request timed out"
                );
                DESCRIPTION_FALLBACK.to_string()
            }
        }
    }

    /// Describes every title concurrently. The output lines up with the input.
    pub async fn describe_all(&self, titles: Vec<String>) -> Vec<String> {
        if self.generator.is_none() {
            return vec![DESCRIPTION_UNCONFIGURED.to_string(); titles.len()];
        }

        let mut tasks = Vec::with_capacity(titles.len());
        for title in titles {
            let describer = self.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = describer.permits.acquire().await;
                describer.describe(&title).await
            }));
        }

        let mut descriptions = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(description) => descriptions.push(description),
                Err(e) => {
                    tracing::error!(error = %e, "Description task join error");
                    descriptions.push(DESCRIPTION_FALLBACK.to_string());
                }
            }
        }

        descriptions
    }
}
