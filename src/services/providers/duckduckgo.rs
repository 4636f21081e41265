/// DuckDuckGo Instant Answer search
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::WebSearch,
};

pub const NO_RESULT: &str = "No good search result was found";

const MAX_TOPICS: usize = 3;

#[derive(Clone)]
pub struct DuckDuckGoSearch {
    http_client: HttpClient,
    api_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Topics are either plain entries or named groups of entries
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Entry {
        #[serde(rename = "Text")]
        text: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl RelatedTopic {
    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RelatedTopic::Entry { text } => out.push(text),
            RelatedTopic::Group { topics } => topics.iter().for_each(|t| t.collect_texts(out)),
        }
    }
}

impl DuckDuckGoSearch {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    /// Flattens an instant answer into a short digest
    fn digest(answer: &InstantAnswer) -> String {
        let mut lines: Vec<&str> = Vec::new();
        if !answer.answer.trim().is_empty() {
            lines.push(answer.answer.trim());
        }
        if !answer.abstract_text.trim().is_empty() {
            lines.push(answer.abstract_text.trim());
        }

        let mut topics = Vec::new();
        for topic in &answer.related_topics {
            topic.collect_texts(&mut topics);
        }
        lines.extend(
            topics
                .into_iter()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .take(MAX_TOPICS),
        );

        if lines.is_empty() {
            NO_RESULT.to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[async_trait::async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> AppResult<String> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "DuckDuckGo returned status {}",
                response.status()
            )));
        }

        let answer: InstantAnswer = response.json().await?;
        let digest = Self::digest(&answer);

        tracing::info!(query = %query, chars = digest.len(), "Web search complete");

        Ok(digest)
    }
}
