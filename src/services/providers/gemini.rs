/// Gemini `generateContent` client
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    services::providers::TextGenerator,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }

    /// Concatenates the text parts of the first candidate
    fn extract_text(response: GenerateResponse) -> AppResult<String> {
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::ExternalService(
                "Gemini returned no text".to_string(),
            ));
        }

        Ok(text.trim().to_string())
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response.json().await?;
        let text = Self::extract_text(body)?;

        tracing::debug!(model = %self.model, chars = text.len(), "Gemini generation complete");

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AppResult<String> {
        GeminiClient::extract_text(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "A toy cowboy " }, { "text": "feels replaced." }] }
            }]
        }"#;
        assert_eq!(parse(raw).unwrap(), "A toy cowboy feels replaced.");
    }

    #[test]
    fn test_extract_text_uses_first_candidate() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "first" }] } },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }"#;
        assert_eq!(parse(raw).unwrap(), "first");
    }

    #[test]
    fn test_extract_text_rejects_empty_response() {
        assert!(parse(r#"{ "candidates": [] }"#).is_err());
        assert!(parse(r#"{}"#).is_err());
        assert!(parse(r#"{ "candidates": [{ "content": { "parts": [] } }] }"#).is_err());
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let client = GeminiClient::new(
            HttpClient::new(),
            "SECRET-GEMINI-KEY".to_string(),
            "http://127.0.0.1:9".to_string(),
            "gemini-2.0-flash".to_string(),
        );
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains("SECRET-GEMINI-KEY"));
    }
}
