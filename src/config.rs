use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Movies table (`movieId,title,genres`)
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Ratings table (`userId,movieId,...`)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Exported factorization model
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Gemini API key. Descriptions and the chatbot are disabled without it.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// OMDb API key
    #[serde(default = "default_imdb_api_key")]
    pub imdb_api_key: String,

    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// DuckDuckGo Instant Answer endpoint
    #[serde(default = "default_search_api_url")]
    pub search_api_url: String,

    /// Redis connection URL. Caching is skipped when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Upper bound on a single description call
    #[serde(default = "default_enrichment_timeout_secs")]
    pub enrichment_timeout_secs: u64,

    /// Description calls allowed in flight for one request
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,

    /// Reason/act turns before the chatbot gives up
    #[serde(default = "default_agent_max_steps")]
    pub agent_max_steps: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_movies_path() -> String {
    "Data/movies.csv".to_string()
}

fn default_ratings_path() -> String {
    "Data/ratings.csv".to_string()
}

fn default_model_path() -> String {
    "Model/recommendation_model.json".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_imdb_api_key() -> String {
    "demo".to_string()
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com".to_string()
}

fn default_search_api_url() -> String {
    "https://api.duckduckgo.com".to_string()
}

fn default_enrichment_timeout_secs() -> u64 {
    10
}

fn default_enrichment_concurrency() -> usize {
    4
}

fn default_agent_max_steps() -> usize {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_environment() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.movies_path, "Data/movies.csv");
        assert_eq!(config.imdb_api_key, "demo");
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert!(config.gemini_api_key.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.enrichment_concurrency, 4);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let vars = vec![
            ("PORT".to_string(), "9000".to_string()),
            ("GEMINI_API_KEY".to_string(), "secret".to_string()),
            ("ENRICHMENT_TIMEOUT_SECS".to_string(), "3".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.enrichment_timeout_secs, 3);
    }
}
