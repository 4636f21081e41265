/// External capabilities the service leans on.
///
/// The set is closed: text generation (Gemini), web search (DuckDuckGo) and
/// movie lookup (OMDb). Each sits behind an async trait so handlers and tests
/// can swap the HTTP-backed implementation for a fake.
use crate::error::AppResult;

pub mod duckduckgo;
pub mod gemini;
pub mod omdb;

pub use duckduckgo::DuckDuckGoSearch;
pub use gemini::GeminiClient;
pub use omdb::{MovieInfo, OmdbClient};

/// Free-form text generation from a prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Web search returning a plain-text digest of the top results
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> AppResult<String>;
}

/// Movie metadata lookup by title
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> AppResult<MovieInfo>;
}

/// Tools the chat agent may call by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    WebSearch,
    MovieLookup,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::WebSearch, Capability::MovieLookup];

    pub fn name(self) -> &'static str {
        match self {
            Capability::WebSearch => "web_search",
            Capability::MovieLookup => "imdb_search",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Capability::WebSearch => {
                "Useful for answering questions about current events or general knowledge. \
                 Input should be a search query."
            }
            Capability::MovieLookup => {
                "Useful for searching movie information from IMDB. Input should be a movie title."
            }
        }
    }

    /// Resolves a tool name as written by the model. Matching ignores case and
    /// surrounding punctuation.
    pub fn from_name(raw: &str) -> Option<Self> {
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '[' || c == ']')
            .to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == cleaned)
    }
}
