use serde::{Deserialize, Serialize};

pub mod envelope;

pub use envelope::{ChatReply, Envelope, GenreRecommendations, PayloadKind, UserRecommendations};

pub type UserId = u32;
pub type ItemId = u32;

/// A movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Genres in the order they were listed in the source table
    pub genres: Vec<String>,
}

/// A historical rating event; only the pair matters here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
}

/// A model estimate for one (user, item) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub item_id: ItemId,
    pub estimate: f64,
}

/// A ranked movie returned by `/recommend/user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub genres: Vec<String>,
    pub description: Option<String>,
}

/// One entry of `/recommend/genre`: the item ranked under a single genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePick {
    pub genre: String,
    pub item_id: ItemId,
    pub estimate: f64,
}
