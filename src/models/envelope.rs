/// Uniform response wrapper shared by every recommendation and chat endpoint.
///
/// On the wire it is a flat object with `success`, `error`, `validation_error`
/// and one payload field whose name depends on the endpoint (for example
/// `recommendations`). Clients branch on `validation_error` first, then on
/// `success`.
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::marker::PhantomData;

use crate::error::AppError;

use super::{GenrePick, Recommendation};

/// Names the payload field of an envelope and its type
pub trait PayloadKind {
    const FIELD: &'static str;
    type Payload: Serialize + Default;
}

pub struct UserRecommendations;

impl PayloadKind for UserRecommendations {
    const FIELD: &'static str = "recommendations";
    type Payload = Vec<Recommendation>;
}

pub struct GenreRecommendations;

impl PayloadKind for GenreRecommendations {
    const FIELD: &'static str = "genre_recommendations";
    type Payload = Vec<GenrePick>;
}

pub struct ChatReply;

impl PayloadKind for ChatReply {
    const FIELD: &'static str = "response";
    type Payload = String;
}

pub struct Envelope<K: PayloadKind> {
    pub success: bool,
    pub payload: Option<K::Payload>,
    pub error: Option<String>,
    pub validation_error: Option<String>,
    kind: PhantomData<K>,
}

impl<K: PayloadKind> Envelope<K> {
    pub fn success(payload: K::Payload) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            validation_error: None,
            kind: PhantomData,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: None,
            validation_error: Some(message.into()),
            kind: PhantomData,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(message.into()),
            validation_error: None,
            kind: PhantomData,
        }
    }

    /// Maps an error caught at the request boundary onto the envelope.
    ///
    /// A user with nothing left to rate gets an empty payload next to the
    /// validation message, the others get no payload at all.
    pub fn from_error(err: &AppError) -> Self {
        match err {
            AppError::NoCandidates => Self {
                payload: Some(K::Payload::default()),
                ..Self::validation(err.to_string())
            },
            e if e.is_validation() => Self::validation(e.to_string()),
            e => Self::failure(e.to_string()),
        }
    }
}

impl<K: PayloadKind> From<AppError> for Envelope<K> {
    fn from(err: AppError) -> Self {
        Self::from_error(&err)
    }
}

impl<K: PayloadKind> Serialize for Envelope<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("success", &self.success)?;
        map.serialize_entry(K::FIELD, &self.payload)?;
        map.serialize_entry("error", &self.error)?;
        map.serialize_entry("validation_error", &self.validation_error)?;
        map.end()
    }
}
