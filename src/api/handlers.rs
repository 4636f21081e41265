use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{
    ChatReply, Envelope, GenrePick, GenreRecommendations, PayloadKind, Recommendation, UserId,
    UserRecommendations,
};
use crate::services::{
    ranking::{parse_n, parse_user_id},
    recommendations::{DEFAULT_PER_GENRE, DEFAULT_TOP_N},
};

use super::AppState;

/// Users the demo client suggests when it starts
const EXAMPLE_USER_IDS: [UserId; 4] = [1, 10, 50, 100];

// Request/Response types

/// `?n=` is kept raw so malformed values surface as validation errors in the
/// envelope instead of extractor rejections
#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub n: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExampleUsersResponse {
    pub user_ids: Vec<UserId>,
}

/// Logs a failed request and folds the outcome into an envelope
fn into_envelope<K: PayloadKind>(
    endpoint: &'static str,
    result: AppResult<K::Payload>,
) -> Envelope<K> {
    match result {
        Ok(payload) => Envelope::success(payload),
        Err(e) if e.is_validation() => {
            tracing::warn!(endpoint, validation_error = %e, "Request rejected");
            Envelope::from_error(&e)
        }
        Err(e) => {
            tracing::error!(endpoint, error = %e, "Request failed");
            Envelope::failure(format!("Error in {}: {}", endpoint, e))
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

async fn user_recommendations(
    state: &AppState,
    raw_user_id: &str,
    raw_n: Option<&str>,
) -> AppResult<Vec<Recommendation>> {
    let user_id = parse_user_id(raw_user_id)?;
    let n = parse_n(raw_n, DEFAULT_TOP_N)?;
    state.recommender.user_recommendations(user_id, n).await
}

/// Top-N personalized recommendations
pub async fn recommend_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<CountParams>,
) -> Json<Envelope<UserRecommendations>> {
    tracing::info!(user_id = %user_id, n = ?params.n, "Recommendation request");

    let result = user_recommendations(&state, &user_id, params.n.as_deref()).await;
    Json(into_envelope("get_user_recommendations", result))
}

fn genre_recommendations(
    state: &AppState,
    raw_user_id: &str,
    raw_n: Option<&str>,
) -> AppResult<Vec<GenrePick>> {
    let user_id = parse_user_id(raw_user_id)?;
    let n = parse_n(raw_n, DEFAULT_PER_GENRE)?;
    state.recommender.genre_recommendations(user_id, n)
}

/// Best unrated pick(s) per genre
pub async fn recommend_genre(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<CountParams>,
) -> Json<Envelope<GenreRecommendations>> {
    tracing::info!(user_id = %user_id, n = ?params.n, "Genre recommendation request");

    let result = genre_recommendations(&state, &user_id, params.n.as_deref());
    Json(into_envelope("get_genre_recommendations", result))
}

/// Demo user ids known to have ratings
pub async fn example_users(State(state): State<AppState>) -> Json<ExampleUsersResponse> {
    let user_ids = state
        .recommender
        .catalog()
        .example_user_ids(&EXAMPLE_USER_IDS, EXAMPLE_USER_IDS.len());
    Json(ExampleUsersResponse { user_ids })
}

/// Conversational agent endpoint
pub async fn chatbot(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Json<Envelope<ChatReply>> {
    let message = match &body {
        Ok(Json(value)) => value.get("message").and_then(Value::as_str).unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unreadable chatbot body");
            ""
        }
    };

    tracing::info!(message = %message, "Chatbot request");

    let envelope = match state.agent.chat(message).await {
        Ok(response) => Envelope::success(response),
        Err(e) if e.is_validation() => {
            tracing::warn!(validation_error = %e, "Chatbot request rejected");
            Envelope::from_error(&e)
        }
        Err(AppError::Unconfigured(reason)) => Envelope::failure(reason),
        Err(e) => {
            tracing::error!(error = %e, "Chatbot error");
            Envelope::failure(format!(
                "Sorry, there was an error processing your request: {}",
                e
            ))
        }
    };

    Json(envelope)
}
