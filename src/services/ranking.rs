use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, Prediction, UserId},
    services::{
        catalog::{Catalog, GenreLookup},
        model::RatingModel,
    },
};

pub const USER_ID_MESSAGE: &str = "user_id must be a positive integer";
pub const N_MESSAGE: &str = "n must be a positive integer";

/// Parses a raw path/query value as a user id
pub fn parse_user_id(raw: &str) -> AppResult<UserId> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => UserId::try_from(id).map_err(|_| invalid_user_id()),
        _ => Err(invalid_user_id()),
    }
}

/// Parses an optional `n` query value, using `default` when absent
pub fn parse_n(raw: Option<&str>, default: usize) -> AppResult<usize> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).map_err(|_| invalid_n()),
        _ => Err(invalid_n()),
    }
}

pub fn ensure_user_id(user_id: UserId) -> AppResult<()> {
    if user_id == 0 {
        return Err(invalid_user_id());
    }
    Ok(())
}

pub fn ensure_n(n: usize) -> AppResult<()> {
    if n == 0 {
        return Err(invalid_n());
    }
    Ok(())
}

fn invalid_user_id() -> AppError {
    AppError::Validation(USER_ID_MESSAGE.to_string())
}

fn invalid_n() -> AppError {
    AppError::Validation(N_MESSAGE.to_string())
}

/// Items the user has not rated yet, in catalog order.
///
/// Returns `AppError::NoCandidates` when the user has rated everything.
pub fn unrated_items(catalog: &Catalog, user_id: UserId) -> AppResult<Vec<ItemId>> {
    ensure_user_id(user_id)?;

    let rated = catalog.rated_by(user_id);
    let candidates: Vec<ItemId> = catalog
        .items()
        .map(|item| item.id)
        .filter(|id| rated.map_or(true, |r| !r.contains(id)))
        .collect();

    if candidates.is_empty() {
        tracing::warn!(user_id, "No unrated movies found");
        return Err(AppError::NoCandidates);
    }

    tracing::debug!(
        user_id,
        candidates = candidates.len(),
        rated = rated.map_or(0, |r| r.len()),
        "Computed candidate set"
    );

    Ok(candidates)
}

/// Scores every candidate, best first. Equal estimates keep candidate order.
fn score(model: &dyn RatingModel, user_id: UserId, candidates: &[ItemId]) -> Vec<Prediction> {
    let mut predictions: Vec<Prediction> = candidates
        .iter()
        .map(|&item_id| model.predict(user_id, item_id))
        .collect();
    sort_by_estimate(&mut predictions);
    predictions
}

/// Stable descending sort
fn sort_by_estimate(predictions: &mut [Prediction]) {
    predictions.sort_by(|a, b| b.estimate.total_cmp(&a.estimate));
}

/// Top `n` candidates overall
pub fn top_n(
    model: &dyn RatingModel,
    user_id: UserId,
    n: usize,
    candidates: &[ItemId],
) -> AppResult<Vec<Prediction>> {
    ensure_user_id(user_id)?;
    ensure_n(n)?;
    if candidates.is_empty() {
        return Err(AppError::NoCandidates);
    }

    let mut predictions = score(model, user_id, candidates);
    predictions.truncate(n);
    Ok(predictions)
}

/// Top `n` candidates within each genre, keyed by genre name.
///
/// An item is listed under every genre it carries and under no other. Genres
/// without candidates do not appear.
pub fn best_per_genre(
    model: &dyn RatingModel,
    user_id: UserId,
    n: usize,
    candidates: &[ItemId],
    genres: &dyn GenreLookup,
) -> AppResult<BTreeMap<String, Vec<Prediction>>> {
    ensure_user_id(user_id)?;
    ensure_n(n)?;
    if candidates.is_empty() {
        return Err(AppError::NoCandidates);
    }

    // Buckets fill in candidate order, so the per-bucket sort breaks ties the
    // same way `top_n` does.
    let mut buckets: BTreeMap<String, Vec<Prediction>> = BTreeMap::new();
    for &item_id in candidates {
        let item_genres = genres.genres_of(item_id);
        if item_genres.is_empty() {
            continue;
        }
        let prediction = model.predict(user_id, item_id);
        for genre in item_genres {
            buckets.entry(genre.clone()).or_default().push(prediction);
        }
    }

    for picks in buckets.values_mut() {
        sort_by_estimate(picks);
        picks.truncate(n);
    }

    Ok(buckets)
}
