use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{GenrePick, Recommendation, UserId},
    services::{
        catalog::Catalog,
        enrichment::Describer,
        model::RatingModel,
        ranking::{self, best_per_genre, top_n, unrated_items},
    },
};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_PER_GENRE: usize = 1;

/// Personalized recommendations over an immutable catalog and model.
///
/// Cloning is cheap; all clones share the same catalog and model.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    model: Arc<dyn RatingModel>,
    describer: Describer,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, model: Arc<dyn RatingModel>, describer: Describer) -> Self {
        Self {
            catalog,
            model,
            describer,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Best `n` unrated movies for the user, each with a description
    pub async fn user_recommendations(
        &self,
        user_id: UserId,
        n: usize,
    ) -> AppResult<Vec<Recommendation>> {
        tracing::info!(user_id, n, "Getting recommendations");

        ranking::ensure_user_id(user_id)?;
        ranking::ensure_n(n)?;

        let candidates = unrated_items(&self.catalog, user_id)?;
        let predictions = top_n(self.model.as_ref(), user_id, n, &candidates)?;

        let mut items = Vec::with_capacity(predictions.len());
        for prediction in &predictions {
            let item = self.catalog.item(prediction.item_id).ok_or_else(|| {
                AppError::Internal(format!("movie {} missing from catalog", prediction.item_id))
            })?;
            items.push(item);
        }

        let titles = items.iter().map(|item| item.title.clone()).collect();
        let descriptions = self.describer.describe_all(titles).await;

        let recommendations: Vec<Recommendation> = items
            .into_iter()
            .zip(descriptions)
            .map(|(item, description)| Recommendation {
                item_id: item.id,
                title: item.title.clone(),
                genres: item.genres.clone(),
                description: Some(description),
            })
            .collect();

        tracing::info!(
            user_id,
            returned = recommendations.len(),
            top_item = ?recommendations.first().map(|r| r.item_id),
            "Recommendations ready"
        );

        Ok(recommendations)
    }

    /// Best `n` unrated movies per genre, flattened in genre-name order
    pub fn genre_recommendations(&self, user_id: UserId, n: usize) -> AppResult<Vec<GenrePick>> {
        tracing::info!(user_id, n, "Getting genre recommendations");

        ranking::ensure_user_id(user_id)?;
        ranking::ensure_n(n)?;

        let candidates = unrated_items(&self.catalog, user_id)?;
        let buckets = best_per_genre(
            self.model.as_ref(),
            user_id,
            n,
            &candidates,
            self.catalog.as_ref(),
        )?;

        let picks: Vec<GenrePick> = buckets
            .into_iter()
            .flat_map(|(genre, predictions)| {
                predictions.into_iter().map(move |p| GenrePick {
                    genre: genre.clone(),
                    item_id: p.item_id,
                    estimate: p.estimate,
                })
            })
            .collect();

        tracing::info!(user_id, returned = picks.len(), "Genre recommendations ready");

        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Cache;
    use crate::models::{Interaction, Item, ItemId, Prediction};
    use crate::services::enrichment::DESCRIPTION_UNCONFIGURED;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedModel(HashMap<ItemId, f64>);

    impl RatingModel for FixedModel {
        fn predict(&self, _user_id: UserId, item_id: ItemId) -> Prediction {
            Prediction {
                item_id,
                estimate: self.0[&item_id],
            }
        }
    }

    fn recommender() -> Recommender {
        let items = vec![
            Item {
                id: 1,
                title: "Alien (1979)".to_string(),
                genres: vec!["Horror".to_string(), "Sci-Fi".to_string()],
            },
            Item {
                id: 2,
                title: "Amelie (2001)".to_string(),
                genres: vec!["Comedy".to_string(), "Romance".to_string()],
            },
            Item {
                id: 3,
                title: "Arrival (2016)".to_string(),
                genres: vec!["Sci-Fi".to_string()],
            },
            Item {
                id: 4,
                title: "Airplane! (1980)".to_string(),
                genres: vec!["Comedy".to_string()],
            },
        ];
        let interactions = vec![
            Interaction { user_id: 1, item_id: 4 },
            Interaction { user_id: 2, item_id: 1 },
            Interaction { user_id: 2, item_id: 2 },
            Interaction { user_id: 2, item_id: 3 },
            Interaction { user_id: 2, item_id: 4 },
        ];
        let model = FixedModel([(1, 4.8), (2, 4.5), (3, 4.5), (4, 5.0)].into_iter().collect());

        Recommender::new(
            Arc::new(Catalog::new(items, interactions)),
            Arc::new(model),
            Describer::new(None, Cache::disabled(), Duration::from_secs(1), 1),
        )
    }

    #[tokio::test]
    async fn test_user_recommendations_rank_unrated_items() {
        let recs = recommender().user_recommendations(1, 2).await.unwrap();
        let ids: Vec<ItemId> = recs.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(recs[0].title, "Alien (1979)");
        assert_eq!(recs[0].genres, vec!["Horror", "Sci-Fi"]);
        assert!(recs
            .iter()
            .all(|r| r.description.as_deref() == Some(DESCRIPTION_UNCONFIGURED)));
    }

    #[tokio::test]
    async fn test_user_recommendations_exhausted_user() {
        let err = recommender().user_recommendations(2, 5).await.unwrap_err();
        assert!(matches!(err, AppError::NoCandidates));
    }

    #[tokio::test]
    async fn test_user_recommendations_validate_n_before_candidates() {
        let err = recommender().user_recommendations(2, 0).await.unwrap_err();
        assert_eq!(err.to_string(), ranking::N_MESSAGE);
    }

    #[test]
    fn test_genre_recommendations_flatten_in_genre_order() {
        let picks = recommender().genre_recommendations(1, 1).unwrap();
        let flat: Vec<(&str, ItemId)> = picks
            .iter()
            .map(|p| (p.genre.as_str(), p.item_id))
            .collect();
        assert_eq!(
            flat,
            vec![("Comedy", 2), ("Horror", 1), ("Romance", 2), ("Sci-Fi", 1)]
        );
    }

    #[test]
    fn test_genre_recommendations_rejects_zero_user() {
        let err = recommender().genre_recommendations(0, 1).unwrap_err();
        assert_eq!(err.to_string(), ranking::USER_ID_MESSAGE);
    }
}
