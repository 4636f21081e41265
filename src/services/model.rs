use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, Prediction, UserId},
};

/// A pretrained estimator. Implementations must be pure: the same pair always
/// yields the same estimate, which keeps ranking reproducible.
pub trait RatingModel: Send + Sync {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> Prediction;
}

#[derive(Debug, Clone, Deserialize)]
struct LatentFactors {
    bias: f64,
    factors: Vec<f64>,
}

/// Biased matrix factorization exported from the offline training job.
///
/// `estimate = mu + b_u + b_i + q_i . p_u`, clipped to the rating scale. Terms
/// for a user or item that was absent from training are left out, so a cold
/// user gets `mu + b_i`.
#[derive(Debug, Clone, Deserialize)]
pub struct FactorModel {
    global_mean: f64,
    rating_scale: (f64, f64),
    #[serde(default)]
    users: HashMap<UserId, LatentFactors>,
    #[serde(default)]
    items: HashMap<ItemId, LatentFactors>,
}

impl FactorModel {
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        tracing::info!(model = ?path, "Loading rating model");

        let file = std::fs::File::open(path)
            .map_err(|e| AppError::Dependency(format!("cannot open {}: {}", path.display(), e)))?;
        let model = Self::from_reader(std::io::BufReader::new(file))?;

        tracing::info!(
            users = model.users.len(),
            items = model.items.len(),
            "Rating model loaded"
        );

        Ok(model)
    }

    pub fn from_reader(reader: impl Read) -> AppResult<Self> {
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| AppError::Dependency(format!("malformed model: {}", e)))?;
        model.check()?;
        Ok(model)
    }

    /// Rejects exports whose factor vectors disagree in length or whose scale
    /// is inverted
    fn check(&self) -> AppResult<()> {
        let (low, high) = self.rating_scale;
        if !(low < high) {
            return Err(AppError::Dependency(format!(
                "invalid rating scale ({}, {})",
                low, high
            )));
        }

        let mut dims = self
            .users
            .values()
            .chain(self.items.values())
            .map(|f| f.factors.len());
        if let Some(first) = dims.next() {
            if dims.any(|d| d != first) {
                return Err(AppError::Dependency(
                    "latent factor vectors have mixed dimensions".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl RatingModel for FactorModel {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> Prediction {
        let user = self.users.get(&user_id);
        let item = self.items.get(&item_id);

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += u.bias;
        }
        if let Some(i) = item {
            estimate += i.bias;
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += u
                .factors
                .iter()
                .zip(&i.factors)
                .map(|(p, q)| p * q)
                .sum::<f64>();
        }

        let (low, high) = self.rating_scale;
        Prediction {
            item_id,
            estimate: estimate.clamp(low, high),
        }
    }
}
