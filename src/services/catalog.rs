use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{Interaction, Item, ItemId, UserId},
};

/// Row of `movies.csv`
#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: ItemId,
    title: String,
    #[serde(default)]
    genres: Option<String>,
}

/// Row of `ratings.csv`; the rating value and timestamp are not needed
#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: ItemId,
}

/// Read-only movie and rating tables, built once at startup.
///
/// Items keep the order of the source table so that candidate iteration, and
/// with it tie-breaking during ranking, is reproducible.
#[derive(Debug, Default)]
pub struct Catalog {
    items: HashMap<ItemId, Item>,
    order: Vec<ItemId>,
    rated: HashMap<UserId, HashSet<ItemId>>,
}

impl Catalog {
    /// Builds a catalog from already parsed rows. Duplicate item ids keep the
    /// first occurrence.
    pub fn new(items: Vec<Item>, interactions: impl IntoIterator<Item = Interaction>) -> Self {
        let mut catalog = Self::default();

        for item in items {
            if catalog.items.contains_key(&item.id) {
                tracing::warn!(item_id = item.id, "Duplicate movie id, keeping first row");
                continue;
            }
            catalog.order.push(item.id);
            catalog.items.insert(item.id, item);
        }

        for interaction in interactions {
            catalog
                .rated
                .entry(interaction.user_id)
                .or_default()
                .insert(interaction.item_id);
        }

        catalog
    }

    /// Loads the movies and ratings tables from disk
    pub fn load(movies_path: impl AsRef<Path>, ratings_path: impl AsRef<Path>) -> AppResult<Self> {
        let movies_path = movies_path.as_ref();
        let ratings_path = ratings_path.as_ref();

        tracing::info!(movies = ?movies_path, ratings = ?ratings_path, "Loading catalog");

        let movies = std::fs::File::open(movies_path).map_err(|e| {
            AppError::Dependency(format!("cannot open {}: {}", movies_path.display(), e))
        })?;
        let ratings = std::fs::File::open(ratings_path).map_err(|e| {
            AppError::Dependency(format!("cannot open {}: {}", ratings_path.display(), e))
        })?;

        Self::from_readers(movies, ratings)
    }

    /// Parses both tables from CSV readers with header rows
    pub fn from_readers(movies: impl Read, ratings: impl Read) -> AppResult<Self> {
        let mut items = Vec::new();
        for record in csv::Reader::from_reader(movies).deserialize::<MovieRecord>() {
            let record =
                record.map_err(|e| AppError::Dependency(format!("bad movie row: {}", e)))?;
            items.push(Item {
                id: record.movie_id,
                title: record.title,
                genres: parse_genres(record.genres.as_deref().unwrap_or_default()),
            });
        }

        let mut interactions = Vec::new();
        for record in csv::Reader::from_reader(ratings).deserialize::<RatingRecord>() {
            let record =
                record.map_err(|e| AppError::Dependency(format!("bad rating row: {}", e)))?;
            interactions.push(Interaction {
                user_id: record.user_id,
                item_id: record.movie_id,
            });
        }

        let catalog = Self::new(items, interactions);

        tracing::info!(
            items = catalog.items.len(),
            users = catalog.rated.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Every item, in source order
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Items the user has rated; `None` for users with no ratings
    pub fn rated_by(&self, user_id: UserId) -> Option<&HashSet<ItemId>> {
        self.rated.get(&user_id)
    }

    pub fn has_ratings(&self, user_id: UserId) -> bool {
        self.rated.contains_key(&user_id)
    }

    /// Picks demo users: the preferred ids that have ratings, topped up with the
    /// lowest known user ids.
    pub fn example_user_ids(&self, preferred: &[UserId], limit: usize) -> Vec<UserId> {
        let mut picked: Vec<UserId> = preferred
            .iter()
            .copied()
            .filter(|id| self.has_ratings(*id))
            .take(limit)
            .collect();

        if picked.len() < limit {
            let mut known: Vec<UserId> = self.rated.keys().copied().collect();
            known.sort_unstable();
            for id in known {
                if picked.len() == limit {
                    break;
                }
                if !picked.contains(&id) {
                    picked.push(id);
                }
            }
        }

        picked
    }
}

/// Genre lookup used when bucketing predictions
pub trait GenreLookup {
    fn genres_of(&self, item_id: ItemId) -> &[String];
}

impl GenreLookup for Catalog {
    fn genres_of(&self, item_id: ItemId) -> &[String] {
        self.items
            .get(&item_id)
            .map(|item| item.genres.as_slice())
            .unwrap_or_default()
    }
}

impl GenreLookup for HashMap<ItemId, Vec<String>> {
    fn genres_of(&self, item_id: ItemId) -> &[String] {
        self.get(&item_id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Splits a `|`-separated genre list, dropping blanks and repeats
fn parse_genres(raw: &str) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for genre in raw.split('|').map(str::trim).filter(|g| !g.is_empty()) {
        if !genres.iter().any(|g| g == genre) {
            genres.push(genre.to_string());
        }
    }
    genres
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIES: &str = "movieId,title,genres\n\
        1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
        2,Jumanji (1995),Adventure|Children|Fantasy\n\
        3,Grumpier Old Men (1995),Comedy|Romance\n\
        4,\"Heat, The Remake (1995)\",(no genres listed)\n";

    const RATINGS: &str = "userId,movieId,rating,timestamp\n\
        1,1,4.0,964982703\n\
        1,3,4.0,964981247\n\
        2,2,3.5,1445714835\n";

    fn catalog() -> Catalog {
        Catalog::from_readers(MOVIES.as_bytes(), RATINGS.as_bytes()).unwrap()
    }

    #[test]
    fn test_loads_items_in_source_order() {
        let catalog = catalog();
        let ids: Vec<ItemId> = catalog.items().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(catalog.items().count(), 4);
    }

    #[test]
    fn test_parses_genres_and_quoted_titles() {
        let catalog = catalog();
        assert_eq!(
            catalog.genres_of(3),
            &["Comedy".to_string(), "Romance".to_string()]
        );
        assert_eq!(catalog.item(4).unwrap().title, "Heat, The Remake (1995)");
        assert_eq!(catalog.genres_of(4), &["(no genres listed)".to_string()]);
    }

    #[test]
    fn test_rated_items_per_user() {
        let catalog = catalog();
        let rated = catalog.rated_by(1).unwrap();
        assert!(rated.contains(&1));
        assert!(rated.contains(&3));
        assert!(!rated.contains(&2));
        assert!(catalog.rated_by(99).is_none());
    }

    #[test]
    fn test_unknown_item_has_no_genres() {
        assert!(catalog().genres_of(999).is_empty());
    }

    #[test]
    fn test_duplicate_item_keeps_first() {
        let items = vec![
            Item {
                id: 7,
                title: "First".to_string(),
                genres: vec![],
            },
            Item {
                id: 7,
                title: "Second".to_string(),
                genres: vec![],
            },
        ];
        let catalog = Catalog::new(items, Vec::new());
        assert_eq!(catalog.items().count(), 1);
        assert_eq!(catalog.item(7).unwrap().title, "First");
    }

    #[test]
    fn test_bad_rows_are_dependency_errors() {
        let movies = "movieId,title,genres\nnot-a-number,Broken,Drama\n";
        let err = Catalog::from_readers(movies.as_bytes(), RATINGS.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Dependency(_)));
    }

    #[test]
    fn test_missing_file_is_dependency_error() {
        let err = Catalog::load("/nonexistent/movies.csv", "/nonexistent/ratings.csv").unwrap_err();
        assert!(matches!(err, AppError::Dependency(_)));
    }

    #[test]
    fn test_parse_genres_drops_blanks_and_repeats() {
        assert_eq!(parse_genres("Drama||Drama| Crime "), vec!["Drama", "Crime"]);
        assert!(parse_genres("").is_empty());
    }

    #[test]
    fn test_example_user_ids_prefers_known_defaults() {
        let interactions = [1, 10, 20, 30, 100]
            .into_iter()
            .map(|user_id| Interaction { user_id, item_id: 1 });
        let catalog = Catalog::new(Vec::new(), interactions);

        assert_eq!(catalog.example_user_ids(&[1, 10, 50, 100], 4), vec![1, 10, 100, 20]);
        assert_eq!(catalog.example_user_ids(&[1, 10, 50, 100], 2), vec![1, 10]);
    }
}
