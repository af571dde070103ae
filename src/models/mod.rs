use serde::{Deserialize, Serialize};

pub mod dataset;
pub mod matrix;

pub use dataset::{JoinedDataset, JoinedRow};
pub use matrix::LabeledMatrix;

pub type UserId = u32;
pub type MovieId = u32;

/// Dense user×title rating matrix, 0.0 marks an unrated cell
pub type UserMovieMatrix = LabeledMatrix<UserId, String>;

/// Title×genre indicator matrix (0/1 cells)
pub type MovieFeatureMatrix = LabeledMatrix<String, String>;

/// Square cosine-similarity matrix labeled by the same axis on both sides
pub type SimilarityMatrix<L> = LabeledMatrix<L, L>;

// ============================================================================
// Source records
// ============================================================================

/// One observed rating from `ratings.dat`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: u8,
    pub timestamp: i64,
}

/// One movie from `movies.dat`, title already normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    /// Pipe-delimited genre labels, e.g. `Animation|Children's|Comedy`
    pub genres: String,
}

/// One user from `users.dat`. Demographics are carried through to exports only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub gender: String,
    pub age: u32,
    pub occupation: u32,
    pub zip_code: String,
}

pub(crate) fn split_genres(genres: &str) -> impl Iterator<Item = &str> {
    genres.split('|').map(str::trim).filter(|g| !g.is_empty())
}

// ============================================================================
// Recommendation outputs
// ============================================================================

/// A title with the score it was ranked by
///
/// Hybrid scores are rank-fusion points, not probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTitle {
    pub title: String,
    pub score: f64,
}

/// Which algorithm produced a recommendation list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Hybrid,
    Collaborative,
    Content,
}

/// A title paired with its genre string, as rendered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCard {
    pub title: String,
    pub genres: String,
}

/// A neighbor returned by the similar-movies lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMovie {
    pub title: String,
    pub genres: String,
    pub similarity: f64,
}

/// Outcome of resolving a free-text movie name
#[derive(Debug, Clone, PartialEq)]
pub enum MovieLookup {
    Found {
        /// Canonical (normalized) title the query resolved to
        title: String,
        neighbors: Vec<SimilarMovie>,
    },
    NotFound,
}
