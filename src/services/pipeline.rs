use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{
        JoinedDataset, MovieCard, MovieFeatureMatrix, MovieLookup, ScoredTitle, SimilarityMatrix,
        Strategy, UserId, UserMovieMatrix,
    },
    services::{
        loader::{join_tables, DatasetFingerprint, RawTables},
        matrices, recommendations,
        recommendations::RecommendationParams,
        similar_movies, similarity,
    },
};

/// Every artifact derived from one dataset load
///
/// Built once per fingerprint and then only read. The matrices share the
/// model's lifetime and are never refreshed independently.
#[derive(Debug)]
pub struct RecommenderModel {
    pub fingerprint: DatasetFingerprint,
    pub built_at: DateTime<Utc>,
    pub dataset: JoinedDataset,
    pub ratings: UserMovieMatrix,
    pub user_means: Vec<f64>,
    pub centered: UserMovieMatrix,
    pub features: MovieFeatureMatrix,
    pub user_similarity: SimilarityMatrix<UserId>,
    pub movie_similarity: SimilarityMatrix<String>,
    /// Genre string of each title's first occurrence
    pub genres: HashMap<String, String>,
}

/// Counts describing a built model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelSummary {
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
    pub rows: usize,
    pub users: usize,
    pub movies: usize,
    pub genre_count: usize,
    pub genres: Vec<String>,
}

impl RecommenderModel {
    /// Runs the whole pipeline: join, pivot, center, features, similarities
    pub fn build(tables: &RawTables) -> Self {
        let start = Instant::now();

        let dataset = join_tables(tables);
        let ratings = matrices::user_movie_matrix(&dataset);
        let user_means = matrices::user_means(&ratings);
        let centered = matrices::mean_center(&ratings, &user_means);
        let (features, genres) = matrices::movie_features(&dataset);

        let user_similarity = similarity::pairwise_row_similarity(&centered);
        let movie_similarity = similarity::pairwise_row_similarity(&features);

        tracing::info!(
            fingerprint = %tables.fingerprint,
            users = ratings.rows(),
            movies = ratings.cols(),
            genres = features.cols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommender model built"
        );

        Self {
            fingerprint: tables.fingerprint.clone(),
            built_at: Utc::now(),
            dataset,
            ratings,
            user_means,
            centered,
            features,
            user_similarity,
            movie_similarity,
            genres,
        }
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            fingerprint: self.fingerprint.to_string(),
            built_at: self.built_at,
            rows: self.dataset.len(),
            users: self.ratings.rows(),
            movies: self.ratings.cols(),
            genre_count: self.features.cols(),
            genres: self.dataset.genres().to_vec(),
        }
    }

    /// Users that can be recommended for, ascending
    pub fn users(&self) -> &[UserId] {
        self.ratings.row_labels()
    }

    /// Ranked titles for a user using the requested strategy
    pub fn recommend(
        &self,
        user_id: UserId,
        params: &RecommendationParams,
    ) -> AppResult<Vec<ScoredTitle>> {
        params.validate()?;

        let ranked = match params.strategy {
            Strategy::Collaborative => recommendations::collaborative(
                user_id,
                &self.ratings,
                &self.user_similarity,
                params.neighbors,
                params.n,
            ),
            Strategy::Content => recommendations::content_based(
                user_id,
                &self.ratings,
                &self.movie_similarity,
                params.n,
            ),
            Strategy::Hybrid => recommendations::hybrid(
                user_id,
                &self.ratings,
                &self.user_similarity,
                &self.movie_similarity,
                params,
            )?,
        };

        tracing::info!(
            user_id,
            strategy = ?params.strategy,
            count = ranked.len(),
            "Recommendations computed"
        );

        Ok(ranked)
    }

    /// Pairs ranked titles with their genre strings
    pub fn cards(&self, ranked: &[ScoredTitle]) -> Vec<MovieCard> {
        ranked
            .iter()
            .map(|s| MovieCard {
                title: s.title.clone(),
                genres: self.genres.get(&s.title).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn similar_movies(&self, query: &str, n: usize) -> MovieLookup {
        similar_movies::similar_movies(query, &self.movie_similarity, &self.genres, n)
    }
}
