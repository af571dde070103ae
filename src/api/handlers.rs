use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    cache::ReloadOutcome,
    error::{AppError, AppResult},
    models::{MovieCard, MovieLookup, SimilarMovie, Strategy, UserId},
    services::{export::ExportReport, pipeline::ModelSummary, RecommendationParams},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub strategy: Option<Strategy>,
    pub alpha: Option<f64>,
    pub n: Option<usize>,
    pub neighbors: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub strategy: Strategy,
    pub movies: Vec<MovieCard>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarMoviesQuery {
    pub q: String,
    pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SimilarMoviesResponse {
    pub resolved_title: String,
    pub movies: Vec<SimilarMovie>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub rebuilt: bool,
    pub dataset: ModelSummary,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Summary of the loaded dataset and its model
pub async fn get_dataset(State(state): State<AppState>) -> AppResult<Json<ModelSummary>> {
    let model = state.model().await?;
    Ok(Json(model.summary()))
}

/// Re-read the dataset source, rebuilding only if it changed
pub async fn reload_dataset(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let (model, outcome) = state.reload().await?;
    Ok(Json(ReloadResponse {
        rebuilt: outcome == ReloadOutcome::Rebuilt,
        dataset: model.summary(),
    }))
}

/// Drop the cached model and all derived matrices
pub async fn invalidate_cache(State(state): State<AppState>) -> StatusCode {
    state.invalidate().await;
    StatusCode::NO_CONTENT
}

/// User ids available for recommendation
pub async fn get_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserId>>> {
    let model = state.model().await?;
    Ok(Json(model.users().to_vec()))
}

/// Recommendations for one user
///
/// An empty list means there is nothing to recommend, not a failure.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let config = state.config();
    let params = RecommendationParams {
        strategy: query.strategy.unwrap_or_default(),
        alpha: query.alpha.unwrap_or(config.default_alpha),
        neighbors: query.neighbors.unwrap_or(config.default_neighbors),
        n: query.n.unwrap_or(config.default_results),
    };
    params.validate()?;

    let model = state.model().await?;
    let ranked = model.recommend(user_id, &params)?;

    if ranked.is_empty() {
        tracing::info!(user_id, strategy = ?params.strategy, "No recommendations available");
    }

    Ok(Json(RecommendationResponse {
        user_id,
        strategy: params.strategy,
        movies: model.cards(&ranked),
    }))
}

/// Movies with the most similar genres to a free-text title
pub async fn similar_movies(
    State(state): State<AppState>,
    Query(query): Query<SimilarMoviesQuery>,
) -> AppResult<Json<SimilarMoviesResponse>> {
    if query.q.trim().is_empty() {
        return Err(AppError::InvalidInput("Movie name must not be empty".to_string()));
    }

    let n = query.n.unwrap_or(state.config().default_results);
    let model = state.model().await?;

    match model.similar_movies(&query.q, n) {
        MovieLookup::Found { title, neighbors } => Ok(Json(SimilarMoviesResponse {
            resolved_title: title,
            movies: neighbors,
        })),
        MovieLookup::NotFound => Err(AppError::NotFound(format!(
            "No movie matching '{}'",
            query.q.trim()
        ))),
    }
}

/// Write the CSV snapshots of the current model
pub async fn export_snapshots(State(state): State<AppState>) -> AppResult<Json<ExportReport>> {
    let report = state.export().await?;
    Ok(Json(report))
}
