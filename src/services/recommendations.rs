use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{ScoredTitle, SimilarityMatrix, Strategy, UserId, UserMovieMatrix},
};

/// Ratings at or above this value count as "liked" for content filtering
pub const LIKED_THRESHOLD: f64 = 4.0;

/// Parameters of a single recommendation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationParams {
    pub strategy: Strategy,
    /// Collaborative weight of the hybrid blend, content gets `1 - alpha`
    pub alpha: f64,
    /// Neighbors consulted by collaborative filtering
    pub neighbors: usize,
    /// Maximum number of titles returned
    pub n: usize,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self {
            strategy: Strategy::Hybrid,
            alpha: 0.6,
            neighbors: 5,
            n: 15,
        }
    }
}

impl RecommendationParams {
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(AppError::InvalidInput(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Sorts by score descending, title ascending on ties, and keeps the top `n`
fn top_n(mut scored: Vec<ScoredTitle>, n: usize) -> Vec<ScoredTitle> {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.title.cmp(&b.title))
    });
    scored.truncate(n);
    scored
}

/// User-based collaborative filtering
///
/// Takes the `neighbors` most similar other users (similarity descending,
/// user id ascending on ties) and scores each title the target has not rated
/// by the similarity-weighted average of the neighbors' raw ratings. Returns
/// an empty list when the user is unknown or the neighbor weights sum to 0.
pub fn collaborative(
    user_id: UserId,
    ratings: &UserMovieMatrix,
    user_similarity: &SimilarityMatrix<UserId>,
    neighbors: usize,
    n: usize,
) -> Vec<ScoredTitle> {
    let (Some(target), Some(sim_row)) = (
        ratings.row_position(&user_id),
        user_similarity.row_position(&user_id),
    ) else {
        tracing::debug!(user_id, "User has no ratings, no collaborative candidates");
        return Vec::new();
    };

    if n == 0 || neighbors == 0 {
        return Vec::new();
    }

    let mut nearest: Vec<(UserId, f64)> = user_similarity
        .row(sim_row)
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != sim_row)
        .map(|(j, sim)| (user_similarity.col_labels()[j], *sim))
        .collect();
    nearest.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    nearest.truncate(neighbors);

    let weight_sum: f64 = nearest.iter().map(|(_, sim)| sim).sum();
    if weight_sum.abs() < f64::EPSILON {
        tracing::debug!(user_id, "Neighbor similarities sum to zero");
        return Vec::new();
    }

    let neighbor_rows: Vec<(usize, f64)> = nearest
        .iter()
        .filter_map(|(neighbor, sim)| ratings.row_position(neighbor).map(|row| (row, *sim)))
        .collect();

    let scored = ratings
        .row(target)
        .iter()
        .enumerate()
        .filter(|(_, rating)| **rating == 0.0)
        .map(|(col, _)| {
            let weighted: f64 = neighbor_rows
                .iter()
                .map(|(row, sim)| sim * ratings.get(*row, col))
                .sum();
            ScoredTitle {
                title: ratings.col_labels()[col].clone(),
                score: weighted / weight_sum,
            }
        })
        .collect();

    top_n(scored, n)
}

/// Content-based filtering over genre similarity
///
/// Each unrated title scores the sum of its similarity to every title the
/// user rated at least [`LIKED_THRESHOLD`]. No liked titles means no result.
pub fn content_based(
    user_id: UserId,
    ratings: &UserMovieMatrix,
    movie_similarity: &SimilarityMatrix<String>,
    n: usize,
) -> Vec<ScoredTitle> {
    let Some(target) = ratings.row_position(&user_id) else {
        tracing::debug!(user_id, "User has no ratings, no content candidates");
        return Vec::new();
    };

    let row = ratings.row(target);
    let titles = ratings.col_labels();

    let liked: Vec<usize> = row
        .iter()
        .enumerate()
        .filter(|(_, rating)| **rating >= LIKED_THRESHOLD)
        .filter_map(|(col, _)| movie_similarity.col_position(&titles[col]))
        .collect();

    if liked.is_empty() || n == 0 {
        tracing::debug!(user_id, "User has no liked titles");
        return Vec::new();
    }

    let scored = row
        .iter()
        .enumerate()
        .filter(|(_, rating)| **rating == 0.0)
        .filter_map(|(col, _)| {
            let pos = movie_similarity.row_position(&titles[col])?;
            let score: f64 = liked.iter().map(|l| movie_similarity.get(pos, *l)).sum();
            Some(ScoredTitle {
                title: titles[col].clone(),
                score,
            })
        })
        .collect();

    top_n(scored, n)
}

/// Rank fusion of a collaborative and a content ranking
///
/// The title at rank `i` (0 = best) of a list weighted `w` earns
/// `w * (n - i) / n` points; points add up across lists. Scores are rank
/// points, not probabilities. Ties keep first-seen order, collaborative
/// titles first. A list weighted 0 contributes nothing.
pub fn fuse_rankings(
    collaborative: &[String],
    content: &[String],
    alpha: f64,
    n: usize,
) -> Vec<ScoredTitle> {
    if n == 0 {
        return Vec::new();
    }

    let mut fused: Vec<ScoredTitle> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for (weight, ranking) in [(alpha, collaborative), (1.0 - alpha, content)] {
        if weight <= 0.0 {
            continue;
        }
        for (rank, title) in ranking.iter().take(n).enumerate() {
            let points = weight * (n - rank) as f64 / n as f64;
            match position.get(title.as_str()) {
                Some(&i) => fused[i].score += points,
                None => {
                    position.insert(title.as_str(), fused.len());
                    fused.push(ScoredTitle {
                        title: title.clone(),
                        score: points,
                    });
                }
            }
        }
    }

    // stable sort: equal scores keep insertion order
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(n);
    fused
}

/// Hybrid recommendation: collaborative and content lists of length `n`
/// fused with weights `alpha` and `1 - alpha`
pub fn hybrid(
    user_id: UserId,
    ratings: &UserMovieMatrix,
    user_similarity: &SimilarityMatrix<UserId>,
    movie_similarity: &SimilarityMatrix<String>,
    params: &RecommendationParams,
) -> AppResult<Vec<ScoredTitle>> {
    params.validate()?;

    let titles = |list: Vec<ScoredTitle>| -> Vec<String> {
        list.into_iter().map(|s| s.title).collect()
    };

    let collab = titles(collaborative(
        user_id,
        ratings,
        user_similarity,
        params.neighbors,
        params.n,
    ));
    let content = titles(content_based(user_id, ratings, movie_similarity, params.n));

    let fused = fuse_rankings(&collab, &content, params.alpha, params.n);

    tracing::debug!(
        user_id,
        alpha = params.alpha,
        collaborative = collab.len(),
        content = content.len(),
        fused = fused.len(),
        "Hybrid ranking fused"
    );

    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        fixtures,
        loader::join_tables,
        matrices::{mean_center, movie_features, user_means, user_movie_matrix},
        similarity::pairwise_row_similarity,
    };

    struct Matrices {
        ratings: UserMovieMatrix,
        users: SimilarityMatrix<UserId>,
        movies: SimilarityMatrix<String>,
    }

    fn build(tables: crate::services::loader::RawTables) -> Matrices {
        let dataset = join_tables(&tables);
        let ratings = user_movie_matrix(&dataset);
        let centered = mean_center(&ratings, &user_means(&ratings));
        let (features, _) = movie_features(&dataset);
        Matrices {
            users: pairwise_row_similarity(&centered),
            movies: pairwise_row_similarity(&features),
            ratings,
        }
    }

    fn names(list: &[ScoredTitle]) -> Vec<&str> {
        list.iter().map(|s| s.title.as_str()).collect()
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_collaborative_scores_unrated_titles() {
        let m = build(fixtures::raw_tables());
        let recs = collaborative(1, &m.ratings, &m.users, 2, 15);

        assert_eq!(names(&recs), vec!["delta", "echo"]);

        let s12 = m.users.value(&1, &2).unwrap();
        let s13 = m.users.value(&1, &3).unwrap();
        let expected_delta = (s12 * 3.0 + s13 * 5.0) / (s12 + s13);
        assert!((recs[0].score - expected_delta).abs() < 1e-9);
    }

    #[test]
    fn test_collaborative_never_returns_rated_titles() {
        let m = build(fixtures::raw_tables());
        for user in [1, 2, 3] {
            let rated: Vec<&String> = m
                .ratings
                .col_labels()
                .iter()
                .filter(|t| m.ratings.value(&user, t).unwrap() > 0.0)
                .collect();
            for rec in collaborative(user, &m.ratings, &m.users, 5, 15) {
                assert!(!rated.contains(&&rec.title), "user {} got {}", user, rec.title);
            }
        }
    }

    #[test]
    fn test_collaborative_respects_n() {
        let m = build(fixtures::raw_tables());
        assert_eq!(collaborative(1, &m.ratings, &m.users, 2, 1).len(), 1);
        assert!(collaborative(1, &m.ratings, &m.users, 2, 0).is_empty());
    }

    #[test]
    fn test_collaborative_ties_break_by_title() {
        // columns deliberately out of alphabetical order
        let mut ratings = UserMovieMatrix::zeros(vec![1, 2], strings(&["b", "a", "c"]));
        ratings.set(0, 2, 5.0);
        ratings.set(1, 0, 4.0);
        ratings.set(1, 1, 4.0);

        let mut users = SimilarityMatrix::zeros(vec![1, 2], vec![1, 2]);
        users.set(0, 0, 1.0);
        users.set(1, 1, 1.0);
        users.set(0, 1, 0.5);
        users.set(1, 0, 0.5);

        let recs = collaborative(1, &ratings, &users, 5, 15);
        assert_eq!(names(&recs), vec!["a", "b"]);
        assert_eq!(recs[0].score, recs[1].score);
        assert_eq!(recs[0].score, 4.0);
    }

    #[test]
    fn test_collaborative_neighbor_ties_prefer_lower_user_id() {
        let mut ratings = UserMovieMatrix::zeros(vec![1, 2, 3], strings(&["x", "y"]));
        ratings.set(0, 0, 5.0);
        ratings.set(1, 1, 2.0);
        ratings.set(2, 1, 4.0);

        // user 3 sits before user 2 in the similarity axis
        let mut users = SimilarityMatrix::zeros(vec![1, 3, 2], vec![1, 3, 2]);
        for i in 0..3 {
            users.set(i, i, 1.0);
        }
        users.set(0, 1, 0.5);
        users.set(1, 0, 0.5);
        users.set(0, 2, 0.5);
        users.set(2, 0, 0.5);

        let recs = collaborative(1, &ratings, &users, 1, 15);
        assert_eq!(names(&recs), vec!["y"]);
        // only user 2 consulted
        assert_eq!(recs[0].score, 2.0);
    }

    #[test]
    fn test_content_based_ties_break_by_title() {
        let mut ratings = UserMovieMatrix::zeros(vec![1], strings(&["b", "a", "c"]));
        ratings.set(0, 2, 5.0);

        let axis = strings(&["b", "a", "c"]);
        let mut movies = SimilarityMatrix::zeros(axis.clone(), axis);
        for i in 0..3 {
            movies.set(i, i, 1.0);
        }
        movies.set(0, 2, 0.5);
        movies.set(2, 0, 0.5);
        movies.set(1, 2, 0.5);
        movies.set(2, 1, 0.5);

        let recs = content_based(1, &ratings, &movies, 15);
        assert_eq!(names(&recs), vec!["a", "b"]);
        assert_eq!(recs[0].score, recs[1].score);
    }

    #[test]
    fn test_collaborative_zero_weight_sum_is_empty() {
        let mut ratings = UserMovieMatrix::zeros(
            vec![1, 2],
            vec!["alpha".to_string(), "bravo".to_string()],
        );
        ratings.set(0, 0, 5.0);
        ratings.set(1, 1, 3.0);
        // Single-rating users center to zero vectors, so every similarity is 0
        let centered = mean_center(&ratings, &user_means(&ratings));
        let users = pairwise_row_similarity(&centered);

        assert!(collaborative(1, &ratings, &users, 5, 15).is_empty());
    }

    #[test]
    fn test_unknown_user_gets_nothing() {
        let m = build(fixtures::raw_tables());
        // user 4 exists in users.dat but never rated anything
        assert!(collaborative(4, &m.ratings, &m.users, 5, 15).is_empty());
        assert!(content_based(4, &m.ratings, &m.movies, 15).is_empty());
    }

    #[test]
    fn test_content_based_prefers_genre_overlap() {
        let m = build(fixtures::raw_tables());
        let recs = content_based(1, &m.ratings, &m.movies, 15);

        assert_eq!(names(&recs), vec!["delta", "echo"]);
        // delta matches alpha and charlie fully, bravo at 1/sqrt(2)
        assert!((recs[0].score - (2.0 + 1.0 / 2f64.sqrt())).abs() < 1e-9);
        assert!((recs[1].score - 1.0 / 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_content_based_four_movie_scenario() {
        let m = build(fixtures::four_movie_tables());
        let recs = content_based(1, &m.ratings, &m.movies, 1);

        assert_eq!(names(&recs), vec!["face off"]);
        // face off (Action) vs heat (Action) = 1, speed (Action|Comedy) = 1/sqrt(2), ronin = 1
        assert!((recs[0].score - 2.707106781186548).abs() < 1e-9);
    }

    #[test]
    fn test_content_based_without_liked_titles_is_empty() {
        let mut ratings = UserMovieMatrix::zeros(
            vec![1],
            vec!["alpha".to_string(), "bravo".to_string()],
        );
        ratings.set(0, 0, 3.0);
        let movies = SimilarityMatrix::zeros(
            vec!["alpha".to_string(), "bravo".to_string()],
            vec!["alpha".to_string(), "bravo".to_string()],
        );
        assert!(content_based(1, &ratings, &movies, 15).is_empty());
    }

    #[test]
    fn test_fuse_rankings_blends_positions() {
        let collab = strings(&["a", "b", "c"]);
        let content = strings(&["c", "d", "a"]);
        let fused = fuse_rankings(&collab, &content, 0.6, 3);

        // a: .6*3/3 + .4*1/3, b: .6*2/3, c: .6*1/3 + .4*3/3, d: .4*2/3
        assert_eq!(names(&fused), vec!["a", "c", "b"]);
        assert!((fused[0].score - (0.6 + 0.4 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_fuse_rankings_ties_keep_first_seen_order() {
        let collab = strings(&["a"]);
        let content = strings(&["b"]);
        let fused = fuse_rankings(&collab, &content, 0.5, 2);
        assert_eq!(names(&fused), vec!["a", "b"]);
    }

    #[test]
    fn test_fuse_rankings_extreme_alpha_matches_single_list() {
        let collab = strings(&["a", "b"]);
        let content = strings(&["c", "d"]);

        assert_eq!(names(&fuse_rankings(&collab, &content, 1.0, 2)), vec!["a", "b"]);
        assert_eq!(names(&fuse_rankings(&collab, &content, 0.0, 2)), vec!["c", "d"]);
    }

    #[test]
    fn test_hybrid_alpha_one_equals_collaborative() {
        let m = build(fixtures::raw_tables());
        let params = RecommendationParams {
            alpha: 1.0,
            neighbors: 2,
            ..Default::default()
        };
        let hybrid = hybrid(1, &m.ratings, &m.users, &m.movies, &params).unwrap();
        let collab = collaborative(1, &m.ratings, &m.users, 2, params.n);
        assert_eq!(names(&hybrid), names(&collab));
    }

    #[test]
    fn test_hybrid_alpha_zero_equals_content() {
        let m = build(fixtures::raw_tables());
        for user in [1, 2, 3] {
            let params = RecommendationParams {
                alpha: 0.0,
                ..Default::default()
            };
            let hybrid = hybrid(user, &m.ratings, &m.users, &m.movies, &params).unwrap();
            let content = content_based(user, &m.ratings, &m.movies, params.n);
            assert_eq!(names(&hybrid), names(&content), "user {}", user);
        }
    }

    #[test]
    fn test_hybrid_output_comes_from_input_lists() {
        let m = build(fixtures::raw_tables());
        for user in [1, 2, 3, 4] {
            let params = RecommendationParams {
                n: 2,
                ..Default::default()
            };
            let fused = hybrid(user, &m.ratings, &m.users, &m.movies, &params).unwrap();
            let collab = collaborative(user, &m.ratings, &m.users, params.neighbors, 2);
            let content = content_based(user, &m.ratings, &m.movies, 2);

            assert!(fused.len() <= 2);
            for rec in &fused {
                assert!(
                    names(&collab).contains(&rec.title.as_str())
                        || names(&content).contains(&rec.title.as_str())
                );
            }
        }
    }

    #[test]
    fn test_hybrid_rejects_alpha_out_of_range() {
        let m = build(fixtures::raw_tables());
        let params = RecommendationParams {
            alpha: 1.5,
            ..Default::default()
        };
        let err = hybrid(1, &m.ratings, &m.users, &m.movies, &params).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let nan = RecommendationParams {
            alpha: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }
}
