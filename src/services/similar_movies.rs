use std::collections::HashMap;

use crate::{
    models::{MovieLookup, SimilarMovie, SimilarityMatrix},
    services::loader::normalize_title,
};

/// Resolves a free-text name to an indexed title
///
/// The query is normalized like every title. An exact match wins; otherwise
/// the shortest indexed title containing the query, ties broken
/// lexicographically. A blank query resolves to nothing.
pub fn resolve_title(query: &str, movie_similarity: &SimilarityMatrix<String>) -> Option<String> {
    let needle = normalize_title(query);
    if needle.is_empty() {
        return None;
    }

    if movie_similarity.row_position(&needle).is_some() {
        return Some(needle);
    }

    movie_similarity
        .row_labels()
        .iter()
        .filter(|title| title.contains(needle.as_str()))
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .cloned()
}

/// Top-`n` titles most similar to the one `query` resolves to
///
/// Neighbors exclude the resolved title itself and are ordered by
/// similarity descending, title ascending on ties. Each neighbor carries the
/// genre string of its first occurrence in the dataset.
pub fn similar_movies(
    query: &str,
    movie_similarity: &SimilarityMatrix<String>,
    genres: &HashMap<String, String>,
    n: usize,
) -> MovieLookup {
    let Some(title) = resolve_title(query, movie_similarity) else {
        tracing::debug!(query, "No title matches query");
        return MovieLookup::NotFound;
    };

    let Some(pos) = movie_similarity.row_position(&title) else {
        return MovieLookup::NotFound;
    };

    let labels = movie_similarity.col_labels();
    let mut neighbors: Vec<SimilarMovie> = movie_similarity
        .row(pos)
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != pos)
        .map(|(j, similarity)| SimilarMovie {
            title: labels[j].clone(),
            genres: genres.get(&labels[j]).cloned().unwrap_or_default(),
            similarity: *similarity,
        })
        .collect();

    neighbors.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.title.cmp(&b.title))
    });
    neighbors.truncate(n);

    tracing::debug!(query, resolved = %title, neighbors = neighbors.len(), "Similar movies found");

    MovieLookup::Found { title, neighbors }
}
