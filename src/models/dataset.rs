use serde::Serialize;

use super::{split_genres, MovieId, UserId};

/// One (user, movie, rating) observation joined with user and movie metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JoinedRow {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: u8,
    pub timestamp: i64,
    pub gender: String,
    pub age: u32,
    pub occupation: u32,
    pub zip_code: String,
    /// Normalized title
    pub title: String,
    /// Pipe-delimited genre labels
    pub genres: String,
}

/// The denormalized ratings-with-metadata table plus its genre columns
///
/// Genre indicator columns are derived from each row's genre string on
/// demand; they cannot be edited independently.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedDataset {
    rows: Vec<JoinedRow>,
    genres: Vec<String>,
}

impl JoinedDataset {
    /// Builds the dataset, deriving the ascending genre column set from the rows
    pub fn new(rows: Vec<JoinedRow>) -> Self {
        let mut genres: Vec<String> = rows
            .iter()
            .flat_map(|row| split_genres(&row.genres))
            .map(str::to_string)
            .collect();
        genres.sort();
        genres.dedup();

        Self { rows, genres }
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    /// Genre column names, ascending
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 0/1 indicator per genre column for a genre string
    pub fn genre_indicators(&self, genres: &str) -> Vec<u8> {
        let labels: Vec<&str> = split_genres(genres).collect();
        self.genres
            .iter()
            .map(|g| u8::from(labels.contains(&g.as_str())))
            .collect()
    }
}
