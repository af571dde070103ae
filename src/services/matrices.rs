use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{JoinedDataset, MovieFeatureMatrix, UserId, UserMovieMatrix};

/// Observed (non-zero) cells of a rating row
fn rated(row: &[f64]) -> impl Iterator<Item = f64> + '_ {
    row.iter().copied().filter(|v| *v != 0.0)
}

/// Pivots the joined dataset into a dense user×title rating matrix
///
/// Users ascend by id, titles ascend lexicographically. Unrated cells are 0.
/// When one user has several ratings for the same normalized title the cell
/// holds their mean.
pub fn user_movie_matrix(dataset: &JoinedDataset) -> UserMovieMatrix {
    let mut cells: BTreeMap<(UserId, &str), (f64, u32)> = BTreeMap::new();
    let mut titles: BTreeSet<&str> = BTreeSet::new();

    for row in dataset.rows() {
        let cell = cells.entry((row.user_id, row.title.as_str())).or_insert((0.0, 0));
        cell.0 += f64::from(row.rating);
        cell.1 += 1;
        titles.insert(row.title.as_str());
    }

    let users: BTreeSet<UserId> = cells.keys().map(|(user, _)| *user).collect();
    let mut matrix = UserMovieMatrix::zeros(
        users.into_iter().collect(),
        titles.into_iter().map(str::to_string).collect(),
    );

    for ((user, title), (sum, count)) in cells {
        let row = matrix.row_position(&user);
        let col = matrix.col_position(&title.to_string());
        if let (Some(row), Some(col)) = (row, col) {
            matrix.set(row, col, sum / f64::from(count));
        }
    }

    tracing::debug!(
        users = matrix.rows(),
        titles = matrix.cols(),
        "User-movie matrix built"
    );

    matrix
}

/// Mean rating per user over rated cells only
///
/// A user with no rated cell gets mean 0, so centering leaves the row untouched.
pub fn user_means(ratings: &UserMovieMatrix) -> Vec<f64> {
    (0..ratings.rows())
        .map(|i| {
            let (sum, count) = rated(ratings.row(i)).fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 {
                0.0
            } else {
                sum / count as f64
            }
        })
        .collect()
}

/// Subtracts each user's mean from their rated cells; unrated cells stay 0
pub fn mean_center(ratings: &UserMovieMatrix, means: &[f64]) -> UserMovieMatrix {
    ratings.map_cells(|row, _, value| {
        if value == 0.0 {
            0.0
        } else {
            value - means[row]
        }
    })
}

/// Builds the title×genre indicator matrix
///
/// One row per distinct title in the same ascending order as the rating
/// matrix columns. A title's genres come from its first occurrence in the
/// dataset. Also returns that first-occurrence genre string per title.
pub fn movie_features(dataset: &JoinedDataset) -> (MovieFeatureMatrix, HashMap<String, String>) {
    let mut first_genres: HashMap<String, String> = HashMap::new();
    for row in dataset.rows() {
        first_genres
            .entry(row.title.clone())
            .or_insert_with(|| row.genres.clone());
    }

    let mut titles: Vec<String> = first_genres.keys().cloned().collect();
    titles.sort();

    let mut features = MovieFeatureMatrix::zeros(titles, dataset.genres().to_vec());
    for i in 0..features.rows() {
        let genres = &first_genres[&features.row_labels()[i]];
        let indicators = dataset.genre_indicators(genres);
        for (j, flag) in indicators.into_iter().enumerate() {
            features.set(i, j, f64::from(flag));
        }
    }

    tracing::debug!(
        titles = features.rows(),
        genres = features.cols(),
        "Movie feature matrix built"
    );

    (features, first_genres)
}
