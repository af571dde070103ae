use std::fmt::Display;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    error::AppResult,
    models::{JoinedDataset, LabeledMatrix},
    services::pipeline::RecommenderModel,
};

pub const DATASET_EXPORT: &str = "data_complet.csv";
pub const USER_MOVIE_EXPORT: &str = "user_movie_matrix.csv";
pub const USER_SIMILARITY_EXPORT: &str = "user_similarity.csv";
pub const MOVIE_SIMILARITY_EXPORT: &str = "movie_similarity.csv";

/// Paths of the snapshot files written by one export
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportReport {
    pub fingerprint: String,
    pub files: Vec<PathBuf>,
}

/// Writes the joined dataset and the three matrices as CSV snapshots
///
/// The directory is created if missing and existing files are overwritten.
pub fn export_snapshots(model: &RecommenderModel, dir: &Path) -> AppResult<ExportReport> {
    std::fs::create_dir_all(dir)?;

    let files = vec![
        dir.join(DATASET_EXPORT),
        dir.join(USER_MOVIE_EXPORT),
        dir.join(USER_SIMILARITY_EXPORT),
        dir.join(MOVIE_SIMILARITY_EXPORT),
    ];

    write_dataset(&model.dataset, &files[0])?;
    write_matrix(&model.ratings, "UserID", &files[1])?;
    write_matrix(&model.user_similarity, "UserID", &files[2])?;
    write_matrix(&model.movie_similarity, "Title", &files[3])?;

    tracing::info!(
        dir = %dir.display(),
        fingerprint = %model.fingerprint,
        "Snapshots exported"
    );

    Ok(ExportReport {
        fingerprint: model.fingerprint.to_string(),
        files,
    })
}

fn write_dataset(dataset: &JoinedDataset, path: &Path) -> AppResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = [
        "UserID",
        "MovieID",
        "Rating",
        "Timestamp",
        "Gender",
        "Age",
        "Occupation",
        "Zip-code",
        "Title",
        "Genres",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    header.extend(dataset.genres().iter().cloned());
    writer.write_record(&header)?;

    for row in dataset.rows() {
        let mut record = vec![
            row.user_id.to_string(),
            row.movie_id.to_string(),
            row.rating.to_string(),
            row.timestamp.to_string(),
            row.gender.clone(),
            row.age.to_string(),
            row.occupation.to_string(),
            row.zip_code.clone(),
            row.title.clone(),
            row.genres.clone(),
        ];
        record.extend(
            dataset
                .genre_indicators(&row.genres)
                .into_iter()
                .map(|flag| flag.to_string()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_matrix<R, C>(matrix: &LabeledMatrix<R, C>, index_name: &str, path: &Path) -> AppResult<()>
where
    R: Clone + Eq + Hash + Display,
    C: Clone + Eq + Hash + Display,
{
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![index_name.to_string()];
    header.extend(matrix.col_labels().iter().map(|c| c.to_string()));
    writer.write_record(&header)?;

    for (i, label) in matrix.row_labels().iter().enumerate() {
        let mut record = vec![label.to_string()];
        record.extend(matrix.row(i).iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
