use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::{
    error::{AppError, AppResult},
    models::{JoinedDataset, JoinedRow, MovieId, MovieRecord, RatingRecord, UserId, UserRecord},
};

pub const RATINGS_FILE: &str = "ratings.dat";
pub const MOVIES_FILE: &str = "movies.dat";
pub const USERS_FILE: &str = "users.dat";

const FIELD_SEPARATOR: &str = "::";

/// Content identity of a raw dataset (hex SHA-256 of the three sources)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetFingerprint(String);

impl DatasetFingerprint {
    pub fn of(ratings: &[u8], movies: &[u8], users: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        for part in [ratings, movies, users] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DatasetFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three parsed source tables, before joining
#[derive(Debug, Clone)]
pub struct RawTables {
    pub ratings: Vec<RatingRecord>,
    pub movies: Vec<MovieRecord>,
    pub users: Vec<UserRecord>,
    pub fingerprint: DatasetFingerprint,
}

impl RawTables {
    /// Parses the raw bytes of the three sources
    ///
    /// Bytes are decoded as Latin-1, which is how the MovieLens `.dat` files
    /// are encoded.
    pub fn parse(ratings: &[u8], movies: &[u8], users: &[u8]) -> AppResult<Self> {
        let fingerprint = DatasetFingerprint::of(ratings, movies, users);

        Ok(Self {
            ratings: parse_ratings(&decode_latin1(ratings))?,
            movies: parse_movies(&decode_latin1(movies))?,
            users: parse_users(&decode_latin1(users))?,
            fingerprint,
        })
    }
}

/// Trait for dataset sources
///
/// A source yields the three raw tables in one shot; any missing or
/// malformed table fails the whole fetch with `DataUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch and parse all three tables
    async fn fetch(&self) -> AppResult<RawTables>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Reads `ratings.dat`, `movies.dat` and `users.dat` from a directory
pub struct DatFileSource {
    dir: PathBuf,
}

impl DatFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, file: &str) -> AppResult<Vec<u8>> {
        let path = self.dir.join(file);
        tokio::fs::read(&path).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to read dataset file");
            AppError::DataUnavailable(format!("{}: {}", path.display(), e))
        })
    }
}

#[async_trait::async_trait]
impl DatasetSource for DatFileSource {
    async fn fetch(&self) -> AppResult<RawTables> {
        let ratings = self.read(RATINGS_FILE).await?;
        let movies = self.read(MOVIES_FILE).await?;
        let users = self.read(USERS_FILE).await?;

        let tables = RawTables::parse(&ratings, &movies, &users)?;

        tracing::info!(
            dir = %self.dir.display(),
            ratings = tables.ratings.len(),
            movies = tables.movies.len(),
            users = tables.users.len(),
            fingerprint = %tables.fingerprint,
            "Dataset files parsed"
        );

        Ok(tables)
    }

    fn name(&self) -> &'static str {
        "dat-files"
    }
}

// ============================================================================
// Title normalization
// ============================================================================

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(\d{4}\)").expect("valid year pattern"))
}

fn punctuation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"))
}

/// Canonical title key: lowercase, `(yyyy)` groups removed, punctuation
/// removed, surrounding whitespace trimmed. Idempotent.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let without_year = year_pattern().replace_all(&lowered, "");
    let without_punctuation = punctuation_pattern().replace_all(&without_year, "");
    without_punctuation.trim().to_string()
}

// ============================================================================
// Parsing
// ============================================================================

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Splits non-blank lines into exactly `expected` fields
fn records<'a>(
    file: &'a str,
    text: &'a str,
    expected: usize,
) -> impl Iterator<Item = AppResult<(usize, Vec<&'a str>)>> + 'a {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
        .map(move |(line_no, line)| {
            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            if fields.len() != expected {
                return Err(AppError::DataUnavailable(format!(
                    "{} line {}: expected {} fields, found {}",
                    file,
                    line_no,
                    expected,
                    fields.len()
                )));
            }
            Ok((line_no, fields))
        })
}

fn field<T: std::str::FromStr>(file: &str, line_no: usize, name: &str, raw: &str) -> AppResult<T> {
    raw.trim().parse().map_err(|_| {
        AppError::DataUnavailable(format!(
            "{} line {}: invalid {} {:?}",
            file, line_no, name, raw
        ))
    })
}

pub fn parse_ratings(text: &str) -> AppResult<Vec<RatingRecord>> {
    records(RATINGS_FILE, text, 4)
        .map(|record| -> AppResult<RatingRecord> {
            let (line, f) = record?;
            Ok(RatingRecord {
                user_id: field(RATINGS_FILE, line, "UserID", f[0])?,
                movie_id: field(RATINGS_FILE, line, "MovieID", f[1])?,
                rating: field(RATINGS_FILE, line, "Rating", f[2])?,
                timestamp: field(RATINGS_FILE, line, "Timestamp", f[3])?,
            })
        })
        .collect()
}

pub fn parse_movies(text: &str) -> AppResult<Vec<MovieRecord>> {
    records(MOVIES_FILE, text, 3)
        .map(|record| -> AppResult<MovieRecord> {
            let (line, f) = record?;
            Ok(MovieRecord {
                movie_id: field(MOVIES_FILE, line, "MovieID", f[0])?,
                title: normalize_title(f[1]),
                genres: f[2].trim().to_string(),
            })
        })
        .collect()
}

pub fn parse_users(text: &str) -> AppResult<Vec<UserRecord>> {
    records(USERS_FILE, text, 5)
        .map(|record| -> AppResult<UserRecord> {
            let (line, f) = record?;
            Ok(UserRecord {
                user_id: field(USERS_FILE, line, "UserID", f[0])?,
                gender: f[1].trim().to_string(),
                age: field(USERS_FILE, line, "Age", f[2])?,
                occupation: field(USERS_FILE, line, "Occupation", f[3])?,
                zip_code: f[4].trim().to_string(),
            })
        })
        .collect()
}

// ============================================================================
// Join
// ============================================================================

/// Inner-joins ratings with users and movies, then drops exact duplicate rows
///
/// Ratings referencing an unknown user or movie are dropped silently. Row
/// order follows the ratings table; the first of any duplicate rows wins.
pub fn join_tables(tables: &RawTables) -> JoinedDataset {
    let users: HashMap<UserId, &UserRecord> =
        tables.users.iter().map(|u| (u.user_id, u)).collect();
    let movies: HashMap<MovieId, &MovieRecord> =
        tables.movies.iter().map(|m| (m.movie_id, m)).collect();

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(tables.ratings.len());
    let mut unmatched = 0usize;
    let mut duplicates = 0usize;

    for rating in &tables.ratings {
        let (Some(user), Some(movie)) = (users.get(&rating.user_id), movies.get(&rating.movie_id))
        else {
            unmatched += 1;
            continue;
        };

        let row = JoinedRow {
            user_id: rating.user_id,
            movie_id: rating.movie_id,
            rating: rating.rating,
            timestamp: rating.timestamp,
            gender: user.gender.clone(),
            age: user.age,
            occupation: user.occupation,
            zip_code: user.zip_code.clone(),
            title: movie.title.clone(),
            genres: movie.genres.clone(),
        };

        if seen.insert(row.clone()) {
            rows.push(row);
        } else {
            duplicates += 1;
        }
    }

    let dataset = JoinedDataset::new(rows);

    tracing::info!(
        rows = dataset.len(),
        unmatched,
        duplicates,
        genres = dataset.genres().len(),
        "Joined dataset built"
    );

    dataset
}
