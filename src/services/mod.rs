pub mod export;
pub mod loader;
pub mod matrices;
pub mod pipeline;
pub mod recommendations;
pub mod similar_movies;
pub mod similarity;

#[cfg(test)]
pub(crate) mod fixtures;

pub use loader::{DatFileSource, DatasetSource};
pub use pipeline::RecommenderModel;
pub use recommendations::RecommendationParams;
