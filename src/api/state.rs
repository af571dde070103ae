use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    cache::{ModelCache, ReloadOutcome},
    config::Config,
    error::{AppError, AppResult},
    services::{
        export::{export_snapshots, ExportReport},
        DatFileSource, DatasetSource, RecommenderModel,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

/// Dataset source, model cache and request defaults
pub struct AppStateInner {
    pub source: Arc<dyn DatasetSource>,
    pub cache: ModelCache,
    pub config: Config,
}

impl AppState {
    /// Creates state around an arbitrary dataset source
    pub fn new(source: Arc<dyn DatasetSource>, config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                source,
                cache: ModelCache::new(),
                config,
            }),
        }
    }

    /// Creates state reading `.dat` files from the configured data directory
    pub fn from_config(config: Config) -> Self {
        let source = Arc::new(DatFileSource::new(&config.data_dir));
        Self::new(source, config)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The current model, built on first use
    pub async fn model(&self) -> AppResult<Arc<RecommenderModel>> {
        self.inner.cache.current(self.inner.source.as_ref()).await
    }

    pub async fn reload(&self) -> AppResult<(Arc<RecommenderModel>, ReloadOutcome)> {
        self.inner.cache.reload(self.inner.source.as_ref()).await
    }

    pub async fn invalidate(&self) {
        self.inner.cache.invalidate().await
    }

    /// Writes the CSV snapshots of the current model to the export directory
    pub async fn export(&self) -> AppResult<ExportReport> {
        let model = self.model().await?;
        let dir = PathBuf::from(&self.inner.config.export_dir);
        tokio::task::spawn_blocking(move || export_snapshots(&model, &dir))
            .await
            .map_err(|e| AppError::Internal(format!("Export task failed: {}", e)))?
    }

    /// Builds the model ahead of the first request and exports it if configured
    pub async fn warm_up(&self) -> AppResult<()> {
        let model = self.model().await?;
        tracing::info!(
            users = model.ratings.rows(),
            movies = model.ratings.cols(),
            "Model ready"
        );

        if self.inner.config.export_on_load {
            self.export().await?;
        }

        Ok(())
    }
}
