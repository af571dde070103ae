use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    services::{
        loader::{DatasetFingerprint, DatasetSource, RawTables},
        pipeline::RecommenderModel,
    },
};

/// Whether a reload reused the cached model or built a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Unchanged,
    Rebuilt,
}

/// Memoizes the recommender model keyed by dataset fingerprint
///
/// Holds at most one model. All derived matrices live inside it, so
/// invalidation drops them together.
#[derive(Default)]
pub struct ModelCache {
    model: RwLock<Option<Arc<RecommenderModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint of the cached model, if any
    pub async fn fingerprint(&self) -> Option<DatasetFingerprint> {
        self.model.read().await.as_ref().map(|m| m.fingerprint.clone())
    }

    /// Returns the cached model, loading and building it on first use
    pub async fn current(&self, source: &dyn DatasetSource) -> AppResult<Arc<RecommenderModel>> {
        if let Some(model) = self.model.read().await.as_ref() {
            tracing::debug!(fingerprint = %model.fingerprint, "Model cache hit");
            return Ok(model.clone());
        }

        let mut slot = self.model.write().await;
        // another request may have built it while we waited for the lock
        if let Some(model) = slot.as_ref() {
            return Ok(model.clone());
        }

        tracing::info!(source = source.name(), "Model cache miss, building");
        let model = build(source.fetch().await?).await?;
        *slot = Some(model.clone());
        Ok(model)
    }

    /// Re-reads the source and rebuilds only when its fingerprint changed
    pub async fn reload(
        &self,
        source: &dyn DatasetSource,
    ) -> AppResult<(Arc<RecommenderModel>, ReloadOutcome)> {
        let mut slot = self.model.write().await;
        let tables = source.fetch().await?;

        if let Some(model) = slot.as_ref() {
            if model.fingerprint == tables.fingerprint {
                tracing::info!(fingerprint = %model.fingerprint, "Dataset unchanged, keeping cached model");
                return Ok((model.clone(), ReloadOutcome::Unchanged));
            }
        }

        let model = build(tables).await?;
        *slot = Some(model.clone());
        Ok((model, ReloadOutcome::Rebuilt))
    }

    /// Drops the cached model and every matrix derived with it
    pub async fn invalidate(&self) {
        if let Some(model) = self.model.write().await.take() {
            tracing::info!(fingerprint = %model.fingerprint, "Model cache invalidated");
        }
    }
}

/// Builds the model on the blocking pool; the similarity step is CPU bound
async fn build(tables: RawTables) -> AppResult<Arc<RecommenderModel>> {
    tokio::task::spawn_blocking(move || Arc::new(RecommenderModel::build(&tables)))
        .await
        .map_err(|e| AppError::Internal(format!("Model build task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{fixtures, loader::MockDatasetSource};

    fn source_expecting(fetches: usize) -> MockDatasetSource {
        let mut source = MockDatasetSource::new();
        source
            .expect_fetch()
            .times(fetches)
            .returning(|| Ok(fixtures::raw_tables()));
        source.expect_name().return_const("mock");
        source
    }

    #[tokio::test]
    async fn test_current_builds_once() {
        let cache = ModelCache::new();
        let source = source_expecting(1);

        let first = cache.current(&source).await.unwrap();
        let second = cache.current(&source).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.fingerprint().await, Some(first.fingerprint.clone()));
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let cache = ModelCache::new();
        let source = source_expecting(2);

        let first = cache.current(&source).await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.fingerprint().await, None);

        let second = cache.current(&source).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_reload_same_fingerprint_keeps_model() {
        let cache = ModelCache::new();
        let source = source_expecting(2);

        let first = cache.current(&source).await.unwrap();
        let (second, outcome) = cache.reload(&source).await.unwrap();

        assert_eq!(outcome, ReloadOutcome::Unchanged);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_reload_changed_dataset_rebuilds() {
        let cache = ModelCache::new();
        let mut source = MockDatasetSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(fixtures::raw_tables()));
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(fixtures::four_movie_tables()));
        source.expect_name().return_const("mock");

        let first = cache.current(&source).await.unwrap();
        let (second, outcome) = cache.reload(&source).await.unwrap();

        assert_eq!(outcome, ReloadOutcome::Rebuilt);
        assert_ne!(first.fingerprint, second.fingerprint);
        assert_eq!(cache.fingerprint().await, Some(second.fingerprint.clone()));
    }

    #[tokio::test]
    async fn test_failed_load_leaves_cache_empty() {
        let cache = ModelCache::new();
        let mut source = MockDatasetSource::new();
        source
            .expect_fetch()
            .returning(|| Err(AppError::DataUnavailable("ratings.dat missing".to_string())));
        source.expect_name().return_const("mock");

        let err = cache.current(&source).await.unwrap_err();
        assert!(matches!(err, AppError::DataUnavailable(_)));
        assert_eq!(cache.fingerprint().await, None);
    }
}
