//! Fetch one remote record, normalize it, persist it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::{
    catalog::Catalog,
    entities::upstream_miss::RecordKind,
    error::{AppError, AppResult},
    normalize::{normalize_movie, normalize_person},
    tmdb::MetadataProvider,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Stored { local_id: i32 },
    Updated { local_id: i32 },
    Unchanged,
    Missing,
    /// The provider answered with a payload the catalog cannot represent.
    Rejected,
}

/// The result of processing one id. Failures are carried, never raised.
#[derive(Debug)]
pub struct Settled {
    pub id: i64,
    pub result: AppResult<Outcome>,
}

#[async_trait]
pub trait Worker: Send + Sync {
    async fn process(&self, id: i64) -> Settled;
}

pub struct MovieWorker {
    provider: Arc<dyn MetadataProvider>,
    catalog: Catalog,
}

impl MovieWorker {
    pub fn new(provider: Arc<dyn MetadataProvider>, catalog: Catalog) -> Self {
        Self { provider, catalog }
    }

    async fn run(&self, id: i64) -> AppResult<Outcome> {
        let Some(resp) = self.provider.movie(id).await? else {
            debug!(id = id, "movie not found upstream");
            self.catalog.record_miss(RecordKind::Movie, id).await?;
            return Ok(Outcome::Missing);
        };

        let normalized = match normalize_movie(resp) {
            Ok(normalized) => normalized,
            Err(AppError::Payload(reason)) => {
                error!(id = id, reason = %reason, "rejecting movie payload");
                return Ok(Outcome::Rejected);
            },
            Err(err) => return Err(err),
        };
        let local_id = self.catalog.store_movie(&normalized).await?;
        Ok(Outcome::Stored { local_id })
    }
}

#[async_trait]
impl Worker for MovieWorker {
    async fn process(&self, id: i64) -> Settled {
        let result = self.run(id).await;
        if let Err(err) = &result {
            warn!(id = id, error = %err, "failed to sync movie");
        }
        Settled { id, result }
    }
}

pub struct PersonWorker {
    provider: Arc<dyn MetadataProvider>,
    catalog: Catalog,
}

impl PersonWorker {
    pub fn new(provider: Arc<dyn MetadataProvider>, catalog: Catalog) -> Self {
        Self { provider, catalog }
    }

    async fn run(&self, id: i64) -> AppResult<Outcome> {
        // Persons only enter the catalog through movie credits.
        let Some(existing) = self.catalog.person_by_remote_id(id).await? else {
            debug!(id = id, "person not in catalog, skipping");
            return Ok(Outcome::Unchanged);
        };

        if existing.is_fully_loaded() {
            return Ok(Outcome::Unchanged);
        }

        let Some(resp) = self.provider.person(id).await? else {
            debug!(id = id, "person not found upstream");
            self.catalog.record_miss(RecordKind::Person, id).await?;
            return Ok(Outcome::Missing);
        };

        let record = normalize_person(resp);
        let updated = self.catalog.update_person(existing.id, &record).await?;
        Ok(Outcome::Updated { local_id: updated.id })
    }
}

#[async_trait]
impl Worker for PersonWorker {
    async fn process(&self, id: i64) -> Settled {
        let result = self.run(id).await;
        if let Err(err) = &result {
            warn!(id = id, error = %err, "failed to sync person");
        }
        Settled { id, result }
    }
}
