//! Batch driver for the catalog mirror.
//!
//! Ids are cut into fixed-size windows. Windows run one after the other; the
//! ids inside a window are processed concurrently, bounded by the window
//! size. Ids that fail with a retryable error get exactly one more attempt
//! once the whole window has settled. A second failure aborts the run.

use std::{collections::HashSet, ops::RangeInclusive, sync::Arc};

use futures::{StreamExt, stream};
use jiff::{Span, Zoned};
use tracing::{debug, error, info};

use crate::{
    catalog::Catalog,
    config::SyncSettings,
    error::{AppError, AppResult},
    models::SyncReport,
    normalize::lookups,
    tmdb::{ChangeWindow, GenreKind, MetadataProvider},
    worker::{MovieWorker, Outcome, PersonWorker, Settled, Worker},
};

pub struct CatalogSync {
    catalog: Catalog,
    provider: Arc<dyn MetadataProvider>,
    settings: SyncSettings,
}

impl CatalogSync {
    pub fn new(catalog: Catalog, provider: Arc<dyn MetadataProvider>, settings: SyncSettings) -> Self {
        Self { catalog, provider, settings }
    }

    /// Mirrors every movie id above the highest one already stored, up to
    /// the provider's latest id.
    pub async fn sync_movie_catalog(&self) -> AppResult<SyncReport> {
        let latest = self.provider.latest_movie_id().await?;
        let last_stored = self.catalog.last_movie_remote_id().await?;

        if latest <= last_stored {
            info!(latest = latest, last_stored = last_stored, "movie catalog is up to date");
            return Ok(SyncReport::default());
        }

        info!(from = last_stored + 1, to = latest, "syncing movie range");

        let worker = MovieWorker::new(self.provider.clone(), self.catalog.clone());
        let windows = range_windows(last_stored + 1, latest, self.settings.window_size)
            .map(|range| range.collect::<Vec<_>>());

        self.drive(&worker, windows).await
    }

    /// Loads full detail for persons. Without an explicit list the provider's
    /// change feed is used.
    pub async fn sync_person_batch(&self, ids: Option<Vec<i64>>) -> AppResult<SyncReport> {
        let ids = match ids {
            Some(ids) => ids,
            None => self.changed_person_ids().await?,
        };

        info!(
            total = ids.len(),
            offset = self.settings.person_start_offset,
            "syncing person batch"
        );

        let worker = PersonWorker::new(self.provider.clone(), self.catalog.clone());
        let windows = list_windows(&ids, self.settings.person_start_offset, self.settings.window_size)
            .map(<[i64]>::to_vec);

        self.drive(&worker, windows).await
    }

    /// Person batch over every person only known from credit listings.
    pub async fn sync_unloaded_persons(&self) -> AppResult<SyncReport> {
        let ids = self.catalog.unloaded_person_ids().await?;
        self.sync_person_batch(Some(ids)).await
    }

    /// Stores the movie and tv genre lists as tags. Returns how many distinct
    /// genres the provider published.
    pub async fn sync_genres(&self) -> AppResult<usize> {
        let (mut entries, tv) = futures::try_join!(
            self.provider.genres(GenreKind::Movie),
            self.provider.genres(GenreKind::Tv),
        )?;
        entries.extend(tv);

        let mut seen = HashSet::new();
        entries.retain(|e| seen.insert(e.id));

        let ids = self.catalog.store_tags(&lookups(&entries)).await?;
        info!(genres = ids.len(), "genres synced");
        Ok(ids.len())
    }

    async fn changed_person_ids(&self) -> AppResult<Vec<i64>> {
        let window = match self.settings.person_changes_days {
            Some(days) => {
                let today = Zoned::now().date();
                let start = Span::new()
                    .try_days(days)
                    .and_then(|span| today.checked_sub(span))
                    .map_err(|e| AppError::Validation(format!("PERSON_CHANGES_DAYS: {e}")))?;
                ChangeWindow { start_date: Some(start), end_date: Some(today) }
            },
            None => ChangeWindow::default(),
        };

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut page = 1;
        loop {
            let changes = self.provider.person_changes(window, page).await?;
            for entry in changes.results {
                if seen.insert(entry.id) {
                    ids.push(entry.id);
                }
            }
            debug!(page = page, total_pages = changes.total_pages, ids = ids.len(), "change feed page");

            if page >= changes.total_pages {
                break;
            }
            page += 1;
        }

        Ok(ids)
    }

    async fn drive(
        &self,
        worker: &dyn Worker,
        windows: impl IntoIterator<Item = Vec<i64>>,
    ) -> AppResult<SyncReport> {
        let mut report = SyncReport::default();

        for ids in windows {
            if ids.is_empty() {
                continue;
            }

            if let Err(err) = self.run_window(worker, &ids, &mut report).await {
                error!(error = %err, windows = report.windows, "sync aborted");
                return Err(err);
            }

            report.windows += 1;
            report.last_id = ids.last().copied();
        }

        info!(
            windows = report.windows,
            stored = report.stored,
            updated = report.updated,
            unchanged = report.unchanged,
            missing = report.missing.len(),
            rejected = report.rejected.len(),
            retried = report.retried.len(),
            "sync finished"
        );
        Ok(report)
    }

    async fn run_window(
        &self,
        worker: &dyn Worker,
        ids: &[i64],
        report: &mut SyncReport,
    ) -> AppResult<()> {
        debug!(first = ids[0], size = ids.len(), "processing window");

        let mut failed = Vec::new();
        for settled in settle_all(worker, ids.to_vec(), self.settings.window_size).await {
            match settled.result {
                Ok(outcome) => tally(report, settled.id, outcome),
                Err(err) if err.is_retryable() => failed.push(settled.id),
                Err(err) => {
                    return Err(AppError::BatchAborted { id: settled.id, source: Box::new(err) });
                },
            }
        }

        if failed.is_empty() {
            return Ok(());
        }

        debug!(ids = ?failed, "retrying failed ids");
        report.retried.extend(&failed);

        for settled in settle_all(worker, failed, self.settings.window_size).await {
            match settled.result {
                Ok(outcome) => tally(report, settled.id, outcome),
                Err(err) => {
                    return Err(AppError::BatchAborted { id: settled.id, source: Box::new(err) });
                },
            }
        }

        Ok(())
    }
}

/// Runs the worker over every id with at most `concurrency` in flight and
/// waits for all of them. Results come back in id order.
async fn settle_all(worker: &dyn Worker, ids: Vec<i64>, concurrency: usize) -> Vec<Settled> {
    let mut settled: Vec<Settled> = stream::iter(ids)
        .map(|id| worker.process(id))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    settled.sort_by_key(|s| s.id);
    settled
}

fn tally(report: &mut SyncReport, id: i64, outcome: Outcome) {
    match outcome {
        Outcome::Stored { .. } => report.stored += 1,
        Outcome::Updated { .. } => report.updated += 1,
        Outcome::Unchanged => report.unchanged += 1,
        Outcome::Missing => report.missing.push(id),
        Outcome::Rejected => report.rejected.push(id),
    }
}

/// Splits `start..=end` into consecutive windows of `size` ids. The last
/// window is shorter when the range does not divide evenly.
pub fn range_windows(start: i64, end: i64, size: usize) -> impl Iterator<Item = RangeInclusive<i64>> {
    let size = size.max(1) as i64;
    let mut next = start;
    std::iter::from_fn(move || {
        if next > end {
            return None;
        }
        let last = next.saturating_add(size - 1).min(end);
        let window = next..=last;
        next = last + 1;
        Some(window)
    })
}

/// Windows over an explicit id list, skipping the first `offset` entries.
pub fn list_windows(ids: &[i64], offset: usize, size: usize) -> impl Iterator<Item = &[i64]> {
    ids.get(offset..).unwrap_or_default().chunks(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_window_shrinks() {
        let windows: Vec<_> = range_windows(1, 10, 4).collect();
        assert_eq!(windows, vec![1..=4, 5..=8, 9..=10]);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let windows: Vec<_> = range_windows(5, 12, 4).collect();
        assert_eq!(windows, vec![5..=8, 9..=12]);
    }

    #[test]
    fn empty_range_yields_nothing() {
        assert_eq!(range_windows(11, 10, 4).count(), 0);
        assert_eq!(range_windows(7, 7, 4).collect::<Vec<_>>(), vec![7..=7]);
    }

    #[test]
    fn list_windows_respect_offset() {
        let ids = [10, 20, 30, 40, 50, 60, 70];
        let windows: Vec<_> = list_windows(&ids, 2, 3).collect();
        assert_eq!(windows, vec![&[30, 40, 50][..], &[60, 70][..]]);
    }

    #[test]
    fn offset_past_the_end_is_empty() {
        let ids = [1, 2, 3];
        assert_eq!(list_windows(&ids, 3, 2).count(), 0);
        assert_eq!(list_windows(&ids, 9, 2).count(), 0);
    }

    #[test]
    fn tally_counts_outcomes() {
        let mut report = SyncReport::default();
        tally(&mut report, 1, Outcome::Stored { local_id: 1 });
        tally(&mut report, 2, Outcome::Missing);
        tally(&mut report, 3, Outcome::Unchanged);
        tally(&mut report, 4, Outcome::Updated { local_id: 9 });
        tally(&mut report, 5, Outcome::Rejected);
        assert_eq!((report.stored, report.updated, report.unchanged), (1, 1, 1));
        assert_eq!(report.missing, vec![2]);
        assert_eq!(report.rejected, vec![5]);
    }
}
