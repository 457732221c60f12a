//! Throttled write-back of computed ratings
//!
//! Updates are sequential with a fixed delay between calls so the catalog
//! server is not flooded. A failed update is logged and counted; the batch
//! always runs to the end.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use sck_common::models::Artifact;
use sck_common::{Catalog, RatingTarget, Scene};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::Rated;

/// Default pause between two updates
pub const DEFAULT_WRITE_DELAY_MS: u64 = 200;

/// Counts for one write-back batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteBackSummary {
    pub updated: usize,
    pub failed: usize,
    /// Entities with no writable rating field (tags)
    pub skipped: usize,
}

impl WriteBackSummary {
    pub fn merge(&mut self, other: WriteBackSummary) {
        self.updated += other.updated;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Enforces a minimum interval between consecutive updates
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Pushes rated entities back to the catalog
pub struct RatingWriter<'a> {
    catalog: &'a dyn Catalog,
    rate_limiter: RateLimiter,
    show_progress: bool,
}

impl<'a> RatingWriter<'a> {
    pub fn new(catalog: &'a dyn Catalog, delay_ms: u64) -> Self {
        Self {
            catalog,
            rate_limiter: RateLimiter::new(delay_ms),
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while writing
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Write ratings for performers or studios
    ///
    /// Tags are counted as skipped: the catalog has no rating field for them.
    pub async fn write_artifacts<A: Artifact>(&self, rated: &[Rated<A>]) -> WriteBackSummary {
        let Some(target) = RatingTarget::for_artifact(A::KIND) else {
            warn!(
                count = rated.len(),
                "{}s have no rating field, skipping write-back",
                A::KIND.label()
            );
            return WriteBackSummary {
                skipped: rated.len(),
                ..WriteBackSummary::default()
            };
        };

        let items: Vec<(&str, &str, u8)> = rated
            .iter()
            .map(|r| (r.base.id(), r.base.name(), r.score()))
            .collect();
        self.write(target, &items).await
    }

    pub async fn write_scenes(&self, rated: &[Rated<Scene>]) -> WriteBackSummary {
        let titles: Vec<String> = rated.iter().map(|r| r.base.display_title()).collect();
        let items: Vec<(&str, &str, u8)> = rated
            .iter()
            .zip(titles.iter())
            .map(|(r, title)| (r.base.id.as_str(), title.as_str(), r.score()))
            .collect();
        self.write(RatingTarget::Scene, &items).await
    }

    async fn write(&self, target: RatingTarget, items: &[(&str, &str, u8)]) -> WriteBackSummary {
        let progress = self.progress_bar(target, items.len());
        let mut summary = WriteBackSummary::default();

        for (id, name, score) in items {
            self.rate_limiter.wait().await;

            match self.catalog.update_rating(target, id, *score).await {
                Ok(()) => {
                    debug!(target = target.label(), id = %id, score = score, "Rating written");
                    summary.updated += 1;
                }
                Err(e) => {
                    error!(
                        target = target.label(),
                        id = %id,
                        name = %name,
                        "Failed to write rating: {}",
                        e
                    );
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            target = target.label(),
            updated = summary.updated,
            failed = summary.failed,
            "Write-back complete"
        );
        summary
    }

    fn progress_bar(&self, target: RatingTarget, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_message(format!("Updating {} ratings", target.label()));
        bar
    }
}
