use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::ScoutError;
use crate::history::HistoryStore;
use crate::models::{ListingRef, NewObservation};
use crate::reconcile::{reconcile, DateWindow};
use crate::scrapers::{self, Driver, RetryPolicy};

/// Where a listing is in its scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingState {
    PageLoading,
    Extracting,
    Reconciled,
    Persisted,
    Skipped,
}

impl fmt::Display for ListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListingState::PageLoading => "page loading",
            ListingState::Extracting => "extracting",
            ListingState::Reconciled => "reconciled",
            ListingState::Persisted => "persisted",
            ListingState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Result of scraping one listing
#[derive(Debug, Clone, PartialEq)]
pub enum ListingOutcome {
    Persisted { added: usize, ignored: usize },
    Skipped { reason: String },
}

/// Totals of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub persisted: usize,
    pub skipped: usize,
    pub added: usize,
    pub ignored: usize,
    pub interrupted: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listings scraped, {} skipped; {} records added, {} ignored as already recorded",
            self.persisted, self.skipped, self.added, self.ignored
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

/// Settings the orchestrator needs from the run configuration
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Rental dates that get recorded
    pub range: DateWindow,
    pub output: PathBuf,
    pub retry: RetryPolicy,
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Scrapes listings one after another into the history store, flushing it
/// after every listing.
pub struct Orchestrator<D: Driver> {
    driver: D,
    store: HistoryStore,
    settings: ScrapeSettings,
    interrupted: Arc<AtomicBool>,
    today: Clock,
}

impl<D: Driver> Orchestrator<D> {
    pub fn new(driver: D, store: HistoryStore, settings: ScrapeSettings) -> Self {
        Self {
            driver,
            store,
            settings,
            interrupted: Arc::new(AtomicBool::new(false)),
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Flag that, once set, stops the run before the next listing
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Source of the scrape date stamped on observations
    #[cfg(test)]
    pub fn with_clock(
        mut self,
        today: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        self.today = Box::new(today);
        self
    }

    #[cfg(test)]
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    #[cfg(test)]
    pub fn into_store(self) -> HistoryStore {
        self.store
    }

    /// Scrape every listing in order, then release the driver and flush.
    ///
    /// Per-listing failures only skip that listing. Anything else stops the
    /// loop, but what was scraped so far is still written out.
    pub async fn run(&mut self, listings: &[ListingRef]) -> Result<RunSummary, ScoutError> {
        let mut summary = RunSummary::default();

        for listing in listings {
            if self.interrupted.load(Ordering::SeqCst) {
                warn!("Interrupted, not starting {}", listing.url());
                summary.interrupted = true;
                break;
            }

            match self.scrape_listing(listing).await {
                Ok(ListingOutcome::Persisted { added, ignored }) => {
                    summary.persisted += 1;
                    summary.added += added;
                    summary.ignored += ignored;
                }
                Ok(ListingOutcome::Skipped { reason }) => {
                    debug!("{} left out of this run: {}", listing.code, reason);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("An unexpected error occurred on {}: {}", listing.url(), e);
                    break;
                }
            }
        }

        if let Err(e) = self.driver.quit().await {
            warn!("Failed to close the browser: {:#}", e);
        }
        self.store.flush(&self.settings.output)?;
        info!("Dataset holds {} observations", self.store.size());

        Ok(summary)
    }

    async fn scrape_listing(&mut self, listing: &ListingRef) -> Result<ListingOutcome, ScoutError> {
        let url = listing.url();
        info!("Scraping {}...", url);

        self.transition(listing, ListingState::PageLoading);
        if let Err(e) = self.driver.navigate(&url).await {
            return Ok(self.skip(listing, format!("page failed to load: {:#}", e)));
        }

        self.transition(listing, ListingState::Extracting);
        let raw = match scrapers::extract_with_retry(
            listing.source,
            &self.driver,
            self.settings.retry,
            &listing.code,
        )
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                let reason = ScoutError::Extraction {
                    listing: listing.code.clone(),
                    reason: e.to_string(),
                };
                return Ok(self.skip(listing, reason.to_string()));
            }
        };

        let reconciled = reconcile(&raw.availability, raw.pricing.as_ref());
        if reconciled.pricing_missing {
            warn!("{}: nightly rates are null, rents left empty", url);
        }
        debug!("{} dates reconciled", reconciled.records.len());
        self.transition(listing, ListingState::Reconciled);

        let scrape_date = (self.today)();
        let (mut added, mut ignored) = (0, 0);
        for date in self.settings.range.days() {
            let Some(record) = reconciled.get(&date) else {
                continue;
            };
            let was_added = self.store.append(NewObservation {
                source: listing.source,
                listing_id: listing.code.clone(),
                scrape_date,
                snapshot: raw.snapshot.clone(),
                record: record.clone(),
            });
            if was_added {
                added += 1;
            } else {
                ignored += 1;
            }
        }

        if let Some(name) = &raw.snapshot.name {
            info!("  Name: {}", name);
        }
        info!("  {} records added, {} ignored because they were already recorded", added, ignored);

        self.store.flush(&self.settings.output)?;
        self.transition(listing, ListingState::Persisted);

        Ok(ListingOutcome::Persisted { added, ignored })
    }

    fn skip(&self, listing: &ListingRef, reason: String) -> ListingOutcome {
        error!("Skipping {} {}: {}", listing.source, listing.code, reason);
        self.transition(listing, ListingState::Skipped);
        ListingOutcome::Skipped { reason }
    }

    fn transition(&self, listing: &ListingRef, state: ListingState) {
        debug!("{} {} -> {}", listing.source, listing.code, state);
    }
}
