//! Crawler coordinator - resolution of seeds and catalog runs
//!
//! This module contains the logic that turns one seed URL into rows:
//! - Fetching with bounded retries
//! - Classifying the document as a lot or a dataset
//! - Extracting lots and handing their rows to the writer
//! - Recursively resolving dataset links without revisiting URLs
//!
//! and the catalog driver that runs every seed and records its outcome.

use crate::config::{Config, CrawlerConfig, DedupScope, RunContext};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::visited::{Admission, VisitedSet};
use crate::document::{
    self, decode_document, extract_links, extract_lots, parse_catalog, AttributeVocabulary,
    CatalogEntry, DocumentKind, LotRecord,
};
use crate::output::{
    build_rows, spawn_writer, RecordSink, RunStats, SinkWriter, StatsRecorder, StatusRow,
};
use crate::state::{Outcome, Resource, ResourceState};
use crate::url::{visit_key, with_default_scheme};
use crate::{CrawlError, DocumentError};
use indicatif::ProgressBar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Boxed future of a recursive resolution
type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Resolution, CrawlError>> + Send + 'a>>;

/// What resolving a resource produced, including everything below it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Lots extracted and turned into rows
    pub lots: usize,
    /// Lots dropped for a missing mandatory field
    pub lots_skipped: usize,
    /// Rows handed to the writer
    pub rows: usize,
    /// Dataset links that were resolved (successfully or not)
    pub links_followed: usize,
    /// Dataset links whose resolution failed
    pub links_failed: usize,
}

impl Resolution {
    fn absorb(&mut self, other: Resolution) {
        self.lots += other.lots;
        self.lots_skipped += other.lots_skipped;
        self.rows += other.rows;
        self.links_followed += other.links_followed;
        self.links_failed += other.links_failed;
    }
}

/// A classified document, detached from the parsed tree
enum Interpretation {
    Lots(Vec<Result<LotRecord, DocumentError>>),
    Dataset(Vec<String>),
}

/// Parses and classifies fetched text
///
/// Runs synchronously so that no parsed tree is held across an await point.
fn interpret(text: &str, vocabulary: &AttributeVocabulary) -> Result<Interpretation, DocumentError> {
    let parsed = document::parse_document(text)?;
    match document::classify(&parsed) {
        DocumentKind::Lot => Ok(Interpretation::Lots(extract_lots(&parsed, vocabulary))),
        DocumentKind::Dataset => Ok(Interpretation::Dataset(extract_links(&parsed))),
        DocumentKind::Unknown => Err(DocumentError::UnrecognizedSchema),
    }
}

/// Tracks one resource through the resolution state machine
struct Lifecycle<'a> {
    url: &'a str,
    state: ResourceState,
}

impl<'a> Lifecycle<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            state: ResourceState::Pending,
        }
    }

    fn advance(&mut self, next: ResourceState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Deduplication state shared by everything below one seed
#[derive(Debug, Clone)]
struct SeedScope {
    visited: Option<VisitedSet>,
}

struct Inner {
    fetcher: Fetcher,
    vocabulary: AttributeVocabulary,
    settings: CrawlerConfig,
    fetch_slots: Semaphore,
    writer: SinkWriter,
    stats: StatsRecorder,
}

/// Resolves seed URLs into rows
///
/// Cheap to clone; clones share the fetcher, the fetch concurrency limit,
/// the writer and the statistics.
#[derive(Clone)]
pub struct Crawler {
    inner: Arc<Inner>,
}

impl Crawler {
    /// Creates a crawler from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Fetcher, crawler and vocabulary settings
    /// * `writer` - Destination of extracted rows
    /// * `stats` - Counters updated while resolving
    pub fn new(config: &Config, writer: SinkWriter, stats: StatsRecorder) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(&config.fetcher, &config.user_agent)?;
        Ok(Self::with_fetcher(fetcher, config, writer, stats))
    }

    /// Creates a crawler around an existing fetcher
    pub fn with_fetcher(
        fetcher: Fetcher,
        config: &Config,
        writer: SinkWriter,
        stats: StatsRecorder,
    ) -> Self {
        let slots = config.crawler.max_concurrent_fetches.max(1) as usize;
        Self {
            inner: Arc::new(Inner {
                fetcher,
                vocabulary: config.vocabulary.clone(),
                settings: config.crawler.clone(),
                fetch_slots: Semaphore::new(slots),
                writer,
                stats,
            }),
        }
    }

    /// Resolves a seed and everything reachable from it
    ///
    /// Never fails: the seed's own failure is mapped to its [`Outcome`], and
    /// failures of nested links are logged and counted without affecting it.
    pub async fn resolve_seed(&self, seed_url: &str) -> Outcome {
        match self.resolve_seed_detailed(seed_url).await {
            Ok(resolution) => {
                tracing::info!(
                    "Resolved {}: {} lots, {} rows, {} nested links ({} failed)",
                    seed_url,
                    resolution.lots,
                    resolution.rows,
                    resolution.links_followed,
                    resolution.links_failed
                );
                Outcome::Success
            }
            Err(error) => {
                let outcome = Outcome::from_error(&error);
                match outcome {
                    Outcome::Unrecognized => {
                        tracing::warn!("Unrecognized document at {}", seed_url)
                    }
                    _ => tracing::error!(
                        kind = error.kind(),
                        "Error processing {}: {}",
                        seed_url,
                        error
                    ),
                }
                outcome
            }
        }
    }

    /// Resolves a seed, returning the aggregated resolution or the seed's error
    pub async fn resolve_seed_detailed(&self, seed_url: &str) -> Result<Resolution, CrawlError> {
        let scope = match self.inner.settings.dedup_scope {
            DedupScope::Parent => SeedScope { visited: None },
            DedupScope::Seed => {
                let visited = VisitedSet::new(self.inner.settings.max_visited_urls);
                visited.admit(seed_url);
                SeedScope {
                    visited: Some(visited),
                }
            }
        };

        self.resolve(Resource::seed(seed_url), scope).await
    }

    fn resolve(&self, resource: Resource, scope: SeedScope) -> ResolveFuture<'_> {
        Box::pin(async move { self.resolve_resource(resource, scope).await })
    }

    async fn resolve_resource(
        &self,
        resource: Resource,
        scope: SeedScope,
    ) -> Result<Resolution, CrawlError> {
        let mut lifecycle = Lifecycle::new(&resource.url);

        lifecycle.advance(ResourceState::Fetching)?;
        let fetched = {
            // The semaphore is never closed, so a failed acquire cannot happen
            let _permit = self.inner.fetch_slots.acquire().await.ok();
            self.inner.fetcher.fetch(&resource.url).await
        };
        let raw = match fetched {
            Ok(raw) => raw,
            Err(error) => {
                lifecycle.advance(ResourceState::FetchFailed)?;
                return Err(error.into());
            }
        };
        lifecycle.advance(ResourceState::Fetched)?;

        lifecycle.advance(ResourceState::Classifying)?;
        let interpretation = match interpret(&raw.text, &self.inner.vocabulary) {
            Ok(interpretation) => interpretation,
            Err(error) => {
                let next = match error {
                    DocumentError::UnrecognizedSchema => ResourceState::Unrecognized,
                    _ => ResourceState::ParseFailed,
                };
                lifecycle.advance(next)?;
                return Err(error.into());
            }
        };

        match interpretation {
            Interpretation::Lots(lots) => match self.store_lots(&resource, lots).await {
                Ok(resolution) => {
                    lifecycle.advance(ResourceState::LotResolved)?;
                    Ok(resolution)
                }
                Err(error) => {
                    lifecycle.advance(ResourceState::ParseFailed)?;
                    Err(error)
                }
            },
            Interpretation::Dataset(links) => {
                lifecycle.advance(ResourceState::DatasetExpanding)?;
                let resolution = self.expand_dataset(&resource, links, scope).await;
                lifecycle.advance(ResourceState::DatasetResolved)?;
                Ok(resolution)
            }
        }
    }

    /// Builds rows for every valid lot and appends them as one batch
    ///
    /// An invalid lot is skipped while a sibling is valid. When no lot of the
    /// document is valid, the first lot error fails the document.
    async fn store_lots(
        &self,
        resource: &Resource,
        lots: Vec<Result<LotRecord, DocumentError>>,
    ) -> Result<Resolution, CrawlError> {
        let mut resolution = Resolution::default();
        let mut rows = Vec::new();
        let mut first_error = None;

        for lot in lots {
            match lot {
                Ok(lot) => {
                    resolution.lots += 1;
                    rows.extend(build_rows(&lot));
                }
                Err(error) => {
                    resolution.lots_skipped += 1;
                    self.inner.stats.record_lot_skipped();
                    tracing::warn!("Skipping lot in {}: {}", resource.url, error);
                    first_error.get_or_insert(error);
                }
            }
        }

        if resolution.lots == 0 {
            if let Some(error) = first_error {
                return Err(error.into());
            }
        }

        resolution.rows = rows.len();
        if !rows.is_empty() {
            self.inner.writer.append_rows(rows).await?;
        }

        tracing::info!("Processed: {}", resource.url);
        Ok(resolution)
    }

    /// Resolves every admissible link of a dataset
    ///
    /// Child failures are logged and counted here; they never fail the
    /// dataset itself.
    async fn expand_dataset(
        &self,
        resource: &Resource,
        links: Vec<String>,
        scope: SeedScope,
    ) -> Resolution {
        let children: Vec<Resource> = links
            .iter()
            .filter_map(|link| self.admit(resource, link, &scope))
            .collect();

        tracing::debug!(
            "Dataset {} lists {} links, {} to resolve",
            resource.url,
            links.len(),
            children.len()
        );

        let mut resolution = Resolution::default();

        if self.inner.settings.max_concurrent_fetches <= 1 {
            for child in children {
                let result = self.resolve(child.clone(), scope.clone()).await;
                self.record_child(&mut resolution, &child, result);
            }
            return resolution;
        }

        let mut tasks = JoinSet::new();
        for child in children {
            let crawler = self.clone();
            let scope = scope.clone();
            tasks.spawn(async move {
                let result = crawler.resolve(child.clone(), scope).await;
                (child, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((child, result)) => self.record_child(&mut resolution, &child, result),
                Err(error) => {
                    resolution.links_followed += 1;
                    resolution.links_failed += 1;
                    self.inner.stats.record_link_failed();
                    tracing::error!("Link task failed in {}: {}", resource.url, error);
                }
            }
        }

        resolution
    }

    /// Decides whether a dataset link is resolved, returning its resource
    fn admit(&self, parent: &Resource, link: &str, scope: &SeedScope) -> Option<Resource> {
        let link = with_default_scheme(link);

        if parent.depth >= self.inner.settings.max_depth {
            tracing::warn!(
                "Not following {} from {}: nesting exceeds {}",
                link,
                parent.url,
                self.inner.settings.max_depth
            );
            return None;
        }

        match &scope.visited {
            None => {
                let key = visit_key(&link);
                let back_reference = key == visit_key(&parent.url)
                    || parent
                        .parent_url
                        .as_deref()
                        .is_some_and(|grandparent| key == visit_key(grandparent));
                if back_reference {
                    tracing::debug!("Skipping back-reference {} in {}", link, parent.url);
                    return None;
                }
            }
            Some(visited) => match visited.admit(&link) {
                Admission::Admitted => {}
                Admission::AlreadySeen => {
                    tracing::debug!("Skipping already visited {} in {}", link, parent.url);
                    return None;
                }
                Admission::CapacityReached => {
                    tracing::warn!(
                        "Not following {} from {}: visited set is full",
                        link,
                        parent.url
                    );
                    return None;
                }
            },
        }

        Some(parent.child(link))
    }

    fn record_child(
        &self,
        resolution: &mut Resolution,
        child: &Resource,
        result: Result<Resolution, CrawlError>,
    ) {
        resolution.links_followed += 1;
        match result {
            Ok(nested) => resolution.absorb(nested),
            Err(error) => {
                resolution.links_failed += 1;
                self.inner.stats.record_link_failed();
                tracing::error!(
                    kind = error.kind(),
                    parent = child.parent_url.as_deref().unwrap_or_default(),
                    "Error processing {}: {}",
                    child.url,
                    error
                );
            }
        }
    }
}

/// Runs a complete catalog
///
/// This is the main entry point for a run. It will:
/// 1. Read, decode and parse the root catalog
/// 2. Start the writer task that owns `sink`
/// 3. Resolve every usable entry, at most `max-concurrent-seeds` at a time
/// 4. Append exactly one status row per resolved entry
/// 5. Close the sink and return the run's statistics
///
/// # Returns
///
/// * `Ok(RunStats)` - Every entry was handled
/// * `Err(CrawlError)` - The catalog could not be read or parsed, or the
///   sink failed
pub async fn run_catalog(
    context: &RunContext,
    config: &Config,
    sink: Box<dyn RecordSink>,
    progress: &ProgressBar,
) -> Result<RunStats, CrawlError> {
    let bytes = tokio::fs::read(&context.catalog_path).await?;
    let catalog = decode_document(&bytes);
    let entries = parse_catalog(&catalog.text)?;

    tracing::info!(
        "Catalog {} lists {} entries for {}",
        context.catalog_path.display(),
        entries.len(),
        context.year
    );
    progress.set_length(entries.len() as u64);

    let stats = StatsRecorder::new();
    let (writer, writer_task) = spawn_writer(sink);
    let crawler = Crawler::new(config, writer.clone(), stats.clone())?;
    let seed_limit = config.crawler.max_concurrent_seeds.max(1) as usize;

    let mut tasks: JoinSet<Result<Outcome, CrawlError>> = JoinSet::new();
    let mut failure: Option<CrawlError> = None;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::error!("Error processing comunicazione: {}", error);
                stats.record_entry_skipped();
                progress.inc(1);
                continue;
            }
        };

        while tasks.len() >= seed_limit && failure.is_none() {
            if let Some(joined) = tasks.join_next().await {
                failure = settle(joined, &stats, progress);
            }
        }
        if failure.is_some() {
            break;
        }

        let crawler = crawler.clone();
        let writer = writer.clone();
        let year = context.year.clone();
        tasks.spawn(async move { resolve_entry(crawler, writer, year, entry).await });
    }

    while failure.is_none() {
        match tasks.join_next().await {
            Some(joined) => failure = settle(joined, &stats, progress),
            None => break,
        }
    }
    tasks.abort_all();

    drop(crawler);
    drop(writer);
    // Drain remaining tasks so their writer handles are released
    while tasks.join_next().await.is_some() {}

    let report = writer_task.finish().await;

    if let Some(error) = failure {
        // A closed writer hides the sink's own error; prefer the latter
        report?;
        return Err(error);
    }

    Ok(stats.snapshot(report?))
}

/// Resolves one catalog entry and appends its status row
async fn resolve_entry(
    crawler: Crawler,
    writer: SinkWriter,
    year: String,
    entry: CatalogEntry,
) -> Result<Outcome, CrawlError> {
    tracing::info!("Processing {} ({})", entry.url, entry.entity_tax_id);

    let outcome = crawler.resolve_seed(&entry.url).await;
    writer
        .append_status(StatusRow {
            year,
            entity_tax_id: entry.entity_tax_id,
            entity_name: entry.entity_name,
            url: entry.url,
            outcome,
        })
        .await?;

    Ok(outcome)
}

/// Accounts for a finished entry task, returning a run-fatal error if any
fn settle(
    joined: Result<Result<Outcome, CrawlError>, tokio::task::JoinError>,
    stats: &StatsRecorder,
    progress: &ProgressBar,
) -> Option<CrawlError> {
    progress.inc(1);
    match joined {
        Ok(Ok(outcome)) => {
            stats.record_outcome(outcome);
            None
        }
        Ok(Err(error)) => Some(error),
        Err(error) => Some(error.into()),
    }
}
