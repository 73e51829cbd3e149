use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::domain::{Category, WatchedHost};
use crate::ports::{fetch_category, HostFetcher, MetricSink};

/// Deadline shared by every unit of work in one scrape
#[derive(Debug, Clone, Copy)]
pub struct ScrapeContext {
    deadline: Instant,
}

impl ScrapeContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// What happened to one category during a collect call
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOutcome {
    Succeeded { rows: usize },
    Failed { error: String },
    /// Abandoned at the deadline; nothing was recorded for it
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: Category,
    pub outcome: CategoryOutcome,
    pub elapsed: Duration,
}

/// Per-host diagnostics of one collect call
#[derive(Debug, Clone, Default)]
pub struct CollectReport {
    pub hostname: String,
    pub categories: Vec<CategoryReport>,
}

impl CollectReport {
    fn count(&self, pred: impl Fn(&CategoryOutcome) -> bool) -> usize {
        self.categories.iter().filter(|c| pred(&c.outcome)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, CategoryOutcome::Succeeded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CategoryOutcome::Failed { .. }))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|o| matches!(o, CategoryOutcome::TimedOut))
    }

    pub fn outcome(&self, category: Category) -> Option<&CategoryOutcome> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| &c.outcome)
    }
}

/// Collects every category from a single host into a host-scoped sink
pub struct HostCollector {
    fetcher: Arc<dyn HostFetcher>,
    sink: Arc<dyn MetricSink>,
}

impl HostCollector {
    pub fn new(fetcher: Arc<dyn HostFetcher>, sink: Arc<dyn MetricSink>) -> Self {
        Self { fetcher, sink }
    }

    /// Run all category fetches concurrently and wait for each to finish or hit the deadline
    pub async fn collect(&self, ctx: &ScrapeContext, host: &WatchedHost) -> CollectReport {
        let mut tasks = JoinSet::new();
        for category in Category::ALL {
            tasks.spawn(collect_category(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.sink),
                category,
                host.hostname.clone(),
                ctx.deadline(),
            ));
        }

        let mut report = CollectReport {
            hostname: host.hostname.clone(),
            categories: Vec::with_capacity(Category::ALL.len()),
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(category_report) => report.categories.push(category_report),
                Err(e) => warn!(hostname = %host.hostname, error = %e, "Category task did not complete"),
            }
        }
        report
    }
}

async fn collect_category(
    fetcher: Arc<dyn HostFetcher>,
    sink: Arc<dyn MetricSink>,
    category: Category,
    hostname: String,
    deadline: Instant,
) -> CategoryReport {
    debug!(%hostname, %category, "Querying host");
    let start = Instant::now();
    let result = timeout_at(deadline, fetch_category(fetcher, category)).await;
    let elapsed = start.elapsed();

    let outcome = match result {
        Ok(Ok(rows)) => {
            debug!(%hostname, %category, ?elapsed, rows = rows.len(), "Extracted rows");
            sink.write_rows(&rows);
            sink.write_fetch_ok(category);
            CategoryOutcome::Succeeded { rows: rows.len() }
        }
        Ok(Err(e)) => {
            warn!(%hostname, %category, ?elapsed, error = %e, "Error querying host");
            sink.write_fetch_error(category);
            CategoryOutcome::Failed {
                error: e.to_string(),
            }
        }
        Err(_) => {
            warn!(%hostname, %category, ?elapsed, "Query abandoned at collection deadline");
            CategoryOutcome::TimedOut
        }
    };

    CategoryReport {
        category,
        outcome,
        elapsed,
    }
}
