use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::adapters::prometheus::PrometheusWriter;
use crate::domain::{ClusterConnectionParams, Descriptor, EndpointParams, Installation, Sample, WatchedHost};
use crate::ports::{DiscoveryError, FetcherFactory, Normalizer, PullCollector, ResourceSource};

use super::collector::{HostCollector, ScrapeContext};
use super::registry::Registry;

/// Slack after the deadline for host tasks to observe it before they are aborted
pub const ABANDON_GRACE: Duration = Duration::from_millis(50);

/// Summary of one scrape
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub hosts_dispatched: usize,
    pub hosts_completed: usize,
    pub hosts_abandoned: usize,
    pub categories_failed: usize,
    pub categories_timed_out: usize,
    pub samples: usize,
    pub elapsed: Duration,
}

/// Output of one scrape
#[derive(Debug, Clone, Default)]
pub struct Scrape {
    pub samples: Vec<Sample>,
    pub report: ScrapeReport,
}

/// Summary of one discovery pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub listed: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub upserted: usize,
    pub finished_at: DateTime<Utc>,
}

/// Default watch policy: paused installations are not queried
pub fn should_watch(installation: &Installation) -> bool {
    if installation.is_stopped() {
        debug!(installation = %installation.key(), "Installation is stopped, unable to watch it");
        return false;
    }
    true
}

/// Pull-protocol collector over every host in the registry, plus discovery
pub struct Exporter {
    registry: Arc<Registry>,
    fetchers: Arc<dyn FetcherFactory>,
    connection: ClusterConnectionParams,
    collection_timeout: Duration,
}

impl Exporter {
    pub fn new(
        registry: Arc<Registry>,
        fetchers: Arc<dyn FetcherFactory>,
        connection: ClusterConnectionParams,
        collection_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            fetchers,
            connection,
            collection_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn collection_timeout(&self) -> Duration {
        self.collection_timeout
    }

    /// Connection target for a host: the cluster-wide base adjusted by the host's ports
    pub fn endpoint_for(&self, host: &WatchedHost) -> EndpointParams {
        self.connection.for_host(host)
    }

    /// Collect from every registered host, bounded by the collection timeout.
    ///
    /// Hosts still running when the deadline passes are abandoned; whatever they
    /// already produced is kept.
    pub async fn scrape(&self) -> Scrape {
        let start = Instant::now();
        let ctx = ScrapeContext::with_timeout(self.collection_timeout);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        debug!("Collect started");
        self.registry.for_each_host(|resource, cluster, host| {
            let sink = Arc::new(PrometheusWriter::new(tx.clone(), resource, cluster, host));
            let fetcher = self.fetchers.fetcher_for(&self.endpoint_for(host));
            let collector = HostCollector::new(fetcher, sink);
            let host = host.clone();
            tasks.spawn(async move { collector.collect(&ctx, &host).await });
        });
        drop(tx);

        let mut report = ScrapeReport {
            hosts_dispatched: tasks.len(),
            ..Default::default()
        };
        debug!(hosts = report.hosts_dispatched, "Launched host collectors");

        let joined = timeout_at(ctx.deadline() + ABANDON_GRACE, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(host_report) => {
                        report.hosts_completed += 1;
                        report.categories_failed += host_report.failed();
                        report.categories_timed_out += host_report.timed_out();
                    }
                    Err(e) => warn!(error = %e, "Host collector did not complete"),
                }
            }
        })
        .await;

        if joined.is_err() {
            report.hosts_abandoned = tasks.len();
            tasks.abort_all();
            warn!(hosts = report.hosts_abandoned, "Collection deadline passed, abandoning host collectors");
        }

        let mut samples = Vec::new();
        while let Ok(sample) = rx.try_recv() {
            samples.push(sample);
        }

        report.samples = samples.len();
        report.elapsed = start.elapsed();
        info!(
            hosts = report.hosts_dispatched,
            failed = report.categories_failed,
            timed_out = report.categories_timed_out,
            samples = report.samples,
            elapsed = ?report.elapsed,
            "Collect completed"
        );

        Scrape { samples, report }
    }

    /// List candidates, keep the ones `should_watch` accepts, normalize and upsert them.
    ///
    /// Resources missing from the listing are left in place.
    pub async fn refresh_from_source<F>(
        &self,
        source: &dyn ResourceSource,
        should_watch: F,
        normalizer: &dyn Normalizer,
    ) -> Result<DiscoveryReport, DiscoveryError>
    where
        F: Fn(&Installation) -> bool,
    {
        let candidates = source.list().await?;
        let mut report = DiscoveryReport {
            listed: candidates.len(),
            ..Default::default()
        };

        for candidate in &candidates {
            if !should_watch(candidate) {
                info!(installation = %candidate.key(), "Skip discovered installation");
                report.skipped += 1;
                continue;
            }

            match normalizer.normalize(candidate) {
                Ok(resource) => {
                    info!(installation = %candidate.key(), "Add discovered installation");
                    self.registry.upsert_resource(resource);
                    report.upserted += 1;
                }
                Err(e) => {
                    warn!(installation = %candidate.key(), error = %e, "Unable to normalize discovered installation");
                    report.rejected += 1;
                }
            }
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    /// Run discovery now and then on every `interval` tick, forever
    pub async fn run_discovery(
        self: Arc<Self>,
        source: Arc<dyn ResourceSource>,
        normalizer: Arc<dyn Normalizer>,
        interval: Duration,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self
                .refresh_from_source(source.as_ref(), should_watch, normalizer.as_ref())
                .await
            {
                Ok(report) => info!(
                    listed = report.listed,
                    skipped = report.skipped,
                    rejected = report.rejected,
                    upserted = report.upserted,
                    "Discovery completed"
                ),
                Err(e) => warn!(error = %e, "Discovery failed"),
            }
        }
    }
}

#[async_trait]
impl PullCollector for Exporter {
    /// The metric set depends on which hosts exist, so descriptors come from a full collection
    async fn describe(&self) -> Vec<Descriptor> {
        let mut descriptors = BTreeMap::new();
        for sample in self.collect().await {
            descriptors
                .entry(sample.name.clone())
                .or_insert_with(|| sample.descriptor());
        }
        descriptors.into_values().collect()
    }

    async fn collect(&self) -> Vec<Sample> {
        self.scrape().await.samples
    }
}
