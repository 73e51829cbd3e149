use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::domain::{
    sanitize_metric_name, Category, DetachedPartRow, DiskRow, MetricKind, MetricRow, MutationRow,
    PartRow, ReplicaRow, Sample, WatchedCluster, WatchedHost, WatchedResource,
};
use crate::ports::MetricSink;

const PREFIX: &str = "chi_clickhouse";

/// Turns one host's rows into samples and sends them to the scrape's output channel
pub struct PrometheusWriter {
    tx: UnboundedSender<Sample>,
    base_labels: Vec<(String, String)>,
}

impl PrometheusWriter {
    pub fn new(
        tx: UnboundedSender<Sample>,
        resource: &WatchedResource,
        cluster: &WatchedCluster,
        host: &WatchedHost,
    ) -> Self {
        Self {
            tx,
            base_labels: vec![
                ("chi".to_string(), resource.name.clone()),
                ("namespace".to_string(), resource.namespace.clone()),
                ("cluster".to_string(), cluster.name.clone()),
                ("hostname".to_string(), host.hostname.clone()),
            ],
        }
    }

    fn labels(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut labels = self.base_labels.clone();
        labels.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        labels
    }

    fn gauge(&self, name: &str, help: &str, value: f64, extra: &[(&str, &str)]) {
        self.emit(Sample::gauge(format!("{}_{}", PREFIX, name), help, value).with_labels(self.labels(extra)));
    }

    fn emit(&self, sample: Sample) {
        // The receiver is gone once the scrape has stopped waiting for this host.
        if self.tx.send(sample).is_err() {
            trace!("Scrape output closed, dropping sample");
        }
    }
}

impl MetricSink for PrometheusWriter {
    fn write_metrics(&self, rows: &[MetricRow]) {
        for row in rows {
            let help = if row.description.is_empty() {
                row.metric.as_str()
            } else {
                row.description.as_str()
            };
            let sample = match row.kind {
                MetricKind::Gauge => Sample::gauge(
                    format!("{}_metric_{}", PREFIX, sanitize_metric_name(&row.metric)),
                    help,
                    row.value,
                ),
                MetricKind::Counter => Sample::counter(
                    format!("{}_event_{}", PREFIX, sanitize_metric_name(&row.metric)),
                    help,
                    row.value,
                ),
            };
            self.emit(sample.with_labels(self.labels(&[])));
        }
    }

    fn write_parts(&self, rows: &[PartRow]) {
        for row in rows {
            let active = if row.active { "1" } else { "0" };
            let extra = [
                ("database", row.database.as_str()),
                ("table", row.table.as_str()),
                ("active", active),
            ];
            self.gauge("table_partitions", "Number of partitions of the table", row.partitions as f64, &extra);
            self.gauge("table_parts", "Number of parts of the table", row.parts as f64, &extra);
            self.gauge("table_parts_bytes", "Table size in bytes", row.bytes as f64, &extra);
            self.gauge(
                "table_parts_bytes_uncompressed",
                "Table size in bytes uncompressed",
                row.uncompressed_bytes as f64,
                &extra,
            );
            self.gauge("table_parts_rows", "Number of rows in the table", row.rows as f64, &extra);
        }
    }

    fn write_replicas(&self, rows: &[ReplicaRow]) {
        for row in rows {
            self.gauge(
                "system_replicas_is_session_expired",
                "Number of expired Zookeeper sessions of the table",
                if row.is_session_expired { 1.0 } else { 0.0 },
                &[("database", row.database.as_str()), ("table", row.table.as_str())],
            );
        }
    }

    fn write_mutations(&self, rows: &[MutationRow]) {
        for row in rows {
            let extra = [("database", row.database.as_str()), ("table", row.table.as_str())];
            self.gauge("table_mutations", "Number of active mutations for the table", row.mutations as f64, &extra);
            self.gauge(
                "table_mutations_parts_to_do",
                "Number of data parts that need to be mutated for the mutation to finish",
                row.parts_to_do as f64,
                &extra,
            );
        }
    }

    fn write_disks(&self, rows: &[DiskRow]) {
        for row in rows {
            let extra = [("disk", row.disk.as_str())];
            self.gauge("metric_DiskFreeBytes", "Free disk space available from system.disks", row.free_space as f64, &extra);
            self.gauge("metric_DiskTotalBytes", "Total disk space available from system.disks", row.total_space as f64, &extra);
        }
    }

    fn write_detached_parts(&self, rows: &[DetachedPartRow]) {
        for row in rows {
            self.gauge(
                "metric_DetachedParts",
                "Count of currently detached parts from system.detached_parts",
                row.count as f64,
                &[
                    ("database", row.database.as_str()),
                    ("table", row.table.as_str()),
                    ("disk", row.disk.as_str()),
                    ("reason", row.reason.as_str()),
                ],
            );
        }
    }

    fn write_fetch_ok(&self, category: Category) {
        self.gauge(
            "metric_fetch_errors",
            "Status of fetching metrics from ClickHouse, 1 - unsuccessful, 0 - successful",
            0.0,
            &[("fetch_type", category.as_str())],
        );
    }

    fn write_fetch_error(&self, category: Category) {
        self.gauge(
            "metric_fetch_errors",
            "Status of fetching metrics from ClickHouse, 1 - unsuccessful, 0 - successful",
            1.0,
            &[("fetch_type", category.as_str())],
        );
    }
}
