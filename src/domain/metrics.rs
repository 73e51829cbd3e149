use std::fmt;

use serde::{Deserialize, Serialize};

/// One independent kind of per-host query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "system.metrics")]
    Metrics,
    #[serde(rename = "system.parts")]
    Parts,
    #[serde(rename = "system.replicas")]
    Replicas,
    #[serde(rename = "system.mutations")]
    Mutations,
    #[serde(rename = "system.disks")]
    Disks,
    #[serde(rename = "system.detached_parts")]
    DetachedParts,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Metrics,
        Category::Parts,
        Category::Replicas,
        Category::Mutations,
        Category::Disks,
        Category::DetachedParts,
    ];

    /// Name used as the `fetch_type` label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "system.metrics",
            Self::Parts => "system.parts",
            Self::Replicas => "system.replicas",
            Self::Mutations => "system.mutations",
            Self::Disks => "system.disks",
            Self::DetachedParts => "system.detached_parts",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a server-side metric is a point-in-time value or a running total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Row from system.metrics / system.events / system.asynchronous_metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: f64,
    #[serde(default)]
    pub description: String,
    pub kind: MetricKind,
}

impl MetricRow {
    pub fn gauge(metric: impl Into<String>, value: f64) -> Self {
        Self {
            metric: metric.into(),
            value,
            description: String::new(),
            kind: MetricKind::Gauge,
        }
    }

    pub fn counter(metric: impl Into<String>, value: f64) -> Self {
        Self {
            kind: MetricKind::Counter,
            ..Self::gauge(metric, value)
        }
    }
}

/// Per-table part statistics from system.parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRow {
    pub database: String,
    pub table: String,
    pub active: bool,
    pub partitions: u64,
    pub parts: u64,
    pub bytes: u64,
    pub uncompressed_bytes: u64,
    pub rows: u64,
}

/// Replica session state from system.replicas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaRow {
    pub database: String,
    pub table: String,
    pub is_session_expired: bool,
}

/// Unfinished mutations per table from system.mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRow {
    pub database: String,
    pub table: String,
    pub mutations: u64,
    pub parts_to_do: u64,
}

/// Space on one configured disk from system.disks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskRow {
    pub disk: String,
    pub free_space: u64,
    pub total_space: u64,
}

/// Detached part counts grouped by reason from system.detached_parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachedPartRow {
    pub database: String,
    pub table: String,
    pub disk: String,
    pub reason: String,
    pub count: u64,
}

/// Result of one successful category fetch
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryRows {
    Metrics(Vec<MetricRow>),
    Parts(Vec<PartRow>),
    Replicas(Vec<ReplicaRow>),
    Mutations(Vec<MutationRow>),
    Disks(Vec<DiskRow>),
    DetachedParts(Vec<DetachedPartRow>),
}

impl CategoryRows {
    pub fn category(&self) -> Category {
        match self {
            Self::Metrics(_) => Category::Metrics,
            Self::Parts(_) => Category::Parts,
            Self::Replicas(_) => Category::Replicas,
            Self::Mutations(_) => Category::Mutations,
            Self::Disks(_) => Category::Disks,
            Self::DetachedParts(_) => Category::DetachedParts,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Metrics(rows) => rows.len(),
            Self::Parts(rows) => rows.len(),
            Self::Replicas(rows) => rows.len(),
            Self::Mutations(rows) => rows.len(),
            Self::Disks(rows) => rows.len(),
            Self::DetachedParts(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
