use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ResourceKey, WatchedHost};

/// Discovery candidate: an installation as listed by the external source,
/// before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    /// Administratively paused; such installations are not queried
    #[serde(default)]
    pub stopped: bool,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, rename = "cluster")]
    pub clusters: Vec<InstallationCluster>,
}

impl Installation {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn stopped(mut self, stopped: bool) -> Self {
        self.stopped = stopped;
        self
    }

    pub fn with_cluster(mut self, cluster: InstallationCluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace.clone(), self.name.clone())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Cluster layout as declared on an installation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallationCluster {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shards: Option<u32>,
    #[serde(default)]
    pub replicas: Option<u32>,
    /// Explicit host list; when present the layout counts are ignored
    #[serde(default, rename = "host")]
    pub hosts: Vec<WatchedHost>,
    #[serde(default)]
    pub ports: PortOverrides,
}

impl InstallationCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_layout(mut self, shards: u32, replicas: u32) -> Self {
        self.shards = Some(shards);
        self.replicas = Some(replicas);
        self
    }

    pub fn with_host(mut self, host: WatchedHost) -> Self {
        self.hosts.push(host);
        self
    }
}

/// Per-cluster port settings applied to generated hosts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOverrides {
    pub tcp: Option<u16>,
    pub tls: Option<u16>,
    pub http: Option<u16>,
    pub https: Option<u16>,
}
