use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WatchedCluster;

/// Composite identity of a watched resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Structural defect in a resource's cluster/host tree
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("cluster with empty name")]
    EmptyClusterName,

    #[error("duplicate cluster {0}")]
    DuplicateCluster(String),

    #[error("host with empty hostname in cluster {0}")]
    EmptyHostname(String),

    #[error("duplicate host {hostname} in cluster {cluster}")]
    DuplicateHost { cluster: String, hostname: String },
}

/// A ClickHouse installation under monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedResource {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub clusters: Vec<WatchedCluster>,
}

impl WatchedResource {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_cluster(mut self, cluster: WatchedCluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace.clone(), self.name.clone())
    }

    /// A resource is well-formed when its identity is complete
    pub fn is_valid(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty()
    }

    /// Cluster names must be non-empty and unique within the resource,
    /// hostnames non-empty and unique within their cluster
    pub fn check_layout(&self) -> Result<(), LayoutError> {
        let mut clusters = BTreeSet::new();
        for cluster in &self.clusters {
            if cluster.name.is_empty() {
                return Err(LayoutError::EmptyClusterName);
            }
            if !clusters.insert(cluster.name.as_str()) {
                return Err(LayoutError::DuplicateCluster(cluster.name.clone()));
            }

            let mut hosts = BTreeSet::new();
            for host in &cluster.hosts {
                if !host.is_valid() {
                    return Err(LayoutError::EmptyHostname(cluster.name.clone()));
                }
                if !hosts.insert(host.hostname.as_str()) {
                    return Err(LayoutError::DuplicateHost {
                        cluster: cluster.name.clone(),
                        hostname: host.hostname.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Find the named cluster, creating an empty one at the end if missing
    pub fn cluster_mut_or_insert(&mut self, name: &str) -> &mut WatchedCluster {
        let index = match self.clusters.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.clusters.push(WatchedCluster::new(name));
                self.clusters.len() - 1
            }
        };
        &mut self.clusters[index]
    }

    pub fn cluster_mut(&mut self, name: &str) -> Option<&mut WatchedCluster> {
        self.clusters.iter_mut().find(|c| c.name == name)
    }

    pub fn host_count(&self) -> usize {
        self.clusters.iter().map(|c| c.hosts.len()).sum()
    }
}

impl fmt::Display for WatchedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} clusters, {} hosts)",
            self.namespace,
            self.name,
            self.clusters.len(),
            self.host_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WatchedHost;

    #[test]
    fn test_cluster_mut_or_insert_reuses_existing() {
        let mut resource = WatchedResource::new("ns", "chi1").with_cluster(WatchedCluster::new("shard0"));
        resource.cluster_mut_or_insert("shard0").upsert_host(WatchedHost::new("h1"));
        resource.cluster_mut_or_insert("shard1");

        assert_eq!(resource.clusters.len(), 2);
        assert_eq!(resource.clusters[0].hosts.len(), 1);
        assert_eq!(resource.clusters[1].name, "shard1");
    }

    #[test]
    fn test_validity_requires_identity() {
        assert!(WatchedResource::new("ns", "chi1").is_valid());
        assert!(!WatchedResource::new("", "chi1").is_valid());
        assert!(!WatchedResource::new("ns", "").is_valid());
    }

    #[test]
    fn test_check_layout() {
        let resource = WatchedResource::new("ns", "chi1")
            .with_cluster(WatchedCluster::new("c0").with_hosts(vec![WatchedHost::new("h1"), WatchedHost::new("h2")]))
            .with_cluster(WatchedCluster::new("c1").with_hosts(vec![WatchedHost::new("h1")]));
        assert_eq!(resource.check_layout(), Ok(()));

        let duplicate_host = WatchedResource::new("ns", "chi1")
            .with_cluster(WatchedCluster::new("c").with_hosts(vec![WatchedHost::new("h1"), WatchedHost::new("h1")]));
        assert_eq!(
            duplicate_host.check_layout(),
            Err(LayoutError::DuplicateHost {
                cluster: "c".into(),
                hostname: "h1".into(),
            })
        );

        let duplicate_cluster = WatchedResource::new("ns", "chi1")
            .with_cluster(WatchedCluster::new("c"))
            .with_cluster(WatchedCluster::new("c"));
        assert_eq!(duplicate_cluster.check_layout(), Err(LayoutError::DuplicateCluster("c".into())));

        let empty_cluster = WatchedResource::new("ns", "chi1").with_cluster(WatchedCluster::new(""));
        assert_eq!(empty_cluster.check_layout(), Err(LayoutError::EmptyClusterName));

        let empty_host = WatchedResource::new("ns", "chi1")
            .with_cluster(WatchedCluster::new("c").with_hosts(vec![WatchedHost::new("")]));
        assert_eq!(empty_host.check_layout(), Err(LayoutError::EmptyHostname("c".into())));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ResourceKey::new("ns", "chi1").to_string(), "ns/chi1");
    }
}
