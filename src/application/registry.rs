use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use crate::domain::{ResourceKey, WatchedCluster, WatchedHost, WatchedResource};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("resource not found: {0}")]
    NotFound(ResourceKey),
}

/// Thread-safe store of everything currently monitored.
///
/// One reader/writer lock guards the whole resource -> cluster -> host tree.
/// Snapshots take the shared side; mutations and the dispatch walk take the
/// exclusive side.
#[derive(Debug, Default)]
pub struct Registry {
    index: RwLock<BTreeMap<ResourceKey, WatchedResource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoning is ignored; no mutation below can unwind half-applied.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ResourceKey, WatchedResource>> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ResourceKey, WatchedResource>> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert the resource or fully replace the entry with the same key
    pub fn upsert_resource(&self, resource: WatchedResource) {
        debug!(resource = %resource, "Registry: upsert resource");
        self.write().insert(resource.key(), resource);
    }

    /// Remove the resource; absent keys are ignored
    pub fn remove_resource(&self, key: &ResourceKey) -> bool {
        let removed = self.write().remove(key).is_some();
        debug!(resource = %key, removed, "Registry: remove resource");
        removed
    }

    /// Add or replace a host under `cluster_name`, creating the cluster if needed.
    ///
    /// Fails without touching the registry when the resource is not registered.
    pub fn add_host(
        &self,
        key: &ResourceKey,
        cluster_name: &str,
        host: WatchedHost,
    ) -> Result<(), RegistryError> {
        let mut index = self.write();
        let resource = index
            .get_mut(key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;

        debug!(resource = %key, cluster = cluster_name, hostname = %host.hostname, "Registry: add host");
        resource.cluster_mut_or_insert(cluster_name).upsert_host(host);
        Ok(())
    }

    /// Remove one host; missing resource, cluster or host is a no-op
    pub fn remove_host(&self, key: &ResourceKey, cluster_name: &str, hostname: &str) -> bool {
        let mut index = self.write();
        let removed = index
            .get_mut(key)
            .and_then(|resource| resource.cluster_mut(cluster_name))
            .map(|cluster| cluster.remove_host(hostname))
            .unwrap_or(false);

        if removed {
            debug!(resource = %key, cluster = cluster_name, hostname, "Registry: remove host");
        } else {
            debug!(resource = %key, cluster = cluster_name, hostname, "Registry: host to remove not found");
        }
        removed
    }

    /// Point-in-time copy of all resources, ordered by key
    pub fn snapshot_all(&self) -> Vec<WatchedResource> {
        self.read().values().cloned().collect()
    }

    pub fn get(&self, key: &ResourceKey) -> Option<WatchedResource> {
        self.read().get(key).cloned()
    }

    /// Hand every (resource, cluster, host) triple to `visitor` under the exclusive lock.
    ///
    /// The visitor must only enumerate or dispatch work; it must not block.
    pub fn for_each_host<F>(&self, mut visitor: F)
    where
        F: FnMut(&WatchedResource, &WatchedCluster, &WatchedHost),
    {
        let index = self.write();
        for resource in index.values() {
            for cluster in &resource.clusters {
                for host in &cluster.hosts {
                    visitor(resource, cluster, host);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn host_count(&self) -> usize {
        self.read().values().map(|r| r.host_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn key() -> ResourceKey {
        ResourceKey::new("ns", "chi1")
    }

    fn registry_with_chi1() -> Registry {
        let registry = Registry::new();
        registry.upsert_resource(
            WatchedResource::new("ns", "chi1")
                .with_cluster(WatchedCluster::new("shard0").with_hosts(vec![WatchedHost::new("h1")])),
        );
        registry
    }

    #[test]
    fn test_upsert_replaces_by_key() {
        let registry = registry_with_chi1();
        registry.upsert_resource(WatchedResource::new("ns", "chi1"));

        let snapshot = registry.snapshot_all();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].clusters.is_empty());
    }

    #[test]
    fn test_remove_absent_resource_is_noop() {
        let registry = registry_with_chi1();
        assert!(!registry.remove_resource(&ResourceKey::new("ns", "other")));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove_resource(&key()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_host_twice_keeps_latest() {
        let registry = registry_with_chi1();
        registry
            .add_host(&key(), "shard0", WatchedHost::new("h2").with_http_port(8123))
            .unwrap();
        registry
            .add_host(&key(), "shard0", WatchedHost::new("h2").with_http_port(18123))
            .unwrap();

        let resource = registry.get(&key()).unwrap();
        let hosts = &resource.clusters[0].hosts;
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[1].hostname, "h2");
        assert_eq!(hosts[1].http_port, Some(18123));
    }

    #[test]
    fn test_add_host_creates_cluster() {
        let registry = registry_with_chi1();
        registry.add_host(&key(), "shard1", WatchedHost::new("h3")).unwrap();

        let resource = registry.get(&key()).unwrap();
        assert_eq!(resource.clusters.len(), 2);
        assert_eq!(resource.clusters[1].name, "shard1");
        assert_eq!(resource.clusters[1].hosts[0].hostname, "h3");
    }

    #[test]
    fn test_add_host_unknown_resource_fails() {
        let registry = registry_with_chi1();
        let before = registry.snapshot_all();

        let missing = ResourceKey::new("ns", "missing");
        let err = registry
            .add_host(&missing, "shard0", WatchedHost::new("h9"))
            .unwrap_err();

        assert_eq!(err, RegistryError::NotFound(missing));
        assert_eq!(registry.snapshot_all(), before);
    }

    #[test]
    fn test_remove_host_missing_is_noop() {
        let registry = registry_with_chi1();
        let before = registry.snapshot_all();

        assert!(!registry.remove_host(&ResourceKey::new("ns", "missing"), "shard0", "h1"));
        assert!(!registry.remove_host(&key(), "missing", "h1"));
        assert!(!registry.remove_host(&key(), "shard0", "missing"));
        assert_eq!(registry.snapshot_all(), before);
    }

    #[test]
    fn test_remove_host_preserves_order() {
        let registry = registry_with_chi1();
        for name in ["h2", "h3", "h4"] {
            registry.add_host(&key(), "shard0", WatchedHost::new(name)).unwrap();
        }
        assert!(registry.remove_host(&key(), "shard0", "h2"));

        let hostnames: Vec<_> = registry.get(&key()).unwrap().clusters[0]
            .hosts
            .iter()
            .map(|h| h.hostname.clone())
            .collect();
        assert_eq!(hostnames, vec!["h1", "h3", "h4"]);
    }

    #[test]
    fn test_for_each_host_visits_every_triple() {
        let registry = registry_with_chi1();
        registry.add_host(&key(), "shard1", WatchedHost::new("h2")).unwrap();
        registry.upsert_resource(
            WatchedResource::new("other", "chi2")
                .with_cluster(WatchedCluster::new("c").with_hosts(vec![WatchedHost::new("h3")])),
        );

        let mut visited = Vec::new();
        registry.for_each_host(|resource, cluster, host| {
            visited.push(format!("{}/{}/{}", resource.name, cluster.name, host.hostname));
        });

        assert_eq!(visited, vec!["chi1/shard0/h1", "chi1/shard1/h2", "chi2/c/h3"]);
        assert_eq!(registry.host_count(), 3);
    }

    #[test]
    fn test_concurrent_snapshots_see_prefixes() {
        let registry = Arc::new(Registry::new());
        registry.upsert_resource(WatchedResource::new("ns", "chi1"));

        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..200 {
                    registry
                        .add_host(&key(), "shard0", WatchedHost::new(format!("h{}", i)))
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = registry.snapshot_all();
                        assert_eq!(snapshot.len(), 1);
                        if let Some(cluster) = snapshot[0].clusters.first() {
                            for (i, host) in cluster.hosts.iter().enumerate() {
                                assert_eq!(host.hostname, format!("h{}", i));
                            }
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.host_count(), 200);
    }
}
