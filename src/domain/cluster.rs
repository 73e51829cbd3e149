use serde::{Deserialize, Serialize};

use super::WatchedHost;

/// Named group of hosts (a ClickHouse cluster) inside a watched resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedCluster {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<WatchedHost>,
}

impl WatchedCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: Vec::new(),
        }
    }

    pub fn with_hosts(mut self, hosts: Vec<WatchedHost>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Replace the host with the same hostname, or append it
    pub fn upsert_host(&mut self, host: WatchedHost) {
        match self.hosts.iter_mut().find(|h| h.hostname == host.hostname) {
            Some(existing) => *existing = host,
            None => self.hosts.push(host),
        }
    }

    /// Remove the host with the given hostname, keeping the order of the rest.
    /// Returns whether a host was removed.
    pub fn remove_host(&mut self, hostname: &str) -> bool {
        match self.hosts.iter().position(|h| h.hostname == hostname) {
            Some(index) => {
                self.hosts.remove(index);
                true
            }
            None => false,
        }
    }
}
