use crate::domain::{
    assigned_port, Installation, InstallationCluster, PortOverrides, WatchedCluster, WatchedHost,
    WatchedResource,
};
use crate::ports::{NormalizeError, Normalizer};

pub const DEFAULT_TCP_PORT: u16 = 9000;
pub const DEFAULT_HTTP_PORT: u16 = 8123;
pub const DEFAULT_DOMAIN: &str = "svc.cluster.local";
/// Upper bound on hosts generated from one cluster's shard/replica counts
pub const MAX_GENERATED_HOSTS: u32 = 10_000;

/// Expands installation layouts into watched hosts.
///
/// Generated hosts are named `chi-{installation}-{cluster}-{shard}-{replica}`
/// and addressed as `{name}.{namespace}.{domain}`. Explicit host lists win
/// over layout counts.
#[derive(Debug, Clone)]
pub struct InstallationNormalizer {
    domain: String,
}

impl Default for InstallationNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN)
    }
}

impl InstallationNormalizer {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    fn generated_hosts(
        &self,
        installation: &Installation,
        cluster: &InstallationCluster,
    ) -> Result<Vec<WatchedHost>, NormalizeError> {
        let shards = cluster.shards.unwrap_or(1).max(1);
        let replicas = cluster.replicas.unwrap_or(1).max(1);

        let total = match shards.checked_mul(replicas) {
            Some(total) if total <= MAX_GENERATED_HOSTS => total,
            _ => {
                return Err(NormalizeError::LayoutTooLarge {
                    resource: installation.key().to_string(),
                    cluster: cluster.name.clone(),
                    shards,
                    replicas,
                    limit: MAX_GENERATED_HOSTS,
                })
            }
        };

        let mut hosts = Vec::with_capacity(total as usize);
        for shard in 0..shards {
            for replica in 0..replicas {
                let name = format!(
                    "chi-{}-{}-{}-{}",
                    installation.name, cluster.name, shard, replica
                )
                .to_lowercase();
                let hostname = format!("{}.{}.{}", name, installation.namespace, self.domain);
                hosts.push(with_ports(
                    WatchedHost::new(hostname).with_name(name),
                    &cluster.ports,
                ));
            }
        }
        Ok(hosts)
    }
}

/// Fill unset ports from the cluster overrides, then the defaults
fn with_ports(mut host: WatchedHost, ports: &PortOverrides) -> WatchedHost {
    host.tcp_port = assigned_port(host.tcp_port)
        .or(assigned_port(ports.tcp))
        .or(Some(DEFAULT_TCP_PORT));
    host.http_port = assigned_port(host.http_port)
        .or(assigned_port(ports.http))
        .or(Some(DEFAULT_HTTP_PORT));
    host.tls_port = assigned_port(host.tls_port).or(assigned_port(ports.tls));
    host.https_port = assigned_port(host.https_port).or(assigned_port(ports.https));
    if host.name.is_empty() {
        host.name = host.hostname.clone();
    }
    host
}

impl Normalizer for InstallationNormalizer {
    fn normalize(&self, candidate: &Installation) -> Result<WatchedResource, NormalizeError> {
        if candidate.namespace.is_empty() || candidate.name.is_empty() {
            return Err(NormalizeError::MissingIdentity);
        }

        let key = candidate.key().to_string();

        // Cluster names are checked before any host is generated
        let mut skeleton = WatchedResource::new(candidate.namespace.clone(), candidate.name.clone());
        skeleton.clusters = candidate
            .clusters
            .iter()
            .map(|c| WatchedCluster::new(c.name.clone()))
            .collect();
        skeleton
            .check_layout()
            .map_err(|e| NormalizeError::from_layout(key.clone(), e))?;

        let mut resource = WatchedResource::new(candidate.namespace.clone(), candidate.name.clone())
            .with_labels(candidate.labels.clone());

        for cluster in &candidate.clusters {
            let mut watched = WatchedCluster::new(cluster.name.clone());
            if cluster.hosts.is_empty() {
                watched.hosts = self.generated_hosts(candidate, cluster)?;
            } else {
                for host in cluster.hosts.iter().filter(|h| h.is_valid()) {
                    watched.upsert_host(with_ports(host.clone(), &cluster.ports));
                }
            }
            resource = resource.with_cluster(watched);
        }

        resource
            .check_layout()
            .map_err(|e| NormalizeError::from_layout(key, e))?;
        Ok(resource)
    }
}
