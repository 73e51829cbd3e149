use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::{LayoutError, ResourceKey, WatchedHost, WatchedResource};

use super::registry::{Registry, RegistryError};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("unable to parse request: {0}")]
    Protocol(String),

    #[error("invalid {0} in request")]
    Validation(&'static str),

    #[error("invalid resource layout: {0}")]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    NotFound(#[from] RegistryError),
}

/// Host mutation addressed by its parent resource and cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRequest {
    #[serde(default)]
    pub resource_namespace: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub host: Option<WatchedHost>,
}

impl HostRequest {
    pub fn new(
        resource_namespace: impl Into<String>,
        resource_name: impl Into<String>,
        cluster_name: impl Into<String>,
        host: WatchedHost,
    ) -> Self {
        Self {
            resource_namespace: resource_namespace.into(),
            resource_name: resource_name.into(),
            cluster_name: cluster_name.into(),
            host: Some(host),
        }
    }

    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(self.resource_namespace.clone(), self.resource_name.clone())
    }

    pub fn is_valid(&self) -> bool {
        !self.resource_namespace.is_empty()
            && !self.resource_name.is_empty()
            && !self.cluster_name.is_empty()
            && self.host.as_ref().is_some_and(WatchedHost::is_valid)
    }
}

/// Control API request body, discriminated by `kind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControlRequest {
    Resource { resource: WatchedResource },
    Host { host: HostRequest },
}

impl ControlRequest {
    /// Decode and validate a request body; nothing is applied yet
    pub fn decode(body: &[u8]) -> Result<Self, ControlError> {
        let request: Self =
            serde_json::from_slice(body).map_err(|e| ControlError::Protocol(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        match self {
            Self::Resource { resource } if !resource.is_valid() => Err(ControlError::Validation("resource")),
            Self::Resource { resource } => Ok(resource.check_layout()?),
            Self::Host { host } if !host.is_valid() => Err(ControlError::Validation("host")),
            Self::Host { .. } => Ok(()),
        }
    }
}

/// Add or remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Add,
    Remove,
}

/// Applies control API requests to the registry
#[derive(Debug, Clone)]
pub struct ControlService {
    registry: Arc<Registry>,
}

impl ControlService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn list(&self) -> Vec<WatchedResource> {
        self.registry.snapshot_all()
    }

    /// Decode, validate and apply one request body
    pub fn handle(&self, mutation: Mutation, body: &[u8]) -> Result<(), ControlError> {
        let request = ControlRequest::decode(body)?;
        self.apply(mutation, request)
    }

    pub fn apply(&self, mutation: Mutation, request: ControlRequest) -> Result<(), ControlError> {
        request.validate()?;

        match (mutation, request) {
            (Mutation::Add, ControlRequest::Resource { resource }) => {
                info!(resource = %resource.key(), "Control: add resource");
                self.registry.upsert_resource(resource);
            }
            (Mutation::Remove, ControlRequest::Resource { resource }) => {
                info!(resource = %resource.key(), "Control: remove resource");
                self.registry.remove_resource(&resource.key());
            }
            (Mutation::Add, ControlRequest::Host { host: request }) => {
                let key = request.resource_key();
                let host = request.host.ok_or(ControlError::Validation("host"))?;
                info!(resource = %key, cluster = %request.cluster_name, hostname = %host.hostname, "Control: add host");
                self.registry.add_host(&key, &request.cluster_name, host)?;
            }
            (Mutation::Remove, ControlRequest::Host { host: request }) => {
                let key = request.resource_key();
                let hostname = request.host.map(|h| h.hostname).unwrap_or_default();
                info!(resource = %key, cluster = %request.cluster_name, %hostname, "Control: remove host");
                self.registry.remove_host(&key, &request.cluster_name, &hostname);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::WatchedCluster;

    fn service() -> ControlService {
        let registry = Arc::new(Registry::new());
        registry.upsert_resource(
            WatchedResource::new("ns", "chi1")
                .with_cluster(WatchedCluster::new("shard0").with_hosts(vec![WatchedHost::new("h1")])),
        );
        ControlService::new(registry)
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_decode_tagged_variants() {
        let request = ControlRequest::decode(&body(json!({
            "kind": "host",
            "host": {
                "resourceNamespace": "ns",
                "resourceName": "chi1",
                "clusterName": "shard0",
                "host": {"hostname": "h2", "httpPort": 8123}
            }
        })))
        .unwrap();

        assert_eq!(
            request,
            ControlRequest::Host {
                host: HostRequest::new("ns", "chi1", "shard0", WatchedHost::new("h2").with_name("").with_http_port(8123)),
            }
        );

        let request = ControlRequest::decode(&body(json!({
            "kind": "resource",
            "resource": {"namespace": "ns", "name": "chi2"}
        })))
        .unwrap();
        assert!(matches!(request, ControlRequest::Resource { resource } if resource.name == "chi2"));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let err = ControlRequest::decode(&body(json!({"kind": "cluster"}))).unwrap_err();
        assert!(matches!(err, ControlError::Protocol(_)));
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let err = ControlRequest::decode(b"{not json").unwrap_err();
        assert!(matches!(err, ControlError::Protocol(_)));
    }

    #[test]
    fn test_validation_requires_identity() {
        let err = ControlRequest::decode(&body(json!({
            "kind": "host",
            "host": {"resourceNamespace": "ns", "resourceName": "chi1", "clusterName": "shard0", "host": {"hostname": ""}}
        })))
        .unwrap_err();
        assert!(matches!(err, ControlError::Validation("host")));

        let err = ControlRequest::decode(&body(json!({
            "kind": "host",
            "host": {"resourceNamespace": "ns", "resourceName": "chi1", "clusterName": "shard0"}
        })))
        .unwrap_err();
        assert!(matches!(err, ControlError::Validation("host")));

        let err = ControlRequest::decode(&body(json!({
            "kind": "resource",
            "resource": {"namespace": "ns"}
        })))
        .unwrap_err();
        assert!(matches!(err, ControlError::Validation("resource")));
    }

    #[test]
    fn test_validation_rejects_duplicate_layout() {
        let err = ControlRequest::decode(&body(json!({
            "kind": "resource",
            "resource": {
                "namespace": "ns",
                "name": "chi1",
                "clusters": [
                    {"name": "c", "hosts": [{"hostname": "h1"}, {"hostname": "h1"}]},
                    {"name": "c"}
                ]
            }
        })))
        .unwrap_err();
        assert!(matches!(err, ControlError::Layout(LayoutError::DuplicateHost { .. })));

        let err = ControlRequest::decode(&body(json!({
            "kind": "resource",
            "resource": {"namespace": "ns", "name": "chi1", "clusters": [{"name": "c"}, {"name": "c"}]}
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid resource layout: duplicate cluster c");

        let service = service();
        let before = service.list();
        let err = service
            .apply(
                Mutation::Add,
                ControlRequest::Resource {
                    resource: WatchedResource::new("ns", "chi1")
                        .with_cluster(WatchedCluster::new("c").with_hosts(vec![WatchedHost::new("")])),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ControlError::Layout(LayoutError::EmptyHostname(_))));
        assert_eq!(service.list(), before);
    }

    #[test]
    fn test_host_add_then_remove() {
        let service = service();
        service
            .apply(
                Mutation::Add,
                ControlRequest::Host {
                    host: HostRequest::new("ns", "chi1", "shard0", WatchedHost::new("h2")),
                },
            )
            .unwrap();
        service
            .apply(
                Mutation::Remove,
                ControlRequest::Host {
                    host: HostRequest::new("ns", "chi1", "shard0", WatchedHost::new("h1")),
                },
            )
            .unwrap();

        let hosts: Vec<_> = service.list()[0].clusters[0]
            .hosts
            .iter()
            .map(|h| h.hostname.clone())
            .collect();
        assert_eq!(hosts, vec!["h2"]);
    }

    #[test]
    fn test_host_add_unknown_resource_is_not_found() {
        let service = service();
        let err = service
            .apply(
                Mutation::Add,
                ControlRequest::Host {
                    host: HostRequest::new("ns", "missing", "shard0", WatchedHost::new("h2")),
                },
            )
            .unwrap_err();

        assert!(matches!(err, ControlError::NotFound(_)));
        assert_eq!(err.to_string(), "resource not found: ns/missing");
    }

    #[test]
    fn test_invalid_request_does_not_touch_registry() {
        let service = service();
        let before = service.list();
        let err = service
            .apply(
                Mutation::Remove,
                ControlRequest::Resource {
                    resource: WatchedResource::new("", "chi1"),
                },
            )
            .unwrap_err();

        assert!(matches!(err, ControlError::Validation("resource")));
        assert_eq!(service.list(), before);
    }
}
