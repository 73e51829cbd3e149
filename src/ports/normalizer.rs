use thiserror::Error;

use crate::domain::{Installation, LayoutError, WatchedResource};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("installation has no namespace or name")]
    MissingIdentity,

    #[error("cluster with empty name in {0}")]
    EmptyClusterName(String),

    #[error("duplicate cluster {cluster} in {resource}")]
    DuplicateCluster { resource: String, cluster: String },

    #[error("invalid hosts in {resource}: {reason}")]
    InvalidHosts { resource: String, reason: String },

    #[error("cluster {cluster} in {resource} declares {shards}x{replicas} hosts, more than {limit}")]
    LayoutTooLarge {
        resource: String,
        cluster: String,
        shards: u32,
        replicas: u32,
        limit: u32,
    },
}

impl NormalizeError {
    /// Attach the offending resource to a layout defect
    pub fn from_layout(resource: impl Into<String>, err: LayoutError) -> Self {
        let resource = resource.into();
        match err {
            LayoutError::EmptyClusterName => Self::EmptyClusterName(resource),
            LayoutError::DuplicateCluster(cluster) => Self::DuplicateCluster { resource, cluster },
            other => Self::InvalidHosts {
                resource,
                reason: other.to_string(),
            },
        }
    }
}

/// Port for turning a discovery candidate into its canonical watched form
pub trait Normalizer: Send + Sync {
    fn normalize(&self, candidate: &Installation) -> Result<WatchedResource, NormalizeError>;
}
