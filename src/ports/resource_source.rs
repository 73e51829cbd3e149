use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Installation;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source error: {0}")]
    Source(String),
}

/// Port for listing candidate installations
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list(&self) -> Result<Vec<Installation>, DiscoveryError>;
}
