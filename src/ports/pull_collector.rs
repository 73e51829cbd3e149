use async_trait::async_trait;

use crate::domain::{Descriptor, Sample};

/// Pull-based exposition contract, driven by whoever serves the scrape endpoint
#[async_trait]
pub trait PullCollector: Send + Sync {
    /// Describe every metric family currently produced
    async fn describe(&self) -> Vec<Descriptor>;

    /// Collect every sample currently available; returns only once complete
    async fn collect(&self) -> Vec<Sample>;
}
