use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::domain::{
    Category, CategoryRows, DetachedPartRow, DiskRow, EndpointParams, MetricRow, MutationRow,
    PartRow, ReplicaRow,
};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Port for querying one ClickHouse host, one method per category
#[async_trait]
pub trait HostFetcher: Send + Sync {
    /// system.metrics, system.events and system.asynchronous_metrics
    async fn fetch_metrics(&self) -> FetchResult<Vec<MetricRow>>;

    /// Part statistics grouped by table
    async fn fetch_parts(&self) -> FetchResult<Vec<PartRow>>;

    async fn fetch_replicas(&self) -> FetchResult<Vec<ReplicaRow>>;

    /// Unfinished mutations grouped by table
    async fn fetch_mutations(&self) -> FetchResult<Vec<MutationRow>>;

    async fn fetch_disks(&self) -> FetchResult<Vec<DiskRow>>;

    async fn fetch_detached_parts(&self) -> FetchResult<Vec<DetachedPartRow>>;
}

/// Builds a fetcher for a resolved host endpoint
pub trait FetcherFactory: Send + Sync {
    fn fetcher_for(&self, endpoint: &EndpointParams) -> Arc<dyn HostFetcher>;
}

/// Run the fetch for `category`, tagging the rows with their category
pub fn fetch_category(
    fetcher: Arc<dyn HostFetcher>,
    category: Category,
) -> BoxFuture<'static, FetchResult<CategoryRows>> {
    async move {
        let rows = match category {
            Category::Metrics => CategoryRows::Metrics(fetcher.fetch_metrics().await?),
            Category::Parts => CategoryRows::Parts(fetcher.fetch_parts().await?),
            Category::Replicas => CategoryRows::Replicas(fetcher.fetch_replicas().await?),
            Category::Mutations => CategoryRows::Mutations(fetcher.fetch_mutations().await?),
            Category::Disks => CategoryRows::Disks(fetcher.fetch_disks().await?),
            Category::DetachedParts => {
                CategoryRows::DetachedParts(fetcher.fetch_detached_parts().await?)
            }
        };
        Ok(rows)
    }
    .boxed()
}
