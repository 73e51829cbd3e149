pub mod fetcher;
pub mod metric_sink;
pub mod normalizer;
pub mod pull_collector;
pub mod resource_source;

pub use fetcher::{fetch_category, FetchError, FetchResult, FetcherFactory, HostFetcher};
pub use metric_sink::MetricSink;
pub use normalizer::{NormalizeError, Normalizer};
pub use pull_collector::PullCollector;
pub use resource_source::{DiscoveryError, ResourceSource};
