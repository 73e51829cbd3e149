pub mod cluster;
pub mod connection;
pub mod host;
pub mod installation;
pub mod metrics;
pub mod resource;
pub mod sample;

pub use cluster::WatchedCluster;
pub use connection::{ChScheme, ClusterConnectionParams, EndpointParams};
pub use host::{assigned_port, WatchedHost};
pub use installation::{Installation, InstallationCluster, PortOverrides};
pub use metrics::{
    Category, CategoryRows, DetachedPartRow, DiskRow, MetricKind, MetricRow, MutationRow, PartRow,
    ReplicaRow,
};
pub use resource::{LayoutError, ResourceKey, WatchedResource};
pub use sample::{sanitize_metric_name, Descriptor, Sample, SampleKind};
