pub mod clickhouse;
pub mod discovery;
pub mod prometheus;

pub use clickhouse::{ClickHouseFetcher, ClickHouseFetcherFactory};
pub use discovery::{InstallationNormalizer, TomlFileSource};
pub use self::prometheus::PrometheusWriter;
