use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{
    DetachedPartRow, DiskRow, EndpointParams, MetricKind, MetricRow, MutationRow, PartRow,
    ReplicaRow,
};
use crate::ports::{FetchError, FetchResult, FetcherFactory, HostFetcher};

const QUERY_METRICS: &str = r#"
    SELECT metric, toFloat64(value) AS value, description, 'gauge' AS kind FROM system.metrics
    UNION ALL
    SELECT metric, toFloat64(value) AS value, '' AS description, 'gauge' AS kind FROM system.asynchronous_metrics
    UNION ALL
    SELECT event AS metric, toFloat64(value) AS value, description, 'counter' AS kind FROM system.events
"#;

const QUERY_PARTS: &str = r#"
    SELECT
        database,
        table,
        toUInt8(active) AS active,
        uniq(partition) AS partitions,
        count() AS parts,
        sum(bytes_on_disk) AS bytes,
        sum(data_uncompressed_bytes) AS uncompressed_bytes,
        sum(rows) AS rows
    FROM system.parts
    GROUP BY database, table, active
"#;

const QUERY_REPLICAS: &str = r#"
    SELECT database, table, toUInt8(is_session_expired) AS is_session_expired
    FROM system.replicas
"#;

const QUERY_MUTATIONS: &str = r#"
    SELECT database, table, count() AS mutations, sum(parts_to_do) AS parts_to_do
    FROM system.mutations
    WHERE is_done = 0
    GROUP BY database, table
"#;

const QUERY_DISKS: &str = r#"
    SELECT name AS disk, free_space, total_space
    FROM system.disks
"#;

const QUERY_DETACHED_PARTS: &str = r#"
    SELECT database, table, disk, ifNull(reason, '') AS reason, count() AS count
    FROM system.detached_parts
    GROUP BY database, table, disk, reason
"#;

#[derive(Debug, Deserialize)]
struct RawMetric {
    metric: String,
    value: Option<f64>,
    #[serde(default)]
    description: String,
    kind: MetricKind,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    database: String,
    table: String,
    active: u8,
    partitions: u64,
    parts: u64,
    bytes: u64,
    uncompressed_bytes: u64,
    rows: u64,
}

#[derive(Debug, Deserialize)]
struct RawReplica {
    database: String,
    table: String,
    is_session_expired: u8,
}

/// Decode a `JSONEachRow` response body
pub fn parse_json_each_row<T: DeserializeOwned>(body: &str) -> FetchResult<Vec<T>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| FetchError::Decode(e.to_string())))
        .collect()
}

/// Fetcher talking to one host over the ClickHouse HTTP interface
pub struct ClickHouseFetcher {
    client: reqwest::Client,
    endpoint: EndpointParams,
}

impl ClickHouseFetcher {
    pub fn new(client: reqwest::Client, endpoint: EndpointParams) -> Self {
        Self { client, endpoint }
    }

    async fn query<T: DeserializeOwned>(&self, sql: &str) -> FetchResult<Vec<T>> {
        let url = format!(
            "{}?output_format_json_quote_64bit_integers=0",
            self.endpoint.url()
        );
        let mut request = self
            .client
            .post(url)
            .body(format!("{} FORMAT JSONEachRow", sql.trim()));
        if !self.endpoint.username.is_empty() {
            request = request
                .header("X-ClickHouse-User", &self.endpoint.username)
                .header("X-ClickHouse-Key", &self.endpoint.password);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        parse_json_each_row(&body)
    }
}

#[async_trait]
impl HostFetcher for ClickHouseFetcher {
    async fn fetch_metrics(&self) -> FetchResult<Vec<MetricRow>> {
        let rows: Vec<RawMetric> = self.query(QUERY_METRICS).await?;
        Ok(rows
            .into_iter()
            .filter_map(|raw| {
                // NaN and infinities come back as null
                raw.value.map(|value| MetricRow {
                    metric: raw.metric,
                    value,
                    description: raw.description,
                    kind: raw.kind,
                })
            })
            .collect())
    }

    async fn fetch_parts(&self) -> FetchResult<Vec<PartRow>> {
        let rows: Vec<RawPart> = self.query(QUERY_PARTS).await?;
        Ok(rows
            .into_iter()
            .map(|raw| PartRow {
                database: raw.database,
                table: raw.table,
                active: raw.active != 0,
                partitions: raw.partitions,
                parts: raw.parts,
                bytes: raw.bytes,
                uncompressed_bytes: raw.uncompressed_bytes,
                rows: raw.rows,
            })
            .collect())
    }

    async fn fetch_replicas(&self) -> FetchResult<Vec<ReplicaRow>> {
        let rows: Vec<RawReplica> = self.query(QUERY_REPLICAS).await?;
        Ok(rows
            .into_iter()
            .map(|raw| ReplicaRow {
                database: raw.database,
                table: raw.table,
                is_session_expired: raw.is_session_expired != 0,
            })
            .collect())
    }

    async fn fetch_mutations(&self) -> FetchResult<Vec<MutationRow>> {
        self.query(QUERY_MUTATIONS).await
    }

    async fn fetch_disks(&self) -> FetchResult<Vec<DiskRow>> {
        self.query(QUERY_DISKS).await
    }

    async fn fetch_detached_parts(&self) -> FetchResult<Vec<DetachedPartRow>> {
        self.query(QUERY_DETACHED_PARTS).await
    }
}

/// Hands out per-endpoint fetchers sharing one HTTP client
#[derive(Debug, Clone)]
pub struct ClickHouseFetcherFactory {
    client: reqwest::Client,
}

impl ClickHouseFetcherFactory {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chimon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl FetcherFactory for ClickHouseFetcherFactory {
    fn fetcher_for(&self, endpoint: &EndpointParams) -> Arc<dyn HostFetcher> {
        Arc::new(ClickHouseFetcher::new(self.client.clone(), endpoint.clone()))
    }
}
