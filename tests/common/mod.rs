#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use chimon::application::{Exporter, Registry};
use chimon::domain::{
    ClusterConnectionParams, DetachedPartRow, DiskRow, EndpointParams, MetricRow, MutationRow,
    PartRow, ReplicaRow,
};
use chimon::interface::http::{create_router, AppState, Endpoints};
use chimon::ports::{FetchError, FetchResult, FetcherFactory, HostFetcher};

/// Fixed rows for every host; replicas fail on hosts whose name starts with `broken`
pub struct StaticFetcher {
    hostname: String,
}

#[async_trait]
impl HostFetcher for StaticFetcher {
    async fn fetch_metrics(&self) -> FetchResult<Vec<MetricRow>> {
        Ok(vec![MetricRow::gauge("Query", 3.0), MetricRow::counter("SelectQuery", 42.0)])
    }

    async fn fetch_parts(&self) -> FetchResult<Vec<PartRow>> {
        Ok(Vec::new())
    }

    async fn fetch_replicas(&self) -> FetchResult<Vec<ReplicaRow>> {
        if self.hostname.starts_with("broken") {
            return Err(FetchError::Status {
                status: 500,
                body: "replicas unavailable".into(),
            });
        }
        Ok(Vec::new())
    }

    async fn fetch_mutations(&self) -> FetchResult<Vec<MutationRow>> {
        Ok(Vec::new())
    }

    async fn fetch_disks(&self) -> FetchResult<Vec<DiskRow>> {
        Ok(vec![DiskRow {
            disk: "default".into(),
            free_space: 1024,
            total_space: 4096,
        }])
    }

    async fn fetch_detached_parts(&self) -> FetchResult<Vec<DetachedPartRow>> {
        Ok(Vec::new())
    }
}

pub struct StaticFactory;

impl FetcherFactory for StaticFactory {
    fn fetcher_for(&self, endpoint: &EndpointParams) -> Arc<dyn HostFetcher> {
        Arc::new(StaticFetcher {
            hostname: endpoint.hostname.clone(),
        })
    }
}

pub fn exporter(registry: Arc<Registry>) -> Arc<Exporter> {
    Arc::new(Exporter::new(
        registry,
        Arc::new(StaticFactory),
        ClusterConnectionParams::default(),
        Duration::from_secs(5),
    ))
}

pub fn app(registry: Arc<Registry>) -> Router {
    let exporter = exporter(registry);
    create_router(
        AppState::new(exporter),
        Endpoints {
            metrics: Some("/metrics"),
            control: Some("/chi"),
        },
    )
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let text = body_text(response).await;
    (status, serde_json::from_str(&text).unwrap())
}
