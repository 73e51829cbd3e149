mod client;

pub use client::{parse_json_each_row, ClickHouseFetcher, ClickHouseFetcherFactory};
