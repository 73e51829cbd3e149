use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{ChScheme, ClusterConnectionParams};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub metrics_port: u16,
    pub metrics_path: String,
    pub control_port: u16,
    pub control_path: String,
    pub collection_timeout: Duration,
    pub discovery_interval: Duration,
    pub discovery_file: Option<PathBuf>,
    pub ch_scheme: ChScheme,
    pub ch_port: u16,
    pub ch_username: String,
    pub ch_password: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            metrics_port: parse_var(lookup("CHIMON_METRICS_PORT")).unwrap_or(8888),
            metrics_path: route_path(lookup("CHIMON_METRICS_PATH"), "/metrics"),
            control_port: parse_var(lookup("CHIMON_CONTROL_PORT")).unwrap_or(8888),
            control_path: route_path(lookup("CHIMON_CONTROL_PATH"), "/chi"),
            collection_timeout: Duration::from_secs(parse_var(lookup("CHIMON_COLLECTION_TIMEOUT")).unwrap_or(30)),
            discovery_interval: Duration::from_secs(parse_var(lookup("CHIMON_DISCOVERY_INTERVAL")).unwrap_or(60)),
            discovery_file: lookup("CHIMON_DISCOVERY_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            ch_scheme: parse_var(lookup("CHIMON_CH_SCHEME")).unwrap_or_default(),
            ch_port: parse_var(lookup("CHIMON_CH_PORT")).unwrap_or(8123),
            ch_username: lookup("CHIMON_CH_USERNAME").unwrap_or_default(),
            ch_password: lookup("CHIMON_CH_PASSWORD").unwrap_or_default(),
            log_level: lookup("CHIMON_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn connection_params(&self) -> ClusterConnectionParams {
        ClusterConnectionParams::new(self.ch_scheme, self.ch_port)
            .with_credentials(self.ch_username.clone(), self.ch_password.clone())
    }

    /// Metrics and control share one listener
    pub fn single_listener(&self) -> bool {
        self.metrics_port == self.control_port
    }

    pub fn discovery_enabled(&self) -> bool {
        self.discovery_file.is_some() && !self.discovery_interval.is_zero()
    }
}

fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|s| s.trim().parse().ok())
}

fn route_path(value: Option<String>, default: &str) -> String {
    match value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(path) if path.starts_with('/') => path,
        Some(path) => format!("/{}", path),
        None => default.to_string(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("metrics_port", &self.metrics_port)
            .field("metrics_path", &self.metrics_path)
            .field("control_port", &self.control_port)
            .field("control_path", &self.control_path)
            .field("collection_timeout", &self.collection_timeout)
            .field("discovery_interval", &self.discovery_interval)
            .field("discovery_file", &self.discovery_file)
            .field("ch_scheme", &self.ch_scheme)
            .field("ch_port", &self.ch_port)
            .field("ch_username", &self.ch_username)
            .field("ch_password", &"***")
            .field("log_level", &self.log_level)
            .finish()
    }
}
