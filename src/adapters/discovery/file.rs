use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::Installation;
use crate::ports::{DiscoveryError, ResourceSource};

#[derive(Debug, Default, Deserialize)]
struct InstallationFile {
    #[serde(default)]
    installation: Vec<Installation>,
}

/// Parse a TOML document made of `[[installation]]` tables
pub fn parse_installations(content: &str) -> Result<Vec<Installation>, DiscoveryError> {
    toml::from_str::<InstallationFile>(content)
        .map(|file| file.installation)
        .map_err(|e| DiscoveryError::Parse(e.to_string()))
}

/// Installation listing backed by a TOML file, re-read on every call
#[derive(Debug, Clone)]
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResourceSource for TomlFileSource {
    async fn list(&self) -> Result<Vec<Installation>, DiscoveryError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let installations = parse_installations(&content)?;
        debug!(path = %self.path.display(), count = installations.len(), "Read installations");
        Ok(installations)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
[[installation]]
namespace = "prod"
name = "events"
labels = { team = "analytics" }

[[installation.cluster]]
name = "main"
shards = 2
replicas = 2
ports = { http = 8124 }

[[installation]]
namespace = "prod"
name = "legacy"
stopped = true

[[installation.cluster]]
name = "single"

[[installation.cluster.host]]
hostname = "ch-legacy.internal"
httpPort = 8123
"#;

    #[test]
    fn test_parse_installations() {
        let installations = parse_installations(SAMPLE).unwrap();
        assert_eq!(installations.len(), 2);

        let events = &installations[0];
        assert_eq!(events.labels.get("team").map(String::as_str), Some("analytics"));
        assert_eq!(events.clusters[0].shards, Some(2));
        assert_eq!(events.clusters[0].ports.http, Some(8124));

        let legacy = &installations[1];
        assert!(legacy.is_stopped());
        assert_eq!(legacy.clusters[0].hosts[0].hostname, "ch-legacy.internal");
        assert_eq!(legacy.clusters[0].hosts[0].http_port, Some(8123));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_installations("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_installations("[[installation]\nname = 1").unwrap_err();
        assert!(matches!(err, DiscoveryError::Parse(_)));
    }

    #[tokio::test]
    async fn test_list_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = TomlFileSource::new(file.path());
        let installations = source.list().await.unwrap();
        assert_eq!(installations.len(), 2);
    }

    #[tokio::test]
    async fn test_list_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = TomlFileSource::new(dir.path().join("absent.toml"));
        assert!(matches!(source.list().await, Err(DiscoveryError::Io(_))));
    }
}
