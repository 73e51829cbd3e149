use serde::{Deserialize, Serialize};

/// Returns the port when it carries a concrete value.
///
/// Zero is treated the same as an absent port.
pub fn assigned_port(port: Option<u16>) -> Option<u16> {
    port.filter(|p| *p != 0)
}

/// A single monitored ClickHouse endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedHost {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,
}

impl WatchedHost {
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            name: hostname.clone(),
            hostname,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    pub fn with_https_port(mut self, port: u16) -> Self {
        self.https_port = Some(port);
        self
    }

    pub fn with_tcp_port(mut self, port: u16) -> Self {
        self.tcp_port = Some(port);
        self
    }

    pub fn with_tls_port(mut self, port: u16) -> Self {
        self.tls_port = Some(port);
        self
    }

    /// Plaintext HTTP port, if one is assigned
    pub fn plaintext_port(&self) -> Option<u16> {
        assigned_port(self.http_port)
    }

    /// Secure HTTPS port, if one is assigned
    pub fn secure_port(&self) -> Option<u16> {
        assigned_port(self.https_port)
    }

    pub fn is_valid(&self) -> bool {
        !self.hostname.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_port_is_unassigned() {
        let host = WatchedHost::new("h1").with_http_port(0).with_https_port(8443);
        assert_eq!(host.plaintext_port(), None);
        assert_eq!(host.secure_port(), Some(8443));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let host: WatchedHost =
            serde_json::from_str(r#"{"hostname":"h1","httpPort":8123,"tcpPort":9000}"#).unwrap();
        assert_eq!(host.hostname, "h1");
        assert_eq!(host.http_port, Some(8123));
        assert_eq!(host.tcp_port, Some(9000));
        assert_eq!(host.https_port, None);
    }
}
