use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::WatchedHost;

/// Scheme used to reach a host's HTTP interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChScheme {
    /// Pick per host from whichever port it has assigned
    #[default]
    Auto,
    Http,
    Https,
}

impl ChScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for ChScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unknown scheme: {}", other)),
        }
    }
}

/// Cluster-wide connection settings that every host starts from
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterConnectionParams {
    pub scheme: ChScheme,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ClusterConnectionParams {
    pub fn new(scheme: ChScheme, port: u16) -> Self {
        Self {
            scheme,
            port,
            username: String::new(),
            password: String::new(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Adjust the base scheme/port with the ports the host has assigned.
    ///
    /// The base values are kept whenever the host has no applicable port.
    pub fn for_host(&self, host: &WatchedHost) -> EndpointParams {
        let mut scheme = self.scheme;
        let mut port = self.port;

        match self.scheme {
            ChScheme::Auto => {
                if let Some(p) = host.plaintext_port() {
                    scheme = ChScheme::Http;
                    port = p;
                } else if let Some(p) = host.secure_port() {
                    scheme = ChScheme::Https;
                    port = p;
                }
            }
            ChScheme::Http => {
                if let Some(p) = host.plaintext_port() {
                    port = p;
                }
            }
            ChScheme::Https => {
                if let Some(p) = host.secure_port() {
                    port = p;
                }
            }
        }

        EndpointParams {
            scheme,
            hostname: host.hostname.clone(),
            port,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for ClusterConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConnectionParams")
            .field("scheme", &self.scheme)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Default for ClusterConnectionParams {
    fn default() -> Self {
        Self::new(ChScheme::Auto, 8123)
    }
}

/// Fully resolved connection target for one host
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointParams {
    pub scheme: ChScheme,
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl EndpointParams {
    /// Base URL of the host's HTTP interface; an unresolved `auto` scheme renders as http
    pub fn url(&self) -> String {
        let scheme = match self.scheme {
            ChScheme::Https => "https",
            ChScheme::Auto | ChScheme::Http => "http",
        };
        format!("{}://{}:{}/", scheme, self.hostname, self.port)
    }
}

impl fmt::Debug for EndpointParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointParams")
            .field("url", &self.url())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_plaintext_port() {
        let base = ClusterConnectionParams::new(ChScheme::Auto, 8123);
        let host = WatchedHost::new("h1").with_http_port(18123).with_https_port(18443);
        let endpoint = base.for_host(&host);
        assert_eq!(endpoint.scheme, ChScheme::Http);
        assert_eq!(endpoint.url(), "http://h1:18123/");
    }

    #[test]
    fn test_auto_falls_back_to_secure_port() {
        let base = ClusterConnectionParams::new(ChScheme::Auto, 8123);
        let host = WatchedHost::new("h1").with_https_port(8443);
        let endpoint = base.for_host(&host);
        assert_eq!(endpoint.scheme, ChScheme::Https);
        assert_eq!(endpoint.url(), "https://h1:8443/");
    }

    #[test]
    fn test_auto_without_ports_keeps_base() {
        let base = ClusterConnectionParams::new(ChScheme::Auto, 8123);
        let endpoint = base.for_host(&WatchedHost::new("h1"));
        assert_eq!(endpoint.scheme, ChScheme::Auto);
        assert_eq!(endpoint.port, 8123);
        assert_eq!(endpoint.url(), "http://h1:8123/");
    }

    #[test]
    fn test_fixed_scheme_ignores_other_port() {
        let base = ClusterConnectionParams::new(ChScheme::Https, 8443);
        let host = WatchedHost::new("h1").with_http_port(8123);
        let endpoint = base.for_host(&host);
        assert_eq!(endpoint.scheme, ChScheme::Https);
        assert_eq!(endpoint.port, 8443);

        let base = ClusterConnectionParams::new(ChScheme::Http, 8123);
        let host = WatchedHost::new("h1").with_http_port(0).with_https_port(8443);
        assert_eq!(base.for_host(&host).port, 8123);
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("HTTPS".parse::<ChScheme>(), Ok(ChScheme::Https));
        assert!("ftp".parse::<ChScheme>().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let base = ClusterConnectionParams::default().with_credentials("monitor", "secret");
        assert!(!format!("{:?}", base).contains("secret"));
        assert!(!format!("{:?}", base.for_host(&WatchedHost::new("h1"))).contains("secret"));
    }
}
