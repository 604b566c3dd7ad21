//! Server address validation and request URL construction.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::error::{Error, Result};

/// Splits `scheme://[userinfo@]host[:port][rest]`. Bracketed IPv6 hosts are
/// allowed; userinfo is captured only so it can be rejected.
static ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:(?P<userinfo>[^\s/?#@]+)@)?(?P<host>\[[0-9A-Fa-f:.]+\]|[^\s/?#@:\[\]]+)(?::(?P<port>[0-9]+))?(?P<rest>.*)$",
    )
    .expect("Invalid server address regex")
});

/// Fully resolved location of a PQL service namespace.
///
/// An endpoint always carries an explicit port. Query requests go to
/// `{scheme}://{host}:{port}/{namespace}/{version}/query`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
    namespace: String,
    version: String,
    base: Url,
}

impl Endpoint {
    /// Validate `server_address` and combine it with a namespace and version.
    ///
    /// `http://` is assumed when the address has no scheme. The address must
    /// name a port (`localhost:8080`, `https://[::1]:8443`); anything after
    /// the port other than a single `/` is rejected.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the port is missing or invalid, the scheme is
    /// not http(s), the address carries credentials, or it has a path.
    pub fn build(
        server_address: &str,
        namespace: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let trimmed = server_address.trim();
        let address = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let caps = ADDRESS_REGEX.captures(&address).ok_or_else(|| {
            Error::Config(format!("invalid server address '{}'", server_address))
        })?;

        let scheme = caps["scheme"].to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(Error::Config(format!(
                "unsupported scheme '{}' in server address '{}'",
                scheme, server_address
            )));
        }

        if caps.name("userinfo").is_some() {
            return Err(Error::Config(format!(
                "credentials are not supported in server address '{}'",
                server_address
            )));
        }

        let port = match caps.name("port") {
            Some(p) => parse_port(p.as_str(), server_address)?,
            None => {
                return Err(Error::Config(format!(
                    "missing port in server address '{}'",
                    server_address
                )));
            }
        };

        let rest = &caps["rest"];
        if !rest.is_empty() && rest != "/" {
            return Err(Error::Config(format!(
                "unexpected '{}' after port in server address '{}'",
                rest, server_address
            )));
        }

        let host = caps["host"].to_string();
        let base = Url::parse(&format!("{}://{}:{}/", scheme, host, port)).map_err(|e| {
            Error::Config(format!("invalid server address '{}': {}", server_address, e))
        })?;

        Ok(Self {
            scheme,
            host,
            port,
            namespace: namespace.into(),
            version: version.into(),
            base,
        })
    }

    /// URL scheme, `http` or `https`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name or address as given (IPv6 hosts keep their brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Service namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// API version, e.g. `v1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// `{scheme}://{host}:{port}/`
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Same server, different namespace.
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..self.clone()
        }
    }

    /// Same server and namespace, different API version.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    /// URL of a resource under `/{namespace}/{version}/`.
    pub fn resource_url(&self, resource: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/{}/{}/{}", self.namespace, self.version, resource));
        url
    }

    /// `{scheme}://{host}:{port}/{namespace}/{version}/query`
    pub fn query_url(&self) -> Url {
        self.resource_url("query")
    }

    /// Server-wide schema listing every namespace and version.
    pub fn describe_all_url(&self) -> Url {
        let mut url = self.base.clone();
        url.set_path("/describe-all");
        url
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}://{}:{}/{}/{}/query",
            self.scheme, self.host, self.port, self.namespace, self.version
        )
    }
}

fn parse_port(digits: &str, server_address: &str) -> Result<u16> {
    match digits.parse::<u16>() {
        Ok(port) if port > 0 && digits.len() <= 5 => Ok(port),
        _ => Err(Error::Config(format!(
            "invalid port '{}' in server address '{}'",
            digits, server_address
        ))),
    }
}
