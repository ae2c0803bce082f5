//! Host descriptor: immutable `(host, port)` identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a single cluster node or router process: host name and
/// optional port. Equality and ordering are lexicographic on both fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Host {
    pub host: String,
    pub port: Option<u16>,
}

impl Host {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
        }
    }

    pub fn without_port(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }

    #[cfg(test)]
    pub fn new_test(label: &str) -> Self {
        Self::new(label, 27017)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

impl TryFrom<&str> for Host {
    type Error = std::num::ParseIntError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.rsplit_once(':') {
            Some((host, port)) => Ok(Self {
                host: host.to_string(),
                port: Some(port.parse()?),
            }),
            None => Ok(Self {
                host: value.to_string(),
                port: None,
            }),
        }
    }
}
