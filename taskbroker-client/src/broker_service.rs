use anyhow::Context;
use std::fmt;

/// Address of a single broker replica, e.g. `broker-2:50051`.
///
/// Addresses are derived once from a [`BrokerService`] and never change for
/// the lifetime of a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostAddress(String);

impl HostAddress {
    /// The address as a `host:port` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HostAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for HostAddress {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for HostAddress {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Defines the broker fleet by the `hostname` and `port` shared by every replica.
///
/// Replica `i` is reachable at `<hostname>-<i>:<port>`.
#[derive(Debug, Clone)]
pub struct BrokerService {
    /// The base hostname, without a replica suffix.
    hostname: String,
    /// The port every replica listens on.
    port: u16,
}

impl BrokerService {
    /// Create a [`BrokerService`] from a `hostname` and `port`.
    ///
    /// This function will fail if the `hostname` is not a valid domain name.
    pub fn from_parts<T: ToString>(hostname: T, port: u16) -> Result<Self, anyhow::Error> {
        let hostname = hostname.to_string();

        if hostname.is_empty() {
            anyhow::bail!("invalid 'hostname': hostname is empty");
        }
        hickory_resolver::Name::from_ascii(&hostname)
            .map_err(anyhow::Error::from)
            .context("invalid 'hostname'")?;

        Ok(Self { hostname, port })
    }

    /// Get the `hostname` part of a `BrokerService`.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get the `port` part of a `BrokerService`.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The address of the replica with zero-based index `index`.
    pub fn replica(&self, index: usize) -> HostAddress {
        HostAddress(format!("{}-{}:{}", self.hostname, index, self.port))
    }

    /// The addresses of `count` replicas, in index order.
    ///
    /// A single replica still carries the `-0` suffix.
    pub fn replicas(&self, count: usize) -> Vec<HostAddress> {
        (0..count).map(|index| self.replica(index)).collect()
    }
}

/// ```
/// let service = taskbroker_client::BrokerService::try_from("localhost:50051").unwrap();
/// assert_eq!(service.hostname(), "localhost");
/// assert_eq!(service.port(), 50051);
/// ```
impl TryFrom<&str> for BrokerService {
    type Error = anyhow::Error;

    fn try_from(address: &str) -> Result<Self, Self::Error> {
        let (hostname, port) = address
            .rsplit_once(':')
            .with_context(|| format!("broker address {address:?} is not of the form host:port"))?;
        let port = port
            .parse::<u16>()
            .with_context(|| format!("invalid 'port' in broker address {address:?}"))?;

        Self::from_parts(hostname, port)
    }
}

impl TryFrom<String> for BrokerService {
    type Error = anyhow::Error;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        Self::try_from(address.as_str())
    }
}

/// ```
/// let service = taskbroker_client::BrokerService::try_from(("localhost", 50051)).unwrap();
/// assert_eq!(service.replica(3).as_str(), "localhost-3:50051");
/// ```
impl TryFrom<(&str, u16)> for BrokerService {
    type Error = anyhow::Error;

    fn try_from((hostname, port): (&str, u16)) -> Result<Self, Self::Error> {
        Self::from_parts(hostname, port)
    }
}

impl TryFrom<(String, u16)> for BrokerService {
    type Error = anyhow::Error;

    fn try_from((hostname, port): (String, u16)) -> Result<Self, Self::Error> {
        Self::from_parts(hostname, port)
    }
}
