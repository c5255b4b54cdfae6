//! One long-lived broker connection per replica, created eagerly.

use crate::{BrokerConnector, BrokerService, HostAddress};
use anyhow::Context as _;
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed arena of broker handles indexed by [`HostAddress`].
///
/// The pool is filled exactly once in [`HostPool::connect`] and never resized.
pub struct HostPool<B> {
    hosts: Arc<[HostAddress]>,
    brokers: HashMap<HostAddress, B>,
}

impl<B> HostPool<B> {
    /// Derive `replicas` addresses from `service` and connect to every one of them.
    ///
    /// Fails if any single replica cannot be connected; no partial pool is returned.
    pub async fn connect<C>(
        service: &BrokerService,
        replicas: usize,
        connector: &C,
    ) -> Result<Self, anyhow::Error>
    where
        C: BrokerConnector<Broker = B>,
    {
        let hosts = service.replicas(replicas);
        let mut brokers = HashMap::with_capacity(hosts.len());

        for host in &hosts {
            let broker = connector
                .connect(host)
                .await
                .with_context(|| format!("failed to connect to broker replica {host}"))?;
            tracing::info!(%host, "connected to broker replica");
            brokers.insert(host.clone(), broker);
        }

        Ok(Self {
            hosts: hosts.into(),
            brokers,
        })
    }

    /// All replica addresses, in index order.
    pub fn hosts(&self) -> &Arc<[HostAddress]> {
        &self.hosts
    }

    /// The broker handle for `host`, if it belongs to this pool.
    pub fn broker_mut(&mut self, host: &HostAddress) -> Option<&mut B> {
        self.brokers.get_mut(host)
    }
}
