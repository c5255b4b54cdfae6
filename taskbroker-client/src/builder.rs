//! Provides the builder that configures and connects a [`TaskClient`].

use crate::{
    BrokerConnector, BrokerService, GrpcConnector, HostPool, HostSelector, RandomSampler,
    RotationConfig, Sampler, TaskClient,
};
use anyhow::Context as _;
use tokio::time::Duration;
use tonic::transport::ClientTlsConfig;

/// Builder to configure and create a [`TaskClient`].
pub struct TaskClientBuilder<C, S> {
    service: S,
    replicas: usize,
    rotation: RotationConfig,
    sampler: Option<Box<dyn Sampler>>,
    connector: C,
}

impl<S> TaskClientBuilder<GrpcConnector, S>
where
    S: TryInto<BrokerService>,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    /// Set the [`BrokerService`] of the broker fleet, e.g. `"taskbroker:50051"`.
    ///
    /// Defaults to a single replica, connected over gRPC.
    pub fn new_with_service(service: S) -> TaskClientBuilder<GrpcConnector, S> {
        Self {
            service,
            replicas: 1,
            rotation: RotationConfig::default(),
            sampler: None,
            connector: GrpcConnector::new(),
        }
    }

    /// Set a custom [`BrokerConnector`].
    pub fn connector<T: BrokerConnector>(self, connector: T) -> TaskClientBuilder<T, S> {
        TaskClientBuilder {
            connector,
            service: self.service,
            replicas: self.replicas,
            rotation: self.rotation,
            sampler: self.sampler,
        }
    }

    /// Configure every replica connection to use tls.
    /// A `tls_config` MUST be specified to use the `HTTPS` scheme.
    pub fn with_tls(self, tls_config: ClientTlsConfig) -> Self {
        Self {
            connector: self.connector.with_tls(tls_config),
            ..self
        }
    }

    /// Set a request timeout that will be applied to every replica `Endpoint`.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            connector: self.connector.timeout(timeout),
            ..self
        }
    }

    /// Set a connection timeout that will be applied to every replica `Endpoint`.
    ///
    /// Defaults to the overall request `timeout` if not set.
    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        Self {
            connector: self.connector.connect_timeout(connect_timeout),
            ..self
        }
    }

    /// Sign every request with the first of `secrets`.
    ///
    /// The remaining secrets are accepted by brokers during rotation but never
    /// used for signing. An empty list disables signing.
    pub fn shared_secrets<I, T>(self, secrets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            connector: self.connector.shared_secrets(secrets),
            ..self
        }
    }
}

impl<C, S> TaskClientBuilder<C, S>
where
    C: BrokerConnector,
    S: TryInto<BrokerService>,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    /// Set the number of broker replicas. Default is 1.
    pub fn replicas(self, replicas: usize) -> Self {
        Self { replicas, ..self }
    }

    /// Set how many fetches one host serves before the client rotates to
    /// another. Default is 32.
    pub fn max_fetches_before_rotation(self, max_fetches: usize) -> Self {
        Self {
            rotation: RotationConfig {
                max_fetches_before_rotation: max_fetches,
                ..self.rotation
            },
            ..self
        }
    }

    /// Set how many unavailable errors in a row put a host in cool-down.
    /// Default is 3.
    pub fn max_consecutive_unavailable(self, max_errors: usize) -> Self {
        Self {
            rotation: RotationConfig {
                max_consecutive_unavailable: max_errors,
                ..self.rotation
            },
            ..self
        }
    }

    /// Set how long a host stays out of rotation once in cool-down.
    /// Default is 60 seconds.
    pub fn cooldown(self, cooldown: Duration) -> Self {
        Self {
            rotation: RotationConfig {
                cooldown,
                ..self.rotation
            },
            ..self
        }
    }

    /// Set the [`Sampler`] used to pick hosts.
    ///
    /// Defaults to a [`RandomSampler`] seeded from the operating system.
    pub fn sampler<T: Sampler + 'static>(self, sampler: T) -> Self {
        Self {
            sampler: Some(Box::new(sampler)),
            ..self
        }
    }

    /// Construct a [`TaskClient`], connecting to every replica up front.
    ///
    /// Fails if the configuration is invalid or any replica cannot be connected.
    pub async fn build(self) -> Result<TaskClient<C::Broker>, anyhow::Error> {
        let service: BrokerService = self
            .service
            .try_into()
            .map_err(Into::into)
            .map_err(|err| anyhow::anyhow!(err))
            .context("invalid broker address")?;

        if self.replicas == 0 {
            anyhow::bail!("'replicas' must be at least 1");
        }
        if self.rotation.max_fetches_before_rotation == 0 {
            anyhow::bail!("'max_fetches_before_rotation' must be at least 1");
        }
        if self.rotation.max_consecutive_unavailable == 0 {
            anyhow::bail!("'max_consecutive_unavailable' must be at least 1");
        }

        let pool = HostPool::connect(&service, self.replicas, &self.connector).await?;
        let sampler: Box<dyn Sampler> = match self.sampler {
            Some(sampler) => sampler,
            None => Box::new(RandomSampler::from_entropy()),
        };
        let selector = HostSelector::new(pool.hosts().clone(), self.rotation, sampler)?;

        Ok(TaskClient::from_parts(pool, selector))
    }
}

const _: () = {
    const fn assert_is_send<T: Send>() {}
    assert_is_send::<TaskClientBuilder<GrpcConnector, BrokerService>>();
    assert_is_send::<TaskClient<crate::GrpcBroker>>();
};
