//! Defines the interface [`TaskClient`](crate::TaskClient) uses to talk to a
//! single broker replica, and its gRPC implementation.

use crate::{HostAddress, RequestSigner};
use anyhow::Context as _;
use broker_proto::pb::consumer_service_client::ConsumerServiceClient;
use broker_proto::pb::{GetTaskRequest, GetTaskResponse, SetTaskStatusRequest, SetTaskStatusResponse};
use broker_proto::{GET_TASK_PATH, SET_TASK_STATUS_PATH};
use tokio::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

/// The two unary calls a broker replica serves.
///
/// A `NotFound` status means the replica has nothing for us (empty queue, or
/// a task it no longer holds), `Unavailable` means it could not be reached.
#[async_trait::async_trait]
pub trait TaskBroker: Send {
    /// Lease the next pending task, optionally restricted to a namespace.
    async fn get_task(&mut self, request: GetTaskRequest)
        -> Result<GetTaskResponse, tonic::Status>;

    /// Report a task's status, optionally leasing the next task in the same call.
    async fn set_task_status(
        &mut self,
        request: SetTaskStatusRequest,
    ) -> Result<SetTaskStatusResponse, tonic::Status>;
}

/// Creates the [`TaskBroker`] handle for one replica.
///
/// Called once per replica when a [`TaskClient`](crate::TaskClient) is built.
#[async_trait::async_trait]
pub trait BrokerConnector {
    type Broker: TaskBroker;

    async fn connect(&self, host: &HostAddress) -> Result<Self::Broker, anyhow::Error>;
}

/// Implements [`BrokerConnector`] by opening a tonic [`Channel`] to each replica.
#[derive(Debug, Clone, Default)]
pub struct GrpcConnector {
    tls_config: Option<ClientTlsConfig>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    shared_secrets: Vec<String>,
}

impl GrpcConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use tls for every replica connection.
    pub fn with_tls(self, tls_config: ClientTlsConfig) -> Self {
        Self {
            tls_config: Some(tls_config),
            ..self
        }
    }

    /// Set a request timeout applied to every replica `Endpoint`.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Set a connection timeout applied to every replica `Endpoint`.
    ///
    /// Defaults to the overall request `timeout` if not set.
    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(connect_timeout),
            ..self
        }
    }

    /// Sign every outbound request with the first of `secrets`.
    pub fn shared_secrets<I, T>(self, secrets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            shared_secrets: secrets.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    fn endpoint(&self, host: &HostAddress) -> Result<Endpoint, anyhow::Error> {
        let scheme = if self.tls_config.is_some() {
            "https"
        } else {
            "http"
        };
        let mut endpoint = Endpoint::from_shared(format!("{scheme}://{host}"))
            .with_context(|| format!("invalid broker endpoint {host}"))?;

        if let Some(timeout) = self.timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout.or(self.timeout) {
            endpoint = endpoint.connect_timeout(connect_timeout);
        }
        if let Some(tls_config) = self.tls_config.clone() {
            endpoint = endpoint
                .tls_config(tls_config)
                .context("failed to apply tls config")?;
        }

        Ok(endpoint)
    }

    fn broker(&self, channel: Channel) -> Result<GrpcBroker, anyhow::Error> {
        Ok(GrpcBroker {
            client: ConsumerServiceClient::new(channel),
            signer: RequestSigner::from_secrets(&self.shared_secrets)?,
        })
    }
}

#[async_trait::async_trait]
impl BrokerConnector for GrpcConnector {
    type Broker = GrpcBroker;

    #[tracing::instrument(level = "debug", skip(self))]
    async fn connect(&self, host: &HostAddress) -> Result<GrpcBroker, anyhow::Error> {
        let endpoint = self.endpoint(host)?;
        self.broker(endpoint.connect().await?)
    }
}

/// A [`TaskBroker`] backed by a long-lived tonic [`Channel`].
#[derive(Debug, Clone)]
pub struct GrpcBroker {
    client: ConsumerServiceClient<Channel>,
    signer: Option<RequestSigner>,
}

impl GrpcBroker {
    fn request<M: prost::Message>(
        &self,
        path: &str,
        message: M,
    ) -> Result<tonic::Request<M>, tonic::Status> {
        match &self.signer {
            Some(signer) => signer.signed_request(path, message),
            None => Ok(tonic::Request::new(message)),
        }
    }
}

#[async_trait::async_trait]
impl TaskBroker for GrpcBroker {
    async fn get_task(
        &mut self,
        request: GetTaskRequest,
    ) -> Result<GetTaskResponse, tonic::Status> {
        let request = self.request(GET_TASK_PATH, request)?;
        Ok(self.client.get_task(request).await?.into_inner())
    }

    async fn set_task_status(
        &mut self,
        request: SetTaskStatusRequest,
    ) -> Result<SetTaskStatusResponse, tonic::Status> {
        let request = self.request(SET_TASK_STATUS_PATH, request)?;
        Ok(self.client.set_task_status(request).await?.into_inner())
    }
}
