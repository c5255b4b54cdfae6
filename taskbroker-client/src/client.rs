//! The task client: fetches work from the broker fleet and routes status
//! reports back to the replica that issued each task.

use crate::{
    BrokerService, GrpcConnector, HostAddress, HostPool, HostSelector, Outcome, TaskAffinity,
    TaskBroker, TaskClientBuilder, TaskClientError,
};
use broker_proto::pb::{
    FetchNextTask, GetTaskRequest, GetTaskResponse, SetTaskStatusRequest, TaskActivation,
    TaskActivationStatus,
};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tonic::Code;

/// Load balances task fetches across a fixed set of broker replicas while
/// keeping every status report pinned to the replica that leased the task.
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     use broker_proto::pb::TaskActivationStatus;
///     use taskbroker_client::TaskClient;
///
///     let mut client = TaskClient::builder("taskbroker:50051")
///         .replicas(3)
///         .build()
///         .await?;
///
///     if let Some(task) = client.fetch(Some("default")).await? {
///         client
///             .report_status(&task.id, TaskActivationStatus::Complete, None)
///             .await?;
///     }
///     Ok(())
/// }
/// ```
///
/// Operations take `&mut self` and are meant to be driven sequentially. Use
/// [`TaskClient::into_shared`] to share one client between tasks.
pub struct TaskClient<B> {
    pool: HostPool<B>,
    selector: HostSelector,
    affinity: TaskAffinity,
}

impl TaskClient<crate::GrpcBroker> {
    /// Start configuring a `TaskClient` for the broker fleet at `service`, e.g.
    /// `"taskbroker:50051"`.
    ///
    /// Replica `i` is contacted at `taskbroker-<i>:50051`.
    pub fn builder<S>(service: S) -> TaskClientBuilder<GrpcConnector, S>
    where
        S: TryInto<BrokerService>,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
    {
        TaskClientBuilder::new_with_service(service)
    }
}

impl<B: TaskBroker> TaskClient<B> {
    pub(crate) fn from_parts(pool: HostPool<B>, selector: HostSelector) -> Self {
        Self {
            pool,
            selector,
            affinity: TaskAffinity::new(),
        }
    }

    /// Lease the next task from the current host.
    ///
    /// Returns `Ok(None)` when the host has nothing pending, which also moves
    /// subsequent fetches to another host. Transport errors are returned
    /// unchanged; the client never retries.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch(
        &mut self,
        namespace: Option<&str>,
    ) -> Result<Option<TaskActivation>, TaskClientError> {
        let now = Instant::now();
        self.selector.rotate_if_due(now);
        let host = self.selector.current(now).clone();
        let broker = self
            .pool
            .broker_mut(&host)
            .ok_or_else(|| TaskClientError::UnknownHost { host: host.clone() })?;

        let request = GetTaskRequest {
            namespace: namespace.map(str::to_owned),
        };
        let result = broker.get_task(request).await;
        let now = Instant::now();

        match result {
            Ok(GetTaskResponse { task: Some(task) }) => {
                self.affinity.record(task.id.clone(), host);
                self.selector.note_fetch_attempted();
                self.selector.note_outcome(Outcome::Success, now);
                Ok(Some(task))
            }
            Ok(GetTaskResponse { task: None }) => {
                tracing::debug!(%host, "broker returned an empty lease");
                self.selector.note_fetch_attempted();
                self.selector.note_outcome(Outcome::NotFound, now);
                Ok(None)
            }
            Err(status) => match status.code() {
                Code::NotFound => {
                    tracing::debug!(%host, "no pending task");
                    self.selector.note_fetch_attempted();
                    self.selector.note_outcome(Outcome::NotFound, now);
                    Ok(None)
                }
                Code::Unavailable => {
                    self.selector.note_fetch_attempted();
                    self.selector.note_outcome(Outcome::Unavailable, now);
                    Err(TaskClientError::Transport { host, status })
                }
                _ => {
                    self.selector.note_outcome(Outcome::OtherError, now);
                    Err(TaskClientError::Transport { host, status })
                }
            },
        }
    }

    /// Report `status` for `task_id` to the host that leased it.
    ///
    /// With `fetch_next` set, the same call may lease the next task from that
    /// host, which is then returned. A task the host no longer holds is
    /// forgotten and yields `Ok(None)`.
    #[tracing::instrument(level = "debug", skip(self, fetch_next))]
    pub async fn report_status(
        &mut self,
        task_id: &str,
        status: TaskActivationStatus,
        fetch_next: Option<FetchNextTask>,
    ) -> Result<Option<TaskActivation>, TaskClientError> {
        let host = match self.affinity.host_for(task_id) {
            Some(host) => host.clone(),
            None => {
                return Err(TaskClientError::UnknownTask {
                    task_id: task_id.to_owned(),
                })
            }
        };

        if !self.selector.availability().is_available(&host, Instant::now()) {
            tracing::warn!(%host, task_id, "not reporting status, broker host is cooling down");
            return Err(TaskClientError::HostTemporarilyUnavailable { host });
        }

        let broker = self
            .pool
            .broker_mut(&host)
            .ok_or_else(|| TaskClientError::UnknownHost { host: host.clone() })?;

        let request = SetTaskStatusRequest {
            id: task_id.to_owned(),
            status: status.into(),
            fetch_next_task: fetch_next,
        };

        match broker.set_task_status(request).await {
            Ok(response) => {
                self.affinity.forget(task_id);
                match response.task {
                    Some(next) => {
                        self.affinity.record(next.id.clone(), host);
                        Ok(Some(next))
                    }
                    None => Ok(None),
                }
            }
            Err(error) if error.code() == Code::NotFound => {
                tracing::debug!(%host, task_id, "broker no longer holds task");
                self.affinity.forget(task_id);
                self.selector.rotate(Instant::now());
                Ok(None)
            }
            Err(error) => Err(TaskClientError::Transport {
                host,
                status: error,
            }),
        }
    }

    /// Wrap the client so it can be shared between tasks.
    pub fn into_shared(self) -> SharedTaskClient<B> {
        SharedTaskClient {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

impl<B> TaskClient<B> {
    /// Every replica address, in index order.
    pub fn hosts(&self) -> &[HostAddress] {
        self.pool.hosts()
    }

    /// The host new fetches go to, once one has been picked.
    pub fn current_host(&self) -> Option<&HostAddress> {
        self.selector.current_host()
    }

    pub fn consecutive_unavailable(&self) -> usize {
        self.selector.consecutive_unavailable()
    }

    pub fn fetches_since_rotation(&self) -> usize {
        self.selector.fetches_since_rotation()
    }

    /// Whether `host` is outside its cool-down window right now.
    pub fn is_host_available(&self, host: &HostAddress) -> bool {
        self.selector.availability().is_available(host, Instant::now())
    }

    /// Tasks fetched but not yet terminally reported.
    pub fn in_flight(&self) -> &TaskAffinity {
        &self.affinity
    }

    /// The host that leased `task_id`, if it is in flight.
    pub fn host_for(&self, task_id: &str) -> Option<&HostAddress> {
        self.affinity.host_for(task_id)
    }
}

/// A cheaply cloneable [`TaskClient`] behind a single async mutex.
///
/// Each operation holds the lock for its whole duration, including the
/// broker call, so host selection and affinity updates never interleave.
pub struct SharedTaskClient<B> {
    inner: Arc<Mutex<TaskClient<B>>>,
}

impl<B> Clone for SharedTaskClient<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: TaskBroker> SharedTaskClient<B> {
    /// See [`TaskClient::fetch`].
    pub async fn fetch(
        &self,
        namespace: Option<&str>,
    ) -> Result<Option<TaskActivation>, TaskClientError> {
        self.inner.lock().await.fetch(namespace).await
    }

    /// See [`TaskClient::report_status`].
    pub async fn report_status(
        &self,
        task_id: &str,
        status: TaskActivationStatus,
        fetch_next: Option<FetchNextTask>,
    ) -> Result<Option<TaskActivation>, TaskClientError> {
        self.inner
            .lock()
            .await
            .report_status(task_id, status, fetch_next)
            .await
    }

    /// Exclusive access to the underlying client.
    pub async fn lock(&self) -> MutexGuard<'_, TaskClient<B>> {
        self.inner.lock().await
    }
}
