use crate::HostAddress;
use tonic::{Code, Status};

/// Errors surfaced by [`TaskClient`](crate::TaskClient) operations.
///
/// An empty queue or a task the broker no longer holds are not errors; both
/// come back as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum TaskClientError {
    /// A status was reported for a task this client never fetched, or has
    /// already finalized. No call was made.
    #[error("task {task_id} is not in flight on any broker host")]
    UnknownTask { task_id: String },

    /// The host that issued the task is cooling down. No call was made and
    /// the task is still in flight; retry later.
    #[error("Host: {host} is temporarily unavailable")]
    HostTemporarilyUnavailable { host: HostAddress },

    /// The broker call failed. The status is passed through unchanged.
    #[error("broker call to {host} failed: {status}")]
    Transport {
        host: HostAddress,
        #[source]
        status: Status,
    },

    /// A host outside the connected pool was selected.
    #[error("no broker connection for host {host}")]
    UnknownHost { host: HostAddress },
}

impl TaskClientError {
    /// The transport status, if the error came from a broker call.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::Transport { status, .. } => Some(status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<Code> {
        self.status().map(Status::code)
    }

    /// The broker host the error concerns, if any.
    pub fn host(&self) -> Option<&HostAddress> {
        match self {
            Self::HostTemporarilyUnavailable { host }
            | Self::Transport { host, .. }
            | Self::UnknownHost { host } => Some(host),
            Self::UnknownTask { .. } => None,
        }
    }

    /// Whether the broker could not be reached.
    pub fn is_unavailable(&self) -> bool {
        self.code() == Some(Code::Unavailable)
    }
}
