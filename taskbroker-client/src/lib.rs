//! `taskbroker-client` load balances task fetches across a fixed fleet of
//! stateful broker replicas, and routes every status report back to the
//! replica that leased the task.
//!
//! Each replica keeps its own in-memory task state, so the client has to
//! remember which replica issued which task. New fetches are spread across
//! the fleet independently of that, and replicas that keep failing are taken
//! out of rotation for a while.
//!
//! # Simple example
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     use broker_proto::pb::{FetchNextTask, TaskActivationStatus};
//!     use taskbroker_client::TaskClient;
//!
//!     // Talks to taskbroker-0:50051 .. taskbroker-3:50051.
//!     let mut client = TaskClient::builder("taskbroker:50051")
//!         .replicas(4)
//!         .build()
//!         .await?;
//!
//!     let mut next = client.fetch(None).await?;
//!     while let Some(task) = next {
//!         // ... run the task ...
//!         next = client
//!             .report_status(
//!                 &task.id,
//!                 TaskActivationStatus::Complete,
//!                 Some(FetchNextTask { namespace: None }),
//!             )
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Rotation, cool-down and request signing are configured on the builder.
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     use std::time::Duration;
//!     use taskbroker_client::TaskClient;
//!
//!     let client = TaskClient::builder(("taskbroker", 50051))
//!         .replicas(3)
//!         .max_fetches_before_rotation(16)
//!         .max_consecutive_unavailable(3)
//!         .cooldown(Duration::from_secs(30))
//!         .shared_secrets(["current-secret", "previous-secret"])
//!         .connect_timeout(Duration::from_secs(5))
//!         .build()
//!         .await?;
//!     # drop(client);
//!     Ok(())
//! }
//! ```
//!
//! A different transport can be plugged in by implementing [`BrokerConnector`]
//! and [`TaskBroker`].
//!
//! ```rust
//! use broker_proto::pb::{GetTaskRequest, GetTaskResponse, SetTaskStatusRequest, SetTaskStatusResponse};
//! use taskbroker_client::{BrokerConnector, HostAddress, TaskBroker};
//!
//! // A broker that never has any work.
//! struct IdleBroker;
//!
//! #[async_trait::async_trait]
//! impl TaskBroker for IdleBroker {
//!     async fn get_task(&mut self, _: GetTaskRequest) -> Result<GetTaskResponse, tonic::Status> {
//!         Err(tonic::Status::not_found("no pending task found"))
//!     }
//!
//!     async fn set_task_status(
//!         &mut self,
//!         _: SetTaskStatusRequest,
//!     ) -> Result<SetTaskStatusResponse, tonic::Status> {
//!         Err(tonic::Status::not_found("no such task"))
//!     }
//! }
//!
//! struct IdleConnector;
//!
//! #[async_trait::async_trait]
//! impl BrokerConnector for IdleConnector {
//!     type Broker = IdleBroker;
//!
//!     async fn connect(&self, _host: &HostAddress) -> Result<IdleBroker, anyhow::Error> {
//!         Ok(IdleBroker)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     use taskbroker_client::TaskClient;
//!
//!     let mut client = TaskClient::builder("taskbroker:50051")
//!         .replicas(2)
//!         .connector(IdleConnector)
//!         .build()
//!         .await
//!         .expect("failed to build TaskClient");
//!
//!     assert!(client.fetch(None).await.unwrap().is_none());
//! }
//! ```
//!
//! # Internals
//! Every replica gets one long-lived connection, opened when the client is
//! built. A [`HostSelector`] decides which replica serves new fetches and a
//! [`TaskAffinity`] map remembers which replica leased each task. Both live
//! inside the [`TaskClient`], which is the only thing that mutates them.

mod affinity;
mod availability;
mod broker;
mod broker_service;
mod builder;
mod client;
mod error;
mod host_pool;
mod sampler;
mod selector;
mod signing;

pub use affinity::*;
pub use availability::*;
pub use broker::*;
pub use broker_service::*;
pub use builder::*;
pub use client::*;
pub use error::*;
pub use host_pool::*;
pub use sampler::*;
pub use selector::*;
pub use signing::*;
