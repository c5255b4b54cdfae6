//! Wire types for the task broker `ConsumerService`, generated at build time
//! from `proto/sentry_protos/taskbroker/v1/taskbroker.proto`.
//!
//! `protoc` is vendored, so dependents need no system protobuf install.

pub mod pb {
    tonic::include_proto!("sentry_protos.taskbroker.v1");
}

/// Fully qualified name of the broker service.
pub const SERVICE_NAME: &str = "sentry_protos.taskbroker.v1.ConsumerService";
/// gRPC path of the `GetTask` method.
pub const GET_TASK_PATH: &str = "/sentry_protos.taskbroker.v1.ConsumerService/GetTask";
/// gRPC path of the `SetTaskStatus` method.
pub const SET_TASK_STATUS_PATH: &str =
    "/sentry_protos.taskbroker.v1.ConsumerService/SetTaskStatus";
