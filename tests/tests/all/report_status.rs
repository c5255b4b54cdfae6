use crate::fixtures::{client, host, in_flight};
use broker_proto::pb::{FetchNextTask, SetTaskStatusRequest, TaskActivationStatus};
use taskbroker_client::TaskClientError;
use tests::scripted_broker::{Call, ScriptedFleet};
use tests::task;
use tonic::Code;

fn set_task_status_calls(fleet: &ScriptedFleet) -> Vec<(String, SetTaskStatusRequest)> {
    fleet
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::SetTaskStatus { host, request } => Some((host, request)),
            Call::GetTask { .. } => None,
        })
        .collect()
}

#[tokio::test]
async fn report_with_next_lease_replaces_affinity() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.accept_status(&host(0), Some(task("def456")));
    let mut client = client(&fleet, 1, &[0]).await;
    client.fetch(None).await.expect("fetch failed");

    let next = client
        .report_status(
            "abc123",
            TaskActivationStatus::Retry,
            Some(FetchNextTask {
                namespace: Some("testing".into()),
            }),
        )
        .await
        .expect("report failed")
        .expect("no next task");

    assert_eq!(next.id, "def456");
    assert_eq!(next.namespace, "testing");
    assert_eq!(in_flight(&client), vec![("def456".into(), host(0))]);

    let reports = set_task_status_calls(&fleet);
    assert_eq!(reports.len(), 1);
    let (to, request) = &reports[0];
    assert_eq!(to, &host(0));
    assert_eq!(request.id, "abc123");
    assert_eq!(request.status(), TaskActivationStatus::Retry);
    assert_eq!(
        request.fetch_next_task,
        Some(FetchNextTask {
            namespace: Some("testing".into())
        })
    );
}

#[tokio::test]
async fn next_lease_may_reuse_the_task_id() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.accept_status(&host(0), Some(task("abc123")));
    let mut client = client(&fleet, 1, &[0]).await;
    client.fetch(None).await.expect("fetch failed");

    let next = client
        .report_status(
            "abc123",
            TaskActivationStatus::Retry,
            Some(FetchNextTask { namespace: None }),
        )
        .await
        .expect("report failed");

    assert_eq!(next.map(|t| t.id), Some("abc123".to_string()));
    assert_eq!(in_flight(&client), vec![("abc123".into(), host(0))]);
}

#[tokio::test]
async fn report_without_next_lease_clears_affinity() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.accept_status(&host(0), None);
    let mut client = client(&fleet, 1, &[0]).await;
    client.fetch(None).await.expect("fetch failed");

    let next = client
        .report_status("abc123", TaskActivationStatus::Complete, None)
        .await
        .expect("report failed");

    assert!(next.is_none());
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn stale_task_is_forgotten_without_error() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.fail_set_task_status(&host(0), Code::NotFound, "no pending tasks found");
    let mut client = client(&fleet, 1, &[0, 0]).await;
    client.fetch(None).await.expect("fetch failed");

    let next = client
        .report_status(
            "abc123",
            TaskActivationStatus::Retry,
            Some(FetchNextTask { namespace: None }),
        )
        .await
        .expect("a stale task is not an error");

    assert!(next.is_none());
    assert!(client.host_for("abc123").is_none());
}

#[tokio::test]
async fn unavailable_report_keeps_affinity() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.fail_set_task_status(&host(0), Code::Unavailable, "broker down");
    let mut client = client(&fleet, 1, &[0]).await;
    client.fetch(None).await.expect("fetch failed");

    let err = client
        .report_status("abc123", TaskActivationStatus::Retry, None)
        .await
        .expect_err("report should fail");

    assert!(err.is_unavailable());
    assert!(err.to_string().contains("broker down"));
    assert_eq!(in_flight(&client), vec![("abc123".into(), host(0))]);
}

#[tokio::test]
async fn other_report_errors_keep_affinity() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.fail_set_task_status(&host(0), Code::Internal, "something bad");
    let mut client = client(&fleet, 1, &[0]).await;
    client.fetch(None).await.expect("fetch failed");

    let err = client
        .report_status("abc123", TaskActivationStatus::Complete, None)
        .await
        .expect_err("report should fail");

    assert_eq!(err.code(), Some(Code::Internal));
    assert_eq!(in_flight(&client), vec![("abc123".into(), host(0))]);
}

#[tokio::test]
async fn unknown_task_is_rejected_locally() {
    let fleet = ScriptedFleet::new();
    fleet.accept_status(&host(0), None);
    let mut client = client(&fleet, 1, &[0]).await;

    let err = client
        .report_status("abc123", TaskActivationStatus::Complete, None)
        .await
        .expect_err("an unknown task should be rejected");

    assert!(matches!(
        err,
        TaskClientError::UnknownTask { ref task_id } if task_id == "abc123"
    ));
    assert!(fleet.calls().is_empty());
}

#[tokio::test]
async fn finalized_task_cannot_be_reported_twice() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("abc123"));
    fleet.accept_status(&host(0), None);
    let mut client = client(&fleet, 1, &[0]).await;
    client.fetch(None).await.expect("fetch failed");

    client
        .report_status("abc123", TaskActivationStatus::Complete, None)
        .await
        .expect("report failed");
    let err = client
        .report_status("abc123", TaskActivationStatus::Complete, None)
        .await
        .expect_err("a finalized task should be rejected");

    assert!(matches!(err, TaskClientError::UnknownTask { .. }));
    assert_eq!(set_task_status_calls(&fleet).len(), 1);
}
