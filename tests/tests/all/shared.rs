use crate::fixtures::{builder, host};
use broker_proto::pb::TaskActivationStatus;
use std::collections::HashSet;
use tests::scripted_broker::ScriptedFleet;
use tests::task;

#[tokio::test]
async fn concurrent_fetches_share_one_client() {
    let fleet = ScriptedFleet::new();
    fleet.lease(&host(0), task("0"));
    fleet.lease(&host(1), task("1"));
    fleet.accept_status(&host(0), None);
    fleet.accept_status(&host(1), None);
    let client = builder(&fleet, 2, &[0, 1])
        .max_fetches_before_rotation(1)
        .build()
        .await
        .expect("failed to build TaskClient")
        .into_shared();
    let other = client.clone();

    let (first, second) = tokio::join!(client.fetch(None), other.fetch(None));
    let ids: HashSet<String> = [first, second]
        .into_iter()
        .map(|result| result.expect("fetch failed").expect("no task leased").id)
        .collect();

    assert_eq!(ids, HashSet::from(["0".to_string(), "1".to_string()]));
    assert_eq!(client.lock().await.in_flight().len(), 2);

    let (first, second) = tokio::join!(
        client.report_status("0", TaskActivationStatus::Complete, None),
        other.report_status("1", TaskActivationStatus::Complete, None)
    );
    first.expect("report failed");
    second.expect("report failed");

    assert!(client.lock().await.in_flight().is_empty());
}

#[tokio::test]
async fn shared_client_can_move_into_spawned_tasks() {
    let fleet = ScriptedFleet::new();
    for i in 0..3 {
        fleet.lease(&host(i), task(&i.to_string()));
    }
    let client = builder(&fleet, 3, &[0, 1, 2])
        .max_fetches_before_rotation(1)
        .build()
        .await
        .expect("failed to build TaskClient")
        .into_shared();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.fetch(None).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let task = handle
            .await
            .expect("fetch task panicked")
            .expect("fetch failed")
            .expect("no task leased");
        ids.insert(task.id);
    }

    assert_eq!(ids.len(), 3);
    let client = client.lock().await;
    for i in 0..3 {
        assert_eq!(
            client.host_for(&i.to_string()).map(ToString::to_string),
            Some(host(i))
        );
    }
}
