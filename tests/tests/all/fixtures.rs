use taskbroker_client::{TaskClient, TaskClientBuilder};
use tests::scripted_broker::{ScriptedBroker, ScriptedFleet};
use tests::scripted_sampler::ScriptedSampler;

/// Base address of the scripted fleet.
pub const BROKER: &str = "localhost:50051";

/// Address of replica `index` of the scripted fleet.
pub fn host(index: usize) -> String {
    format!("localhost-{index}:50051")
}

/// A builder wired to `fleet`, picking hosts in the order given by `picks`.
pub fn builder(
    fleet: &ScriptedFleet,
    replicas: usize,
    picks: &[usize],
) -> TaskClientBuilder<ScriptedFleet, &'static str> {
    TaskClient::builder(BROKER)
        .connector(fleet.clone())
        .replicas(replicas)
        .sampler(ScriptedSampler::new(picks.iter().copied()))
}

pub async fn client(
    fleet: &ScriptedFleet,
    replicas: usize,
    picks: &[usize],
) -> TaskClient<ScriptedBroker> {
    builder(fleet, replicas, picks)
        .build()
        .await
        .expect("failed to build TaskClient")
}

/// The in-flight tasks of `client`, sorted by task id.
pub fn in_flight(client: &TaskClient<ScriptedBroker>) -> Vec<(String, String)> {
    let mut tasks: Vec<(String, String)> = client
        .in_flight()
        .iter()
        .map(|(task, host)| (task.to_string(), host.to_string()))
        .collect();
    tasks.sort();
    tasks
}
