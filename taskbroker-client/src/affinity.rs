//! Remembers which broker host issued each in-flight task.

use crate::HostAddress;
use std::collections::HashMap;

/// Maps task ids to the host that leased them.
///
/// An id present in the map denotes a task that has not been terminally
/// reported yet; status updates for it must go to the recorded host.
#[derive(Debug, Default, Clone)]
pub struct TaskAffinity {
    hosts: HashMap<String, HostAddress>,
}

impl TaskAffinity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute `task_id` to `host`, replacing any previous entry.
    pub fn record(&mut self, task_id: impl Into<String>, host: HostAddress) {
        self.hosts.insert(task_id.into(), host);
    }

    pub fn host_for(&self, task_id: &str) -> Option<&HostAddress> {
        self.hosts.get(task_id)
    }

    /// Drop the entry for `task_id`. Forgetting an unknown id is a no-op.
    pub fn forget(&mut self, task_id: &str) -> Option<HostAddress> {
        self.hosts.remove(task_id)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostAddress)> {
        self.hosts.iter().map(|(task, host)| (task.as_str(), host))
    }
}
