//! Per-host cool-down tracking.

use crate::HostAddress;
use std::collections::HashMap;
use tokio::time::{Duration, Instant};

/// Records hosts that are temporarily excluded from selection.
///
/// Expiry is evaluated lazily on read: entries are never swept, a stale entry
/// simply reads as available and is overwritten by the next failure.
#[derive(Debug)]
pub struct AvailabilityTracker {
    cooldown: Duration,
    unavailable_until: HashMap<HostAddress, Instant>,
}

impl AvailabilityTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            unavailable_until: HashMap::new(),
        }
    }

    /// Exclude `host` until `now + cooldown`.
    pub fn mark_unavailable(&mut self, host: &HostAddress, now: Instant) {
        let until = now + self.cooldown;
        tracing::warn!(%host, cooldown = ?self.cooldown, "marking broker host temporarily unavailable");
        self.unavailable_until.insert(host.clone(), until);
    }

    /// Whether `host` may be used at `now`.
    pub fn is_available(&self, host: &HostAddress, now: Instant) -> bool {
        match self.unavailable_until.get(host) {
            Some(until) => *until <= now,
            None => true,
        }
    }

    /// Indices into `hosts` that may be picked at `now`.
    ///
    /// When every host is cooling down, all indices are returned so that
    /// selection never blocks.
    pub fn eligible(&self, hosts: &[HostAddress], now: Instant) -> Vec<usize> {
        let available: Vec<usize> = hosts
            .iter()
            .enumerate()
            .filter(|(_, host)| self.is_available(host, now))
            .map(|(index, _)| index)
            .collect();

        if available.is_empty() {
            tracing::debug!("all broker hosts are cooling down, falling back to the full set");
            (0..hosts.len()).collect()
        } else {
            available
        }
    }
}
