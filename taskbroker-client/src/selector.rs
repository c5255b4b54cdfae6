//! Chooses the broker host used for new fetches.

use crate::{AvailabilityTracker, HostAddress, Sampler};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Rotation and cool-down settings for a [`HostSelector`].
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Fetches served by one host before the selector moves on.
    pub max_fetches_before_rotation: usize,
    /// Consecutive unavailable outcomes before a host is put in cool-down.
    pub max_consecutive_unavailable: usize,
    /// How long a host stays excluded once put in cool-down.
    pub cooldown: Duration,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_fetches_before_rotation: 32,
            max_consecutive_unavailable: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// How a call against the current host ended, as far as selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The host had nothing to hand out.
    NotFound,
    /// The host could not be reached.
    Unavailable,
    OtherError,
}

/// Picks the current host and decides when to move away from it.
///
/// Rotation happens on three triggers: the fetch counter reaching
/// [`RotationConfig::max_fetches_before_rotation`], a [`Outcome::NotFound`],
/// or [`RotationConfig::max_consecutive_unavailable`] unavailable outcomes in
/// a row, which also puts the host in cool-down.
pub struct HostSelector {
    hosts: Arc<[HostAddress]>,
    availability: AvailabilityTracker,
    sampler: Box<dyn Sampler>,
    config: RotationConfig,
    current: Option<usize>,
    fetches_since_rotation: usize,
    consecutive_unavailable: usize,
}

impl HostSelector {
    pub fn new(
        hosts: Arc<[HostAddress]>,
        config: RotationConfig,
        sampler: Box<dyn Sampler>,
    ) -> Result<Self, anyhow::Error> {
        if hosts.is_empty() {
            anyhow::bail!("a host selector needs at least one host");
        }

        Ok(Self {
            hosts,
            availability: AvailabilityTracker::new(config.cooldown),
            sampler,
            config,
            current: None,
            fetches_since_rotation: 0,
            consecutive_unavailable: 0,
        })
    }

    /// The host to use for the next fetch, picking one if none is set yet.
    pub fn current(&mut self, now: Instant) -> &HostAddress {
        let index = match self.current {
            Some(index) => index,
            None => self.rotate_index(now),
        };
        &self.hosts[index]
    }

    /// The current host without initializing it.
    pub fn current_host(&self) -> Option<&HostAddress> {
        self.current.map(|index| &self.hosts[index])
    }

    /// Pick a new current host uniformly from the eligible hosts and reset both
    /// counters, which only ever describe the current host.
    pub fn rotate(&mut self, now: Instant) -> &HostAddress {
        let index = self.rotate_index(now);
        &self.hosts[index]
    }

    fn rotate_index(&mut self, now: Instant) -> usize {
        let eligible = self.availability.eligible(&self.hosts, now);
        let index = eligible[self.sampler.sample(eligible.len()) % eligible.len()];

        tracing::debug!(
            from = ?self.current_host(),
            to = %self.hosts[index],
            eligible = eligible.len(),
            "rotating broker host"
        );

        self.current = Some(index);
        self.fetches_since_rotation = 0;
        self.consecutive_unavailable = 0;
        index
    }

    /// Rotate if the current host has served its share of fetches.
    ///
    /// Called before a fetch is dispatched. Returns whether a rotation happened.
    pub fn rotate_if_due(&mut self, now: Instant) -> bool {
        if self.current.is_some()
            && self.fetches_since_rotation >= self.config.max_fetches_before_rotation
        {
            self.rotate_index(now);
            true
        } else {
            false
        }
    }

    /// Count a fetch against the current host.
    pub fn note_fetch_attempted(&mut self) {
        self.fetches_since_rotation += 1;
    }

    /// Feed the outcome of a call to the current host into the rotation state.
    pub fn note_outcome(&mut self, outcome: Outcome, now: Instant) {
        match outcome {
            Outcome::Success | Outcome::OtherError => {
                self.consecutive_unavailable = 0;
            }
            Outcome::NotFound => {
                self.consecutive_unavailable = 0;
                self.rotate_index(now);
            }
            Outcome::Unavailable => {
                self.consecutive_unavailable += 1;
                if self.consecutive_unavailable >= self.config.max_consecutive_unavailable {
                    if let Some(index) = self.current {
                        let host = self.hosts[index].clone();
                        self.availability.mark_unavailable(&host, now);
                    }
                    self.rotate_index(now);
                }
            }
        }
    }

    pub fn availability(&self) -> &AvailabilityTracker {
        &self.availability
    }

    pub fn fetches_since_rotation(&self) -> usize {
        self.fetches_since_rotation
    }

    pub fn consecutive_unavailable(&self) -> usize {
        self.consecutive_unavailable
    }
}
