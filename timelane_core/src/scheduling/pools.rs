//! Lanes, priority pools, and the registry that routes jobs between them.
//!
//! Both collections are keyed by value (lane name strings and priority
//! integers) and owned by one [`Registry`], so moving a lane between pools
//! is a pure remove/insert on the pool rotations, never a pointer rewrite.

use crate::config::ConfigProvider;
use crate::scheduling::fifo::Fifo;
use crate::scheduling::job::Job;
use crate::scheduling::robin::RoundRobin;
use std::collections::HashMap;
use std::sync::Arc;

pub type LaneName = String;
pub type Priority = u32;

/// A named unit of work sharing one priority. Owns the FIFO of its pending
/// jobs. Invariant: `lane.priority` equals the priority of the pool whose
/// rotation holds the lane's name.
struct Lane {
    priority: Priority,
    jobs: Fifo<Job>,
}

/// All lanes sharing one priority value, in round-robin rotation.
struct Pool {
    priority: Priority,
    lanes: RoundRobin<LaneName>,
}

/// Owns every pool and lane; routes submissions and answers "next runnable
/// job system-wide".
pub(crate) struct Registry {
    /// Sorted by descending priority; at most one pool per priority value.
    pools: Vec<Pool>,
    lanes: HashMap<LaneName, Lane>,
    config: Arc<dyn ConfigProvider>,
}

impl Registry {
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            pools: Vec::new(),
            lanes: HashMap::new(),
            config,
        }
    }

    /// Index of the pool with exactly this priority, creating it in sorted
    /// position if absent.
    fn pool_index(&mut self, priority: Priority) -> usize {
        // Descending order: compare reversed.
        match self
            .pools
            .binary_search_by(|pool| priority.cmp(&pool.priority))
        {
            Ok(idx) => idx,
            Err(idx) => {
                log::debug!("creating pool at priority {}", priority);
                self.pools.insert(
                    idx,
                    Pool {
                        priority,
                        lanes: RoundRobin::new(),
                    },
                );
                idx
            }
        }
    }

    /// Get-or-create the lane, resolving unseen names to a priority through
    /// the config provider. Returns the lane's current priority.
    fn get_or_create_lane(&mut self, name: &str) -> Priority {
        if let Some(lane) = self.lanes.get(name) {
            return lane.priority;
        }
        let priority = self.config.priority_for_lane(name);
        log::debug!("creating lane '{}' at priority {}", name, priority);
        self.lanes.insert(
            name.to_string(),
            Lane {
                priority,
                jobs: Fifo::new(),
            },
        );
        let idx = self.pool_index(priority);
        self.pools[idx].lanes.add(name.to_string());
        priority
    }

    /// Get-or-create the lane and, if its priority differs, relocate it:
    /// remove its name from the old pool's rotation, add it to the target
    /// pool's (creating that pool if needed), update the stored priority.
    pub fn ensure_lane(&mut self, name: &str, priority: Priority) {
        let current = self.get_or_create_lane(name);
        if current == priority {
            return;
        }
        log::debug!(
            "moving lane '{}' from priority {} to {}",
            name,
            current,
            priority
        );
        let src = self.pool_index(current);
        self.pools[src].lanes.remove(&name.to_string());
        let dst = self.pool_index(priority);
        self.pools[dst].lanes.add(name.to_string());
        if let Some(lane) = self.lanes.get_mut(name) {
            lane.priority = priority;
        }
    }

    /// Enqueue a job at the tail of its lane's queue, creating the lane on
    /// first reference. Also used to re-enqueue unfinished jobs.
    pub fn add_job(&mut self, job: Job) {
        self.get_or_create_lane(&job.lane);
        if let Some(lane) = self.lanes.get_mut(&job.lane) {
            lane.jobs.push(job);
        }
    }

    /// Next runnable job system-wide: pools in descending priority order,
    /// each asked for the next lane in rotation with pending work. Higher
    /// priority strictly dominates; within a pool the rotation guarantees
    /// every non-empty lane one step per circuit.
    pub fn next_job(&mut self) -> Option<Job> {
        let lanes = &self.lanes;
        let mut matched: Option<LaneName> = None;
        for pool in self.pools.iter_mut() {
            let hit = pool
                .lanes
                .next_matching(|name| lanes.get(name).is_some_and(|lane| !lane.jobs.is_empty()));
            if let Some(name) = hit {
                matched = Some(name.clone());
                break;
            }
        }
        let name = matched?;
        self.lanes.get_mut(&name).and_then(|lane| lane.jobs.pop())
    }

    /// Whether any lane still holds pending jobs.
    pub fn has_pending(&self) -> bool {
        self.lanes.values().any(|lane| !lane.jobs.is_empty())
    }

    #[cfg(test)]
    pub fn pending_jobs(&self) -> usize {
        self.lanes.values().map(|lane| lane.jobs.len()).sum()
    }

    #[cfg(test)]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    #[cfg(test)]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}
