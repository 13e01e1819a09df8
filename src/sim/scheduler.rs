//! Deferred tasks keyed on simulated time
//!
//! Timers replace suspended control flow: each entry carries an expiry tick
//! and a task, and due entries come out in (expiry, insertion) order. The
//! clock counts whole microseconds so it never stalls however long a session
//! runs.

use serde::{Deserialize, Serialize};

use super::agent::AgentId;

/// Clock resolution
const TICKS_PER_SECOND: f64 = 1_000_000.0;

/// Convert a duration in seconds to clock ticks; negative and NaN become 0
fn to_ticks(seconds: f32) -> u64 {
    (f64::from(seconds.max(0.0)) * TICKS_PER_SECOND).round() as u64
}

/// Work the round controller runs when a timer expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// End an agent's hit flash
    ClearHitFlash(AgentId),
    /// Poll every live agent for a ring-out
    FallenCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timer {
    due: u64,
    seq: u64,
    task: Task,
}

/// Deterministic timer queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    now: u64,
    seq: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated seconds since the scheduler was created
    pub fn now(&self) -> f64 {
        self.now as f64 / TICKS_PER_SECOND
    }

    /// Advance the clock
    pub fn advance(&mut self, dt: f32) {
        self.now = self.now.saturating_add(to_ticks(dt));
    }

    /// Run `task` once `delay` seconds from now
    pub fn schedule(&mut self, delay: f32, task: Task) {
        self.timers.push(Timer {
            due: self.now.saturating_add(to_ticks(delay)),
            seq: self.seq,
            task,
        });
        self.seq += 1;
    }

    /// Drop every pending timer whose task matches
    pub fn cancel(&mut self, mut matches: impl FnMut(&Task) -> bool) {
        self.timers.retain(|t| !matches(&t.task));
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.timers.iter().any(|t| t.task == task)
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Remove and return every task due at or before now
    pub fn take_due(&mut self) -> Vec<Task> {
        let now = self.now;
        let mut due: Vec<Timer> = Vec::new();
        self.timers.retain(|t| {
            if t.due <= now {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }
}
