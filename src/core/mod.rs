//! Core module - run state and the node's main loop

mod clock;
mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Collaborators, Engine, TickReport};

use serde::{Deserialize, Serialize};

/// Mutable state that survives from tick to tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Periodic telemetry enabled
    pub auto_publish: bool,
    /// Clock time of the last accepted telemetry publish
    pub last_publish_ts: i64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            auto_publish: true,
            last_publish_ts: 0,
        }
    }
}

impl RunState {
    /// Whether at least `interval_ms` has passed since the last accepted publish
    pub fn publish_due(&self, now_ms: i64, interval_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_publish_ts) >= interval_ms as i64
    }
}

/// Node lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Init,
    Connecting,
    Online,
    Offline,
    Running,
    Fatal,
}

/// Why [`Engine::run`] returned without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeExit {
    /// A reboot was requested; build a fresh engine and run again
    Restart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_publish_is_due_immediately() {
        let state = RunState::default();
        assert!(state.auto_publish);
        assert!(state.publish_due(1_700_000_000_000, 5000));
    }

    #[test]
    fn test_publish_interval() {
        let state = RunState {
            auto_publish: true,
            last_publish_ts: 10_000,
        };
        assert!(!state.publish_due(10_000, 5000));
        assert!(!state.publish_due(14_999, 5000));
        assert!(state.publish_due(15_000, 5000));
    }

    #[test]
    fn test_clock_going_backwards_is_not_due() {
        let state = RunState {
            auto_publish: true,
            last_publish_ts: 10_000,
        };
        assert!(!state.publish_due(9_000, 5000));
    }
}
