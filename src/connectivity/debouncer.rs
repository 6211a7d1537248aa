use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Sleep, sleep};

use crate::types::connectivity_state::{ConnectivityState, ConnectivityTransition};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Collapses flapping connectivity readings into settled transitions.
///
/// Every reading restarts the quiet period against itself; a reading is only
/// considered once it has gone the full quiet period without being replaced, and it
/// is only reported when it differs from the last accepted value.
#[derive(Debug)]
pub struct ConnectivityDebouncer {
    quiet_period: Duration,
    accepted: ConnectivityState,
    pending: Option<PendingReading>,
}

#[derive(Debug)]
struct PendingReading {
    reading: ConnectivityState,
    deadline: Pin<Box<Sleep>>,
}

impl ConnectivityDebouncer {
    pub fn new(quiet_period: Duration, accepted: ConnectivityState) -> Self {
        Self {
            quiet_period,
            accepted,
            pending: None,
        }
    }

    pub fn accepted(&self) -> ConnectivityState {
        self.accepted
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Last write wins: any earlier pending reading is dropped along with its timer.
    pub fn submit(&mut self, reading: ConnectivityState) {
        self.pending = Some(PendingReading {
            reading,
            deadline: Box::pin(sleep(self.quiet_period)),
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Resolves when the pending reading has held for the full quiet period. Never
    /// resolves while nothing is pending. Cancel safe: dropping the future keeps the
    /// pending reading and its original deadline.
    pub async fn settled(&mut self) -> Option<ConnectivityTransition> {
        let Some(pending) = self.pending.as_mut() else {
            return std::future::pending().await;
        };

        pending.deadline.as_mut().await;
        let reading = pending.reading;
        self.pending = None;

        self.accept(reading)
    }

    fn accept(&mut self, reading: ConnectivityState) -> Option<ConnectivityTransition> {
        if reading == self.accepted {
            return None;
        }

        let transition = ConnectivityTransition {
            from: self.accepted,
            to: reading,
        };
        self.accepted = reading;

        Some(transition)
    }
}
