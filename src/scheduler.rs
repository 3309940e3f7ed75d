//! Poll scheduler and the refresh cycle.
//!
//! The scheduler is a two-state machine (Idle / Polling). A tick while
//! Polling is dropped: it is neither queued nor overlapped with the running
//! cycle, which bounds work against a slow backend and keeps results from
//! being applied out of order. Out-of-band refreshes requested by commands
//! while a cycle is in flight collapse into a single follow-up cycle.
//!
//! The timer itself is an Iced subscription that exists only while the
//! scheduler is armed. Subscriptions are identified by their recipe, so
//! re-arming replaces the timer instead of adding a second one.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::gateway::{Gateway, GatewayError};
use crate::model::{AccountHistory, AccountMap, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Start,
    /// A cycle is still in flight; the tick is dropped.
    Busy,
    /// Auto-refresh is off; a tick that was already queued is ignored.
    Disarmed,
}

#[derive(Debug)]
pub struct PollScheduler {
    state:         PollState,
    armed:         bool,
    interval:      Duration,
    follow_up:     bool,
    cycles:        u64,
    dropped_ticks: u64,
}

impl PollScheduler {
    pub fn new(interval: Duration, armed: bool) -> Self {
        Self {
            state: PollState::Idle,
            armed,
            interval,
            follow_up: false,
            cycles: 0,
            dropped_ticks: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Timer tick. Moves Idle → Polling when a cycle should start.
    pub fn on_tick(&mut self) -> TickDecision {
        if !self.armed {
            return TickDecision::Disarmed;
        }
        match self.state {
            PollState::Polling => {
                self.dropped_ticks += 1;
                debug!(dropped_ticks = self.dropped_ticks, "poll tick dropped, cycle in flight");
                TickDecision::Busy
            }
            PollState::Idle => {
                self.begin();
                TickDecision::Start
            }
        }
    }

    /// Refresh requested outside the timer (manual refresh, after reset).
    /// Returns `true` if a cycle starts now; otherwise one follow-up cycle is
    /// scheduled for when the current one finishes.
    pub fn request(&mut self) -> bool {
        match self.state {
            PollState::Idle => {
                self.begin();
                true
            }
            PollState::Polling => {
                self.follow_up = true;
                false
            }
        }
    }

    /// The in-flight cycle has been applied. Returns `true` if a follow-up
    /// cycle starts immediately (the scheduler stays Polling).
    pub fn finish(&mut self) -> bool {
        self.state = PollState::Idle;
        if std::mem::take(&mut self.follow_up) {
            self.begin();
            true
        } else {
            false
        }
    }

    /// Number of the cycle most recently started.
    pub fn current_cycle(&self) -> u64 {
        self.cycles
    }

    fn begin(&mut self) {
        self.state = PollState::Polling;
        self.cycles += 1;
    }
}

// ── Cycle ─────────────────────────────────────────────────────────────────────

/// What one cycle should fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRequest {
    pub cycle:        u64,
    /// Snapshot of the expansion set when the cycle started.
    pub expanded:     Vec<String>,
    /// Start-up cycle also reads the mode switch.
    pub include_mode: bool,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle:     u64,
    pub accounts:  Result<AccountMap, GatewayError>,
    pub mode:      Option<Result<bool, GatewayError>>,
    pub workflows: Result<Vec<Workflow>, GatewayError>,
    pub histories: Vec<(String, Result<AccountHistory, GatewayError>)>,
}

/// Fetch everything one cycle needs, strictly one call at a time:
/// accounts, (mode), workflows, then each expanded account's history in
/// expansion-set order. A failure never stops the remaining fetches.
pub async fn run_cycle<G: Gateway>(gateway: Arc<G>, request: CycleRequest) -> CycleReport {
    let accounts = gateway.get_accounts().await;
    let mode = if request.include_mode {
        Some(gateway.get_mode().await)
    } else {
        None
    };
    let workflows = gateway.get_workflows().await;

    let mut histories = Vec::with_capacity(request.expanded.len());
    for account_id in request.expanded {
        let result = gateway.get_account_history(&account_id).await;
        histories.push((account_id, result));
    }

    CycleReport {
        cycle: request.cycle,
        accounts,
        mode,
        workflows,
        histories,
    }
}
