// Leadflow Engine - Admission control
//
// Guards the per-workflow execution budgets before a new execution starts.
// Rolling one-hour and one-day windows; a match beyond either budget is
// rejected, never queued. Counters reset when their window elapses.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use leadflow_core::{LeadflowError, LeadflowResult, WorkflowLimits};

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86400);

struct WindowState {
    hour_started: Instant,
    hour_count: u32,
    day_started: Instant,
    day_count: u32,
}

impl WindowState {
    fn new(now: Instant) -> Self {
        Self {
            hour_started: now,
            hour_count: 0,
            day_started: now,
            day_count: 0,
        }
    }

    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.hour_started) >= HOUR {
            self.hour_started = now;
            self.hour_count = 0;
        }
        if now.duration_since(self.day_started) >= DAY {
            self.day_started = now;
            self.day_count = 0;
        }
    }
}

/// Per-workflow execution budget guard
#[derive(Default)]
pub struct AdmissionController {
    windows: DashMap<String, Mutex<WindowState>>,
}

impl AdmissionController {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Check the workflow's budgets and consume one slot on success
    pub fn try_admit(&self, workflow_id: &str, limits: &WorkflowLimits) -> LeadflowResult<()> {
        let now = Instant::now();
        let entry = self
            .windows
            .entry(workflow_id.to_string())
            .or_insert_with(|| Mutex::new(WindowState::new(now)));
        let mut state = entry.lock();

        state.roll(now);

        if state.hour_count >= limits.max_executions_per_hour {
            warn!(workflow = %workflow_id, "Hourly execution budget exhausted");
            return Err(LeadflowError::AdmissionRejected {
                workflow_id: workflow_id.to_string(),
                reason: format!(
                    "hourly budget of {} executions exhausted",
                    limits.max_executions_per_hour
                ),
            });
        }
        if state.day_count >= limits.max_executions_per_day {
            warn!(workflow = %workflow_id, "Daily execution budget exhausted");
            return Err(LeadflowError::AdmissionRejected {
                workflow_id: workflow_id.to_string(),
                reason: format!(
                    "daily budget of {} executions exhausted",
                    limits.max_executions_per_day
                ),
            });
        }

        state.hour_count += 1;
        state.day_count += 1;
        Ok(())
    }
}
