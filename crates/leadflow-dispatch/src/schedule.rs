// Leadflow Dispatch - Schedule ticker
//
// Decides when time_based workflows are due and launches them through
// the dispatcher. `is_due` is the pure due-ness check; the ticker wakes
// on a tokio interval, scans the registry's scheduled workflows, asks
// the embedder's target selector which records each due workflow should
// run against, and launches one execution per target. The dispatcher
// itself never polls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Timelike, Utc};
use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, info, warn};

use leadflow_core::{
    parse_time_of_day, LeadflowResult, Schedule, ScheduleFrequency, WorkflowDefinition,
};

use crate::dispatcher::{MatchOutcome, TriggerDispatcher};

const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Pure due-ness check for one schedule.
///
/// Hourly schedules fire once per elapsed hour. Daily, weekly and
/// monthly schedules fire once per matching day, at or after
/// `time_of_day` (or at the start of the day when unset). A schedule
/// that already fired within its current slot is not due again.
pub fn is_due(schedule: &Schedule, last_fired: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match schedule.frequency {
        ScheduleFrequency::Hourly => {
            last_fired.map_or(true, |t| now - t >= ChronoDuration::hours(1))
        }
        ScheduleFrequency::Daily => time_reached(schedule, now) && !fired_today(last_fired, now),
        ScheduleFrequency::Weekly => {
            let day = schedule.day_of_week.unwrap_or(0) as u32;
            now.weekday().num_days_from_sunday() == day
                && time_reached(schedule, now)
                && !fired_today(last_fired, now)
        }
        ScheduleFrequency::Monthly => {
            let day = schedule.day_of_month.unwrap_or(1) as u32;
            now.day() == day && time_reached(schedule, now) && !fired_today(last_fired, now)
        }
    }
}

fn time_reached(schedule: &Schedule, now: DateTime<Utc>) -> bool {
    match &schedule.time_of_day {
        // Validated at definition time; a bad value here just never fires
        Some(tod) => parse_time_of_day(tod)
            .map(|(h, m)| (now.hour(), now.minute()) >= (h, m))
            .unwrap_or(false),
        None => true,
    }
}

fn fired_today(last_fired: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_fired.map_or(false, |t| t.date_naive() == now.date_naive())
}

/// Selects the records a due scheduled workflow runs against. Owned by
/// the embedder; typically a query over the tenant's leads.
#[async_trait]
pub trait TickTargets: Send + Sync {
    async fn targets_for(&self, workflow: &WorkflowDefinition) -> LeadflowResult<Vec<String>>;
}

/// Periodic scanner that fires due time_based workflows
pub struct ScheduleTicker {
    dispatcher: Arc<TriggerDispatcher>,
    targets: Arc<dyn TickTargets>,
    tick_interval: Duration,
    last_fired: DashMap<String, DateTime<Utc>>,
}

impl ScheduleTicker {
    pub fn new(dispatcher: Arc<TriggerDispatcher>, targets: Arc<dyn TickTargets>) -> Self {
        Self {
            dispatcher,
            targets,
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            last_fired: DashMap::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// One scan pass. Returns the launch outcomes of every due workflow.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<MatchOutcome> {
        let mut outcomes = Vec::new();

        for definition in self.dispatcher.registry().scheduled() {
            let Some(schedule) = &definition.trigger.schedule else {
                continue;
            };
            let last = self.last_fired.get(&definition.id).map(|r| *r.value());
            if !is_due(schedule, last, now) {
                continue;
            }
            self.last_fired.insert(definition.id.clone(), now);

            let targets = match self.targets.targets_for(&definition).await {
                Ok(targets) => targets,
                Err(e) => {
                    warn!(
                        workflow = %definition.id,
                        error = %e,
                        "Target selection failed, skipping tick"
                    );
                    continue;
                }
            };
            if targets.is_empty() {
                debug!(workflow = %definition.id, "Schedule due but no targets");
                continue;
            }

            info!(
                workflow = %definition.id,
                targets = targets.len(),
                "Schedule due, launching"
            );
            for record_id in targets {
                let payload = json!({
                    "workflowId": definition.id,
                    "scheduledFor": now,
                });
                outcomes.push(self.dispatcher.run_scheduled(
                    definition.clone(),
                    &record_id,
                    payload,
                ));
            }
        }

        outcomes
    }

    /// Run the scan loop until the task is aborted
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval = ?self.tick_interval, "Schedule ticker started");
        loop {
            interval.tick().await;
            self.tick(Utc::now()).await;
        }
    }
}
