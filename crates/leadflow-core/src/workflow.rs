// Leadflow Core - Workflow definition model
//
// A WorkflowDefinition is a tenant-owned automation: a trigger (event class
// plus gating conditions, optionally a schedule), an ordered list of
// side-effecting actions, rate limits, an error-handling policy, aggregate
// execution statistics, and an append-only version history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::condition::Condition;
use crate::duration::parse_duration;
use crate::error::{LeadflowError, LeadflowResult};

/// Workflow definition document
///
/// Example:
/// ```yaml
/// tenantId: acme
/// name: welcome-new-leads
/// trigger:
///   type: lead_created
/// actions:
///   - type: send_email
///     order: 1
///     config:
///       subject: "Welcome, ${name}!"
///       body: "Thanks for signing up."
///   - type: add_tag
///     order: 2
///     delay: 5m
///     config:
///       tag: welcome-sent
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Workflow id (unique across tenants)
    #[serde(default = "new_id")]
    pub id: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Workflow name
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Trigger definition
    pub trigger: TriggerDefinition,

    /// Ordered actions (kept sorted by `order` before execution)
    pub actions: Vec<Action>,

    /// Lifecycle status
    #[serde(default)]
    pub status: WorkflowStatus,

    /// Whether the workflow accepts new trigger matches
    #[serde(default)]
    pub is_active: bool,

    /// Execution rate limits and timeout budget
    #[serde(default)]
    pub limits: WorkflowLimits,

    /// Failure-handling policy
    #[serde(default)]
    pub error_handling: ErrorHandling,

    /// Aggregate execution statistics (serialized snapshot)
    #[serde(default)]
    pub execution_stats: ExecutionStats,

    /// Version, incremented on every structural edit
    #[serde(default = "default_version")]
    pub version: u32,

    /// Prior versions, append-only, never mutated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_versions: Vec<WorkflowRevision>,

    /// Created timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last structural edit
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_version() -> u32 {
    1
}

/// Trigger definition: event class + gating conditions + optional schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    /// Event class that causes the workflow to be considered
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,

    /// Conditions applied to the event payload (logical AND)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Schedule (required for time_based triggers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Event classes a workflow can subscribe to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// A lead record was created
    LeadCreated,
    /// A lead record changed
    LeadUpdated,
    /// A tag was added to a lead
    TagAdded,
    /// Scheduled tick from the external scheduler
    TimeBased,
    /// Explicit manual invocation
    Manual,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LeadCreated => write!(f, "lead_created"),
            Self::LeadUpdated => write!(f, "lead_updated"),
            Self::TagAdded => write!(f, "tag_added"),
            Self::TimeBased => write!(f, "time_based"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Schedule configuration for time_based triggers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// How often the workflow fires
    pub frequency: ScheduleFrequency,

    /// Wall-clock time of day "HH:MM" (daily and coarser frequencies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,

    /// Day of week, 0 = Sunday (weekly frequency)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,

    /// Day of month, 1-31 (monthly frequency)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
}

/// Schedule frequencies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

/// One ordered, configurable side-effecting step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action type tag
    #[serde(rename = "type")]
    pub action_type: ActionType,

    /// Ordering key, unique within a workflow; ties keep insertion order
    pub order: u32,

    /// Delay before the *next* action runs (e.g. "5m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    /// Conditions gating this action (logical AND)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Type-specific configuration
    #[serde(default)]
    pub config: ActionConfig,

    /// Disabled actions are skipped, not evaluated
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Closed set of action types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendEmail,
    SendWhatsapp,
    CreateTask,
    UpdateLead,
    AddTag,
    RemoveTag,
    ChangeStatus,
    AssignUser,
    Webhook,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SendEmail => write!(f, "send_email"),
            Self::SendWhatsapp => write!(f, "send_whatsapp"),
            Self::CreateTask => write!(f, "create_task"),
            Self::UpdateLead => write!(f, "update_lead"),
            Self::AddTag => write!(f, "add_tag"),
            Self::RemoveTag => write!(f, "remove_tag"),
            Self::ChangeStatus => write!(f, "change_status"),
            Self::AssignUser => write!(f, "assign_user"),
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

/// Type-specific action configuration. One flat struct: each action type
/// reads the fields it needs and the executor validates the required ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    // send_email
    /// Email subject (supports ${path} variables from the target record)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Email body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    // send_whatsapp
    /// Message text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    // create_task
    /// Task title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,

    /// Task description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,

    /// Relative due date (e.g. "24h", "3d")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_in: Option<String>,

    // create_task / assign_user
    /// Assignee user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    // update_lead
    /// Field patch applied to the lead record
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,

    // add_tag / remove_tag
    /// Tag name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    // change_status
    /// New lead status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_status: Option<String>,

    // webhook
    /// Webhook URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// HTTP headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// JSON payload (defaults to the target record)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Additional configuration
    #[serde(flatten, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Workflow lifecycle status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Editable, never matched against events
    #[default]
    Draft,
    /// Matched against incoming events
    Active,
    /// Temporarily disabled
    Inactive,
    /// Retired; never matched, kept for audit
    Archived,
}

/// Execution rate limits and timeout budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowLimits {
    /// Admission budget per calendar-rolling day
    #[serde(default = "default_per_day")]
    pub max_executions_per_day: u32,

    /// Admission budget per rolling hour
    #[serde(default = "default_per_hour")]
    pub max_executions_per_hour: u32,

    /// Wall-clock budget for one execution (e.g. "5m")
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout: String,
}

fn default_per_day() -> u32 {
    1000
}

fn default_per_hour() -> u32 {
    100
}

fn default_execution_timeout() -> String {
    "5m".to_string()
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            max_executions_per_day: default_per_day(),
            max_executions_per_hour: default_per_hour(),
            execution_timeout: default_execution_timeout(),
        }
    }
}

/// Upper bound on [`ErrorHandling::max_retries`] accepted by validation
pub const MAX_RETRY_LIMIT: u32 = 100;

/// Failure-handling policy for action execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandling {
    /// Retry a failed action before giving up on it
    #[serde(default)]
    pub retry_on_failure: bool,

    /// Maximum retry attempts per action
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retry attempts (e.g. "30s")
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,

    /// Abort remaining actions when one fails (after retries)
    #[serde(default = "default_true")]
    pub stop_on_error: bool,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> String {
    "30s".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ErrorHandling {
    fn default() -> Self {
        Self {
            retry_on_failure: false,
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            stop_on_error: true,
        }
    }
}

/// Aggregate execution statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    /// Total executions started
    pub total_executions: u64,

    /// Executions that completed all actions
    pub successful_executions: u64,

    /// Executions that ended failed
    pub failed_executions: u64,

    /// Running average wall-clock time in milliseconds
    pub average_execution_time_ms: f64,

    /// Timestamp of the most recent execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_executed: Option<DateTime<Utc>>,
}

/// Immutable snapshot of a prior workflow version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRevision {
    /// Version number the snapshot belongs to
    pub version: u32,

    /// Structural fields as they were before the edit
    pub snapshot: WorkflowSnapshot,

    /// When the version was superseded
    pub archived_at: DateTime<Utc>,
}

/// The structural fields captured by a revision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger: TriggerDefinition,
    pub actions: Vec<Action>,
}

impl WorkflowDefinition {
    /// Create a new draft workflow
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        trigger: TriggerDefinition,
        actions: Vec<Action>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            description: None,
            trigger,
            actions,
            status: WorkflowStatus::Draft,
            is_active: false,
            limits: WorkflowLimits::default(),
            error_handling: ErrorHandling::default(),
            execution_stats: ExecutionStats::default(),
            version: 1,
            previous_versions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Actions sorted by `order` ascending. The sort is stable, so actions
    /// sharing an order value keep their original insertion order.
    pub fn sorted_actions(&self) -> Vec<&Action> {
        let mut actions: Vec<&Action> = self.actions.iter().collect();
        actions.sort_by_key(|a| a.order);
        actions
    }

    /// Whether the workflow accepts new trigger matches
    pub fn accepts_matches(&self) -> bool {
        self.is_active && self.status == WorkflowStatus::Active
    }

    /// Transition to active. Only drafts and inactive workflows can be
    /// activated; archived workflows stay archived.
    pub fn activate(&mut self) -> LeadflowResult<()> {
        match self.status {
            WorkflowStatus::Archived => Err(LeadflowError::config(format!(
                "workflow {} is archived and cannot be activated",
                self.id
            ))),
            _ => {
                self.status = WorkflowStatus::Active;
                self.is_active = true;
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    /// Stop matching new events. In-flight executions are unaffected.
    pub fn deactivate(&mut self) {
        self.status = WorkflowStatus::Inactive;
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Retire the workflow permanently
    pub fn archive(&mut self) {
        self.status = WorkflowStatus::Archived;
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Snapshot the current structural fields into the version history and
    /// bump the version. Called before applying a structural edit.
    pub fn push_revision(&mut self) {
        self.previous_versions.push(WorkflowRevision {
            version: self.version,
            snapshot: WorkflowSnapshot {
                name: self.name.clone(),
                description: self.description.clone(),
                trigger: self.trigger.clone(),
                actions: self.actions.clone(),
            },
            archived_at: Utc::now(),
        });
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Validate the definition before it is stored
    pub fn validate(&self) -> LeadflowResult<()> {
        if self.name.trim().is_empty() {
            return Err(LeadflowError::config("workflow name is required"));
        }
        if self.tenant_id.trim().is_empty() {
            return Err(LeadflowError::config("workflow tenant id is required"));
        }

        // Duplicate order values would make execution order depend on
        // insertion order alone, which is almost always an authoring error.
        let mut orders: Vec<u32> = self.actions.iter().map(|a| a.order).collect();
        orders.sort_unstable();
        orders.dedup();
        if orders.len() != self.actions.len() {
            return Err(LeadflowError::config(format!(
                "workflow '{}' has duplicate action order values",
                self.name
            )));
        }

        if self.trigger.trigger_type == TriggerType::TimeBased && self.trigger.schedule.is_none() {
            return Err(LeadflowError::config(format!(
                "workflow '{}' has a time_based trigger but no schedule",
                self.name
            )));
        }

        if let Some(schedule) = &self.trigger.schedule {
            schedule.validate()?;
        }

        for condition in &self.trigger.conditions {
            condition.validate()?;
        }

        parse_duration(&self.limits.execution_timeout)?;
        parse_duration(&self.error_handling.retry_delay)?;

        if self.error_handling.max_retries > MAX_RETRY_LIMIT {
            return Err(LeadflowError::config(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRY_LIMIT, self.error_handling.max_retries
            )));
        }

        for action in &self.actions {
            if let Some(delay) = &action.delay {
                parse_duration(delay)?;
            }
            for condition in &action.conditions {
                condition.validate()?;
            }
        }

        Ok(())
    }
}

impl Schedule {
    pub fn validate(&self) -> LeadflowResult<()> {
        if let Some(tod) = &self.time_of_day {
            parse_time_of_day(tod)?;
        }
        if let Some(dow) = self.day_of_week {
            if dow > 6 {
                return Err(LeadflowError::config(format!(
                    "day_of_week must be 0-6, got {}",
                    dow
                )));
            }
        }
        if let Some(dom) = self.day_of_month {
            if !(1..=31).contains(&dom) {
                return Err(LeadflowError::config(format!(
                    "day_of_month must be 1-31, got {}",
                    dom
                )));
            }
        }
        Ok(())
    }
}

/// Parse "HH:MM" into (hour, minute)
pub fn parse_time_of_day(s: &str) -> LeadflowResult<(u32, u32)> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| LeadflowError::config(format!("invalid time of day: {}", s)))?;
    let hour: u32 = h
        .parse()
        .map_err(|_| LeadflowError::config(format!("invalid time of day: {}", s)))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| LeadflowError::config(format!("invalid time of day: {}", s)))?;
    if hour > 23 || minute > 59 {
        return Err(LeadflowError::config(format!(
            "invalid time of day: {}",
            s
        )));
    }
    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionOperator;
    use serde_json::json;

    fn sample_yaml() -> &'static str {
        r#"
tenantId: acme
name: welcome-new-leads
trigger:
  type: lead_created
  conditions:
    - field: source
      operator: equals
      value: landing-page
actions:
  - type: send_email
    order: 1
    config:
      subject: "Welcome, ${name}!"
      body: "Thanks for signing up."
  - type: add_tag
    order: 2
    delay: 5m
    config:
      tag: welcome-sent
limits:
  maxExecutionsPerHour: 50
errorHandling:
  retryOnFailure: true
  maxRetries: 2
  retryDelay: 10s
"#
    }

    #[test]
    fn test_parse_workflow_document() {
        let wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(wf.tenant_id, "acme");
        assert_eq!(wf.trigger.trigger_type, TriggerType::LeadCreated);
        assert_eq!(wf.trigger.conditions.len(), 1);
        assert_eq!(wf.actions.len(), 2);
        assert_eq!(wf.actions[1].delay.as_deref(), Some("5m"));
        assert_eq!(wf.status, WorkflowStatus::Draft);
        assert!(!wf.is_active);
        assert_eq!(wf.limits.max_executions_per_hour, 50);
        assert_eq!(wf.limits.max_executions_per_day, 1000);
        assert!(wf.error_handling.retry_on_failure);
        assert_eq!(wf.version, 1);
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_action_type_tags() {
        let yaml = r#"
type: change_status
order: 3
config:
  leadStatus: qualified
"#;
        let action: Action = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(action.action_type, ActionType::ChangeStatus);
        assert!(action.enabled);
        assert_eq!(action.config.lead_status.as_deref(), Some("qualified"));
    }

    #[test]
    fn test_sorted_actions_stable() {
        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.actions = vec![
            Action {
                action_type: ActionType::AddTag,
                order: 2,
                delay: None,
                conditions: vec![],
                config: ActionConfig {
                    tag: Some("second".to_string()),
                    ..Default::default()
                },
                enabled: true,
            },
            Action {
                action_type: ActionType::AddTag,
                order: 1,
                delay: None,
                conditions: vec![],
                config: ActionConfig {
                    tag: Some("first".to_string()),
                    ..Default::default()
                },
                enabled: true,
            },
            Action {
                action_type: ActionType::AddTag,
                order: 2,
                delay: None,
                conditions: vec![],
                config: ActionConfig {
                    tag: Some("third".to_string()),
                    ..Default::default()
                },
                enabled: true,
            },
        ];

        let sorted = wf.sorted_actions();
        let tags: Vec<&str> = sorted
            .iter()
            .map(|a| a.config.tag.as_deref().unwrap())
            .collect();
        // Ties keep insertion order
        assert_eq!(tags, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_lifecycle() {
        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(!wf.accepts_matches());

        wf.activate().unwrap();
        assert_eq!(wf.status, WorkflowStatus::Active);
        assert!(wf.accepts_matches());

        wf.deactivate();
        assert!(!wf.accepts_matches());
        assert_eq!(wf.status, WorkflowStatus::Inactive);

        wf.activate().unwrap();
        wf.archive();
        assert!(wf.activate().is_err());
        assert!(!wf.accepts_matches());
    }

    #[test]
    fn test_push_revision_append_only() {
        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(wf.version, 1);

        wf.push_revision();
        wf.name = "welcome-new-leads-v2".to_string();

        assert_eq!(wf.version, 2);
        assert_eq!(wf.previous_versions.len(), 1);
        assert_eq!(wf.previous_versions[0].version, 1);
        assert_eq!(wf.previous_versions[0].snapshot.name, "welcome-new-leads");

        wf.push_revision();
        assert_eq!(wf.version, 3);
        assert_eq!(wf.previous_versions.len(), 2);
        // Older snapshots are untouched by later revisions
        assert_eq!(wf.previous_versions[0].snapshot.name, "welcome-new-leads");
        assert_eq!(
            wf.previous_versions[1].snapshot.name,
            "welcome-new-leads-v2"
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.name = "".to_string();
        assert!(wf.validate().is_err());

        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.actions[1].order = 1;
        assert!(wf.validate().is_err());

        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.trigger.trigger_type = TriggerType::TimeBased;
        assert!(wf.validate().is_err());

        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.actions[0].delay = Some("soon".to_string());
        assert!(wf.validate().is_err());

        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.trigger.conditions.push(Condition {
            field: "".to_string(),
            operator: ConditionOperator::Equals,
            value: json!("x"),
        });
        assert!(wf.validate().is_err());

        let mut wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        wf.error_handling.max_retries = u32::MAX;
        assert!(wf.validate().is_err());
        wf.error_handling.max_retries = MAX_RETRY_LIMIT;
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_schedule_validation() {
        let schedule = Schedule {
            frequency: ScheduleFrequency::Weekly,
            time_of_day: Some("09:00".to_string()),
            day_of_week: Some(1),
            day_of_month: None,
        };
        assert!(schedule.validate().is_ok());

        let schedule = Schedule {
            frequency: ScheduleFrequency::Weekly,
            time_of_day: Some("25:00".to_string()),
            day_of_week: None,
            day_of_month: None,
        };
        assert!(schedule.validate().is_err());

        let schedule = Schedule {
            frequency: ScheduleFrequency::Monthly,
            time_of_day: None,
            day_of_week: None,
            day_of_month: Some(32),
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_stats_serialization_roundtrip() {
        let wf: WorkflowDefinition = serde_yaml::from_str(sample_yaml()).unwrap();
        let json = serde_json::to_string(&wf).unwrap();
        let parsed: WorkflowDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, wf.name);
        assert_eq!(parsed.execution_stats.total_executions, 0);
        assert!(json.contains("maxExecutionsPerDay"));
        assert!(json.contains("retryOnFailure"));
    }
}
