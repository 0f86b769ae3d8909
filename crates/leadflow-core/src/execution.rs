// Leadflow Core - Workflow execution audit record
//
// One WorkflowExecution exists per trigger match. It is created at dispatch
// time, mutated only by the engine that owns it, and its terminal fields
// are written exactly once. This subsystem never deletes executions;
// retention is an external concern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Execution status state machine: pending → running → {completed, failed}
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Admitted but not yet started
    Pending,
    /// Actions are being executed
    Running,
    /// All actions ran (or were skipped) without error
    Completed,
    /// An action or the timeout budget failed the execution
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One run of a workflow's action sequence against one target record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    /// Execution id
    pub id: String,

    /// Workflow this execution belongs to
    pub workflow_id: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Target record (lead) id
    pub target_id: String,

    /// The triggering event payload, captured verbatim
    pub trigger_payload: Value,

    /// Caller-supplied context
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, Value>,

    /// Execution status
    pub status: ExecutionStatus,

    /// When the execution was created
    pub started_at: DateTime<Utc>,

    /// When the execution reached a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Wall-clock duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,

    /// Error message for failed executions, recorded verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowExecution {
    /// Create a new running execution for a trigger match
    pub fn new(
        workflow_id: impl Into<String>,
        tenant_id: impl Into<String>,
        target_id: impl Into<String>,
        trigger_payload: Value,
        context: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            tenant_id: tenant_id.into(),
            target_id: target_id.into(),
            trigger_payload,
            context,
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            execution_time_ms: None,
            error: None,
        }
    }

    /// Mark the execution completed. Terminal fields are written once.
    pub fn complete(&mut self, elapsed_ms: u64) {
        debug_assert!(!self.status.is_terminal());
        self.status = ExecutionStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.execution_time_ms = Some(elapsed_ms);
    }

    /// Mark the execution failed with the triggering error message
    pub fn fail(&mut self, elapsed_ms: u64, error: impl Into<String>) {
        debug_assert!(!self.status.is_terminal());
        self.status = ExecutionStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.execution_time_ms = Some(elapsed_ms);
        self.error = Some(error.into());
    }
}
