// Leadflow Core - Foundation types for the workflow automation engine
//
// This crate holds the pure parts of the system: the workflow definition
// model, the condition evaluator, the execution audit record, and the
// definition store with its live statistics. Everything side-effecting
// lives in leadflow-engine; event intake lives in leadflow-dispatch.

pub mod condition;
pub mod duration;
pub mod error;
pub mod execution;
pub mod registry;
pub mod workflow;

// Re-export core types
pub use condition::{
    coerce_string, evaluate, evaluate_all, resolve_path, Condition, ConditionOperator,
};
pub use duration::parse_duration;
pub use error::{LeadflowError, LeadflowResult};
pub use execution::{ExecutionStatus, WorkflowExecution};
pub use registry::WorkflowRegistry;
pub use workflow::{
    parse_time_of_day, Action, ActionConfig, ActionType, ErrorHandling, ExecutionStats, Schedule,
    ScheduleFrequency, TriggerDefinition, TriggerType, WorkflowDefinition, WorkflowLimits,
    WorkflowRevision, WorkflowSnapshot, WorkflowStatus, MAX_RETRY_LIMIT,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
