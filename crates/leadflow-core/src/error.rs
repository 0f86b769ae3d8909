// Leadflow Core - Error taxonomy
//
// One error enum for the whole workspace. Condition evaluation problems are
// absorbed at the call site (a condition that cannot be evaluated is false),
// so `Condition` only surfaces from definition validation. Action and
// timeout errors abort the execution that raised them and are recorded on
// its audit record before being re-raised.

use thiserror::Error;

/// Result alias used across Leadflow crates
pub type LeadflowResult<T> = Result<T, LeadflowError>;

/// Errors produced by the workflow automation engine
#[derive(Debug, Error)]
pub enum LeadflowError {
    /// Invalid workflow definition or document
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed condition (empty field path, bad value shape)
    #[error("Condition error: {0}")]
    Condition(String),

    /// Action is missing required config for its type
    #[error("Action config error: {0}")]
    ActionConfig(String),

    /// Downstream channel failure while executing an action
    #[error("Action failed: {0}")]
    Action(String),

    /// Execution exceeded its configured timeout budget
    #[error("Execution timed out after {0}")]
    Timeout(String),

    /// Execution budget exhausted; the match was rejected, not queued
    #[error("Admission rejected for workflow {workflow_id}: {reason}")]
    AdmissionRejected { workflow_id: String, reason: String },

    /// Lead/record store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Outbound messaging channel failure
    #[error("Channel error: {0}")]
    Channel(String),
}

impl LeadflowError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn action_config(msg: impl Into<String>) -> Self {
        Self::ActionConfig(msg.into())
    }

    pub fn action(msg: impl Into<String>) -> Self {
        Self::Action(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// True for errors that end an execution (as opposed to rejecting or
    /// misconfiguring one).
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::Action(_)
                | Self::ActionConfig(_)
                | Self::Timeout(_)
                | Self::Store(_)
                | Self::Channel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LeadflowError::action_config("webhook requires 'url'");
        assert_eq!(
            err.to_string(),
            "Action config error: webhook requires 'url'"
        );

        let err = LeadflowError::AdmissionRejected {
            workflow_id: "wf-1".to_string(),
            reason: "hourly budget exhausted".to_string(),
        };
        assert!(err.to_string().contains("wf-1"));
    }

    #[test]
    fn test_execution_failure_classification() {
        assert!(LeadflowError::action("boom").is_execution_failure());
        assert!(LeadflowError::Timeout("5m".to_string()).is_execution_failure());
        assert!(!LeadflowError::config("bad yaml").is_execution_failure());
        assert!(!LeadflowError::AdmissionRejected {
            workflow_id: "wf-1".to_string(),
            reason: "daily budget exhausted".to_string(),
        }
        .is_execution_failure());
    }
}
