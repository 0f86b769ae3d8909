// Leadflow Engine - Workflow execution engine
//
// Runs one workflow's action sequence against one target record:
// creates the execution audit record, walks the actions in ascending
// order through the condition evaluator and the action executor, applies
// inter-action delays as true suspension points, and finalizes the record
// and the workflow statistics before reporting back to the dispatcher.
//
// The whole run lives under the workflow's execution timeout; the budget
// preempts delays and collaborator I/O alike. Many executions of the same
// or different workflows run concurrently; nothing here takes a global
// lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use leadflow_core::{
    evaluate_all, parse_duration, Action, LeadflowError, LeadflowResult, WorkflowDefinition,
    WorkflowExecution, WorkflowRegistry,
};

use crate::action::ActionExecutor;
use crate::history::ExecutionLog;

/// Events emitted during workflow execution
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Execution started
    ExecutionStarted {
        execution_id: String,
        workflow_id: String,
    },

    /// Action execution started
    ActionStarted { execution_id: String, order: u32 },

    /// Action was skipped (disabled or conditions not met)
    ActionSkipped {
        execution_id: String,
        order: u32,
        reason: String,
    },

    /// Action completed
    ActionCompleted { execution_id: String, order: u32 },

    /// Action failed and will be retried
    ActionRetrying {
        execution_id: String,
        order: u32,
        attempt: u32,
        error: String,
    },

    /// Action failed terminally
    ActionFailed {
        execution_id: String,
        order: u32,
        error: String,
    },

    /// Execution reached a terminal status
    ExecutionFinished {
        execution_id: String,
        success: bool,
        elapsed_ms: u64,
    },
}

/// Workflow execution engine
pub struct WorkflowEngine {
    registry: Arc<WorkflowRegistry>,
    actions: Arc<ActionExecutor>,
    history: Arc<ExecutionLog>,
    event_tx: Option<mpsc::Sender<EngineEvent>>,
}

impl WorkflowEngine {
    pub fn new(
        registry: Arc<WorkflowRegistry>,
        actions: Arc<ActionExecutor>,
        history: Arc<ExecutionLog>,
    ) -> Self {
        Self {
            registry,
            actions,
            history,
            event_tx: None,
        }
    }

    /// Add an event channel for monitoring
    pub fn with_event_channel(mut self, tx: mpsc::Sender<EngineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn history(&self) -> &Arc<ExecutionLog> {
        &self.history
    }

    pub fn registry(&self) -> &Arc<WorkflowRegistry> {
        &self.registry
    }

    /// Run one workflow against one target record. Returns the finalized
    /// execution record; failures are re-raised after being recorded.
    ///
    /// The definition is the caller's Arc snapshot: deactivating the
    /// workflow mid-flight does not affect this run.
    pub async fn execute(
        &self,
        definition: Arc<WorkflowDefinition>,
        target_id: &str,
        trigger_payload: Value,
        context: HashMap<String, Value>,
    ) -> LeadflowResult<WorkflowExecution> {
        // Resolve the budget first so a bad definition never leaves a
        // dangling running record behind
        let budget = parse_duration(&definition.limits.execution_timeout)?;

        let mut execution = WorkflowExecution::new(
            definition.id.clone(),
            definition.tenant_id.clone(),
            target_id,
            trigger_payload,
            context,
        );
        self.history.insert(execution.clone());

        info!(
            execution = %execution.id,
            workflow = %definition.id,
            target = %target_id,
            "Starting workflow execution"
        );
        self.emit(EngineEvent::ExecutionStarted {
            execution_id: execution.id.clone(),
            workflow_id: definition.id.clone(),
        })
        .await;

        let start = Instant::now();

        let outcome = match timeout(budget, self.run_actions(&definition, &execution)).await {
            Ok(result) => result,
            Err(_) => Err(LeadflowError::Timeout(
                definition.limits.execution_timeout.clone(),
            )),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        // Stats and the terminal write land before the caller hears back.
        match outcome {
            Ok(()) => {
                execution.complete(elapsed_ms);
                self.registry.record_success(&definition.id, elapsed_ms);
                self.history.finalize(execution.clone());

                info!(
                    execution = %execution.id,
                    elapsed_ms,
                    "Workflow execution completed"
                );
                self.emit(EngineEvent::ExecutionFinished {
                    execution_id: execution.id.clone(),
                    success: true,
                    elapsed_ms,
                })
                .await;
                Ok(execution)
            }
            Err(e) => {
                execution.fail(elapsed_ms, e.to_string());
                self.registry.record_failure(&definition.id, elapsed_ms);
                self.history.finalize(execution.clone());

                error!(
                    execution = %execution.id,
                    error = %e,
                    "Workflow execution failed"
                );
                self.emit(EngineEvent::ExecutionFinished {
                    execution_id: execution.id.clone(),
                    success: false,
                    elapsed_ms,
                })
                .await;
                Err(e)
            }
        }
    }

    /// Walk the action sequence. Strictly sequential within one execution;
    /// delays yield to the scheduler rather than occupying a worker.
    async fn run_actions(
        &self,
        definition: &WorkflowDefinition,
        execution: &WorkflowExecution,
    ) -> LeadflowResult<()> {
        // The triggering record conditions and templates resolve against
        let target = self.actions.leads().get(&execution.target_id).await?;

        let mut first_error: Option<LeadflowError> = None;

        for action in definition.sorted_actions() {
            if !action.enabled {
                debug!(order = action.order, "Action disabled, skipping");
                self.emit(EngineEvent::ActionSkipped {
                    execution_id: execution.id.clone(),
                    order: action.order,
                    reason: "disabled".to_string(),
                })
                .await;
                continue;
            }

            if !action.conditions.is_empty() && !evaluate_all(&action.conditions, &target) {
                debug!(order = action.order, "Action conditions not met, skipping");
                self.emit(EngineEvent::ActionSkipped {
                    execution_id: execution.id.clone(),
                    order: action.order,
                    reason: "conditions not met".to_string(),
                })
                .await;
                continue;
            }

            self.emit(EngineEvent::ActionStarted {
                execution_id: execution.id.clone(),
                order: action.order,
            })
            .await;

            match self
                .run_with_retries(definition, action, &target, execution)
                .await
            {
                Ok(()) => {
                    self.emit(EngineEvent::ActionCompleted {
                        execution_id: execution.id.clone(),
                        order: action.order,
                    })
                    .await;
                }
                Err(e) => {
                    self.emit(EngineEvent::ActionFailed {
                        execution_id: execution.id.clone(),
                        order: action.order,
                        error: e.to_string(),
                    })
                    .await;

                    if definition.error_handling.stop_on_error {
                        return Err(e);
                    }
                    warn!(
                        order = action.order,
                        error = %e,
                        "Action failed, continuing (stopOnError = false)"
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    continue;
                }
            }

            // Suspension point between actions. Other executions keep
            // running; the execution timeout can preempt this sleep.
            if let Some(delay) = &action.delay {
                let delay = parse_duration(delay)?;
                if !delay.is_zero() {
                    debug!(order = action.order, ?delay, "Delaying before next action");
                    sleep(delay).await;
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Execute one action under the workflow's retry policy
    async fn run_with_retries(
        &self,
        definition: &WorkflowDefinition,
        action: &Action,
        target: &Value,
        execution: &WorkflowExecution,
    ) -> LeadflowResult<()> {
        let policy = &definition.error_handling;
        let max_attempts = if policy.retry_on_failure {
            policy.max_retries.saturating_add(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            match self.actions.execute(action, target, execution).await {
                Ok(()) => return Ok(()),
                // Missing config is not transient; retrying cannot help
                Err(e @ LeadflowError::ActionConfig(_)) => return Err(e),
                Err(e) if attempt < max_attempts => {
                    self.emit(EngineEvent::ActionRetrying {
                        execution_id: execution.id.clone(),
                        order: action.order,
                        attempt,
                        error: e.to_string(),
                    })
                    .await;
                    warn!(
                        order = action.order,
                        attempt,
                        error = %e,
                        "Action failed, retrying"
                    );
                    sleep(parse_duration(&policy.retry_delay)?).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).await.is_err() {
                warn!("Failed to send engine event");
            }
        }
    }
}
