// Leadflow Dispatch - Trigger dispatcher
//
// Fans one CRM event out to every matching workflow of the event's
// tenant: active definitions subscribed to the event class, trigger
// conditions evaluated against the payload, admission-checked, then one
// independent engine execution per match. Matches beyond their budget are
// rejected and reported, never queued. Inter-match order is unspecified.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use leadflow_core::{
    evaluate_all, LeadflowError, LeadflowResult, WorkflowDefinition, WorkflowExecution,
    WorkflowRegistry, WorkflowStatus,
};
use leadflow_engine::{AdmissionController, WorkflowEngine};

use crate::event::CrmEvent;

/// What happened to one matched workflow during dispatch
#[derive(Debug)]
pub enum MatchOutcome {
    /// An execution was launched; the handle resolves to its final record
    Started {
        workflow_id: String,
        handle: JoinHandle<LeadflowResult<WorkflowExecution>>,
    },

    /// The match was over budget and rejected
    Rejected { workflow_id: String, reason: String },

    /// Trigger conditions did not hold for the payload
    Skipped { workflow_id: String },
}

/// Per-event dispatch report
#[derive(Debug)]
pub struct DispatchOutcome {
    pub event_id: String,
    pub outcomes: Vec<MatchOutcome>,
}

impl DispatchOutcome {
    pub fn started(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, MatchOutcome::Started { .. }))
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, MatchOutcome::Rejected { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, MatchOutcome::Skipped { .. }))
            .count()
    }

    /// Await every launched execution (test and embedding convenience)
    pub async fn join_all(self) -> Vec<LeadflowResult<WorkflowExecution>> {
        let mut results = Vec::new();
        for outcome in self.outcomes {
            if let MatchOutcome::Started { handle, .. } = outcome {
                match handle.await {
                    Ok(result) => results.push(result),
                    Err(e) => results.push(Err(LeadflowError::channel(format!(
                        "execution task panicked: {}",
                        e
                    )))),
                }
            }
        }
        results
    }
}

/// Matches CRM events against workflow triggers and launches executions
pub struct TriggerDispatcher {
    registry: Arc<WorkflowRegistry>,
    engine: Arc<WorkflowEngine>,
    admission: AdmissionController,
}

impl TriggerDispatcher {
    pub fn new(registry: Arc<WorkflowRegistry>, engine: Arc<WorkflowEngine>) -> Self {
        Self {
            registry,
            engine,
            admission: AdmissionController::new(),
        }
    }

    pub fn registry(&self) -> &Arc<WorkflowRegistry> {
        &self.registry
    }

    /// Dispatch one event. Each matched workflow runs as its own task;
    /// an execution failing (or being rejected) never affects the others.
    pub async fn dispatch(&self, event: CrmEvent) -> DispatchOutcome {
        let candidates = self
            .registry
            .active_for_tenant(&event.tenant_id, event.trigger_type);

        debug!(
            event = %event.id,
            trigger = %event.trigger_type,
            tenant = %event.tenant_id,
            candidates = candidates.len(),
            "Dispatching event"
        );

        let mut outcomes = Vec::with_capacity(candidates.len());
        for definition in candidates {
            if !definition.trigger.conditions.is_empty()
                && !evaluate_all(&definition.trigger.conditions, &event.payload)
            {
                debug!(
                    workflow = %definition.id,
                    event = %event.id,
                    "Trigger conditions not met"
                );
                outcomes.push(MatchOutcome::Skipped {
                    workflow_id: definition.id.clone(),
                });
                continue;
            }

            outcomes.push(self.launch(
                definition,
                event.record_id.clone(),
                event.payload.clone(),
                event_context(&event),
            ));
        }

        DispatchOutcome {
            event_id: event.id,
            outcomes,
        }
    }

    /// Launch one specific workflow for a scheduler tick. Trigger matching
    /// is the ticker's job here; only the admission budget is checked.
    pub fn run_scheduled(
        &self,
        definition: Arc<WorkflowDefinition>,
        record_id: &str,
        payload: Value,
    ) -> MatchOutcome {
        let context = HashMap::from([("invocation".to_string(), json!("schedule"))]);
        self.launch(definition, record_id.to_string(), payload, context)
    }

    fn launch(
        &self,
        definition: Arc<WorkflowDefinition>,
        record_id: String,
        payload: Value,
        context: HashMap<String, Value>,
    ) -> MatchOutcome {
        if let Err(e) = self.admission.try_admit(&definition.id, &definition.limits) {
            warn!(workflow = %definition.id, error = %e, "Match rejected");
            return MatchOutcome::Rejected {
                workflow_id: definition.id.clone(),
                reason: e.to_string(),
            };
        }

        info!(
            workflow = %definition.id,
            target = %record_id,
            "Launching workflow execution"
        );

        let workflow_id = definition.id.clone();
        let engine = self.engine.clone();
        let handle = tokio::spawn(async move {
            let result = engine.execute(definition, &record_id, payload, context).await;
            if let Err(e) = &result {
                // Failures are recorded by the engine; the event
                // producer is never escalated to.
                error!(error = %e, "Workflow execution failed");
            }
            result
        });

        MatchOutcome::Started {
            workflow_id,
            handle,
        }
    }

    /// Run one workflow directly against a record, bypassing trigger
    /// matching. The workflow must be active; the admission budget still
    /// applies. Runs inline and returns the finalized execution.
    pub async fn run_manual(
        &self,
        workflow_id: &str,
        record_id: &str,
        payload: Value,
        mut context: HashMap<String, Value>,
    ) -> LeadflowResult<WorkflowExecution> {
        let definition = self.registry.get(workflow_id).ok_or_else(|| {
            LeadflowError::config(format!("workflow not found: {}", workflow_id))
        })?;

        if definition.status == WorkflowStatus::Archived || !definition.accepts_matches() {
            return Err(LeadflowError::config(format!(
                "workflow {} is not active",
                workflow_id
            )));
        }

        self.admission.try_admit(&definition.id, &definition.limits)?;

        context.insert("invocation".to_string(), json!("manual"));
        info!(workflow = %workflow_id, target = %record_id, "Manual workflow run");
        self.engine
            .execute(definition, record_id, payload, context)
            .await
    }
}

fn event_context(event: &CrmEvent) -> HashMap<String, Value> {
    HashMap::from([
        ("eventId".to_string(), json!(event.id)),
        ("triggerType".to_string(), json!(event.trigger_type.to_string())),
        ("occurredAt".to_string(), json!(event.occurred_at)),
    ])
}
