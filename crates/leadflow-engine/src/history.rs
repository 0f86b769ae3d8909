// Leadflow Engine - Execution audit trail
//
// Every execution record lands here when it is created and is finalized in
// place when it reaches a terminal status. Nothing is ever deleted by this
// subsystem; retention/expiry belongs to whoever embeds the engine.

use dashmap::DashMap;

use leadflow_core::WorkflowExecution;

/// In-memory execution history, keyed by execution id
#[derive(Default)]
pub struct ExecutionLog {
    executions: DashMap<String, WorkflowExecution>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self {
            executions: DashMap::new(),
        }
    }

    /// Record a newly created execution
    pub fn insert(&self, execution: WorkflowExecution) {
        self.executions.insert(execution.id.clone(), execution);
    }

    /// Overwrite an execution with its finalized form. The engine owns the
    /// record exclusively, so this is the single writer.
    pub fn finalize(&self, execution: WorkflowExecution) {
        self.executions.insert(execution.id.clone(), execution);
    }

    /// Fetch one execution by id
    pub fn get(&self, id: &str) -> Option<WorkflowExecution> {
        self.executions.get(id).map(|r| r.value().clone())
    }

    /// All executions of one workflow, newest first
    pub fn by_workflow(&self, workflow_id: &str) -> Vec<WorkflowExecution> {
        let mut executions: Vec<WorkflowExecution> = self
            .executions
            .iter()
            .filter(|r| r.value().workflow_id == workflow_id)
            .map(|r| r.value().clone())
            .collect();
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        executions
    }

    /// All executions of one tenant, newest first
    pub fn by_tenant(&self, tenant_id: &str) -> Vec<WorkflowExecution> {
        let mut executions: Vec<WorkflowExecution> = self
            .executions
            .iter()
            .filter(|r| r.value().tenant_id == tenant_id)
            .map(|r| r.value().clone())
            .collect();
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        executions
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}
