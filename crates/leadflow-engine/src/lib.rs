// Leadflow Engine - Workflow execution
//
// Turns a workflow definition plus a target record into side effects:
// - Action executor for the closed set of action types
// - Workflow engine state machine with timeouts, retries and delays
// - Admission control over per-workflow execution budgets
// - Execution audit trail
// - Collaborator traits (lead store, messenger, tasks, webhooks) with
//   in-memory and HTTP implementations

pub mod action;
pub mod admission;
pub mod executor;
pub mod history;
pub mod memory;
pub mod services;
pub mod webhook;

pub use action::{render_template, ActionExecutor};
pub use admission::AdmissionController;
pub use executor::{EngineEvent, WorkflowEngine};
pub use history::ExecutionLog;
pub use memory::InMemoryLeadStore;
pub use services::{
    EmailMessage, LeadStore, Messenger, NewTask, TaskService, WebhookCaller, WhatsAppMessage,
};
pub use webhook::HttpWebhookCaller;
