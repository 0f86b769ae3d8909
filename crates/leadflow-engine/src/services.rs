// Leadflow Engine - Consumed collaborator interfaces
//
// The engine mutates leads, sends messages, creates tasks and calls
// webhooks through these traits. Their implementations (database-backed
// stores, SMTP/WhatsApp gateways, CRM task queues) live outside this
// subsystem; the engine only consumes them.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use leadflow_core::LeadflowResult;

/// Lead/record store. Supplies the target passed to the condition
/// evaluator and receives record mutations from actions.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Fetch a lead record as a JSON document
    async fn get(&self, id: &str) -> LeadflowResult<Value>;

    /// Apply a field patch to a lead record, returning the updated record
    async fn update(&self, id: &str, patch: &HashMap<String, Value>) -> LeadflowResult<Value>;

    /// Add a tag to a lead (idempotent)
    async fn add_tag(&self, id: &str, tag: &str) -> LeadflowResult<()>;

    /// Remove a tag from a lead
    async fn remove_tag(&self, id: &str, tag: &str) -> LeadflowResult<()>;

    /// Change the lead's pipeline status
    async fn change_status(&self, id: &str, status: &str) -> LeadflowResult<()>;

    /// Assign the lead to a user
    async fn assign_user(&self, id: &str, user_id: &str) -> LeadflowResult<()>;
}

/// Resolved outbound email
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Resolved outbound WhatsApp message
#[derive(Debug, Clone)]
pub struct WhatsAppMessage {
    pub to: String,
    pub body: String,
}

/// Outbound messaging channels. Template variables are resolved from the
/// target record before the message reaches this trait.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> LeadflowResult<()>;

    async fn send_whatsapp(&self, message: WhatsAppMessage) -> LeadflowResult<()>;
}

/// New task handed to the CRM task service
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Due relative to now
    pub due_in: Option<Duration>,
    pub assignee: Option<String>,
    /// Lead the task is about
    pub related_record_id: String,
}

/// Task-creation service
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Create a task, returning its id
    async fn create_task(&self, task: NewTask) -> LeadflowResult<String>;
}

/// Generic HTTP webhook caller
#[async_trait]
pub trait WebhookCaller: Send + Sync {
    async fn call(
        &self,
        url: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> LeadflowResult<()>;
}
