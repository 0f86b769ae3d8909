// Leadflow Engine - Action executor
//
// Executes one action of a known type against a target record through the
// collaborator traits. Required-config validation happens before any side
// effect; a missing config field fails the execution immediately. Whether
// an action runs at all (enabled flag, conditions) is the engine's call,
// not this module's: a false condition means "skip", an error here means
// "fail".

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use leadflow_core::{
    coerce_string, parse_duration, resolve_path, Action, ActionType, LeadflowError,
    LeadflowResult, WorkflowExecution,
};

use crate::services::{
    EmailMessage, LeadStore, Messenger, NewTask, TaskService, WebhookCaller, WhatsAppMessage,
};

/// Executes single actions through the consumed collaborators
pub struct ActionExecutor {
    leads: Arc<dyn LeadStore>,
    messenger: Arc<dyn Messenger>,
    tasks: Arc<dyn TaskService>,
    webhooks: Arc<dyn WebhookCaller>,
}

impl ActionExecutor {
    pub fn new(
        leads: Arc<dyn LeadStore>,
        messenger: Arc<dyn Messenger>,
        tasks: Arc<dyn TaskService>,
        webhooks: Arc<dyn WebhookCaller>,
    ) -> Self {
        Self {
            leads,
            messenger,
            tasks,
            webhooks,
        }
    }

    pub fn leads(&self) -> &Arc<dyn LeadStore> {
        &self.leads
    }

    /// Execute one action against a target record
    pub async fn execute(
        &self,
        action: &Action,
        target: &Value,
        execution: &WorkflowExecution,
    ) -> LeadflowResult<()> {
        debug!(
            action = %action.action_type,
            execution = %execution.id,
            target = %execution.target_id,
            "Executing action"
        );

        match action.action_type {
            ActionType::SendEmail => self.send_email(action, target).await,
            ActionType::SendWhatsapp => self.send_whatsapp(action, target).await,
            ActionType::CreateTask => self.create_task(action, target, execution).await,
            ActionType::UpdateLead => self.update_lead(action, execution).await,
            ActionType::AddTag => {
                let tag = require(action, action.config.tag.as_deref(), "tag")?;
                self.leads.add_tag(&execution.target_id, tag).await
            }
            ActionType::RemoveTag => {
                let tag = require(action, action.config.tag.as_deref(), "tag")?;
                self.leads.remove_tag(&execution.target_id, tag).await
            }
            ActionType::ChangeStatus => {
                let status = require(action, action.config.lead_status.as_deref(), "leadStatus")?;
                self.leads.change_status(&execution.target_id, status).await
            }
            ActionType::AssignUser => {
                let assignee = require(action, action.config.assignee.as_deref(), "assignee")?;
                self.leads.assign_user(&execution.target_id, assignee).await
            }
            ActionType::Webhook => self.call_webhook(action, target).await,
        }
    }

    async fn send_email(&self, action: &Action, target: &Value) -> LeadflowResult<()> {
        let subject = require(action, action.config.subject.as_deref(), "subject")?;
        let body = require(action, action.config.body.as_deref(), "body")?;

        let to = coerce_string(resolve_path(target, "email"));
        if to.is_empty() {
            return Err(LeadflowError::action(
                "send_email target record has no email address",
            ));
        }

        self.messenger
            .send_email(EmailMessage {
                to,
                subject: render_template(subject, target),
                body: render_template(body, target),
            })
            .await
    }

    async fn send_whatsapp(&self, action: &Action, target: &Value) -> LeadflowResult<()> {
        let message = require(action, action.config.message.as_deref(), "message")?;

        let to = coerce_string(resolve_path(target, "phone"));
        if to.is_empty() {
            return Err(LeadflowError::action(
                "send_whatsapp target record has no phone number",
            ));
        }

        self.messenger
            .send_whatsapp(WhatsAppMessage {
                to,
                body: render_template(message, target),
            })
            .await
    }

    async fn create_task(
        &self,
        action: &Action,
        target: &Value,
        execution: &WorkflowExecution,
    ) -> LeadflowResult<()> {
        let title = require(action, action.config.task_title.as_deref(), "taskTitle")?;
        let due_in = require(action, action.config.due_in.as_deref(), "dueIn")?;
        let due_in = parse_duration(due_in)
            .map_err(|e| LeadflowError::action_config(format!("create_task dueIn: {}", e)))?;

        let task_id = self
            .tasks
            .create_task(NewTask {
                title: render_template(title, target),
                description: action
                    .config
                    .task_description
                    .as_deref()
                    .map(|d| render_template(d, target)),
                due_in: Some(due_in),
                assignee: action.config.assignee.clone(),
                related_record_id: execution.target_id.clone(),
            })
            .await?;

        debug!(task_id = %task_id, "Task created");
        Ok(())
    }

    async fn update_lead(
        &self,
        action: &Action,
        execution: &WorkflowExecution,
    ) -> LeadflowResult<()> {
        if action.config.fields.is_empty() {
            return Err(config_error(action, "fields"));
        }
        self.leads
            .update(&execution.target_id, &action.config.fields)
            .await?;
        Ok(())
    }

    async fn call_webhook(&self, action: &Action, target: &Value) -> LeadflowResult<()> {
        let url = require(action, action.config.url.as_deref(), "url")?;
        let method = require(action, action.config.method.as_deref(), "method")?;

        // The payload defaults to the target record itself
        let body = action
            .config
            .payload
            .clone()
            .unwrap_or_else(|| target.clone());

        self.webhooks
            .call(url, method, &action.config.headers, &body)
            .await
    }
}

fn require<'a>(action: &Action, field: Option<&'a str>, name: &str) -> LeadflowResult<&'a str> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(config_error(action, name)),
    }
}

fn config_error(action: &Action, field: &str) -> LeadflowError {
    LeadflowError::action_config(format!(
        "{} action requires config field '{}'",
        action.action_type, field
    ))
}

/// Resolve ${dot.path} variables in a template from the target record.
/// Unknown paths render as the empty string.
pub fn render_template(template: &str, record: &Value) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let path = &after[..end];
                result.push_str(&coerce_string(resolve_path(record, path)));
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated placeholder, emit verbatim
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}
