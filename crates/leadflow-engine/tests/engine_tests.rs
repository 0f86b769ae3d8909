// Workflow engine integration tests
//
// Exercises the engine end to end against recording collaborators:
// ordering, skips, failure policies, retries, timeouts and concurrent
// statistics updates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use leadflow_core::{
    Action, ActionConfig, ActionType, Condition, ConditionOperator, ExecutionStatus,
    LeadflowError, LeadflowResult, TriggerDefinition, TriggerType, WorkflowDefinition,
    WorkflowRegistry,
};
use leadflow_engine::{
    ActionExecutor, EmailMessage, ExecutionLog, InMemoryLeadStore, LeadStore, Messenger, NewTask,
    TaskService, WebhookCaller, WhatsAppMessage, WorkflowEngine,
};

#[derive(Default)]
struct RecordingMessenger {
    emails: Mutex<Vec<EmailMessage>>,
    whatsapp: Mutex<Vec<WhatsAppMessage>>,
    attempts: AtomicU32,
    /// Fail this many send_email calls before succeeding
    fail_first: AtomicU32,
}

impl RecordingMessenger {
    fn failing(times: u32) -> Self {
        Self {
            fail_first: AtomicU32::new(times),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_email(&self, message: EmailMessage) -> LeadflowResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LeadflowError::action("smtp gateway unavailable"));
        }
        self.emails.lock().push(message);
        Ok(())
    }

    async fn send_whatsapp(&self, message: WhatsAppMessage) -> LeadflowResult<()> {
        self.whatsapp.lock().push(message);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingTasks {
    tasks: Mutex<Vec<NewTask>>,
}

#[async_trait]
impl TaskService for RecordingTasks {
    async fn create_task(&self, task: NewTask) -> LeadflowResult<String> {
        let mut tasks = self.tasks.lock();
        tasks.push(task);
        Ok(format!("task-{}", tasks.len()))
    }
}

#[derive(Default)]
struct RecordingWebhooks {
    calls: Mutex<Vec<(String, String, Value)>>,
}

#[async_trait]
impl WebhookCaller for RecordingWebhooks {
    async fn call(
        &self,
        url: &str,
        method: &str,
        _headers: &HashMap<String, String>,
        body: &Value,
    ) -> LeadflowResult<()> {
        self.calls
            .lock()
            .push((url.to_string(), method.to_string(), body.clone()));
        Ok(())
    }
}

struct Harness {
    engine: Arc<WorkflowEngine>,
    registry: Arc<WorkflowRegistry>,
    leads: Arc<InMemoryLeadStore>,
    messenger: Arc<RecordingMessenger>,
    tasks: Arc<RecordingTasks>,
    webhooks: Arc<RecordingWebhooks>,
}

fn harness_with(messenger: RecordingMessenger) -> Harness {
    let leads = Arc::new(InMemoryLeadStore::new());
    leads.put(
        "lead-1",
        json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "+4915512345678",
            "status": "new",
            "score": 80,
            "source": "landing-page"
        }),
    );

    let messenger = Arc::new(messenger);
    let tasks = Arc::new(RecordingTasks::default());
    let webhooks = Arc::new(RecordingWebhooks::default());
    let registry = Arc::new(WorkflowRegistry::new());

    let actions = Arc::new(ActionExecutor::new(
        leads.clone(),
        messenger.clone(),
        tasks.clone(),
        webhooks.clone(),
    ));
    let engine = Arc::new(WorkflowEngine::new(
        registry.clone(),
        actions,
        Arc::new(ExecutionLog::new()),
    ));

    Harness {
        engine,
        registry,
        leads,
        messenger,
        tasks,
        webhooks,
    }
}

fn harness() -> Harness {
    harness_with(RecordingMessenger::default())
}

fn workflow(actions: Vec<Action>) -> WorkflowDefinition {
    let mut wf = WorkflowDefinition::new(
        "acme",
        "test-workflow",
        TriggerDefinition {
            trigger_type: TriggerType::LeadCreated,
            conditions: vec![],
            schedule: None,
        },
        actions,
    );
    wf.activate().unwrap();
    wf
}

fn tag_action(order: u32, tag: &str) -> Action {
    Action {
        action_type: ActionType::AddTag,
        order,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            tag: Some(tag.to_string()),
            ..Default::default()
        },
        enabled: true,
    }
}

fn email_action(order: u32) -> Action {
    Action {
        action_type: ActionType::SendEmail,
        order,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            subject: Some("Welcome, ${name}!".to_string()),
            body: Some("Thanks for signing up.".to_string()),
            ..Default::default()
        },
        enabled: true,
    }
}

async fn run(
    harness: &Harness,
    wf: WorkflowDefinition,
) -> LeadflowResult<leadflow_core::WorkflowExecution> {
    let id = wf.id.clone();
    harness.registry.insert(wf).unwrap();
    let definition = harness.registry.get(&id).unwrap();
    harness
        .engine
        .execute(definition, "lead-1", json!({}), HashMap::new())
        .await
}

#[tokio::test]
async fn test_welcome_flow_completes() {
    let harness = harness();
    let execution = run(
        &harness,
        workflow(vec![email_action(1), tag_action(2, "welcome-sent")]),
    )
    .await
    .unwrap();

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert!(execution.error.is_none());
    assert!(execution.finished_at.is_some());

    let emails = harness.messenger.emails.lock();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "ada@example.com");
    assert_eq!(emails[0].subject, "Welcome, Ada!");

    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["welcome-sent"]));

    let stats = harness.registry.stats_snapshot(&execution.workflow_id);
    assert_eq!(stats.total_executions, 1);
    assert_eq!(stats.successful_executions, 1);
    assert_eq!(stats.failed_executions, 0);
    assert!(stats.last_executed.is_some());

    let log = harness.engine.history();
    assert_eq!(log.by_workflow(&execution.workflow_id).len(), 1);
}

#[tokio::test]
async fn test_actions_run_in_ascending_order() {
    let harness = harness();
    run(
        &harness,
        workflow(vec![
            tag_action(3, "third"),
            tag_action(1, "first"),
            tag_action(2, "second"),
        ]),
    )
    .await
    .unwrap();

    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["first", "second", "third"]));
}

#[tokio::test]
async fn test_disabled_action_is_skipped() {
    let harness = harness();
    let mut disabled = email_action(1);
    disabled.enabled = false;

    let execution = run(&harness, workflow(vec![disabled, tag_action(2, "kept")]))
        .await
        .unwrap();

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert!(harness.messenger.emails.lock().is_empty());
    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["kept"]));
}

#[tokio::test]
async fn test_condition_skip_still_completes() {
    let harness = harness();
    let mut gated = email_action(1);
    gated.conditions = vec![Condition {
        field: "score".to_string(),
        operator: ConditionOperator::GreaterThan,
        value: json!(100),
    }];

    let execution = run(&harness, workflow(vec![gated, tag_action(2, "after")]))
        .await
        .unwrap();

    // A false condition skips the action without failing the execution
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert!(harness.messenger.emails.lock().is_empty());
    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["after"]));
}

#[tokio::test]
async fn test_failure_aborts_remaining_actions() {
    let harness = harness_with(RecordingMessenger::failing(u32::MAX));
    let err = run(
        &harness,
        workflow(vec![tag_action(1, "before"), email_action(2), tag_action(3, "after")]),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("smtp gateway unavailable"));

    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["before"]));

    let executions = harness.engine.history().by_tenant("acme");
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Failed);
    assert!(executions[0]
        .error
        .as_deref()
        .unwrap()
        .contains("smtp gateway unavailable"));

    let stats = harness.registry.stats_snapshot(&executions[0].workflow_id);
    assert_eq!(stats.failed_executions, 1);
    assert_eq!(stats.successful_executions, 0);
}

#[tokio::test]
async fn test_stop_on_error_false_continues_but_fails() {
    let harness = harness_with(RecordingMessenger::failing(u32::MAX));
    let mut wf = workflow(vec![email_action(1), tag_action(2, "still-runs")]);
    wf.error_handling.stop_on_error = false;

    let err = run(&harness, wf).await.unwrap_err();
    assert!(err.to_string().contains("smtp gateway unavailable"));

    // The later action ran even though the execution ends failed
    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["still-runs"]));

    let executions = harness.engine.history().by_tenant("acme");
    assert_eq!(executions[0].status, ExecutionStatus::Failed);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let harness = harness_with(RecordingMessenger::failing(2));
    let mut wf = workflow(vec![email_action(1)]);
    wf.error_handling.retry_on_failure = true;
    wf.error_handling.max_retries = 3;
    wf.error_handling.retry_delay = "0s".to_string();

    let execution = run(&harness, wf).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(harness.messenger.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(harness.messenger.emails.lock().len(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_fails_execution() {
    let harness = harness_with(RecordingMessenger::failing(u32::MAX));
    let mut wf = workflow(vec![email_action(1)]);
    wf.error_handling.retry_on_failure = true;
    wf.error_handling.max_retries = 2;
    wf.error_handling.retry_delay = "0s".to_string();

    run(&harness, wf).await.unwrap_err();
    // Initial attempt plus two retries
    assert_eq!(harness.messenger.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_missing_config_fails_without_retrying() {
    let harness = harness();
    let mut broken = email_action(1);
    broken.config.subject = None;
    let mut wf = workflow(vec![broken]);
    wf.error_handling.retry_on_failure = true;
    wf.error_handling.retry_delay = "0s".to_string();

    let err = run(&harness, wf).await.unwrap_err();
    assert!(matches!(err, LeadflowError::ActionConfig(_)));
    // Config validation happens before any side effect
    assert_eq!(harness.messenger.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_execution_timeout_preempts_delays() {
    let harness = harness();
    let mut first = tag_action(1, "before-delay");
    first.delay = Some("10m".to_string());
    let mut wf = workflow(vec![first, tag_action(2, "never")]);
    wf.limits.execution_timeout = "30s".to_string();

    let err = run(&harness, wf).await.unwrap_err();
    assert!(matches!(err, LeadflowError::Timeout(_)));

    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["before-delay"]));

    let executions = harness.engine.history().by_tenant("acme");
    assert_eq!(executions[0].status, ExecutionStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_delay_suspends_between_actions() {
    let harness = harness();
    let mut first = tag_action(1, "first");
    first.delay = Some("5m".to_string());
    let wf = workflow(vec![first, tag_action(2, "second")]);

    let execution = run(&harness, wf).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    // Paused-time auto-advance covered the delay; wall clock stayed flat
    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["first", "second"]));
}

#[tokio::test(start_paused = true)]
async fn test_deactivation_does_not_cancel_running_execution() {
    let harness = harness();
    let mut first = tag_action(1, "first");
    first.delay = Some("5m".to_string());
    let wf = workflow(vec![first, tag_action(2, "second")]);
    let id = wf.id.clone();
    harness.registry.insert(wf).unwrap();
    let definition = harness.registry.get(&id).unwrap();

    let engine = harness.engine.clone();
    let handle = tokio::spawn(async move {
        engine
            .execute(definition, "lead-1", json!({}), HashMap::new())
            .await
    });

    // Let the execution reach its inter-action delay, then deactivate
    tokio::task::yield_now().await;
    harness.registry.deactivate(&id).unwrap();

    let execution = handle.await.unwrap().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);

    // Both actions ran to completion despite the deactivation
    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["tags"], json!(["first", "second"]));

    // Only future matching is blocked
    assert!(!harness.registry.get(&id).unwrap().accepts_matches());
    let stats = harness.registry.stats_snapshot(&id);
    assert_eq!(stats.successful_executions, 1);
    assert_eq!(stats.failed_executions, 0);
}

#[tokio::test]
async fn test_create_task_and_webhook_actions() {
    let harness = harness();
    let task = Action {
        action_type: ActionType::CreateTask,
        order: 1,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            task_title: Some("Call ${name}".to_string()),
            due_in: Some("24h".to_string()),
            assignee: Some("user-7".to_string()),
            ..Default::default()
        },
        enabled: true,
    };
    let hook = Action {
        action_type: ActionType::Webhook,
        order: 2,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            url: Some("https://example.com/hook".to_string()),
            method: Some("POST".to_string()),
            ..Default::default()
        },
        enabled: true,
    };

    run(&harness, workflow(vec![task, hook])).await.unwrap();

    let tasks = harness.tasks.tasks.lock();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Call Ada");
    assert_eq!(tasks[0].assignee.as_deref(), Some("user-7"));
    assert_eq!(tasks[0].related_record_id, "lead-1");

    let calls = harness.webhooks.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "https://example.com/hook");
    assert_eq!(calls[0].1, "POST");
    // Payload defaults to the target record
    assert_eq!(calls[0].2["email"], json!("ada@example.com"));
}

#[tokio::test]
async fn test_concurrent_executions_no_lost_stats() {
    let harness = harness();
    let wf = workflow(vec![tag_action(1, "touched")]);
    let id = wf.id.clone();
    harness.registry.insert(wf).unwrap();
    let definition = harness.registry.get(&id).unwrap();

    let mut handles = Vec::new();
    for i in 0..100 {
        let lead_id = format!("lead-c{}", i);
        harness.leads.put(
            lead_id.clone(),
            json!({"name": format!("Lead {}", i), "email": "x@example.com"}),
        );
        let engine = harness.engine.clone();
        let definition = definition.clone();
        handles.push(tokio::spawn(async move {
            engine
                .execute(definition, &lead_id, json!({}), HashMap::new())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = harness.registry.stats_snapshot(&id);
    assert_eq!(stats.total_executions, 100);
    assert_eq!(stats.successful_executions, 100);
    assert_eq!(stats.failed_executions, 0);
    assert_eq!(harness.engine.history().by_workflow(&id).len(), 100);
}

#[tokio::test]
async fn test_update_and_status_actions_mutate_record() {
    let harness = harness();
    let update = Action {
        action_type: ActionType::UpdateLead,
        order: 1,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            fields: HashMap::from([("score".to_string(), json!(95))]),
            ..Default::default()
        },
        enabled: true,
    };
    let status = Action {
        action_type: ActionType::ChangeStatus,
        order: 2,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            lead_status: Some("qualified".to_string()),
            ..Default::default()
        },
        enabled: true,
    };
    let assign = Action {
        action_type: ActionType::AssignUser,
        order: 3,
        delay: None,
        conditions: vec![],
        config: ActionConfig {
            assignee: Some("user-3".to_string()),
            ..Default::default()
        },
        enabled: true,
    };

    run(&harness, workflow(vec![update, status, assign]))
        .await
        .unwrap();

    let lead = harness.leads.get("lead-1").await.unwrap();
    assert_eq!(lead["score"], json!(95));
    assert_eq!(lead["status"], json!("qualified"));
    assert_eq!(lead["assignedTo"], json!("user-3"));
}
