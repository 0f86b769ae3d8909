// Leadflow Dispatch - CRM event model
//
// Normalized form of everything the dispatcher can react to: lead
// lifecycle events, tag changes, scheduler ticks and manual invocations.
// Producers build these; the dispatcher matches them against workflow
// triggers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use leadflow_core::TriggerType;

/// One CRM event entering the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmEvent {
    /// Event id
    pub id: String,

    /// Tenant the event belongs to
    pub tenant_id: String,

    /// Trigger class this event feeds
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,

    /// Record the event is about (the execution target)
    pub record_id: String,

    /// Event payload, matched against trigger conditions
    pub payload: Value,

    /// When the event happened
    pub occurred_at: DateTime<Utc>,
}

impl CrmEvent {
    pub fn new(
        tenant_id: impl Into<String>,
        trigger_type: TriggerType,
        record_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            trigger_type,
            record_id: record_id.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }

    /// A lead record was created
    pub fn lead_created(
        tenant_id: impl Into<String>,
        record_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(tenant_id, TriggerType::LeadCreated, record_id, payload)
    }

    /// A lead record changed
    pub fn lead_updated(
        tenant_id: impl Into<String>,
        record_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(tenant_id, TriggerType::LeadUpdated, record_id, payload)
    }

    /// A tag was added to a lead
    pub fn tag_added(
        tenant_id: impl Into<String>,
        record_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(tenant_id, TriggerType::TagAdded, record_id, payload)
    }

    /// Scheduler tick for one due workflow target
    pub fn schedule_tick(
        tenant_id: impl Into<String>,
        record_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(tenant_id, TriggerType::TimeBased, record_id, payload)
    }
}
