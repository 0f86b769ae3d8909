// Leadflow Engine - In-memory lead store
//
// DashMap-backed LeadStore used by the test suites and by embedders that
// have no external record store. Records are plain JSON objects; tags are
// kept in a "tags" array, status in "status", owner in "assignedTo".

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::collections::HashMap;

use leadflow_core::{LeadflowError, LeadflowResult};

use crate::services::LeadStore;

/// In-memory LeadStore backend
#[derive(Default)]
pub struct InMemoryLeadStore {
    records: DashMap<String, Value>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Seed a record (creates or replaces)
    pub fn put(&self, id: impl Into<String>, record: Value) {
        self.records.insert(id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn with_record<F>(&self, id: &str, f: F) -> LeadflowResult<()>
    where
        F: FnOnce(&mut Value),
    {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| LeadflowError::store(format!("lead not found: {}", id)))?;
        f(entry.value_mut());
        Ok(())
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn get(&self, id: &str) -> LeadflowResult<Value> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| LeadflowError::store(format!("lead not found: {}", id)))
    }

    async fn update(&self, id: &str, patch: &HashMap<String, Value>) -> LeadflowResult<Value> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| LeadflowError::store(format!("lead not found: {}", id)))?;

        if let Some(obj) = entry.value_mut().as_object_mut() {
            for (key, value) in patch {
                obj.insert(key.clone(), value.clone());
            }
        }
        Ok(entry.value().clone())
    }

    async fn add_tag(&self, id: &str, tag: &str) -> LeadflowResult<()> {
        self.with_record(id, |record| {
            let tags = record
                .as_object_mut()
                .map(|obj| obj.entry("tags").or_insert_with(|| json!([])));
            if let Some(Value::Array(tags)) = tags {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(json!(tag));
                }
            }
        })
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> LeadflowResult<()> {
        self.with_record(id, |record| {
            if let Some(Value::Array(tags)) = record.get_mut("tags") {
                tags.retain(|t| t != tag);
            }
        })
    }

    async fn change_status(&self, id: &str, status: &str) -> LeadflowResult<()> {
        self.with_record(id, |record| {
            if let Some(obj) = record.as_object_mut() {
                obj.insert("status".to_string(), json!(status));
            }
        })
    }

    async fn assign_user(&self, id: &str, user_id: &str) -> LeadflowResult<()> {
        self.with_record(id, |record| {
            if let Some(obj) = record.as_object_mut() {
                obj.insert("assignedTo".to_string(), json!(user_id));
            }
        })
    }
}
