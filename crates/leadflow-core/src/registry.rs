// Leadflow Core - Workflow definition store
//
// The WorkflowRegistry holds tenant-owned workflow definitions and the live
// execution statistics for each. Definitions are handed out as Arc
// snapshots; structural edits go through `update`, which pushes a revision
// before applying the change and swaps the stored Arc.
//
// Statistics are shared by every concurrent execution of a workflow, so
// they live in atomic counters rather than in the serialized definition;
// `stats_snapshot` folds them back into the document form.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{LeadflowError, LeadflowResult};
use crate::workflow::{ExecutionStats, TriggerType, WorkflowDefinition};
#[cfg(test)]
use crate::workflow::WorkflowStatus;

/// Live per-workflow counters, updated atomically by concurrent executions
#[derive(Default)]
struct StatsCell {
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    total_elapsed_ms: AtomicU64,
    last_executed: Mutex<Option<DateTime<Utc>>>,
}

/// Workflow definition store with live statistics
pub struct WorkflowRegistry {
    definitions: DashMap<String, Arc<WorkflowDefinition>>,
    stats: DashMap<String, Arc<StatsCell>>,
}

impl WorkflowRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    /// Validate and store a definition. New definitions arrive as drafts.
    pub fn insert(&self, definition: WorkflowDefinition) -> LeadflowResult<String> {
        definition.validate()?;
        let id = definition.id.clone();
        self.stats.entry(id.clone()).or_default();
        self.definitions.insert(id.clone(), Arc::new(definition));
        Ok(id)
    }

    /// Get a definition snapshot by id
    pub fn get(&self, id: &str) -> Option<Arc<WorkflowDefinition>> {
        self.definitions.get(id).map(|r| r.value().clone())
    }

    /// Remove a definition (administrative; executions in flight keep
    /// their own Arc and are unaffected)
    pub fn remove(&self, id: &str) -> Option<Arc<WorkflowDefinition>> {
        self.stats.remove(id);
        self.definitions.remove(id).map(|(_, v)| v)
    }

    /// All definition ids
    pub fn list(&self) -> Vec<String> {
        self.definitions.iter().map(|r| r.key().clone()).collect()
    }

    /// All definitions owned by a tenant
    pub fn for_tenant(&self, tenant_id: &str) -> Vec<Arc<WorkflowDefinition>> {
        self.definitions
            .iter()
            .filter(|r| r.value().tenant_id == tenant_id)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Active definitions of a tenant subscribed to a trigger type.
    /// This is the dispatcher's match candidate set.
    pub fn active_for_tenant(
        &self,
        tenant_id: &str,
        trigger_type: TriggerType,
    ) -> Vec<Arc<WorkflowDefinition>> {
        self.definitions
            .iter()
            .filter(|r| {
                let wf = r.value();
                wf.tenant_id == tenant_id
                    && wf.accepts_matches()
                    && wf.trigger.trigger_type == trigger_type
            })
            .map(|r| r.value().clone())
            .collect()
    }

    /// All active time_based definitions (the schedule ticker's scan set)
    pub fn scheduled(&self) -> Vec<Arc<WorkflowDefinition>> {
        self.definitions
            .iter()
            .filter(|r| {
                let wf = r.value();
                wf.accepts_matches() && wf.trigger.trigger_type == TriggerType::TimeBased
            })
            .map(|r| r.value().clone())
            .collect()
    }

    /// Activate a workflow
    pub fn activate(&self, id: &str) -> LeadflowResult<()> {
        self.mutate(id, |wf| wf.activate())
    }

    /// Deactivate a workflow. Blocks future matches; executions already
    /// running are not cancelled.
    pub fn deactivate(&self, id: &str) -> LeadflowResult<()> {
        self.mutate(id, |wf| {
            wf.deactivate();
            Ok(())
        })
    }

    /// Archive a workflow
    pub fn archive(&self, id: &str) -> LeadflowResult<()> {
        self.mutate(id, |wf| {
            wf.archive();
            Ok(())
        })
    }

    /// Apply a structural edit. The current version is snapshotted into the
    /// history first, then the mutator runs, then the edited definition is
    /// re-validated and swapped in.
    pub fn update<F>(&self, id: &str, mutator: F) -> LeadflowResult<Arc<WorkflowDefinition>>
    where
        F: FnOnce(&mut WorkflowDefinition),
    {
        let mut entry = self
            .definitions
            .get_mut(id)
            .ok_or_else(|| LeadflowError::config(format!("workflow not found: {}", id)))?;

        let mut edited = (**entry.value()).clone();
        edited.push_revision();
        mutator(&mut edited);
        edited.validate()?;

        let arc = Arc::new(edited);
        *entry.value_mut() = arc.clone();
        Ok(arc)
    }

    fn mutate<F>(&self, id: &str, f: F) -> LeadflowResult<()>
    where
        F: FnOnce(&mut WorkflowDefinition) -> LeadflowResult<()>,
    {
        let mut entry = self
            .definitions
            .get_mut(id)
            .ok_or_else(|| LeadflowError::config(format!("workflow not found: {}", id)))?;
        let mut edited = (**entry.value()).clone();
        f(&mut edited)?;
        *entry.value_mut() = Arc::new(edited);
        Ok(())
    }

    /// Number of stored definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Record a completed execution. Atomic increments; concurrent
    /// executions of the same workflow never lose updates.
    pub fn record_success(&self, id: &str, elapsed_ms: u64) {
        let cell = self.stats.entry(id.to_string()).or_default().clone();
        cell.total.fetch_add(1, Ordering::Relaxed);
        cell.succeeded.fetch_add(1, Ordering::Relaxed);
        cell.total_elapsed_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
        *cell.last_executed.lock() = Some(Utc::now());
    }

    /// Record a failed execution
    pub fn record_failure(&self, id: &str, elapsed_ms: u64) {
        let cell = self.stats.entry(id.to_string()).or_default().clone();
        cell.total.fetch_add(1, Ordering::Relaxed);
        cell.failed.fetch_add(1, Ordering::Relaxed);
        cell.total_elapsed_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
        *cell.last_executed.lock() = Some(Utc::now());
    }

    /// Fold the live counters into the serialized stats form
    pub fn stats_snapshot(&self, id: &str) -> ExecutionStats {
        let Some(cell) = self.stats.get(id).map(|r| r.value().clone()) else {
            return ExecutionStats::default();
        };

        let total = cell.total.load(Ordering::Relaxed);
        let elapsed = cell.total_elapsed_ms.load(Ordering::Relaxed);
        let last_executed = *cell.last_executed.lock();
        ExecutionStats {
            total_executions: total,
            successful_executions: cell.succeeded.load(Ordering::Relaxed),
            failed_executions: cell.failed.load(Ordering::Relaxed),
            average_execution_time_ms: if total > 0 {
                elapsed as f64 / total as f64
            } else {
                0.0
            },
            last_executed,
        }
    }

    /// Definition snapshot with the live statistics folded in; the form
    /// handed to callers querying workflow health
    pub fn definition_with_stats(&self, id: &str) -> Option<WorkflowDefinition> {
        let mut definition = (*self.get(id)?).clone();
        definition.execution_stats = self.stats_snapshot(id);
        Some(definition)
    }

    // ========================================================================
    // Document loading
    // ========================================================================

    /// Load a workflow document from a YAML file
    pub fn load_file(&self, path: impl AsRef<Path>) -> LeadflowResult<String> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LeadflowError::config(format!(
                "failed to read workflow file {}: {}",
                path.display(),
                e
            ))
        })?;

        let definition: WorkflowDefinition = serde_yaml::from_str(&content).map_err(|e| {
            LeadflowError::config(format!(
                "failed to parse workflow file {}: {}",
                path.display(),
                e
            ))
        })?;

        self.insert(definition)
    }

    /// Load every .yaml/.yml workflow document in a directory
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> LeadflowResult<usize> {
        let dir = dir.as_ref();

        if !dir.exists() {
            return Err(LeadflowError::config(format!(
                "workflows directory does not exist: {}",
                dir.display()
            )));
        }

        let entries = std::fs::read_dir(dir).map_err(|e| {
            LeadflowError::config(format!("failed to read workflows directory: {}", e))
        })?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                if ext == "yaml" || ext == "yml" {
                    match self.load_file(&path) {
                        Ok(id) => {
                            info!("Loaded workflow {} from {}", id, path.display());
                            loaded += 1;
                        }
                        Err(e) => {
                            warn!("Failed to load workflow from {}: {}", path.display(), e);
                        }
                    }
                }
            }
        }

        info!("Loaded {} workflows from {}", loaded, dir.display());
        Ok(loaded)
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
