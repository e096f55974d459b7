//! Registry of running workflow instances with opaque search attributes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use common::WorkflowId;
use serde::Serialize;

/// Metadata describing one registered workflow instance.
///
/// Search attributes are an opaque key-value map: core workflow logic
/// never reads them, clients filter on them.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowEntry {
    /// The workflow instance ID.
    pub workflow_id: WorkflowId,
    /// Workflow kind (e.g. "order", "dag").
    pub kind: String,
    /// Opaque attributes for list/search filtering.
    pub search_attributes: HashMap<String, String>,
    /// When the workflow was registered.
    pub started_at: DateTime<Utc>,
}

impl WorkflowEntry {
    /// Creates an entry with no search attributes.
    pub fn new(workflow_id: WorkflowId, kind: impl Into<String>) -> Self {
        Self {
            workflow_id,
            kind: kind.into(),
            search_attributes: HashMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Attaches a search attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.search_attributes.insert(key.into(), value.into());
        self
    }
}

/// Client-facing list/search surface over running workflows.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    inner: Arc<RwLock<HashMap<WorkflowId, WorkflowEntry>>>,
}

impl WorkflowRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a workflow instance.
    pub fn register(&self, entry: WorkflowEntry) {
        self.inner.write().unwrap().insert(entry.workflow_id, entry);
    }

    /// Removes a workflow instance, returning its entry if present.
    pub fn remove(&self, workflow_id: WorkflowId) -> Option<WorkflowEntry> {
        self.inner.write().unwrap().remove(&workflow_id)
    }

    /// Returns the entry for a workflow instance, if registered.
    pub fn get(&self, workflow_id: WorkflowId) -> Option<WorkflowEntry> {
        self.inner.read().unwrap().get(&workflow_id).cloned()
    }

    /// Lists all registered workflows, oldest first.
    pub fn list(&self) -> Vec<WorkflowEntry> {
        let mut entries: Vec<WorkflowEntry> =
            self.inner.read().unwrap().values().cloned().collect();
        entries.sort_by_key(|e| e.started_at);
        entries
    }

    /// Lists workflows whose search attributes contain the given pair.
    pub fn find_by_attribute(&self, key: &str, value: &str) -> Vec<WorkflowEntry> {
        let mut entries: Vec<WorkflowEntry> = self
            .inner
            .read()
            .unwrap()
            .values()
            .filter(|e| e.search_attributes.get(key).is_some_and(|v| v == value))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.started_at);
        entries
    }

    /// Returns the number of registered workflows.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Returns true if no workflows are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}
