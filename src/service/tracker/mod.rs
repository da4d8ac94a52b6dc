//! Tracker (issue store) integration.
//!
//! Defines the generic tracker trait plus the read-only domain types the
//! rest of the application consumes, and re-exports the Jira implementation.
//! Snapshots are projections of externally-owned records: this system never
//! mutates them, only formats subsets of their fields into display text.

pub mod jira;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Res;

// Traits.

/// Generic tracker client trait that implementations must provide.
///
/// The classifier and aggregator only ever see this trait, which keeps the
/// tracker substitutable with a fake in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenericTrackerClient: Send + Sync + 'static {
    /// Fetch a single issue by key, optionally expanding its change history.
    ///
    /// `Ok(None)` means the tracker reports no such issue; transport errors
    /// and unexpected statuses are `Err`.
    async fn get_issue(&self, key: &str, expand_changelog: bool) -> Res<Option<TicketSnapshot>>;

    /// Run a bounded search in the tracker's query language.
    async fn search_issues(&self, jql: &str, max_results: u32) -> Res<SearchResults>;

    /// Fetch a project by key. `Ok(None)` when the project does not exist.
    async fn get_project(&self, key: &str) -> Res<Option<ProjectInfo>>;
}

// Structs.

/// Tracker client for the application.
///
/// This is trivially cloneable and can be passed around without the need for
/// `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TrackerClient {
    inner: Arc<dyn GenericTrackerClient>,
}

impl Deref for TrackerClient {
    type Target = dyn GenericTrackerClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TrackerClient {
    /// Wrap a concrete client implementation.
    pub fn new(inner: Arc<dyn GenericTrackerClient>) -> Self {
        Self { inner }
    }
}

// Domain types.

/// Read-only projection of one tracker issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSnapshot {
    /// Issue key, e.g. `SD-123`.
    pub key: String,
    /// One-line summary.
    pub summary: String,
    /// Status display name.
    pub status: String,
    /// Priority display name.
    pub priority: String,
    /// Assignee display name, if assigned.
    pub assignee: Option<String>,
    /// Creation timestamp, as reported by the tracker.
    pub created: String,
    /// Last-update timestamp, as reported by the tracker.
    pub updated: String,
    /// Key of the owning project.
    pub project_key: String,
    /// Name of the owning project.
    pub project_name: String,
    /// Change history, present only when requested with expansion.
    pub changelog: Vec<ChangeHistoryEntry>,
}

impl TicketSnapshot {
    /// The multi-field block used for reference queries and summary requests.
    pub fn render_block(&self) -> String {
        format!(
            "**Ticket: {}**\n\
             - **Resumen**: {}\n\
             - **Estado**: {}\n\
             - **Prioridad**: {}\n\
             - **Asignado**: {}\n\
             - **Creado**: {}\n\
             - **Actualizado**: {}",
            self.key, self.summary, self.status, self.priority, self.assignee_name(), self.created, self.updated
        )
    }

    /// Assignee display name, or the conventional unassigned marker.
    pub fn assignee_name(&self) -> &str {
        self.assignee.as_deref().unwrap_or("Sin asignar")
    }
}

/// One entry in an issue's change history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeHistoryEntry {
    /// Display name of the person who made the change.
    pub author: String,
    /// When the change happened.
    pub created: String,
    /// The individual field changes in this entry.
    pub items: Vec<ChangeItem>,
}

/// A single field change: what changed, from what, to what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeItem {
    /// The field that changed.
    pub field: String,
    /// Previous value.
    pub from: String,
    /// New value.
    pub to: String,
}

/// Read-only projection of a tracker project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Project key.
    pub key: String,
    /// Project name.
    pub name: String,
    /// Project description, when one is set.
    pub description: Option<String>,
}

impl ProjectInfo {
    /// The name/key/description block.
    pub fn render_block(&self) -> String {
        format!(
            "**Proyecto: {}**\n- Clave: {}\n- Descripción: {}",
            self.name,
            self.key,
            self.description.as_deref().unwrap_or("Sin descripción")
        )
    }
}

/// A page of search hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Total matching issues as reported by the tracker.
    pub total: usize,
    /// The returned page of hits.
    pub hits: Vec<SearchHit>,
}

/// One search hit, carrying the subset of fields the search requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Issue key.
    pub key: String,
    /// One-line summary.
    pub summary: String,
    /// Status display name.
    pub status: String,
    /// Assignee display name, if assigned.
    pub assignee: Option<String>,
}

impl SearchResults {
    /// Bulleted hit list; `with_total` prepends the count header used by the
    /// bulk filters.
    pub fn render(&self, with_total: bool) -> String {
        let mut out = String::new();

        if with_total {
            out.push_str(&format!("**Encontrados {} tickets:**\n\n", self.total));
        }

        for hit in &self.hits {
            out.push_str(&format!("• **{}**: {} - {}\n", hit.key, hit.summary, hit.status));
        }

        out.trim_end().to_string()
    }
}
