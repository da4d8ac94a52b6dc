//! Common types and result aliases.

use serde::{Deserialize, Serialize};

/// Application-wide error type.
pub type Err = anyhow::Error;
/// Application-wide result type.
pub type Res<T> = Result<T, Err>;
/// Result with no payload.
pub type Void = Res<()>;

/// What a detected pattern match is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// General reference to one or more tickets.
    Reference,
    /// A project looked up by its key.
    Project,
    /// The project a given ticket belongs to.
    ProjectOfReference,
    /// Free-text search against the tracker.
    Search,
    /// Status of one or more tickets.
    Status,
    /// Assignee of one or more tickets.
    Assignee,
    /// Priority of one or more tickets.
    Priority,
    /// Summary request over one or more tickets.
    Summary,
    /// Change history of one or more tickets.
    ChangeHistory,
}

/// One classified query: the kind plus the values the pattern captured.
///
/// `values` holds ticket keys (upper-cased) for ticket-scoped kinds, the
/// project key for [`QueryKind::Project`], and the raw search text for
/// [`QueryKind::Search`]. The classifier never emits an empty value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerQuery {
    /// The classification of the match.
    pub kind: QueryKind,
    /// The captured values, in order of appearance.
    pub values: Vec<String>,
}

impl TrackerQuery {
    /// Create a new query.
    pub fn new(kind: QueryKind, values: Vec<String>) -> Self {
        Self { kind, values }
    }
}

/// Wire shape of the completion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmDialect {
    /// Ollama-native `/api/chat`; completion text at `message.content`.
    #[default]
    Ollama,
    /// OpenAI-compatible `/v1/chat/completions`; completion text at
    /// `choices[0].message.content`.
    OpenAi,
}
