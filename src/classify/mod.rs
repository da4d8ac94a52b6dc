//! Natural-language query classification.
//!
//! Scans a free-text message against a fixed, ordered table of patterns and
//! produces the tracker lookups the message asks for. Every pattern is
//! matched case-insensitively over the whole message; each match contributes
//! one [`TrackerQuery`]. A message can legitimately produce several queries
//! of different kinds; precedence between them is the aggregator's job, not
//! the classifier's.

pub mod filter;

use std::sync::LazyLock;

use regex::Regex;

use crate::base::types::{QueryKind, TrackerQuery};

/// Lexical shape of a ticket key: alphabetic project prefix, hyphen, digits.
///
/// Single point of definition; every composite pattern below derives from it.
pub const TICKET_TOKEN_PATTERN: &str = r"[A-Za-z]+-\d+";

/// Strict sub-pattern used to pull individual ticket keys out of a captured span.
static TICKET_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b{TICKET_TOKEN_PATTERN}\b")).expect("ticket token pattern compiles"));

/// How a pattern capture becomes query values.
#[derive(Debug, Clone, Copy)]
enum Extraction {
    /// Re-scan the capture for ticket tokens; discard the match if none are found.
    TicketList,
    /// The capture is a bare project key, unless it is actually the start of a
    /// ticket token (then the project-of-reference pattern owns the match).
    ProjectKey,
    /// The capture is free search text.
    FreeText,
}

struct PatternSpec {
    kind: QueryKind,
    regex: Regex,
    extraction: Extraction,
}

/// Span of consecutive ticket tokens, tolerating comma and "y" separators
/// ("SD-1, SD-2", "SD-1 y SD-2", "SD-1 SD-2").
fn token_list(token: &str) -> String {
    format!(r"((?:{token}(?:\s*,\s*|\s+y\s+|\s+)?)+)")
}

/// Keyword phrase with the identifier list either after it (group 1) or
/// before it (group 2). A filler "de"/"del" is tolerated after the keyword.
fn keyworded(keywords: &str, list: &str) -> String {
    format!(r"(?i)(?:{keywords})\s+(?:del?\s+)?{list}|{list}\s+(?:{keywords})")
}

/// The classifier's pattern table, in evaluation (and output) order.
static PATTERNS: LazyLock<Vec<PatternSpec>> = LazyLock::new(|| {
    let list = token_list(TICKET_TOKEN_PATTERN);
    let spec = |kind, pattern: String, extraction| PatternSpec {
        kind,
        regex: Regex::new(&pattern).expect("query pattern compiles"),
        extraction,
    };

    vec![
        spec(
            QueryKind::Reference,
            format!(r"(?i)(?:ticket|issue|jira|tarea|problema)\s+(?:del?\s+)?{list}"),
            Extraction::TicketList,
        ),
        spec(QueryKind::Project, r"(?i)(?:proyecto|project)\s+([A-Za-z][A-Za-z0-9]*)".to_string(), Extraction::ProjectKey),
        spec(
            QueryKind::ProjectOfReference,
            format!(r"(?i)(?:proyecto|project)\s+(?:del?\s+)?{list}"),
            Extraction::TicketList,
        ),
        spec(
            QueryKind::Search,
            r"(?i)(?:buscar|search|encontrar|listar)\s+(.+?)(?:\s+en\s+jira)?$".to_string(),
            Extraction::FreeText,
        ),
        spec(QueryKind::Status, keyworded("estado|status", &list), Extraction::TicketList),
        spec(QueryKind::Assignee, keyworded("asignado|assignee|asignación", &list), Extraction::TicketList),
        spec(QueryKind::Priority, keyworded("prioridad|priority", &list), Extraction::TicketList),
        spec(QueryKind::Summary, keyworded("resumen|summary|resumir", &list), Extraction::TicketList),
        spec(
            QueryKind::ChangeHistory,
            keyworded("historial de cambios|changelog|historial|cambios", &list),
            Extraction::TicketList,
        ),
    ]
});

/// Detect every tracker query in `message`.
///
/// Runs the whole pattern table (all non-overlapping matches per pattern) and
/// collects one query per productive match. If no table pattern fired, a
/// whole-message scan for bare ticket tokens yields a single
/// [`QueryKind::Reference`] query, or nothing, in which case the message is
/// not a tracker query at all.
pub fn detect_queries(message: &str) -> Vec<TrackerQuery> {
    let mut queries = Vec::new();

    for spec in PATTERNS.iter() {
        for caps in spec.regex.captures_iter(message) {
            // The populated group depends on which alternation branch matched.
            let Some(group) = caps.iter().skip(1).flatten().next() else {
                continue;
            };

            match spec.extraction {
                Extraction::TicketList => {
                    let keys = ticket_tokens(group.as_str());
                    if !keys.is_empty() {
                        queries.push(TrackerQuery::new(spec.kind, keys));
                    }
                }
                Extraction::ProjectKey => {
                    if !capture_is_ticket_prefix(message, group.start()) {
                        queries.push(TrackerQuery::new(spec.kind, vec![group.as_str().to_uppercase()]));
                    }
                }
                Extraction::FreeText => {
                    let text = group.as_str().trim();
                    if !text.is_empty() {
                        queries.push(TrackerQuery::new(spec.kind, vec![text.to_string()]));
                    }
                }
            }
        }
    }

    // No keyword pattern fired: fall back to bare tokens anywhere in the message.
    if queries.is_empty() {
        let keys = ticket_tokens(message);
        if !keys.is_empty() {
            queries.push(TrackerQuery::new(QueryKind::Reference, keys));
        }
    }

    queries
}

/// Every ticket token in `text`, upper-cased, in order of appearance,
/// duplicates included.
pub fn ticket_tokens(text: &str) -> Vec<String> {
    TICKET_TOKEN_RE.find_iter(text).map(|m| m.as_str().to_uppercase()).collect()
}

/// Whether `text` contains at least one ticket token.
pub fn contains_ticket_token(text: &str) -> bool {
    TICKET_TOKEN_RE.is_match(text)
}

/// Whether the capture starting at `start` is the alphabetic prefix of a
/// ticket token ("SD" in "SD-123"). The `regex` crate has no lookahead, so
/// the check happens here instead of in the pattern.
fn capture_is_ticket_prefix(message: &str, start: usize) -> bool {
    TICKET_TOKEN_RE.find(&message[start..]).is_some_and(|m| m.start() == 0)
}
