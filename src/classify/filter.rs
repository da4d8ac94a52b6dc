//! Canned bulk-filter phrasings, resolved ahead of the classifier.
//!
//! A small set of whole-message shapes ("tickets abiertos", "tickets
//! cerrados", "tickets pendientes", "prioridad 3", "top 5 asignados") map
//! straight to one bulk tracker search, bypassing the classifier and the
//! completion model for that turn. Free-text status and priority values go
//! through static synonym tables; an unresolved value produces a guidance
//! message instead of a search.

use std::sync::LazyLock;

use regex::Regex;
use tracing::instrument;

use crate::base::{config::Config, types::Res};
use crate::service::tracker::TrackerClient;

use super::contains_ticket_token;

/// States the service desk considers open.
pub const OPEN_STATES: &[&str] = &[
    "esperando por soporte",
    "esperando por cliente",
    "escalado",
    "en progreso",
    "pendiente",
    "atendido",
];

/// States the service desk considers closed.
pub const CLOSED_STATES: &[&str] = &["cerrado", "resuelto", "cancelado"];

/// Canonical status values with their accepted variants and plurals.
///
/// Resolution is case-insensitive substring membership; the first canonical
/// value in table order wins, so this is an explicit sequence, not a map.
const STATUS_SYNONYMS: &[(&str, &[&str])] = &[
    ("esperando por soporte", &["esperando por soporte", "espera soporte", "soporte", "esperando soporte"]),
    ("esperando por cliente", &["esperando por cliente", "espera cliente", "cliente", "esperando cliente"]),
    ("escalado", &["escalado", "escalados"]),
    ("en progreso", &["en progreso", "progreso"]),
    ("pendiente", &["pendiente", "pendientes"]),
    ("atendido", &["atendido", "atendidos"]),
    ("cerrado", &["cerrado", "cerrados"]),
    ("resuelto", &["resuelto", "resueltos"]),
    ("cancelado", &["cancelado", "cancelados"]),
];

/// Canonical priority values (1–5) with their accepted variants.
const PRIORITY_SYNONYMS: &[(&str, &[&str])] = &[
    ("1", &["1", "p1", "prioridad 1", "alta", "muy alta"]),
    ("2", &["2", "p2", "prioridad 2"]),
    ("3", &["3", "p3", "prioridad 3", "media"]),
    ("4", &["4", "p4", "prioridad 4", "baja"]),
    ("5", &["5", "p5", "prioridad 5", "muy baja"]),
];

static TOP_ASSIGNEES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)top\s*5?\s*asignados|asignados\s+con\s+m[áa]s\s+tickets").expect("filter pattern compiles"));

static OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\btickets?\s+abiertos?\b").expect("filter pattern compiles"));

static CLOSED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\btickets?\s+cerrados?\b").expect("filter pattern compiles"));

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:tickets?\s+)?(?:(?:con|de)\s+)?prioridad\s+(.+)$").expect("filter pattern compiles"));

static STATUS_EXPLICIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btickets?\s+(?:en|con)\s+estado\s+(.+)$").expect("filter pattern compiles"));

static STATUS_IMPLICIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btickets?\s+((?:en\s+)?[a-záéíóúñ]+(?:\s+por\s+[a-záéíóúñ]+)?)\s*$").expect("filter pattern compiles")
});

/// An enumerated canned bulk query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRequest {
    /// All tickets in an open state.
    Open,
    /// All tickets in a closed state.
    Closed,
    /// Tickets in one specific state, given as free text.
    ByStatus(String),
    /// Tickets with one specific priority, given as free text.
    ByPriority(String),
    /// Ranking of the five busiest assignees.
    TopAssignees,
}

/// Recognize a canned bulk query in `message`.
///
/// A status/priority capture that contains a ticket token is not a filter:
/// that message belongs to the classifier ("prioridad SD-123" asks for one
/// ticket's priority, not a bulk search).
pub fn detect_filter(message: &str) -> Option<FilterRequest> {
    if TOP_ASSIGNEES_RE.is_match(message) {
        return Some(FilterRequest::TopAssignees);
    }

    if OPEN_RE.is_match(message) {
        return Some(FilterRequest::Open);
    }

    if CLOSED_RE.is_match(message) {
        return Some(FilterRequest::Closed);
    }

    if let Some(caps) = PRIORITY_RE.captures(message) {
        let value = caps[1].trim();
        if !value.is_empty() && !contains_ticket_token(value) {
            return Some(FilterRequest::ByPriority(value.to_string()));
        }
    }

    if let Some(caps) = STATUS_EXPLICIT_RE.captures(message) {
        let value = caps[1].trim();
        if !value.is_empty() && !contains_ticket_token(value) {
            return Some(FilterRequest::ByStatus(value.to_string()));
        }
    }

    // Bare forms ("tickets pendientes") only count when the state actually
    // resolves; anything else falls through to the classifier.
    if let Some(caps) = STATUS_IMPLICIT_RE.captures(message) {
        let value = caps[1].trim();
        if resolve_status(value).is_some() {
            return Some(FilterRequest::ByStatus(value.to_string()));
        }
    }

    None
}

/// Execute a recognized bulk query against the tracker.
///
/// Search failures here are request-level errors, unlike the per-item
/// absorption in the aggregation path.
#[instrument(skip(tracker, config))]
pub async fn run_filter(request: &FilterRequest, tracker: &TrackerClient, config: &Config) -> Res<String> {
    match request {
        FilterRequest::Open => search_by_states(OPEN_STATES, "No se encontraron tickets abiertos.", tracker, config).await,
        FilterRequest::Closed => search_by_states(CLOSED_STATES, "No se encontraron tickets cerrados.", tracker, config).await,
        FilterRequest::ByStatus(value) => filter_by_status(value, tracker, config).await,
        FilterRequest::ByPriority(value) => filter_by_priority(value, tracker, config).await,
        FilterRequest::TopAssignees => top_assignees(tracker, config).await,
    }
}

/// Resolve a free-text status to its canonical value.
pub fn resolve_status(value: &str) -> Option<&'static str> {
    let needle = value.trim().to_lowercase();
    STATUS_SYNONYMS
        .iter()
        .find(|(_, variants)| variants.iter().any(|v| needle.contains(v)))
        .map(|(canonical, _)| *canonical)
}

/// Resolve a free-text priority to its canonical value ("1"–"5").
pub fn resolve_priority(value: &str) -> Option<&'static str> {
    let needle = value.trim().to_lowercase();
    PRIORITY_SYNONYMS
        .iter()
        .find(|(_, variants)| variants.iter().any(|v| needle.contains(v)))
        .map(|(canonical, _)| *canonical)
}

/// Tickets in one specific state, resolved through the synonym table.
pub async fn filter_by_status(value: &str, tracker: &TrackerClient, config: &Config) -> Res<String> {
    let Some(canonical) = resolve_status(value) else {
        let options = STATUS_SYNONYMS.iter().map(|(canonical, _)| *canonical).collect::<Vec<_>>().join(", ");
        return Ok(format!("Estado '{value}' no válido. Usa uno de: {options}"));
    };

    let jql = format!("status = \"{canonical}\"");
    let results = tracker.search_issues(&jql, config.search_max_results).await?;

    if results.hits.is_empty() {
        return Ok(format!("No se encontraron tickets con estado '{canonical}'."));
    }

    Ok(results.render(true))
}

/// Tickets with one specific priority, resolved through the synonym table.
pub async fn filter_by_priority(value: &str, tracker: &TrackerClient, config: &Config) -> Res<String> {
    let Some(canonical) = resolve_priority(value) else {
        let options = PRIORITY_SYNONYMS.iter().map(|(canonical, _)| format!("Prioridad {canonical}")).collect::<Vec<_>>().join(", ");
        return Ok(format!("Prioridad '{value}' no válida. Usa uno de: {options}"));
    };

    let jql = format!("priority = \"{canonical}\"");
    let results = tracker.search_issues(&jql, config.search_max_results).await?;

    if results.hits.is_empty() {
        return Ok(format!("No se encontraron tickets con prioridad '{canonical}'."));
    }

    Ok(results.render(true))
}

/// The five people with the most assigned tickets, plus summary counts.
///
/// One broad, bounded scan ordered by creation date; grouping and ranking
/// happen here. The sort is stable, so ties keep input order.
pub async fn top_assignees(tracker: &TrackerClient, config: &Config) -> Res<String> {
    let results = tracker
        .search_issues("assignee IS NOT EMPTY ORDER BY created DESC", config.assignee_scan_max_results)
        .await?;

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut unassigned = 0usize;

    for hit in &results.hits {
        match &hit.assignee {
            Some(name) => {
                if let Some(entry) = counts.iter_mut().find(|(n, _)| n == name) {
                    entry.1 += 1;
                } else {
                    counts.push((name.clone(), 1));
                }
            }
            None => unassigned += 1,
        }
    }

    if counts.is_empty() {
        return Ok("No se encontraron tickets asignados.".to_string());
    }

    let total_assignees = counts.len();
    let total_assigned: usize = counts.iter().map(|(_, c)| c).sum();

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = String::from("**Top 5 personas con mayor cantidad de tickets asignados:**\n\n");
    for (rank, (name, count)) in counts.iter().take(5).enumerate() {
        out.push_str(&format!("{}. **{name}**: {count} tickets\n", rank + 1));
    }

    out.push_str("\n**Resumen:**\n");
    out.push_str(&format!("- Total de personas con tickets asignados: {total_assignees}\n"));
    out.push_str(&format!("- Total de tickets asignados: {total_assigned}\n"));
    out.push_str(&format!("- Tickets sin asignar: {unassigned}\n"));

    Ok(out)
}

fn quoted_list(states: &[&str]) -> String {
    states.iter().map(|s| format!("\"{s}\"")).collect::<Vec<_>>().join(", ")
}

async fn search_by_states(states: &[&str], empty_message: &str, tracker: &TrackerClient, config: &Config) -> Res<String> {
    let jql = format!("status in ({})", quoted_list(states));
    let results = tracker.search_issues(&jql, config.search_max_results).await?;

    if results.hits.is_empty() {
        return Ok(empty_message.to_string());
    }

    Ok(results.render(true))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::base::config::ConfigInner;
    use crate::service::tracker::{MockGenericTrackerClient, SearchHit, SearchResults};

    use super::*;

    fn test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                search_max_results: 50,
                assignee_scan_max_results: 1000,
                ..Default::default()
            }),
        }
    }

    fn hit(key: &str, assignee: Option<&str>) -> SearchHit {
        SearchHit {
            key: key.to_string(),
            summary: format!("Resumen de {key}"),
            status: "Pendiente".to_string(),
            assignee: assignee.map(str::to_string),
        }
    }

    #[test]
    fn detects_canned_phrasings() {
        assert_eq!(detect_filter("tickets abiertos"), Some(FilterRequest::Open));
        assert_eq!(detect_filter("tickets cerrados"), Some(FilterRequest::Closed));
        assert_eq!(detect_filter("tickets pendientes"), Some(FilterRequest::ByStatus("pendientes".into())));
        assert_eq!(detect_filter("tickets en progreso"), Some(FilterRequest::ByStatus("en progreso".into())));
        assert_eq!(detect_filter("prioridad 2"), Some(FilterRequest::ByPriority("2".into())));
        assert_eq!(detect_filter("top 5 asignados"), Some(FilterRequest::TopAssignees));
    }

    #[test]
    fn ticket_scoped_messages_are_not_filters() {
        assert_eq!(detect_filter("prioridad SD-123"), None);
        assert_eq!(detect_filter("estado SD-100"), None);
        assert_eq!(detect_filter("hola"), None);
    }

    #[test]
    fn unknown_bare_state_falls_through_to_classifier() {
        assert_eq!(detect_filter("cuántos tickets hay"), None);
    }

    #[test]
    fn status_resolution_is_case_insensitive_substring() {
        assert_eq!(resolve_status("Pendientes"), resolve_status("pendiente"));
        assert_eq!(resolve_status("en ProgresO"), Some("en progreso"));
        assert_eq!(resolve_status("escalados"), Some("escalado"));
        assert_eq!(resolve_status("algo raro"), None);
    }

    #[test]
    fn priority_resolution_accepts_variants() {
        assert_eq!(resolve_priority("p2"), Some("2"));
        assert_eq!(resolve_priority("alta"), Some("1"));
        assert_eq!(resolve_priority("baja"), Some("4"));
        assert_eq!(resolve_priority("9"), None);
    }

    #[tokio::test]
    async fn closed_filter_builds_status_in_jql() {
        let mut mock = MockGenericTrackerClient::new();
        mock.expect_search_issues()
            .withf(|jql, max| jql == "status in (\"cerrado\", \"resuelto\", \"cancelado\")" && *max == 50)
            .returning(|_, _| {
                Ok(SearchResults {
                    total: 2,
                    hits: vec![hit("SD-1", None), hit("SD-2", None)],
                })
            });
        let tracker = TrackerClient::new(Arc::new(mock));

        let out = run_filter(&FilterRequest::Closed, &tracker, &test_config()).await.unwrap();

        assert!(out.contains("Encontrados 2 tickets"));
        assert!(out.contains("SD-1"));
    }

    #[tokio::test]
    async fn invalid_priority_yields_guidance_without_tracker_call() {
        // No expectations: any search would panic the mock.
        let tracker = TrackerClient::new(Arc::new(MockGenericTrackerClient::new()));

        let out = run_filter(&FilterRequest::ByPriority("9".into()), &tracker, &test_config()).await.unwrap();

        assert!(out.contains("Prioridad '9' no válida"));
        assert!(out.contains("Prioridad 1"));
        assert!(out.contains("Prioridad 5"));
    }

    #[tokio::test]
    async fn top_assignees_ranks_and_counts() {
        let mut mock = MockGenericTrackerClient::new();
        mock.expect_search_issues().returning(|_, _| {
            Ok(SearchResults {
                total: 7,
                hits: vec![
                    hit("SD-1", Some("Ana")),
                    hit("SD-2", Some("Ana")),
                    hit("SD-3", Some("Blas")),
                    hit("SD-4", Some("Ana")),
                    hit("SD-5", Some("Blas")),
                    hit("SD-6", Some("Carla")),
                    hit("SD-7", None),
                ],
            })
        });
        let tracker = TrackerClient::new(Arc::new(mock));

        let out = top_assignees(&tracker, &test_config()).await.unwrap();

        assert!(out.contains("1. **Ana**: 3 tickets"));
        assert!(out.contains("2. **Blas**: 2 tickets"));
        assert!(out.contains("3. **Carla**: 1 tickets"));
        assert!(out.contains("Total de personas con tickets asignados: 3"));
        assert!(out.contains("Total de tickets asignados: 6"));
        assert!(out.contains("Tickets sin asignar: 1"));
    }
}
