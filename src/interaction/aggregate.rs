//! Per-kind fetch/format dispatch and the summary precedence rule.
//!
//! The classifier reports every match it found; this module applies the one
//! precedence rule (summary wins outright) and otherwise resolves queries in
//! detection order. Fetches are sequential; a failed or empty ticket fetch
//! becomes an inline "not found" line and never aborts the batch.

use tracing::{instrument, warn};

use crate::base::{
    config::Config,
    prompts,
    types::{QueryKind, Res, TrackerQuery},
};
use crate::service::tracker::{TicketSnapshot, TrackerClient};

/// Line used whenever a ticket-scoped fetch comes back empty or fails.
fn not_found_line(key: &str) -> String {
    format!("Ticket {key}: No se encontró información")
}

/// Build the model prompt for a classified message.
///
/// With at least one summary query, the whole request becomes a summary
/// request over the deduplicated union of summary-kind keys; everything else
/// the classifier found is discarded. Otherwise each query is fetched and
/// formatted in detection order and wrapped, together with the original
/// message, in the context instruction.
#[instrument(skip_all)]
pub async fn build_model_prompt(message: &str, queries: &[TrackerQuery], tracker: &TrackerClient, config: &Config) -> Res<String> {
    let summary_keys = summary_key_union(queries);
    if !summary_keys.is_empty() {
        let blocks = render_snapshot_blocks(&summary_keys, tracker).await;
        return Ok(prompts::summarize(&blocks));
    }

    let mut sections = Vec::with_capacity(queries.len());
    for query in queries {
        sections.push(render_query(query, tracker, config).await);
    }

    Ok(prompts::tracker_context(message, &sections.join("\n")))
}

/// Deduplicated union of summary-kind ticket keys, first-appearance order.
fn summary_key_union(queries: &[TrackerQuery]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();

    for query in queries.iter().filter(|q| q.kind == QueryKind::Summary) {
        for key in &query.values {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    keys
}

/// Full snapshot blocks for a set of keys, blank-line separated.
async fn render_snapshot_blocks(keys: &[String], tracker: &TrackerClient) -> String {
    let mut blocks = Vec::with_capacity(keys.len());

    for key in keys {
        blocks.push(match tracker.get_issue(key, false).await {
            Ok(Some(snapshot)) => snapshot.render_block(),
            Ok(None) => not_found_line(key),
            Err(err) => {
                warn!("Fetch for {key} failed: {err}");
                not_found_line(key)
            }
        });
    }

    blocks.join("\n\n")
}

/// One formatted line per ticket, applying `line` to each fetched snapshot.
async fn render_ticket_lines<F>(keys: &[String], tracker: &TrackerClient, expand_changelog: bool, line: F) -> String
where
    F: Fn(&TicketSnapshot) -> String,
{
    let mut lines = Vec::with_capacity(keys.len());

    for key in keys {
        lines.push(match tracker.get_issue(key, expand_changelog).await {
            Ok(Some(snapshot)) => line(&snapshot),
            Ok(None) => not_found_line(key),
            Err(err) => {
                warn!("Fetch for {key} failed: {err}");
                not_found_line(key)
            }
        });
    }

    lines.join("\n")
}

async fn render_query(query: &TrackerQuery, tracker: &TrackerClient, config: &Config) -> String {
    match query.kind {
        QueryKind::Reference | QueryKind::Summary => {
            render_ticket_lines(&query.values, tracker, false, |s| s.render_block()).await
        }
        QueryKind::Status => {
            render_ticket_lines(&query.values, tracker, false, |s| format!("Ticket {}: Estado: {}", s.key, s.status)).await
        }
        QueryKind::Assignee => {
            render_ticket_lines(&query.values, tracker, false, |s| {
                format!("Ticket {}: Asignado: {}", s.key, s.assignee_name())
            })
            .await
        }
        QueryKind::Priority => {
            render_ticket_lines(&query.values, tracker, false, |s| format!("Ticket {}: Prioridad: {}", s.key, s.priority)).await
        }
        QueryKind::ChangeHistory => render_ticket_lines(&query.values, tracker, true, render_change_history).await,
        QueryKind::ProjectOfReference => {
            render_ticket_lines(&query.values, tracker, false, |s| {
                format!("Ticket {}: Proyecto: {} (clave: {})", s.key, s.project_name, s.project_key)
            })
            .await
        }
        QueryKind::Project => render_project(&query.values[0], tracker).await,
        QueryKind::Search => render_search(&query.values[0], tracker, config).await,
    }
}

fn render_change_history(snapshot: &TicketSnapshot) -> String {
    if snapshot.changelog.is_empty() {
        return format!("Ticket {}: No tiene historial de cambios.", snapshot.key);
    }

    let mut out = format!("Ticket {}:", snapshot.key);
    for entry in &snapshot.changelog {
        for item in &entry.items {
            out.push_str(&format!(
                "\n- {} por {}: {} cambió de '{}' a '{}'",
                entry.created, entry.author, item.field, item.from, item.to
            ));
        }
    }

    out
}

async fn render_project(key: &str, tracker: &TrackerClient) -> String {
    match tracker.get_project(key).await {
        Ok(Some(project)) => project.render_block(),
        Ok(None) => "No se encontró información del proyecto".to_string(),
        Err(err) => {
            warn!("Project fetch for {key} failed: {err}");
            "No se encontró información del proyecto".to_string()
        }
    }
}

async fn render_search(text: &str, tracker: &TrackerClient, config: &Config) -> String {
    let jql = format!("text ~ \"{}\"", text.replace('"', "\\\""));

    match tracker.search_issues(&jql, config.search_max_results).await {
        Ok(results) if !results.hits.is_empty() => results.render(false),
        Ok(_) => "No se encontraron resultados en la búsqueda".to_string(),
        Err(err) => {
            warn!("Search '{text}' failed: {err}");
            "No se encontraron resultados en la búsqueda".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::base::config::ConfigInner;
    use crate::service::tracker::MockGenericTrackerClient;

    use super::*;

    fn test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                search_max_results: 50,
                ..Default::default()
            }),
        }
    }

    fn snapshot(key: &str, status: &str) -> TicketSnapshot {
        TicketSnapshot {
            key: key.to_string(),
            summary: format!("Resumen de {key}"),
            status: status.to_string(),
            priority: "3".to_string(),
            assignee: Some("Ana".to_string()),
            created: "2024-05-01".to_string(),
            updated: "2024-05-02".to_string(),
            project_key: "SD".to_string(),
            project_name: "Service Desk".to_string(),
            changelog: Vec::new(),
        }
    }

    #[tokio::test]
    async fn status_query_renders_the_status_line() {
        let mut mock = MockGenericTrackerClient::new();
        mock.expect_get_issue()
            .withf(|key, expand| key == "SD-100" && !expand)
            .returning(|key, _| Ok(Some(snapshot(key, "En progreso"))));
        let tracker = TrackerClient::new(Arc::new(mock));

        let queries = vec![TrackerQuery::new(QueryKind::Status, vec!["SD-100".into()])];
        let prompt = build_model_prompt("estado SD-100", &queries, &tracker, &test_config()).await.unwrap();

        assert!(prompt.contains("Ticket SD-100: Estado: En progreso"));
        assert!(prompt.contains("Consulta del usuario: estado SD-100"));
    }

    #[tokio::test]
    async fn summary_queries_take_over_the_whole_request() {
        let mut mock = MockGenericTrackerClient::new();
        // Only the summary union may be fetched; SD-9 would panic the mock.
        mock.expect_get_issue()
            .withf(|key, _| key == "SD-1" || key == "SD-2")
            .times(2)
            .returning(|key, _| Ok(Some(snapshot(key, "Pendiente"))));
        let tracker = TrackerClient::new(Arc::new(mock));

        let queries = vec![
            TrackerQuery::new(QueryKind::Status, vec!["SD-9".into()]),
            TrackerQuery::new(QueryKind::Summary, vec!["SD-1".into(), "SD-2".into()]),
            TrackerQuery::new(QueryKind::Summary, vec!["SD-2".into(), "SD-1".into()]),
        ];
        let prompt = build_model_prompt("resumen", &queries, &tracker, &test_config()).await.unwrap();

        assert!(prompt.starts_with("Por favor, haz un resumen general"));
        assert!(prompt.contains("**Ticket: SD-1**"));
        assert!(prompt.contains("**Ticket: SD-2**"));
        assert!(!prompt.contains("SD-9"));
    }

    #[tokio::test]
    async fn missing_ticket_becomes_a_not_found_line() {
        let mut mock = MockGenericTrackerClient::new();
        mock.expect_get_issue().returning(|_, _| Ok(None));
        let tracker = TrackerClient::new(Arc::new(mock));

        let queries = vec![TrackerQuery::new(QueryKind::Status, vec!["SD-404".into()])];
        let prompt = build_model_prompt("estado SD-404", &queries, &tracker, &test_config()).await.unwrap();

        assert!(prompt.contains("Ticket SD-404: No se encontró información"));
    }

    #[tokio::test]
    async fn fetch_errors_are_absorbed_per_item() {
        let mut mock = MockGenericTrackerClient::new();
        mock.expect_get_issue().withf(|key, _| key == "SD-1").returning(|key, _| Ok(Some(snapshot(key, "Atendido"))));
        mock.expect_get_issue()
            .withf(|key, _| key == "SD-2")
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));
        let tracker = TrackerClient::new(Arc::new(mock));

        let queries = vec![TrackerQuery::new(QueryKind::Status, vec!["SD-1".into(), "SD-2".into()])];
        let prompt = build_model_prompt("estado SD-1 SD-2", &queries, &tracker, &test_config()).await.unwrap();

        assert!(prompt.contains("Ticket SD-1: Estado: Atendido"));
        assert!(prompt.contains("Ticket SD-2: No se encontró información"));
    }

    #[tokio::test]
    async fn change_history_renders_per_entry_lines() {
        let mut mock = MockGenericTrackerClient::new();
        mock.expect_get_issue().withf(|key, expand| key == "SD-7" && *expand).returning(|key, _| {
            let mut snap = snapshot(key, "En progreso");
            snap.changelog = vec![crate::service::tracker::ChangeHistoryEntry {
                author: "Blas".to_string(),
                created: "2024-06-01".to_string(),
                items: vec![crate::service::tracker::ChangeItem {
                    field: "status".to_string(),
                    from: "Pendiente".to_string(),
                    to: "En progreso".to_string(),
                }],
            }];
            Ok(Some(snap))
        });
        let tracker = TrackerClient::new(Arc::new(mock));

        let queries = vec![TrackerQuery::new(QueryKind::ChangeHistory, vec!["SD-7".into()])];
        let prompt = build_model_prompt("historial de cambios SD-7", &queries, &tracker, &test_config()).await.unwrap();

        assert!(prompt.contains("2024-06-01 por Blas: status cambió de 'Pendiente' a 'En progreso'"));
    }
}
