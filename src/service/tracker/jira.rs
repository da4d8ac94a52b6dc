//! Jira Cloud REST v3 implementation of the tracker client.
//!
//! Three calls are consumed: issue-by-key (optionally expanded with the
//! changelog), JQL search, and project-by-key. Every call carries basic auth
//! (account email + API token) and the configured timeout. Nothing is
//! retried; a 404 is `Ok(None)` and every other failure propagates.

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::base::{config::Config, types::Res};

use super::{
    ChangeHistoryEntry, ChangeItem, GenericTrackerClient, ProjectInfo, SearchHit, SearchResults, TicketSnapshot, TrackerClient,
};

/// Placeholder for fields the tracker did not populate.
const MISSING: &str = "N/A";

/// Field subset requested from the search endpoint.
const SEARCH_FIELDS: &[&str] = &["summary", "status", "assignee", "priority", "created", "updated"];

// Extra methods on `TrackerClient` applied by the Jira implementation.

impl TrackerClient {
    /// Build a Jira-backed tracker client from the application config.
    pub fn jira(config: &Config) -> Res<Self> {
        Ok(Self::new(Arc::new(JiraTrackerClient::new(config)?)))
    }
}

// Specific implementations.

/// Jira Cloud tracker client.
pub struct JiraTrackerClient {
    client: Client,
    config: Config,
}

impl JiraTrackerClient {
    /// Create a new Jira client with the configured timeout.
    pub fn new(config: &Config) -> Res<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.tracker_timeout_secs)).build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.config.tracker_email, Some(&self.config.tracker_api_token))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn issue_url(&self, key: &str, expand_changelog: bool) -> String {
        let mut url = format!("{}/rest/api/3/issue/{key}", self.config.tracker_base_url);
        if expand_changelog {
            url.push_str("?expand=changelog");
        }
        url
    }
}

#[async_trait]
impl GenericTrackerClient for JiraTrackerClient {
    #[instrument(name = "JiraTrackerClient::get_issue", skip(self))]
    async fn get_issue(&self, key: &str, expand_changelog: bool) -> Res<Option<TicketSnapshot>> {
        let url = self.issue_url(key, expand_changelog);
        debug!("Fetching issue from {url}");

        let response = self.authed(self.client.get(&url)).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<IssueBean>().await?.into_snapshot())),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                warn!("Tracker returned {status} for issue {key}");
                Err(anyhow!("Tracker returned {status} for issue {key}"))
            }
        }
    }

    #[instrument(name = "JiraTrackerClient::search_issues", skip(self))]
    async fn search_issues(&self, jql: &str, max_results: u32) -> Res<SearchResults> {
        let payload = SearchRequest {
            jql,
            max_results,
            fields: SEARCH_FIELDS,
        };

        let response = self
            .authed(self.client.post(format!("{}/rest/api/3/search", self.config.tracker_base_url)))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Tracker search returned {status}");
            return Err(anyhow!("Tracker search returned {status}"));
        }

        let body = response.json::<SearchResponseBean>().await?;
        let hits = body.issues.into_iter().map(IssueBean::into_hit).collect::<Vec<_>>();
        let total = body.total.map(|t| t as usize).unwrap_or(hits.len());

        Ok(SearchResults { total, hits })
    }

    #[instrument(name = "JiraTrackerClient::get_project", skip(self))]
    async fn get_project(&self, key: &str) -> Res<Option<ProjectInfo>> {
        let response = self
            .authed(self.client.get(format!("{}/rest/api/3/project/{key}", self.config.tracker_base_url)))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<ProjectBean>().await?.into_info())),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                warn!("Tracker returned {status} for project {key}");
                Err(anyhow!("Tracker returned {status} for project {key}"))
            }
        }
    }
}

// Wire types.

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    jql: &'a str,
    #[serde(rename = "maxResults")]
    max_results: u32,
    fields: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct SearchResponseBean {
    #[serde(default)]
    issues: Vec<IssueBean>,
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct IssueBean {
    key: String,
    #[serde(default)]
    fields: FieldsBean,
    changelog: Option<ChangelogBean>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldsBean {
    summary: Option<String>,
    status: Option<NamedBean>,
    priority: Option<NamedBean>,
    assignee: Option<UserBean>,
    created: Option<String>,
    updated: Option<String>,
    project: Option<ProjectBean>,
}

#[derive(Debug, Deserialize)]
struct NamedBean {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBean {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectBean {
    key: Option<String>,
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangelogBean {
    #[serde(default)]
    histories: Vec<HistoryBean>,
}

#[derive(Debug, Deserialize)]
struct HistoryBean {
    author: Option<UserBean>,
    created: Option<String>,
    #[serde(default)]
    items: Vec<HistoryItemBean>,
}

#[derive(Debug, Deserialize)]
struct HistoryItemBean {
    field: Option<String>,
    #[serde(rename = "fromString")]
    from: Option<String>,
    #[serde(rename = "toString")]
    to: Option<String>,
}

impl IssueBean {
    fn into_snapshot(self) -> TicketSnapshot {
        let fields = self.fields;

        let (project_key, project_name) = match fields.project {
            Some(project) => (
                project.key.unwrap_or_else(|| MISSING.to_string()),
                project.name.unwrap_or_else(|| MISSING.to_string()),
            ),
            None => (MISSING.to_string(), MISSING.to_string()),
        };

        let changelog = self
            .changelog
            .map(|c| c.histories.into_iter().map(HistoryBean::into_entry).collect())
            .unwrap_or_default();

        TicketSnapshot {
            key: self.key,
            summary: fields.summary.unwrap_or_else(|| MISSING.to_string()),
            status: fields.status.and_then(|s| s.name).unwrap_or_else(|| MISSING.to_string()),
            priority: fields.priority.and_then(|p| p.name).unwrap_or_else(|| MISSING.to_string()),
            assignee: fields.assignee.and_then(|u| u.display_name),
            created: fields.created.unwrap_or_else(|| MISSING.to_string()),
            updated: fields.updated.unwrap_or_else(|| MISSING.to_string()),
            project_key,
            project_name,
            changelog,
        }
    }

    fn into_hit(self) -> SearchHit {
        let fields = self.fields;

        SearchHit {
            key: self.key,
            summary: fields.summary.unwrap_or_else(|| MISSING.to_string()),
            status: fields.status.and_then(|s| s.name).unwrap_or_else(|| MISSING.to_string()),
            assignee: fields.assignee.and_then(|u| u.display_name),
        }
    }
}

impl ProjectBean {
    fn into_info(self) -> ProjectInfo {
        ProjectInfo {
            key: self.key.unwrap_or_else(|| MISSING.to_string()),
            name: self.name.unwrap_or_else(|| MISSING.to_string()),
            description: self.description,
        }
    }
}

impl HistoryBean {
    fn into_entry(self) -> ChangeHistoryEntry {
        ChangeHistoryEntry {
            author: self.author.and_then(|u| u.display_name).unwrap_or_else(|| "Desconocido".to_string()),
            created: self.created.unwrap_or_else(|| MISSING.to_string()),
            items: self
                .items
                .into_iter()
                .map(|item| ChangeItem {
                    field: item.field.unwrap_or_else(|| MISSING.to_string()),
                    from: item.from.unwrap_or_else(|| MISSING.to_string()),
                    to: item.to.unwrap_or_else(|| MISSING.to_string()),
                })
                .collect(),
        }
    }
}
