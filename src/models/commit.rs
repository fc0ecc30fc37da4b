use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A commit as delivered by the backend's commits-graph endpoint.
///
/// Received read-only; identity is the full `sha`. `short_sha` is display-only
/// and not guaranteed unique. The first entry of `parents` is the mainline
/// parent; merge commits carry two or more entries, root commits none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub short_sha: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_login: String,
    /// Missing dates are tolerated; such commits sort as the Unix epoch.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
}

impl Commit {
    /// Timestamp used for ordering and column bucketing. Deterministic even
    /// for malformed feeds: a missing date maps to the epoch, never to "now".
    pub fn sort_date(&self) -> DateTime<Utc> {
        self.date.unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }
}

/// A branch as delivered by the backend's branch-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Branch name -> commits, newest-first (index 0 is the branch HEAD).
///
/// The sole input to the graph pipeline. Re-fetched wholesale on any
/// branch-selection change; never mutated in place.
pub type CommitsByBranch = BTreeMap<String, Vec<Commit>>;
