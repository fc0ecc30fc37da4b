use std::collections::HashSet;

use tracing::debug;

use crate::graph::ownership::BranchOwnership;
use crate::models::{Commit, NodeKind};

/// A commit selected for display, tagged with its owning branch, before any
/// geometry is assigned.
#[derive(Debug, Clone)]
pub struct DisplayCommit {
    pub commit: Commit,
    pub branch: String,
    pub kind: NodeKind,
}

impl DisplayCommit {
    fn new(commit: &Commit, branch: &str, kind: NodeKind) -> Self {
        Self {
            commit: commit.clone(),
            branch: branch.to_string(),
            kind,
        }
    }
}

/// Case-insensitive substring match over message, author fields and sha.
fn matches_search(commit: &Commit, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    commit.message.to_lowercase().contains(&needle)
        || commit.author_name.to_lowercase().contains(&needle)
        || commit.author_login.to_lowercase().contains(&needle)
        || commit.sha.to_lowercase().contains(&needle)
}

/// Merge every branch's display commits into one time-ordered, deduplicated
/// set.
///
/// Per branch: detail mode emits all owned commits passing the search filter;
/// overview mode compresses to HEAD plus the oldest owned commit. HEAD is
/// always emitted even when filtered out, so the branch label has an anchor.
/// The divergence point is emitted attributed to trunk (it is trunk's data
/// point, referenced by the branch's edges). Collapsed trunk additionally
/// keeps its merge commits visible so cross-branch merge connectors survive.
///
/// Deduplication is on the (sha, branch) pair, never on sha alone: the same
/// sha legitimately appears under trunk and under a feature branch at once.
/// First emission wins; branches are processed in `ownerships` order with
/// HEAD emitted before anything else.
pub fn build_display_set(
    ownerships: &[BranchOwnership],
    trunk: &str,
    expanded_branches: &HashSet<String>,
    search: Option<&str>,
) -> Vec<DisplayCommit> {
    let needle = search.map(str::trim).filter(|s| !s.is_empty());
    let passes = |c: &Commit| needle.map_or(true, |n| matches_search(c, n));

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out: Vec<DisplayCommit> = Vec::new();
    let mut emit = |commit: &Commit, branch: &str, kind: NodeKind| {
        if seen.insert((commit.sha.clone(), branch.to_string())) {
            out.push(DisplayCommit::new(commit, branch, kind));
        }
    };

    for own in ownerships {
        let Some(head) = &own.head else {
            // Branch failed to load or fetched empty: contributes nothing.
            continue;
        };
        let branch = own.branch.as_str();
        let is_trunk = branch == trunk;

        emit(head, branch, NodeKind::Head);

        if expanded_branches.contains(branch) {
            for c in own.owned.iter().filter(|c| passes(c)) {
                emit(c, branch, NodeKind::Detail);
            }
        } else {
            if own.owned.len() > 1 {
                if let Some(oldest) = own.oldest_owned() {
                    emit(oldest, branch, NodeKind::Start);
                }
            }
            if is_trunk {
                for c in own.owned.iter().filter(|c| c.is_merge()) {
                    emit(c, branch, NodeKind::Merge);
                }
            }
        }

        if let Some(divergence) = &own.divergence {
            emit(divergence, trunk, NodeKind::BranchPoint);
        }
    }

    // Stable time ordering: ties broken by sha then branch so re-renders
    // never jitter node order.
    out.sort_by(|a, b| {
        a.commit
            .sort_date()
            .cmp(&b.commit.sort_date())
            .then_with(|| a.commit.sha.cmp(&b.commit.sha))
            .then_with(|| a.branch.cmp(&b.branch))
    });

    debug!(nodes = out.len(), "built display set");
    out
}
