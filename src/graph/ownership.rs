use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::models::Commit;

/// Which commits a branch uniquely owns and where it forked from trunk.
#[derive(Debug, Clone)]
pub struct BranchOwnership {
    pub branch: String,
    /// The branch HEAD, if the fetched list was non-empty.
    pub head: Option<Commit>,
    /// Owned commits in first-parent walk order, newest first.
    pub owned: Vec<Commit>,
    pub owned_shas: HashSet<String>,
    /// The trunk commit this branch forked from. Always a member of trunk's
    /// own commit list, never synthesized.
    pub divergence: Option<Commit>,
    /// True when the divergence point came from the nearest-preceding-by-time
    /// heuristic rather than an actual shared ancestor. Best-effort: clock
    /// skew or rebases can mis-attribute it.
    pub divergence_approximate: bool,
}

impl BranchOwnership {
    fn empty(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            head: None,
            owned: Vec::new(),
            owned_shas: HashSet::new(),
            divergence: None,
            divergence_approximate: false,
        }
    }

    /// Oldest owned commit (the tail of the first-parent walk).
    pub fn oldest_owned(&self) -> Option<&Commit> {
        self.owned.last()
    }
}

/// Sha-keyed adjacency lookup over a fetched commit list. Parents stay sha
/// references; no pointer graph is ever built.
fn index(commits: &[Commit]) -> HashMap<&str, &Commit> {
    commits.iter().map(|c| (c.sha.as_str(), c)).collect()
}

/// First-parent walk from HEAD. Ignores second-and-later parents of merge
/// commits (those lead into other branches' histories). Stops at a root
/// commit, at a sha outside the fetched window, or — via the visited guard —
/// when a malformed feed contains a parent cycle.
fn walk_first_parents<'a>(
    head: &'a Commit,
    by_sha: &HashMap<&str, &'a Commit>,
    mut stop: impl FnMut(&Commit) -> bool,
) -> (Vec<&'a Commit>, Option<&'a Commit>) {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut chain = Vec::new();
    let mut current = head;

    loop {
        if !visited.insert(current.sha.as_str()) {
            warn!(sha = %current.sha, "parent cycle in commit feed, stopping walk");
            return (chain, None);
        }
        if stop(current) {
            return (chain, Some(current));
        }
        chain.push(current);
        match current.first_parent().and_then(|p| by_sha.get(p)) {
            Some(parent) => current = parent,
            None => return (chain, None),
        }
    }
}

/// Trunk's own-commit set: every commit reachable from trunk HEAD by first
/// parents within the fetched window. Computed once per refresh and shared by
/// every other branch's resolution.
pub fn resolve_trunk(branch: &str, commits: &[Commit]) -> BranchOwnership {
    let Some(head) = commits.first() else {
        return BranchOwnership::empty(branch);
    };
    let by_sha = index(commits);
    let (chain, _) = walk_first_parents(head, &by_sha, |_| false);

    let owned: Vec<Commit> = chain.into_iter().cloned().collect();
    let owned_shas = owned.iter().map(|c| c.sha.clone()).collect();
    debug!(branch, owned = owned.len(), "resolved trunk ownership");

    BranchOwnership {
        branch: branch.to_string(),
        head: Some(head.clone()),
        owned,
        owned_shas,
        divergence: None,
        divergence_approximate: false,
    }
}

/// A non-trunk branch's own-commit set: the first-parent walk from its HEAD,
/// stopped at the first trunk-owned sha. That commit is the divergence point
/// and is excluded from the owned set. A HEAD that is itself trunk-owned
/// (branch fully merged away) yields an empty owned set with HEAD retained
/// for label anchoring.
pub fn resolve_branch(branch: &str, commits: &[Commit], trunk: &BranchOwnership) -> BranchOwnership {
    let Some(head) = commits.first() else {
        return BranchOwnership::empty(branch);
    };
    let by_sha = index(commits);
    let trunk_by_sha: HashMap<&str, &Commit> =
        trunk.owned.iter().map(|c| (c.sha.as_str(), c)).collect();

    let (chain, stopped_at) =
        walk_first_parents(head, &by_sha, |c| trunk.owned_shas.contains(&c.sha));

    let owned: Vec<Commit> = chain.into_iter().cloned().collect();
    let owned_shas: HashSet<String> = owned.iter().map(|c| c.sha.clone()).collect();

    // The divergence commit is trunk's data point; take trunk's copy of it so
    // it always exists in trunk's own list.
    let mut divergence = stopped_at
        .and_then(|c| trunk_by_sha.get(c.sha.as_str()))
        .map(|c| (*c).clone());
    let mut approximate = false;

    if divergence.is_none() {
        if let Some(oldest) = owned.last() {
            divergence = nearest_preceding_trunk_commit(oldest, trunk);
            approximate = divergence.is_some();
            if approximate {
                debug!(
                    branch,
                    "divergence point approximated by timestamp (fetch depth insufficient)"
                );
            }
        }
    }

    debug!(
        branch,
        owned = owned.len(),
        divergence = divergence.as_ref().map(|c| c.sha.as_str()).unwrap_or("none"),
        "resolved branch ownership"
    );

    BranchOwnership {
        branch: branch.to_string(),
        head: Some(head.clone()),
        owned,
        owned_shas,
        divergence,
        divergence_approximate: approximate,
    }
}

/// Heuristic fallback when the walk exhausts the fetched window without
/// touching trunk: the latest trunk commit dated at or before the branch's
/// oldest owned commit. Searched only within the fetched trunk list so the
/// result stays deterministic and bounded.
fn nearest_preceding_trunk_commit(oldest_owned: &Commit, trunk: &BranchOwnership) -> Option<Commit> {
    let cutoff = oldest_owned.sort_date();
    trunk
        .owned
        .iter()
        .filter(|c| c.sort_date() <= cutoff)
        .max_by(|a, b| {
            a.sort_date()
                .cmp(&b.sort_date())
                .then_with(|| a.sha.cmp(&b.sha))
        })
        .cloned()
}
