use std::collections::HashSet;

use chrono::{FixedOffset, NaiveDate};
use tracing::debug;

use crate::error::{BranchViewError, Result};
use crate::graph::{GraphViewConfig, LayoutMetrics};

/// The UI toggle state the pipeline consumes as configuration.
///
/// Pure data: mutators only record the user's choices, the pipeline reruns
/// from scratch on the next refresh. Row slots are derived, never stored —
/// trunk is pinned to row 0 and the remaining selected branches keep their
/// selection order, so a branch's row is stable as long as it stays selected.
#[derive(Debug, Clone)]
pub struct BranchViewState {
    trunk: String,
    selected: Vec<String>,
    expanded_branches: HashSet<String>,
    expanded_dates: HashSet<NaiveDate>,
    search: String,
}

impl BranchViewState {
    pub fn new(trunk: &str) -> Self {
        Self {
            trunk: trunk.to_string(),
            selected: vec![trunk.to_string()],
            expanded_branches: HashSet::new(),
            expanded_dates: HashSet::new(),
            search: String::new(),
        }
    }

    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    pub fn selected_branches(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, branch: &str) -> bool {
        self.selected.iter().any(|b| b == branch)
    }

    pub fn select_branch(&mut self, branch: &str) {
        if !self.is_selected(branch) {
            self.selected.push(branch.to_string());
            debug!(branch, "branch selected");
        }
    }

    pub fn deselect_branch(&mut self, branch: &str) {
        self.selected.retain(|b| b != branch);
        self.expanded_branches.remove(branch);
    }

    pub fn toggle_branch_expanded(&mut self, branch: &str) {
        if !self.expanded_branches.remove(branch) {
            self.expanded_branches.insert(branch.to_string());
        }
    }

    pub fn toggle_date_expanded(&mut self, date: NaiveDate) {
        if !self.expanded_dates.remove(&date) {
            self.expanded_dates.insert(date);
        }
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    /// Row order for the layout: trunk first when selected, then the other
    /// selected branches in selection order.
    pub fn branch_rows(&self) -> Vec<String> {
        let mut rows = Vec::with_capacity(self.selected.len());
        if self.is_selected(&self.trunk) {
            rows.push(self.trunk.clone());
        }
        rows.extend(
            self.selected
                .iter()
                .filter(|b| **b != self.trunk)
                .cloned(),
        );
        rows
    }

    /// Snapshot this state into the pipeline's explicit configuration.
    pub fn to_config(&self, tz_offset: FixedOffset, metrics: LayoutMetrics) -> GraphViewConfig {
        GraphViewConfig {
            trunk: self.trunk.clone(),
            branch_rows: self.branch_rows(),
            expanded_branches: self.expanded_branches.clone(),
            expanded_dates: self.expanded_dates.clone(),
            search: if self.search.trim().is_empty() {
                None
            } else {
                Some(self.search.clone())
            },
            tz_offset,
            metrics,
        }
    }
}

/// Generation guard for the asynchronous commit fetch.
///
/// A refresh begins by taking a new generation id; only the response carrying
/// the latest id may replace the commits snapshot. An out-of-order response
/// is rejected so it can never revert the graph to stale data.
#[derive(Debug, Default)]
pub struct FetchGuard {
    current: u64,
}

impl FetchGuard {
    /// Start a new fetch, invalidating all earlier ones.
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.current
    }

    /// Accept a completed fetch, or reject it as stale.
    pub fn accept(&self, generation: u64) -> Result<()> {
        if self.is_current(generation) {
            Ok(())
        } else {
            Err(BranchViewError::stale(generation, self.current))
        }
    }
}
