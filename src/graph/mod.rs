//! The three-stage BranchView pipeline: ownership resolution, display-set
//! building, and grid layout. Pure and synchronous; one full run per refresh
//! (branch selection change, expand/collapse toggle, or search change), with
//! the output replacing the prior layout wholesale.

pub mod display;
pub mod layout;
pub mod ownership;

use std::collections::{HashMap, HashSet};

use chrono::{FixedOffset, NaiveDate};

use crate::models::{CommitsByBranch, GraphLayout};

pub use display::DisplayCommit;
pub use layout::LayoutMetrics;
pub use ownership::BranchOwnership;

/// Everything the pipeline needs besides the commit data itself. Held by the
/// presentation layer, passed in explicitly so the pipeline stays a pure
/// function with no view-framework state woven through it.
#[derive(Debug, Clone)]
pub struct GraphViewConfig {
    /// The repository's default branch; the fixed reference frame for
    /// divergence computation, always row 0 when selected.
    pub trunk: String,
    /// Selected branches in row order, trunk first.
    pub branch_rows: Vec<String>,
    /// Branches shown in detail mode (all owned commits individually).
    pub expanded_branches: HashSet<String>,
    /// Dates whose same-day commits are spread into separate columns.
    pub expanded_dates: HashSet<NaiveDate>,
    /// Case-insensitive substring filter over message, author and sha.
    pub search: Option<String>,
    /// The consuming client's local offset, used for date bucketing. Supplied
    /// by the caller so the layout stays referentially transparent.
    pub tz_offset: FixedOffset,
    pub metrics: LayoutMetrics,
}

impl GraphViewConfig {
    pub fn new(trunk: &str) -> Self {
        Self {
            trunk: trunk.to_string(),
            branch_rows: vec![trunk.to_string()],
            expanded_branches: HashSet::new(),
            expanded_dates: HashSet::new(),
            search: None,
            tz_offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
            metrics: LayoutMetrics::default(),
        }
    }
}

/// Run the full pipeline over one fetched snapshot.
///
/// Branches named in `config.branch_rows` but absent or empty in `data`
/// silently contribute no nodes or edges. The result is render-ready: node
/// and edge geometry needs no further interpretation by the consumer.
pub fn compute_graph_layout(
    data: &CommitsByBranch,
    config: &GraphViewConfig,
    viewport: (f32, f32),
) -> GraphLayout {
    let trunk_commits = data
        .get(&config.trunk)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let trunk = ownership::resolve_trunk(&config.trunk, trunk_commits);

    let mut ownerships: Vec<BranchOwnership> = Vec::with_capacity(config.branch_rows.len());
    for branch in &config.branch_rows {
        if branch == &config.trunk {
            ownerships.push(trunk.clone());
            continue;
        }
        let commits = data.get(branch).map(Vec::as_slice).unwrap_or_default();
        ownerships.push(ownership::resolve_branch(branch, commits, &trunk));
    }

    let display = display::build_display_set(
        &ownerships,
        &config.trunk,
        &config.expanded_branches,
        config.search.as_deref(),
    );

    let by_name: HashMap<String, BranchOwnership> = ownerships
        .into_iter()
        .map(|o| (o.branch.clone(), o))
        .collect();

    layout::layout(&display, &by_name, config, viewport)
}
