use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::display::DisplayCommit;
use crate::graph::ownership::BranchOwnership;
use crate::graph::GraphViewConfig;
use crate::models::{
    node_id, trunkline_anchor_id, Bounds, DisplayNode, Edge, EdgeGeometry, GraphLayout, StepOrder,
};

/// Fixed visual constants for the grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub left_padding: f32,
    pub top_padding: f32,
    pub column_width: f32,
    pub row_height: f32,
    pub margin: f32,
    pub node_radius: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            left_padding: 60.0,
            top_padding: 48.0,
            column_width: 90.0,
            row_height: 72.0,
            margin: 60.0,
            node_radius: 6.0,
        }
    }
}

/// Column index per sha, on a non-uniform time axis.
///
/// Commits are bucketed by calendar date in the consumer's time zone. A
/// collapsed date takes one column regardless of commit count; an expanded
/// date with more than one distinct sha takes one column per sha in time
/// order. Indices are recomputed globally on every run, in left-to-right
/// date order, so toggling one date keeps every other date's ordering valid.
pub(crate) fn assign_columns(
    display: &[DisplayCommit],
    config: &GraphViewConfig,
) -> HashMap<String, usize> {
    // BTreeMap keys give the stable left-to-right date ordering. Within one
    // date, shas keep the display set's time order.
    let mut by_date: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
    for d in display {
        let key = d
            .commit
            .sort_date()
            .with_timezone(&config.tz_offset)
            .date_naive();
        let shas = by_date.entry(key).or_default();
        if !shas.contains(&d.commit.sha.as_str()) {
            shas.push(&d.commit.sha);
        }
    }

    let mut columns = HashMap::new();
    let mut col = 0usize;
    for (date, shas) in &by_date {
        if config.expanded_dates.contains(date) && shas.len() > 1 {
            for sha in shas {
                columns.insert(sha.to_string(), col);
                col += 1;
            }
        } else {
            for sha in shas {
                columns.insert(sha.to_string(), col);
            }
            col += 1;
        }
    }
    columns
}

fn classify(from: (f32, f32), to: (f32, f32), step: StepOrder) -> (EdgeGeometry, Option<StepOrder>) {
    if (from.1 - to.1).abs() < f32::EPSILON {
        (EdgeGeometry::Straight, None)
    } else if (from.0 - to.0).abs() < f32::EPSILON {
        (EdgeGeometry::Vertical, None)
    } else {
        (EdgeGeometry::Step, Some(step))
    }
}

fn edge(
    from: &str,
    to: &str,
    from_pos: (f32, f32),
    to_pos: (f32, f32),
    step: StepOrder,
    is_merge_connector: bool,
) -> Edge {
    let (geometry, step_order) = classify(from_pos, to_pos, step);
    Edge {
        from: from.to_string(),
        to: to.to_string(),
        from_pos,
        to_pos,
        geometry,
        step_order,
        is_merge_connector,
    }
}

/// Assign grid positions to the display set and synthesize edges.
///
/// Rows depend only on branch identity (`config.branch_rows`, trunk first);
/// columns come from [`assign_columns`]. Edge synthesis order: intra-branch
/// parent edges, cross-branch merge edges, then one divergence connector per
/// non-trunk branch.
pub fn layout(
    display: &[DisplayCommit],
    ownerships: &HashMap<String, BranchOwnership>,
    config: &GraphViewConfig,
    viewport: (f32, f32),
) -> GraphLayout {
    let m = &config.metrics;
    if display.is_empty() {
        return GraphLayout::empty(Bounds {
            width: viewport.0,
            height: viewport.1,
        });
    }

    let row_of: HashMap<&str, usize> = config
        .branch_rows
        .iter()
        .enumerate()
        .map(|(i, b)| (b.as_str(), i))
        .collect();
    let columns = assign_columns(display, config);

    let mut nodes: Vec<DisplayNode> = Vec::with_capacity(display.len());
    for d in display {
        let Some(&row) = row_of.get(d.branch.as_str()) else {
            // Display commit for a branch with no assigned row: dropped, not
            // an error (the branch was deselected mid-refresh).
            continue;
        };
        let Some(&col) = columns.get(d.commit.sha.as_str()) else {
            continue;
        };
        nodes.push(DisplayNode {
            id: node_id(&d.commit.sha, &d.branch),
            x: m.left_padding + col as f32 * m.column_width,
            y: m.top_padding + row as f32 * m.row_height,
            row,
            color_index: row,
            kind: d.kind,
            branch: d.branch.clone(),
            commit: d.commit.clone(),
        });
    }

    let pos: HashMap<&str, (f32, f32)> = nodes.iter().map(|n| (n.id.as_str(), (n.x, n.y))).collect();
    let mut edges: Vec<Edge> = Vec::new();

    // 1. Intra-branch parent edges, detail mode only. parents[1..] of a merge
    //    commit render as dashed merge connectors.
    for node in &nodes {
        if !config.expanded_branches.contains(&node.branch) {
            continue;
        }
        for (i, parent) in node.commit.parents.iter().enumerate() {
            let parent_id = node_id(parent, &node.branch);
            if let Some(&parent_pos) = pos.get(parent_id.as_str()) {
                edges.push(edge(
                    &node.id,
                    &parent_id,
                    (node.x, node.y),
                    parent_pos,
                    StepOrder::HorizontalFirst,
                    i > 0,
                ));
            }
        }
    }

    // 2. Cross-branch merge edges: trunk merge commits whose non-first parent
    //    belongs to another branch's owned set.
    let trunk = config.trunk.as_str();
    let trunk_merge_nodes: Vec<&DisplayNode> = nodes
        .iter()
        .filter(|n| n.branch == trunk && n.commit.is_merge())
        .collect();
    for branch in config.branch_rows.iter().filter(|b| *b != trunk) {
        let Some(own) = ownerships.get(branch) else {
            continue;
        };
        let head_id = own.head.as_ref().map(|h| node_id(&h.sha, branch));
        for merge_node in &trunk_merge_nodes {
            for parent in merge_node.commit.parents.iter().skip(1) {
                if !own.owned_shas.contains(parent) {
                    continue;
                }
                // Detail mode targets the merged commit itself; overview (or
                // a commit hidden by the search filter) targets the HEAD.
                let specific = node_id(parent, branch);
                let target = if config.expanded_branches.contains(branch)
                    && pos.contains_key(specific.as_str())
                {
                    Some(specific)
                } else {
                    head_id.clone().filter(|id| pos.contains_key(id.as_str()))
                };
                if let Some(target) = target {
                    let to_pos = pos[target.as_str()];
                    edges.push(edge(
                        &merge_node.id,
                        &target,
                        (merge_node.x, merge_node.y),
                        to_pos,
                        StepOrder::VerticalFirst,
                        true,
                    ));
                }
            }
        }
    }

    // 3. Divergence connector: exactly one per non-trunk branch, from its
    //    oldest displayed node up to the divergence point on trunk, or to the
    //    trunk-line anchor when no divergence point was found.
    let trunk_y = m.top_padding
        + row_of.get(trunk).copied().unwrap_or(0) as f32 * m.row_height;
    for branch in config.branch_rows.iter().filter(|b| *b != trunk) {
        let Some(source) = nodes
            .iter()
            .filter(|n| &n.branch == branch)
            .min_by(|a, b| {
                a.commit
                    .sort_date()
                    .cmp(&b.commit.sort_date())
                    .then_with(|| a.commit.sha.cmp(&b.commit.sha))
            })
        else {
            continue;
        };
        let divergence_target = ownerships
            .get(branch)
            .and_then(|o| o.divergence.as_ref())
            .map(|d| node_id(&d.sha, trunk))
            .filter(|id| pos.contains_key(id.as_str()));
        match divergence_target {
            Some(target) => {
                let to_pos = pos[target.as_str()];
                edges.push(edge(
                    &source.id,
                    &target,
                    (source.x, source.y),
                    to_pos,
                    StepOrder::HorizontalFirst,
                    false,
                ));
            }
            None => {
                // Conceptual trunk-timeline anchor at the source's x.
                edges.push(edge(
                    &source.id,
                    &trunkline_anchor_id(branch),
                    (source.x, source.y),
                    (source.x, trunk_y),
                    StepOrder::HorizontalFirst,
                    false,
                ));
            }
        }
    }

    let max_x = nodes.iter().map(|n| n.x).fold(0.0f32, f32::max);
    let max_y = nodes.iter().map(|n| n.y).fold(0.0f32, f32::max);
    let bounds = Bounds {
        width: (max_x + m.margin).max(viewport.0),
        height: (max_y + m.margin).max(viewport.1),
    };

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        width = bounds.width,
        height = bounds.height,
        "layout computed"
    );

    GraphLayout {
        nodes,
        edges,
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::display::build_display_set;
    use crate::graph::fixtures::{commit_on_day, day_date};
    use crate::graph::ownership::{resolve_branch, resolve_trunk};
    use crate::models::NodeKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn config(rows: &[&str], trunk: &str) -> GraphViewConfig {
        GraphViewConfig {
            trunk: trunk.to_string(),
            branch_rows: rows.iter().map(|s| s.to_string()).collect(),
            ..GraphViewConfig::new(trunk)
        }
    }

    /// Trunk c1..c3 on days 0..2, feature f1/f2 on days 3/4 forking at c2.
    fn feature_scenario() -> (
        Vec<DisplayCommit>,
        HashMap<String, BranchOwnership>,
        GraphViewConfig,
    ) {
        let trunk_commits = vec![
            commit_on_day("c3", &["c2"], 2),
            commit_on_day("c2", &["c1"], 1),
            commit_on_day("c1", &[], 0),
        ];
        let feature_commits = vec![
            commit_on_day("f2", &["f1"], 4),
            commit_on_day("f1", &["c2"], 3),
            commit_on_day("c2", &["c1"], 1),
        ];
        let trunk = resolve_trunk("main", &trunk_commits);
        let feature = resolve_branch("feature", &feature_commits, &trunk);
        let cfg = config(&["main", "feature"], "main");
        let display = build_display_set(
            &[trunk.clone(), feature.clone()],
            "main",
            &cfg.expanded_branches,
            None,
        );
        let mut ownerships = HashMap::new();
        ownerships.insert("main".to_string(), trunk);
        ownerships.insert("feature".to_string(), feature);
        (display, ownerships, cfg)
    }

    fn node<'a>(layout: &'a GraphLayout, id: &str) -> &'a DisplayNode {
        layout.nodes.iter().find(|n| n.id == id).unwrap()
    }

    #[test]
    fn trunk_is_row_zero_and_rows_follow_selection_order() {
        let (display, ownerships, cfg) = feature_scenario();
        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        assert_eq!(node(&out, "c3:main").row, 0);
        assert_eq!(node(&out, "f2:feature").row, 1);
        assert_eq!(node(&out, "f2:feature").color_index, 1);
        // Row depends only on branch identity, not on commit data.
        for n in &out.nodes {
            let expected = if n.branch == "main" { 0 } else { 1 };
            assert_eq!(n.row, expected);
        }
    }

    #[test]
    fn overview_feature_gets_stepped_divergence_connector() {
        let (display, ownerships, cfg) = feature_scenario();
        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));

        // Overview: f2 head, f1 start, plus c2 branch point on trunk.
        assert_eq!(
            out.nodes.iter().filter(|n| n.branch == "feature").count(),
            2
        );
        assert_eq!(node(&out, "c2:main").kind, NodeKind::BranchPoint);

        let divergence: Vec<&Edge> = out
            .edges
            .iter()
            .filter(|e| e.to == "c2:main" && e.from == "f1:feature")
            .collect();
        assert_eq!(divergence.len(), 1);
        assert_eq!(divergence[0].geometry, EdgeGeometry::Step);
        assert_eq!(divergence[0].step_order, Some(StepOrder::HorizontalFirst));
        assert!(!divergence[0].is_merge_connector);
    }

    #[test]
    fn detail_mode_draws_intra_branch_parent_edges() {
        let (display_base, ownerships, mut cfg) = feature_scenario();
        cfg.expanded_branches.insert("feature".to_string());
        // Rebuild the display set with the branch expanded.
        let display = build_display_set(
            &[
                ownerships["main"].clone(),
                ownerships["feature"].clone(),
            ],
            "main",
            &cfg.expanded_branches,
            None,
        );
        assert!(display.len() >= display_base.len());

        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        let intra: Vec<&Edge> = out
            .edges
            .iter()
            .filter(|e| e.from == "f2:feature" && e.to == "f1:feature")
            .collect();
        assert_eq!(intra.len(), 1);
        assert_eq!(intra[0].geometry, EdgeGeometry::Straight);
    }

    #[test]
    fn merged_branch_has_no_intra_edges() {
        let trunk_commits = vec![
            commit_on_day("c2", &["c1"], 1),
            commit_on_day("c1", &[], 0),
        ];
        let trunk = resolve_trunk("main", &trunk_commits);
        let feature_commits = vec![
            commit_on_day("c2", &["c1"], 1),
            commit_on_day("c1", &[], 0),
        ];
        let feature = resolve_branch("feature", &feature_commits, &trunk);
        let mut cfg = config(&["main", "feature"], "main");
        cfg.expanded_branches.insert("feature".to_string());
        let display = build_display_set(
            &[trunk.clone(), feature.clone()],
            "main",
            &cfg.expanded_branches,
            None,
        );
        let mut ownerships = HashMap::new();
        ownerships.insert("main".to_string(), trunk);
        ownerships.insert("feature".to_string(), feature);

        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        let feature_nodes: Vec<_> = out.nodes.iter().filter(|n| n.branch == "feature").collect();
        assert_eq!(feature_nodes.len(), 1);
        assert_eq!(feature_nodes[0].kind, NodeKind::Head);
        assert!(!out
            .edges
            .iter()
            .any(|e| e.from.ends_with(":feature") && e.to.ends_with(":feature")));
    }

    #[test]
    fn cross_branch_merge_edge_targets_head_in_overview() {
        // Trunk merges feature: m -> [c2, f1].
        let trunk_commits = vec![
            commit_on_day("m", &["c2", "f1"], 5),
            commit_on_day("c2", &["c1"], 1),
            commit_on_day("c1", &[], 0),
        ];
        let feature_commits = vec![
            commit_on_day("f2", &["f1"], 4),
            commit_on_day("f1", &["c2"], 3),
            commit_on_day("c2", &["c1"], 1),
        ];
        let trunk = resolve_trunk("main", &trunk_commits);
        let feature = resolve_branch("feature", &feature_commits, &trunk);
        let cfg = config(&["main", "feature"], "main");
        let display = build_display_set(
            &[trunk.clone(), feature.clone()],
            "main",
            &cfg.expanded_branches,
            None,
        );
        let mut ownerships = HashMap::new();
        ownerships.insert("main".to_string(), trunk);
        ownerships.insert("feature".to_string(), feature);

        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        let merge_edges: Vec<&Edge> = out
            .edges
            .iter()
            .filter(|e| e.is_merge_connector)
            .collect();
        assert_eq!(merge_edges.len(), 1);
        assert_eq!(merge_edges[0].from, "m:main");
        assert_eq!(merge_edges[0].to, "f2:feature");
        assert_eq!(merge_edges[0].step_order, Some(StepOrder::VerticalFirst));
    }

    #[test]
    fn missing_divergence_targets_trunkline_anchor() {
        let trunk_commits = vec![commit_on_day("t1", &[], 9)];
        let trunk = resolve_trunk("main", &trunk_commits);
        // Unrelated history older than every trunk commit: heuristic finds
        // nothing, walk hits the root.
        let feature_commits = vec![
            commit_on_day("f2", &["f1"], 1),
            commit_on_day("f1", &[], 0),
        ];
        let feature = resolve_branch("feature", &feature_commits, &trunk);
        assert!(feature.divergence.is_none());

        let cfg = config(&["main", "feature"], "main");
        let display = build_display_set(
            &[trunk.clone(), feature.clone()],
            "main",
            &cfg.expanded_branches,
            None,
        );
        let mut ownerships = HashMap::new();
        ownerships.insert("main".to_string(), trunk);
        ownerships.insert("feature".to_string(), feature);

        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        let anchor_edge = out
            .edges
            .iter()
            .find(|e| e.to == "trunkline:feature")
            .unwrap();
        assert_eq!(anchor_edge.from, "f1:feature");
        assert_eq!(anchor_edge.geometry, EdgeGeometry::Vertical);
        let f1 = node(&out, "f1:feature");
        assert_eq!(anchor_edge.to_pos, (f1.x, cfg.metrics.top_padding));
    }

    #[test]
    fn same_day_commits_share_one_column_until_expanded() {
        // 3 trunk commits on the same day.
        let trunk_commits = vec![
            {
                let mut c = commit_on_day("c3", &["c2"], 0);
                c.date = c.date.map(|d| d + chrono::Duration::hours(2));
                c
            },
            {
                let mut c = commit_on_day("c2", &["c1"], 0);
                c.date = c.date.map(|d| d + chrono::Duration::hours(1));
                c
            },
            commit_on_day("c1", &[], 0),
        ];
        let trunk = resolve_trunk("main", &trunk_commits);
        let mut cfg = config(&["main"], "main");
        cfg.expanded_branches.insert("main".to_string());
        let display = build_display_set(
            &[trunk.clone()],
            "main",
            &cfg.expanded_branches,
            None,
        );
        let mut ownerships = HashMap::new();
        ownerships.insert("main".to_string(), trunk);

        // Collapsed: one shared column.
        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        let xs: HashSet<u32> = out.nodes.iter().map(|n| n.x as u32).collect();
        assert_eq!(xs.len(), 1);

        // Expanded: three consecutive columns in time order.
        cfg.expanded_dates.insert(day_date(0));
        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        let w = cfg.metrics.column_width;
        let l = cfg.metrics.left_padding;
        assert_eq!(node(&out, "c1:main").x, l);
        assert_eq!(node(&out, "c2:main").x, l + w);
        assert_eq!(node(&out, "c3:main").x, l + 2.0 * w);
    }

    #[test]
    fn bounds_are_floored_at_viewport() {
        let (display, ownerships, cfg) = feature_scenario();
        let out = layout(&display, &ownerships, &cfg, (1200.0, 800.0));
        assert_eq!(out.bounds.width, 1200.0);
        assert_eq!(out.bounds.height, 800.0);

        let out = layout(&display, &ownerships, &cfg, (0.0, 0.0));
        assert!(out.bounds.width > 0.0 && out.bounds.height > 0.0);
    }

    #[test]
    fn empty_display_set_yields_viewport_sized_empty_layout() {
        let cfg = config(&["main"], "main");
        let out = layout(&[], &HashMap::new(), &cfg, (640.0, 480.0));
        assert!(out.nodes.is_empty() && out.edges.is_empty());
        assert_eq!(out.bounds.width, 640.0);
    }

    proptest! {
        /// Column monotonicity: time never flows backward on the horizontal
        /// axis, under any mix of expanded and collapsed dates.
        #[test]
        fn columns_are_monotonic_in_time(
            days in proptest::collection::vec(0i64..6, 1..20),
            expanded in proptest::collection::hash_set(0i64..6, 0..6),
        ) {
            let mut commits: Vec<_> = days
                .iter()
                .enumerate()
                .map(|(i, &day)| commit_on_day(&format!("s{:02}", i), &[], day))
                .collect();
            commits.sort_by(|a, b| {
                b.sort_date()
                    .cmp(&a.sort_date())
                    .then_with(|| b.sha.cmp(&a.sha))
            });
            // Link into a first-parent chain so the whole list is trunk-owned.
            for i in 0..commits.len() - 1 {
                let parent = commits[i + 1].sha.clone();
                commits[i].parents = vec![parent];
            }

            let trunk = resolve_trunk("main", &commits);
            let mut cfg = config(&["main"], "main");
            cfg.expanded_branches.insert("main".to_string());
            for day in expanded {
                cfg.expanded_dates.insert(day_date(day));
            }
            let display = build_display_set(
                &[trunk],
                "main",
                &cfg.expanded_branches,
                None,
            );
            let columns = assign_columns(&display, &cfg);

            for a in &display {
                for b in &display {
                    if a.commit.sort_date() < b.commit.sort_date() {
                        prop_assert!(
                            columns[a.commit.sha.as_str()] <= columns[b.commit.sha.as_str()]
                        );
                    }
                }
            }
        }
    }
}
