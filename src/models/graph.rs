use serde::{Deserialize, Serialize};

use crate::models::Commit;

/// Why a commit was emitted into the display set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// An owned commit shown individually (branch in detail mode).
    Detail,
    /// The branch HEAD; always present so the branch label has an anchor.
    Head,
    /// The oldest owned commit of a collapsed branch.
    Start,
    /// A divergence point, attributed to the trunk branch.
    BranchPoint,
    /// A trunk merge commit kept visible while trunk is collapsed.
    Merge,
}

/// A render-ready node. Created fresh on every layout pass, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNode {
    /// Composite identity `"{sha}:{branch}"`; the same sha may appear under
    /// more than one branch, so the sha alone is not a node id.
    pub id: String,
    pub x: f32,
    pub y: f32,
    /// Vertical slot of the owning branch; trunk is always row 0.
    pub row: usize,
    /// Color palette index, derived from the row.
    pub color_index: usize,
    pub kind: NodeKind,
    pub branch: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeGeometry {
    /// Same row, differing x.
    Straight,
    /// Same x, differing row.
    Vertical,
    /// Orthogonal two-segment connector.
    Step,
}

/// Which leg of a stepped edge is drawn first, leaving the `from` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepOrder {
    /// Divergence direction: the feature branch reaches up into the mainline.
    HorizontalFirst,
    /// Merge direction: the mainline reaches down into the feature branch.
    VerticalFirst,
}

/// A render-ready connector between two nodes.
///
/// Endpoint coordinates are carried inline so the renderer never has to look
/// nodes up by id; divergence connectors without a resolved trunk node point
/// at a synthetic trunk-line anchor id with explicit coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub from_pos: (f32, f32),
    pub to_pos: (f32, f32),
    pub geometry: EdgeGeometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_order: Option<StepOrder>,
    /// Second-or-later parent links of merge commits render dashed.
    pub is_merge_connector: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

/// The full output of one pipeline run, replacing the prior one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLayout {
    pub nodes: Vec<DisplayNode>,
    pub edges: Vec<Edge>,
    pub bounds: Bounds,
}

impl GraphLayout {
    pub fn empty(bounds: Bounds) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            bounds,
        }
    }
}

/// Composite node id for a (sha, branch) pair.
pub fn node_id(sha: &str, branch: &str) -> String {
    format!("{}:{}", sha, branch)
}

/// Synthetic anchor id used when a branch has no resolved divergence point.
pub fn trunkline_anchor_id(branch: &str) -> String {
    format!("trunkline:{}", branch)
}
