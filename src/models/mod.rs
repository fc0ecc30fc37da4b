mod commit;
mod graph;

pub use commit::{Branch, Commit, CommitsByBranch};
pub use graph::{
    node_id, trunkline_anchor_id, Bounds, DisplayNode, Edge, EdgeGeometry, GraphLayout, NodeKind,
    StepOrder,
};
