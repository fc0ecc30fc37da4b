//! # branchview
//!
//! Commit-graph reconstruction and layout engine behind the BranchView panel
//! of a project-management client.
//!
//! The backend hands over flat, newest-first commit lists per branch; this
//! crate reconstructs branch ownership and divergence points from them and
//! computes a deterministic 2D layout (rows, date-bucketed columns, merge and
//! divergence connectors) ready for direct rendering.
//!
//! ## Architecture
//!
//! - [`graph`] - the three-stage pipeline: ownership resolution, display-set
//!   building, layout
//! - [`models`] - wire types and render-ready output structures
//! - [`state`] - view toggles, fetch generation guard, persisted selections
//! - [`api`] - thin typed client for the backend collaborator
//!
//! ## Example
//!
//! ```rust
//! use branchview::graph::{compute_graph_layout, GraphViewConfig};
//! use branchview::models::CommitsByBranch;
//!
//! let data = CommitsByBranch::new();
//! let config = GraphViewConfig::new("main");
//! let layout = compute_graph_layout(&data, &config, (1280.0, 720.0));
//! assert!(layout.nodes.is_empty());
//! ```

pub mod api;
pub mod error;
pub mod graph;
pub mod models;
pub mod state;

pub use error::{BranchViewError, Result};
pub use graph::{compute_graph_layout, GraphViewConfig, LayoutMetrics};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_metadata() {
        assert_eq!(NAME, "branchview");
        assert!(VERSION.chars().next().unwrap().is_ascii_digit());
    }
}
