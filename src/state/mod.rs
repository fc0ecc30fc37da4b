mod store;
mod view_state;

pub use store::SelectionStore;
pub use view_state::{BranchViewState, FetchGuard};
