use anyhow::Result;
use clap::Parser;

use branchview::api::ApiClient;
use branchview::graph::{compute_graph_layout, LayoutMetrics};
use branchview::state::BranchViewState;

/// Fetch a repository's commit graph from the backend and print the computed
/// layout as JSON. Mainly a development aid for inspecting pipeline output
/// without the web client.
#[derive(Parser, Debug)]
#[command(name = "branchview", version)]
struct Args {
    /// Backend base URL, e.g. https://api.example.test
    #[arg(long)]
    base_url: String,

    /// Team/repository identifier
    #[arg(long)]
    repo: String,

    /// Branches to lay out; defaults to every branch the backend reports
    #[arg(long)]
    branches: Vec<String>,

    /// Commits fetched per branch
    #[arg(long, default_value_t = 100)]
    depth: u32,

    /// Branches to show in detail mode
    #[arg(long)]
    expand: Vec<String>,

    /// Search filter over message, author and sha
    #[arg(long)]
    search: Option<String>,

    /// Viewport width the bounds are floored at
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Viewport height the bounds are floored at
    #[arg(long, default_value_t = 720.0)]
    height: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let client = ApiClient::new(&args.base_url);
    let trunk = client.default_branch(&args.repo).await?;

    let mut state = BranchViewState::new(&trunk);
    if args.branches.is_empty() {
        for branch in client.list_branches(&args.repo).await? {
            state.select_branch(&branch.name);
        }
    } else {
        for branch in &args.branches {
            state.select_branch(branch);
        }
    }
    for branch in &args.expand {
        state.toggle_branch_expanded(branch);
    }
    if let Some(search) = &args.search {
        state.set_search(search);
    }

    let data = client
        .commits_graph(&args.repo, &state.branch_rows(), args.depth)
        .await?;

    let tz_offset = *chrono::Local::now().offset();
    let config = state.to_config(tz_offset, LayoutMetrics::default());
    let layout = compute_graph_layout(&data, &config, (args.width, args.height));

    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}
