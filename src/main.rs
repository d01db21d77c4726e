use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docshelf::config::{Layout, HOME_ENV, PROJECT_DIR_ENV};
use docshelf::mcp::{self, McpServer, ToolError};
use docshelf::providers::Providers;
use docshelf::registry::{ResourceRegistry, DEFAULT_TREE_DEPTH};

#[derive(Parser)]
#[command(name = "docshelf")]
#[command(about = "Local registry of cloned documentation repositories")]
struct Cli {
    /// Global data directory
    #[arg(long, global = true, env = HOME_ENV)]
    home: Option<PathBuf>,

    /// Project directory (project data lives in <dir>/.docshelf)
    #[arg(long, global = true, env = PROJECT_DIR_ENV)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server via stdio (for agent integration)
    Mcp,
    /// Clone a documentation repository and register it
    Add {
        name: String,
        url: String,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// global or project
        #[arg(short, long, default_value = "global")]
        scope: String,
    },
    /// Delete a resource and its clone
    Remove { name: String },
    /// List all resources
    List,
    /// Pull the latest changes (all resources when no name is given)
    Update { name: Option<String> },
    /// Show details for a resource
    Info { name: String },
    /// Re-clone missing working copies (all resources when no name is given)
    Restore { name: Option<String> },
    /// Search cloned documentation
    Search {
        query: String,
        #[arg(short, long)]
        name: Option<String>,
        /// Only search files matching this glob
        #[arg(short, long)]
        include: Option<String>,
    },
    /// Print a file from a resource
    Read { name: String, path: String },
    /// List files in a resource
    Tree {
        name: String,
        path: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_TREE_DEPTH)]
        depth: usize,
    },
}

/// Initialize tracing with output to stderr, keeping stdout for results and the MCP protocol
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docshelf={}", default_level)),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // One-shot commands print their own results, so keep the log quiet.
    let serving = matches!(cli.command, Commands::Mcp);
    init_tracing(if serving { "info" } else { "warn" });

    let layout = Layout::resolve(cli.home, cli.project_dir)?;
    let registry = ResourceRegistry::new(layout, Providers::system());

    let server = McpServer::new(registry.clone());
    let result = match cli.command {
        Commands::Mcp => return mcp::run_stdio_server(registry).await,
        Commands::Add {
            name,
            url,
            branch,
            notes,
            scope,
        } => {
            server
                .manage(mcp::ManageResourcesRequest {
                    action: "add".into(),
                    name: Some(name),
                    url: Some(url),
                    branch,
                    notes,
                    scope: Some(scope),
                })
                .await
        }
        Commands::Remove { name } => server.manage(action("remove", Some(name))).await,
        Commands::List => server.manage(action("list", None)).await,
        Commands::Update { name } => server.manage(action("update", name)).await,
        Commands::Info { name } => server.manage(action("info", Some(name))).await,
        Commands::Restore { name } => server.manage(action("restore", name)).await,
        Commands::Search {
            query,
            name,
            include,
        } => {
            server
                .search(mcp::SearchResourcesRequest {
                    query,
                    name,
                    include,
                })
                .await
        }
        Commands::Read { name, path } => {
            server.read(mcp::ReadResourceRequest { name, path }).await
        }
        Commands::Tree { name, path, depth } => {
            server
                .tree(mcp::ResourceTreeRequest {
                    name,
                    path,
                    depth: Some(depth),
                })
                .await
        }
    };

    report(result)
}

fn action(action: &str, name: Option<String>) -> mcp::ManageResourcesRequest {
    mcp::ManageResourcesRequest {
        action: action.to_string(),
        name,
        ..Default::default()
    }
}

fn report(result: Result<String, ToolError>) -> anyhow::Result<()> {
    match result {
        Ok(text) => {
            println!("{}", text.trim_end());
            Ok(())
        }
        Err(e) if e.is_internal() => Err(e.into()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
