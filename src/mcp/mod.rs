//! MCP server exposing the resource registry to agents.
//!
//! Four tools:
//! - `manage_resources`: add, remove, list, update, info, restore
//! - `search_resources`, `read_resource`, `resource_tree`: read-only content access
//!
//! Expected failures (unknown resource, not cloned, missing file) come back as
//! error-flagged text results, never as protocol errors.

pub mod render;
mod types;

use std::str::FromStr;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use thiserror::Error;

use crate::models::*;
use crate::registry::{RegistryError, ResourceRegistry, DEFAULT_TREE_DEPTH};

/// Failures of a tool call before or during the registry operation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown action '{0}'. Use one of: add, remove, list, update, info, restore")]
    UnknownAction(String),

    #[error("The '{argument}' argument is required for {action}")]
    MissingArgument {
        action: ResourceAction,
        argument: &'static str,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ToolError {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_internal())
    }
}

#[derive(Clone)]
pub struct McpServer {
    registry: ResourceRegistry,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            tool_router: Self::tool_router(),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    fn respond(result: Result<String, ToolError>) -> Result<CallToolResult, McpError> {
        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) if e.is_internal() => Err(McpError::internal_error(e.to_string(), None)),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    fn required(
        value: Option<String>,
        action: ResourceAction,
        argument: &'static str,
    ) -> Result<String, ToolError> {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or(ToolError::MissingArgument { action, argument })
    }

    // ============================================================
    // Tool logic, shared with the CLI and tests
    // ============================================================

    pub async fn manage(&self, req: ManageResourcesRequest) -> Result<String, ToolError> {
        let action = ResourceAction::from_str(&req.action)
            .map_err(|_| ToolError::UnknownAction(req.action.clone()))?;

        match action {
            ResourceAction::Add => {
                let name = Self::required(req.name, action, "name")?;
                let url = Self::required(req.url, action, "url")?;
                let scope = match req.scope.as_deref().filter(|s| !s.trim().is_empty()) {
                    Some(s) => Scope::from_str(s).map_err(ToolError::InvalidArgument)?,
                    None => Scope::Global,
                };

                let mut input = AddResourceInput::new(name, url).scope(scope);
                input.branch = req.branch;
                input.notes = req.notes;

                let resource = self.registry.add(input).await?;
                Ok(render::render_added(&resource))
            }
            ResourceAction::Remove => {
                let name = Self::required(req.name, action, "name")?;
                let resource = self.registry.remove(&name).await?;
                Ok(render::render_removed(&resource))
            }
            ResourceAction::List => Ok(render::render_list(&self.registry.list())),
            ResourceAction::Update => {
                let report = self.registry.update(Self::target(req.name)).await?;
                Ok(render::render_batch(&report))
            }
            ResourceAction::Restore => {
                let report = self.registry.restore(Self::target(req.name)).await?;
                Ok(render::render_batch(&report))
            }
            ResourceAction::Info => {
                let name = Self::required(req.name, action, "name")?;
                let info = self.registry.info(&name).await?;
                Ok(render::render_info(&info))
            }
        }
    }

    fn target(name: Option<String>) -> Target {
        Target::from_name(name.filter(|n| !n.trim().is_empty()))
    }

    pub async fn search(&self, req: SearchResourcesRequest) -> Result<String, ToolError> {
        if req.query.trim().is_empty() {
            return Err(ToolError::InvalidArgument(
                "The 'query' argument must not be empty".to_string(),
            ));
        }
        let name = req.name.filter(|n| !n.trim().is_empty());
        let report = self
            .registry
            .search(&req.query, name.as_deref(), req.include.as_deref())
            .await?;
        Ok(render::render_search(&report))
    }

    pub async fn read(&self, req: ReadResourceRequest) -> Result<String, ToolError> {
        Ok(self.registry.read(&req.name, &req.path).await?)
    }

    pub async fn tree(&self, req: ResourceTreeRequest) -> Result<String, ToolError> {
        let listing = self
            .registry
            .tree(
                &req.name,
                req.path.as_deref().unwrap_or(""),
                req.depth.unwrap_or(DEFAULT_TREE_DEPTH),
            )
            .await?;
        Ok(render::render_tree(&listing))
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "Manage cloned documentation repositories. Actions: 'list' shows every resource with its scope and whether it is cloned; 'info' shows details for one resource; 'add' clones a git repository (name + url, optional branch, notes, scope); 'remove' deletes a resource and its clone; 'update' pulls the latest changes (one resource, or all when name is omitted); 'restore' re-clones resources whose clone is missing (one, or all when name is omitted)."
    )]
    async fn manage_resources(
        &self,
        params: Parameters<ManageResourcesRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.manage(params.0).await)
    }

    #[tool(
        description = "Search cloned documentation for text (case-insensitive). Searches one resource when name is given, otherwise every cloned resource. Returns up to 50 matching lines per resource with paths relative to the resource root. Use read_resource to open a matching file."
    )]
    async fn search_resources(
        &self,
        params: Parameters<SearchResourcesRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.search(params.0).await)
    }

    #[tool(
        description = "Read a file from a cloned resource. The path is relative to the resource root. Returns the full file contents, so prefer search_resources or resource_tree to locate the right file first."
    )]
    async fn read_resource(
        &self,
        params: Parameters<ReadResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.read(params.0).await)
    }

    #[tool(
        description = "List files and directories inside a cloned resource, sorted, up to 'depth' levels (default 3) below 'path' (default: the root). Returns at most 100 entries; directories end with '/'."
    )]
    async fn resource_tree(
        &self,
        params: Parameters<ResourceTreeRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.tree(params.0).await)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "docshelf".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"docshelf keeps local clones of documentation repositories so you can read real docs instead of guessing.

SCOPES:
- global (default): shared by every project, stored under ~/.docshelf
- project: only visible in this project, stored under ./.docshelf
A project resource hides a global resource with the same name.

WORKFLOW:
1. manage_resources action=list to see what is available
2. search_resources to find relevant passages
3. resource_tree to browse structure, read_resource to open a file

MAINTENANCE:
- manage_resources action=add with name and url to clone new docs
- action=update pulls the latest changes; action=restore re-clones missing copies
- action=remove deletes the clone and forgets the resource"#;

/// Serve the registry over stdio until the client disconnects.
pub async fn run_stdio_server(registry: ResourceRegistry) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(registry);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
