//! MCP protocol integration tests.
//!
//! These tests spawn the actual `docshelf mcp` process and communicate via
//! JSON-RPC over stdio, testing the complete MCP protocol flow.
//!
//! The rmcp library uses line-delimited JSON (each message is one line):
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// MCP test client that spawns and communicates with the server
struct McpTestClient {
    child: Child,
    request_id: u64,
    reader: BufReader<std::process::ChildStdout>,
    _root: tempfile::TempDir,
}

impl McpTestClient {
    /// Spawn a server with empty, isolated global and project roots
    fn spawn() -> Self {
        Self::spawn_with(|_| {})
    }

    /// Spawn a server after letting `prepare` write into the global root
    fn spawn_with(prepare: impl FnOnce(&std::path::Path)) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let home = root.path().join("home");
        let project = root.path().join("project");
        std::fs::create_dir_all(&home).expect("Failed to create home");
        std::fs::create_dir_all(&project).expect("Failed to create project");
        prepare(&home);

        let mut child = Command::new(env!("CARGO_BIN_EXE_docshelf"))
            .arg("mcp")
            .env("DOCSHELF_HOME", &home)
            .env("DOCSHELF_PROJECT_DIR", &project)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn docshelf mcp");

        let stdout = child.stdout.take().expect("Failed to get stdout");

        Self {
            child,
            request_id: 0,
            reader: BufReader::new(stdout),
            _root: root,
        }
    }

    /// Send a message as line-delimited JSON
    fn send_message(&mut self, content: &str) {
        let stdin = self.child.stdin.as_mut().expect("Failed to get stdin");
        writeln!(stdin, "{}", content).expect("Failed to write message");
        stdin.flush().expect("Failed to flush stdin");
    }

    /// Read a message as line-delimited JSON
    fn read_message(&mut self) -> String {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .expect("Failed to read line");
        line.trim().to_string()
    }

    /// Send a JSON-RPC request and get the response
    fn request(&mut self, method: &str, params: Option<Value>) -> JsonRpcResponse {
        self.request_id += 1;
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id,
            method: method.to_string(),
            params,
        };

        let request_json = serde_json::to_string(&request).expect("Failed to serialize request");
        self.send_message(&request_json);

        let response_json = self.read_message();
        serde_json::from_str(&response_json).expect("Failed to parse response")
    }

    /// Send initialize request and initialized notification (required first messages)
    fn initialize(&mut self) -> JsonRpcResponse {
        let response = self.request(
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "test-client",
                    "version": "1.0.0"
                }
            })),
        );

        let notification = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });
        self.send_message(&notification.to_string());

        response
    }

    fn list_tools(&mut self) -> JsonRpcResponse {
        self.request("tools/list", None)
    }

    fn call_tool(&mut self, name: &str, arguments: Value) -> JsonRpcResponse {
        self.request(
            "tools/call",
            Some(json!({
                "name": name,
                "arguments": arguments
            })),
        )
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Pull the first text block and the error flag out of a tool result.
fn tool_text(response: JsonRpcResponse) -> (String, bool) {
    assert!(response.error.is_none(), "Expected tool result, got {:?}", response.error);
    let result = response.result.expect("Expected result");
    let text = result
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .expect("Expected text content")
        .to_string();
    let is_error = result
        .get("isError")
        .and_then(|e| e.as_bool())
        .unwrap_or(false);
    (text, is_error)
}

// ============================================================
// Protocol Tests
// ============================================================

mod protocol {
    use super::*;

    #[test]
    fn initialize_returns_server_info() {
        let mut client = McpTestClient::spawn();
        let response = client.initialize();

        assert!(response.error.is_none(), "Expected success, got error");
        let result = response.result.expect("Expected result");

        let server_info = result.get("serverInfo").expect("Expected serverInfo");
        assert_eq!(
            server_info.get("name").and_then(|n| n.as_str()),
            Some("docshelf")
        );
        assert!(result.get("capabilities").is_some());
        assert!(result.get("instructions").is_some());
    }

    #[test]
    fn tools_list_returns_all_tools() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        assert!(response.error.is_none(), "Expected success, got error");

        let result = response.result.expect("Expected result");
        let tools = result
            .get("tools")
            .and_then(|t| t.as_array())
            .expect("Tools should be array");

        let mut tool_names: Vec<&str> = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();
        tool_names.sort();

        assert_eq!(
            tool_names,
            vec![
                "manage_resources",
                "read_resource",
                "resource_tree",
                "search_resources"
            ]
        );
    }

    #[test]
    fn tools_have_descriptions_and_schemas() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        let result = response.result.expect("Expected result");
        let tools = result
            .get("tools")
            .and_then(|t| t.as_array())
            .expect("Tools should be array");

        for tool in tools {
            let name = tool.get("name").and_then(|n| n.as_str()).unwrap_or("?");
            assert!(
                tool.get("description").is_some(),
                "Tool {} missing description",
                name
            );
            assert!(
                tool.get("inputSchema").is_some(),
                "Tool {} missing inputSchema",
                name
            );
        }
    }
}

// ============================================================
// Tool Call Tests
// ============================================================

mod tool_calls {
    use super::*;

    #[test]
    fn list_on_empty_registry() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let (text, is_error) =
            tool_text(client.call_tool("manage_resources", json!({ "action": "list" })));

        assert_eq!(text, "No resources found.");
        assert!(!is_error);
    }

    #[test]
    fn unknown_action_is_an_error_result_not_a_protocol_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let (text, is_error) =
            tool_text(client.call_tool("manage_resources", json!({ "action": "explode" })));

        assert!(text.starts_with("Unknown action 'explode'"));
        assert!(is_error);
    }

    #[test]
    fn read_of_unknown_resource() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let (text, is_error) = tool_text(client.call_tool(
            "read_resource",
            json!({ "name": "ghost", "path": "README.md" }),
        ));

        assert_eq!(text, "Resource 'ghost' not found");
        assert!(is_error);
    }

    #[test]
    fn registered_but_uncloned_resources() {
        let mut client = McpTestClient::spawn_with(|home| {
            std::fs::write(
                home.join("resources.json"),
                r#"{"version":1,"resources":[{"name":"svelte","url":"https://example/svelte","branch":"main","notes":"","clonedAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}]}"#,
            )
            .expect("Failed to seed registry");
        });
        client.initialize();

        let (listed, _) =
            tool_text(client.call_tool("manage_resources", json!({ "action": "list" })));
        assert!(listed.starts_with("svelte [global, not cloned]"));

        let (searched, is_error) = tool_text(client.call_tool(
            "search_resources",
            json!({ "query": "reactive", "name": "svelte" }),
        ));
        assert_eq!(searched, "No matches found for 'reactive'.");
        assert!(!is_error);

        let (tree, is_error) =
            tool_text(client.call_tool("resource_tree", json!({ "name": "svelte" })));
        assert!(tree.contains("is not cloned"));
        assert!(is_error);
    }
}
