//! MCP service implementation using rmcp.
//!
//! `DbService` lists the database tools and forwards every `tools/call` to the
//! `ToolAdapter`. Tool failures are reported in-band (`isError: true`) so the
//! caller sees the engine's message; only an unknown tool name is a protocol
//! error.

use crate::error::DbError;
use crate::tools::adapter::{
    EXECUTE_SQL, EXECUTE_SQL_DESCRIPTION, GET_TABLE_DETAIL, GET_TABLE_DETAIL_DESCRIPTION,
    GET_TABLES, GET_TABLES_DESCRIPTION,
};
use crate::tools::{ExecuteSqlInput, GetTableDetailInput, GetTablesInput, ToolAdapter};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool,
    },
    service::RequestContext,
};
use schemars::JsonSchema;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct DbService {
    /// Shared adapter; one per process, cloned into every MCP session
    adapter: Arc<ToolAdapter>,
}

impl DbService {
    pub fn new(adapter: Arc<ToolAdapter>) -> Self {
        Self { adapter }
    }

    /// Tools currently offered, in listing order.
    pub fn tools(&self) -> Vec<Tool> {
        self.adapter
            .tool_names()
            .into_iter()
            .filter_map(|name| match name {
                GET_TABLES => Some(Tool::new(
                    GET_TABLES,
                    GET_TABLES_DESCRIPTION,
                    input_schema::<GetTablesInput>(),
                )),
                GET_TABLE_DETAIL => Some(Tool::new(
                    GET_TABLE_DETAIL,
                    GET_TABLE_DETAIL_DESCRIPTION,
                    input_schema::<GetTableDetailInput>(),
                )),
                EXECUTE_SQL => Some(Tool::new(
                    EXECUTE_SQL,
                    EXECUTE_SQL_DESCRIPTION,
                    input_schema::<ExecuteSqlInput>(),
                )),
                _ => None,
            })
            .collect()
    }

    /// Close the database session; called once on shutdown.
    pub async fn close(&self) {
        self.adapter.connection().close().await;
    }

    /// Run a tool and shape the outcome as an MCP result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        match self.adapter.invoke(name, arguments).await {
            Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
            Err(DbError::UnknownTool { name }) => Err(McpError::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            )),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                Ok(CallToolResult::error(vec![Content::text(failure_text(&e))]))
            }
        }
    }
}

fn failure_text(err: &DbError) -> String {
    match err.suggestion() {
        Some(hint) => format!("{}\nHint: {}", err, hint),
        None => err.to_string(),
    }
}

/// JSON schema of a tool input as the object map MCP expects.
fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    match schema {
        JsonValue::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

impl ServerHandler for DbService {
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call(&request.name, request.arguments).await
    }

    fn get_info(&self) -> ServerInfo {
        let mut instructions = String::from(
            "Database tools for inspecting and querying one configured database.\n\
            \n\
            ## Workflow\n\
            1. Call `get_tables` to see which tables exist\n\
            2. Call `get_table_detail` with a `table_name` to see its columns\n",
        );
        if self.adapter.raw_sql().is_enabled() {
            instructions.push_str(
                "3. Call `execute_sql` with a `query` to run SQL in the database's own dialect\n",
            );
        }

        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "database-mcp".to_owned(),
                title: Some("Database MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(instructions),
        }
    }
}
