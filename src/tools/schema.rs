//! Tool inputs.
//!
//! Each tool decodes its arguments into one of these structs. The `///` docs
//! double as the parameter descriptions published in `tools/list`.

use schemars::JsonSchema;
use serde::Deserialize;

/// Input for the get_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetTablesInput {}

/// Input for the get_table_detail tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableDetailInput {
    /// Name of the table to describe, exactly as returned by get_tables
    pub table_name: String,
}

/// Input for the execute_sql tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteSqlInput {
    /// SQL text to run verbatim against the connected database
    pub query: String,
}
