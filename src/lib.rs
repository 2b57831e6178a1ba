//! Database MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to inspect and query one SQL database (MySQL, PostgreSQL, SQLite,
//! SQL Server or ClickHouse) without dialect-specific knowledge.

pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::DbService;
