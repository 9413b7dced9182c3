// Keycloak MCP server - Library root for testing

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod mcp;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod tools;
