use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ServerHandler,
};
use std::sync::Arc;

use crate::client::KeycloakClient;
use crate::tools::{self, GetUserInfoArgs, GetUsersArgs};

/// Name the server reports in `initialize`
pub const SERVER_NAME: &str = "keycloak-werki";

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Read-only access to a Keycloak server: list realms, list the users \
    of a realm, and fetch a single user's details by id.";

/// Tool server exposing the read-only Keycloak operations
#[derive(Clone)]
pub struct McpServer {
    client: Arc<KeycloakClient>,
    tool_router: ToolRouter<McpServer>,
}

#[tool_router]
impl McpServer {
    pub fn new(client: Arc<KeycloakClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get a list of all realms from the Keycloak server. A realm is an \
        isolated space where users, credentials, roles and groups are managed.")]
    async fn get_realms(&self) -> Result<CallToolResult, ErrorData> {
        let outcome = self.client.list_realms().await;
        if let Ok(ref realms) = outcome {
            tracing::info!("Retrieved {} realms", realms.len());
        }
        tools::tool_result("get_realms", outcome)
    }

    #[tool(description = "Get a list of users from a specific realm (id, username, email, \
        firstName, lastName, enabled).")]
    async fn get_users(
        &self,
        Parameters(args): Parameters<GetUsersArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        let outcome = self.client.list_users(&args.realm, args.max_users).await;
        if let Ok(ref users) = outcome {
            tracing::info!("Retrieved {} users from realm '{}'", users.len(), args.realm);
        }
        tools::tool_result("get_users", outcome)
    }

    #[tool(description = "Get detailed information about a specific user. Takes the user's \
        unique ID (UUID, not the username) as returned by get_users.")]
    async fn get_user_info(
        &self,
        Parameters(args): Parameters<GetUserInfoArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        let outcome = self.client.get_user(&args.realm, &args.user_id).await;
        if outcome.is_ok() {
            tracing::info!(
                "Retrieved info for user '{}' in realm '{}'",
                args.user_id,
                args.realm
            );
        }
        tools::tool_result("get_user_info", outcome)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: VERSION.into(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use serde_json::{json, Value};
    use std::time::Duration;

    const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";

    fn server_for(base_url: &str) -> McpServer {
        let creds = Credentials::new(base_url, "test-client", "test-secret", "master").unwrap();
        let client = KeycloakClient::new(creds, Duration::from_secs(10)).unwrap();
        McpServer::new(Arc::new(client))
    }

    fn offline_server() -> McpServer {
        server_for("http://127.0.0.1:1")
    }

    fn as_json(result: &CallToolResult) -> Value {
        serde_json::to_value(result).unwrap()
    }

    #[test]
    fn test_server_info() {
        let info = offline_server().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.server_info.version, VERSION);
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_tools_are_registered_with_schemas() {
        let server = offline_server();
        let mut tools = server.tool_router.list_all();
        tools.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, vec!["get_realms", "get_user_info", "get_users"]);

        let get_users = Value::Object((*tools[2].input_schema).clone());
        assert!(get_users["properties"]["max_users"].is_object());
        assert_eq!(get_users["required"], json!(["realm"]));
    }

    #[tokio::test]
    async fn test_config_error_is_surfaced_as_tool_error() {
        let result = offline_server()
            .get_user_info(Parameters(GetUserInfoArgs {
                realm: "master".to_string(),
                user_id: String::new(),
            }))
            .await
            .unwrap();

        let body = as_json(&result);
        assert_eq!(body["isError"], true);
        assert_eq!(
            body["content"][0]["text"],
            "Configuration error: user_id parameter cannot be empty"
        );
        assert_eq!(body["structuredContent"]["error"]["kind"], "config");
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":300}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/admin/realms/missing/users/nobody")
            .with_status(404)
            .with_body(r#"{"error":"User not found"}"#)
            .create_async()
            .await;

        let result = server_for(&server.url())
            .get_user_info(Parameters(GetUserInfoArgs {
                realm: "missing".to_string(),
                user_id: "nobody".to_string(),
            }))
            .await
            .unwrap();

        let body = as_json(&result);
        assert_eq!(body["isError"], true);
        assert_eq!(body["structuredContent"]["error"]["status"], 404);
        assert_eq!(body["structuredContent"]["error"]["kind"], "api");
    }

    #[tokio::test]
    async fn test_realms_are_wrapped_for_structured_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":300}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/admin/realms")
            .with_status(200)
            .with_body(r#"[{"id":"master","realm":"master","displayName":null}]"#)
            .create_async()
            .await;

        let result = server_for(&server.url()).get_realms().await.unwrap();

        let body = as_json(&result);
        assert_ne!(body["isError"], true);
        assert_eq!(
            body["structuredContent"],
            json!({"result": [{"id": "master", "realm": "master"}]})
        );
        let text = body["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed[0]["id"], "master");
    }

    #[tokio::test]
    async fn test_get_users_sends_max() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":300}"#)
            .create_async()
            .await;
        let users = server
            .mock("GET", "/admin/realms/master/users")
            .match_query(mockito::Matcher::UrlEncoded("max".into(), "100".into()))
            .with_status(200)
            .with_body(r#"[]"#)
            .expect(1)
            .create_async()
            .await;

        let args: GetUsersArgs = serde_json::from_value(json!({"realm": "master"})).unwrap();
        let result = server_for(&server.url())
            .get_users(Parameters(args))
            .await
            .unwrap();

        assert_eq!(as_json(&result)["structuredContent"], json!({"result": []}));
        users.assert_async().await;
    }
}
