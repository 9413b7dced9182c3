// Tool arguments and result mapping
// Keycloak failures become `isError` tool results rather than protocol errors

use rmcp::model::{CallToolResult, Content, ErrorData};
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::DEFAULT_MAX_USERS;
use crate::error::KeycloakError;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUsersArgs {
    #[schemars(description = "The name of the realm to get users from (e.g. \"master\")")]
    pub realm: String,

    #[schemars(description = "Maximum number of users to return")]
    #[serde(default = "default_max_users")]
    pub max_users: u32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUserInfoArgs {
    #[schemars(description = "The realm the user belongs to")]
    pub realm: String,

    #[schemars(description = "The unique ID of the user (not the username)")]
    pub user_id: String,
}

fn default_max_users() -> u32 {
    DEFAULT_MAX_USERS
}

/// Convert the outcome of a Keycloak operation into a tool result.
///
/// Success carries the pretty-printed JSON as text plus the same value as
/// structured content (lists wrapped as `{"result": [...]}`). Keycloak errors
/// are logged and reported with `isError: true`; only an output that cannot
/// be serialized is a protocol error.
pub fn tool_result<T: Serialize>(
    tool: &str,
    outcome: crate::error::Result<T>,
) -> Result<CallToolResult, ErrorData> {
    match outcome {
        Ok(output) => success(&output),
        Err(e) => {
            tracing::error!(tool, kind = e.kind(), "Tool call failed: {}", e);
            Ok(failure(&e))
        }
    }
}

fn success<T: Serialize>(output: &T) -> Result<CallToolResult, ErrorData> {
    let value = serde_json::to_value(output).map_err(serialize_error)?;
    let text = serde_json::to_string_pretty(&value).map_err(serialize_error)?;

    let structured = if value.is_object() {
        value
    } else {
        json!({ "result": value })
    };

    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(structured);
    Ok(result)
}

fn failure(e: &KeycloakError) -> CallToolResult {
    let mut result = CallToolResult::error(vec![Content::text(e.to_string())]);
    result.structured_content = Some(json!({
        "error": {
            "kind": e.kind(),
            "status": e.status_code(),
            "message": e.to_string(),
        }
    }));
    result
}

fn serialize_error(e: serde_json::Error) -> ErrorData {
    ErrorData::internal_error(format!("Failed to serialize tool output: {}", e), None)
}
