//! Turning retailer responses and failures into tool results.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    bolmcp_common::text::body_snippet,
    bolmcp_mcp::{EmbeddedResource, ToolsCallResult},
    bolmcp_retailer::{ApiResponse, Error},
    serde::de::DeserializeOwned,
    serde_json::Value,
    tracing::warn,
};

/// Returned for `204 No Content`.
pub const EMPTY_RESULT_TEXT: &str = "The request succeeded; the API returned no content.";

/// Render a successful response. `resource_uri` names binary payloads.
pub fn api_result(response: ApiResponse, resource_uri: &str) -> ToolsCallResult {
    match response {
        ApiResponse::Empty => ToolsCallResult::text(EMPTY_RESULT_TEXT),
        ApiResponse::Json(value) => json_result(&value),
        ApiResponse::Binary {
            content_type,
            bytes,
        } => ToolsCallResult::resource(EmbeddedResource {
            uri: resource_uri.to_string(),
            mime_type: content_type,
            blob: STANDARD.encode(&bytes),
        }),
        ApiResponse::Text { text, .. } => ToolsCallResult::text(text),
    }
}

pub fn json_result(value: &Value) -> ToolsCallResult {
    ToolsCallResult::text(
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    )
}

/// A failed call as the caller sees it: what was attempted plus the status
/// and body the API sent back.
pub fn api_error(operation: &str, err: &Error) -> ToolsCallResult {
    warn!(operation, error = %err, "tool call failed");
    let detail = match err {
        Error::Api { status, body } => format!("HTTP {status}: {}", body_snippet(body)),
        Error::Auth(auth) => match auth.status() {
            Some(status) => format!("authentication failed (HTTP {status}): {auth}"),
            None => format!("authentication failed: {auth}"),
        },
        Error::Network(_) if err.is_timeout() => "the request to bol.com timed out".to_string(),
        other => other.to_string(),
    };
    ToolsCallResult::error(format!("Error while {operation}: {detail}"))
}

/// Deserialize tool arguments, or explain what was wrong with them.
pub fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: Value,
) -> Result<T, ToolsCallResult> {
    // Some clients send `null` for tools without required arguments.
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolsCallResult::error(format!("Invalid arguments for {tool}: {e}")))
}

/// Reject page numbers below 1.
pub fn check_page(tool: &str, page: Option<u32>) -> Result<(), ToolsCallResult> {
    match page {
        Some(0) => Err(ToolsCallResult::error(format!(
            "Invalid arguments for {tool}: page must be 1 or greater"
        ))),
        _ => Ok(()),
    }
}
