//! Metric name and label definitions.
//!
//! Every metric bol-mcp records is named here so the set of exported series
//! can be read in one place.

/// Token lifecycle metrics
pub mod oauth {
    /// Access tokens served from the credential store without a network call
    pub const TOKEN_CACHE_HITS_TOTAL: &str = "bolmcp_oauth_token_cache_hits_total";
    /// Token endpoint requests issued
    pub const TOKEN_REFRESH_TOTAL: &str = "bolmcp_oauth_token_refresh_total";
    /// Token endpoint requests that failed (status, network or parse)
    pub const TOKEN_REFRESH_FAILURES_TOTAL: &str = "bolmcp_oauth_token_refresh_failures_total";
    /// Token endpoint round trip in seconds
    pub const TOKEN_REFRESH_DURATION_SECONDS: &str =
        "bolmcp_oauth_token_refresh_duration_seconds";
}

/// Retailer API dispatcher metrics
pub mod retailer {
    /// Requests sent to the retailer API
    pub const REQUESTS_TOTAL: &str = "bolmcp_retailer_requests_total";
    /// Requests that ended in an auth, network or non-2xx failure
    pub const REQUEST_ERRORS_TOTAL: &str = "bolmcp_retailer_request_errors_total";
    /// Retailer API round trip in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "bolmcp_retailer_request_duration_seconds";
}

/// MCP hosting metrics
pub mod mcp {
    /// Tools handed to the router
    pub const TOOLS_REGISTERED_TOTAL: &str = "bolmcp_mcp_tools_registered_total";
    /// Descriptors skipped at registration (duplicate, rejected, host failure)
    pub const TOOLS_SKIPPED_TOTAL: &str = "bolmcp_mcp_tools_skipped_total";
    /// `tools/call` invocations
    pub const TOOL_CALLS_TOTAL: &str = "bolmcp_mcp_tool_calls_total";
    /// `tools/call` invocations that returned an error result
    pub const TOOL_CALL_ERRORS_TOTAL: &str = "bolmcp_mcp_tool_call_errors_total";
    /// `tools/call` duration in seconds
    pub const TOOL_CALL_DURATION_SECONDS: &str = "bolmcp_mcp_tool_call_duration_seconds";
    /// JSON-RPC messages received on any transport
    pub const RPC_MESSAGES_TOTAL: &str = "bolmcp_mcp_rpc_messages_total";
}

/// Common label keys
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD: &str = "method";
    pub const STATUS: &str = "status";
    pub const TOOL: &str = "tool";
    pub const REASON: &str = "reason";
    pub const TRANSPORT: &str = "transport";
    pub const ERROR_TYPE: &str = "error_type";
}

/// Histogram buckets
pub mod buckets {
    /// Outbound HTTP round trips, 5ms to 60s
    pub const HTTP_DURATION: [f64; 12] = [
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 30.0, 60.0,
    ];

    /// Tool execution, 1ms to 2 minutes
    pub const TOOL_DURATION: [f64; 11] = [
        0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0,
    ];
}
