//! Process exit codes, stable for scripts that wrap the CLI.

/// Success (standard convention)
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error (fallback for unknown errors)
pub const GENERAL_ERROR: i32 = 1;

/// CLI usage error (invalid arguments, missing flags)
pub const USAGE_ERROR: i32 = 2;

/// Configuration error (YAML parse failure, unknown profile, bad URL)
pub const CONFIG_ERROR: i32 = 3;

/// Connection error (gateway unreachable, timeout, unknown datasource, cancelled)
pub const CONNECTION_ERROR: i32 = 4;

/// Query error (gateway rejected the query, datasource error, invalid request)
pub const QUERY_ERROR: i32 = 5;

/// Permission error (gateway refused the credentials)
pub const PERMISSION_ERROR: i32 = 7;
