use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following FLUXGATE-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Connection errors (resolution, transport, cancellation)
/// - **2000-2999**: Query errors (gateway rejections, invalid requests)
/// - **3000-3999**: Configuration errors
/// - **4000-4999**: Authentication/Authorization errors
/// - **5000-5999**: Internal errors (decoding, serialization, I/O)
///
/// Codes are stable across versions (semver contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Connection Errors (1000-1999) ===
    /// FLUXGATE-1001: Datasource uid does not resolve
    DatasourceNotFound = 1001,
    /// FLUXGATE-1002: Request to the gateway timed out
    ConnectionTimeout = 1002,
    /// FLUXGATE-1003: Network or TLS failure reaching the gateway
    ConnectionFailed = 1003,
    /// FLUXGATE-1004: Query cancelled by the caller
    QueryCancelled = 1004,

    // === Query Errors (2000-2999) ===
    /// FLUXGATE-2001: Gateway answered with a non-200 status
    GatewayRejected = 2001,
    /// FLUXGATE-2003: Request parameters failed validation
    InvalidRequest = 2003,

    // === Configuration Errors (3000-3999) ===
    /// FLUXGATE-3001: Invalid YAML syntax
    InvalidYaml = 3001,
    /// FLUXGATE-3002: Named profile does not exist
    ProfileNotFound = 3002,
    /// FLUXGATE-3003: Missing required field in config
    MissingRequiredField = 3003,
    /// FLUXGATE-3004: Gateway URL is not a valid absolute URL
    InvalidUrl = 3004,

    // === Auth Errors (4000-4999) ===
    /// FLUXGATE-4001: Gateway refused the supplied credentials
    AuthenticationFailed = 4001,

    // === Internal Errors (5000-5999) ===
    /// FLUXGATE-5001: Response payload could not be decoded
    DecodeFailed = 5001,
    /// FLUXGATE-5002: Frame data is neither an encoded string nor a value matrix
    UnknownPayloadFormat = 5002,
    /// FLUXGATE-5003: Serialization/deserialization failed
    SerializationFailed = 5003,
    /// FLUXGATE-5004: Local I/O failure
    Io = 5004,

    /// FLUXGATE-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "FLUXGATE-2001")
    pub fn as_str(&self) -> String {
        format!("FLUXGATE-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Connection,
            2000..=2999 => ErrorCategory::Query,
            3000..=3999 => ErrorCategory::Config,
            4000..=4999 => ErrorCategory::Auth,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("FLUXGATE-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::DatasourceNotFound),
            1002 => Ok(Self::ConnectionTimeout),
            1003 => Ok(Self::ConnectionFailed),
            1004 => Ok(Self::QueryCancelled),
            2001 => Ok(Self::GatewayRejected),
            2003 => Ok(Self::InvalidRequest),
            3001 => Ok(Self::InvalidYaml),
            3002 => Ok(Self::ProfileNotFound),
            3003 => Ok(Self::MissingRequiredField),
            3004 => Ok(Self::InvalidUrl),
            4001 => Ok(Self::AuthenticationFailed),
            5001 => Ok(Self::DecodeFailed),
            5002 => Ok(Self::UnknownPayloadFormat),
            5003 => Ok(Self::SerializationFailed),
            5004 => Ok(Self::Io),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category, used for exit code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Connection,
    Query,
    Config,
    Auth,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_formatting() {
        assert_eq!(ErrorCode::DatasourceNotFound.as_str(), "FLUXGATE-1001");
        assert_eq!(ErrorCode::GatewayRejected.as_str(), "FLUXGATE-2001");
        assert_eq!(ErrorCode::Unknown.as_str(), "FLUXGATE-9999");
    }

    #[test]
    fn test_error_code_parsing() {
        assert_eq!(
            ErrorCode::try_from("FLUXGATE-5002".to_string()).unwrap(),
            ErrorCode::UnknownPayloadFormat
        );
        assert_eq!(
            ErrorCode::try_from("FLUXGATE-9999".to_string()).unwrap(),
            ErrorCode::Unknown
        );
    }

    #[test]
    fn test_error_code_parsing_errors() {
        assert!(ErrorCode::try_from("INVALID".to_string()).is_err());
        assert!(ErrorCode::try_from("FLUXGATE-0000".to_string()).is_err());
        assert!(ErrorCode::try_from("FLUXGATE-ABC".to_string()).is_err());
        assert!(ErrorCode::try_from("ERR-1001".to_string()).is_err());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ErrorCode::DatasourceNotFound.category(),
            ErrorCategory::Connection
        );
        assert_eq!(ErrorCode::GatewayRejected.category(), ErrorCategory::Query);
        assert_eq!(ErrorCode::ProfileNotFound.category(), ErrorCategory::Config);
        assert_eq!(
            ErrorCode::AuthenticationFailed.category(),
            ErrorCategory::Auth
        );
        assert_eq!(ErrorCode::DecodeFailed.category(), ErrorCategory::Internal);
        assert_eq!(ErrorCode::Unknown.category(), ErrorCategory::Internal);
    }
}
