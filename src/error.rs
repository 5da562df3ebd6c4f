use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum DsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{} ({url}): {message}", .kind.friendly_message())]
    Navigation {
        kind: NavigationErrorKind,
        url: String,
        message: String,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rule store error: {0}")]
    Rules(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, DsxError>;

/// Classification of a failed page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationErrorKind {
    Dns,
    ConnectionRefused,
    ConnectionReset,
    ConnectionTimeout,
    Tls,
    Timeout,
    Other,
}

impl NavigationErrorKind {
    /// Classifies a raw browser error message (Chromium `net::ERR_*` codes, Playwright timeouts).
    pub fn classify(message: &str) -> Self {
        let upper = message.to_ascii_uppercase();
        if upper.contains("ERR_NAME_NOT_RESOLVED")
            || upper.contains("ERR_NAME_RESOLUTION_FAILED")
            || upper.contains("ENOTFOUND")
        {
            NavigationErrorKind::Dns
        } else if upper.contains("ERR_CONNECTION_REFUSED") || upper.contains("ECONNREFUSED") {
            NavigationErrorKind::ConnectionRefused
        } else if upper.contains("ERR_CONNECTION_RESET")
            || upper.contains("ERR_CONNECTION_CLOSED")
            || upper.contains("ECONNRESET")
        {
            NavigationErrorKind::ConnectionReset
        } else if upper.contains("ERR_CONNECTION_TIMED_OUT") || upper.contains("ETIMEDOUT") {
            NavigationErrorKind::ConnectionTimeout
        } else if upper.contains("ERR_CERT")
            || upper.contains("ERR_SSL")
            || upper.contains("CERTIFICATE")
        {
            NavigationErrorKind::Tls
        } else if upper.contains("TIMEOUT") || upper.contains("TIMED OUT") {
            NavigationErrorKind::Timeout
        } else {
            NavigationErrorKind::Other
        }
    }

    pub fn friendly_message(&self) -> &'static str {
        match self {
            NavigationErrorKind::Dns => "Could not resolve the site's domain name",
            NavigationErrorKind::ConnectionRefused => "The server refused the connection",
            NavigationErrorKind::ConnectionReset => "The connection was reset by the server",
            NavigationErrorKind::ConnectionTimeout => "Connecting to the server timed out",
            NavigationErrorKind::Tls => "The site's TLS/SSL certificate could not be verified",
            NavigationErrorKind::Timeout => "The page took too long to load",
            NavigationErrorKind::Other => "The page could not be loaded",
        }
    }
}

impl fmt::Display for NavigationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationErrorKind::Dns => "dns",
            NavigationErrorKind::ConnectionRefused => "connection-refused",
            NavigationErrorKind::ConnectionReset => "connection-reset",
            NavigationErrorKind::ConnectionTimeout => "connection-timeout",
            NavigationErrorKind::Tls => "tls",
            NavigationErrorKind::Timeout => "timeout",
            NavigationErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

impl DsxError {
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        DsxError::Navigation {
            kind: NavigationErrorKind::classify(&message),
            url: url.into(),
            message,
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        DsxError::Analysis(message.into())
    }

    /// Whether another navigation attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DsxError::Navigation { .. })
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            DsxError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            DsxError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify the URL includes a scheme (e.g., https://example.com).",
            ),
            DsxError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON inputs (mock captures, rule files); run with --verbose for details.",
            ),
            DsxError::Navigation { kind, url, message } => {
                let remediation = match kind {
                    NavigationErrorKind::Dns => "Check the domain spelling and your DNS/network connection.",
                    NavigationErrorKind::ConnectionRefused | NavigationErrorKind::ConnectionReset => {
                        "Verify the site is up and reachable from this machine (proxy/VPN/firewall)."
                    }
                    NavigationErrorKind::ConnectionTimeout | NavigationErrorKind::Timeout => {
                        "Retry with --slow or a larger --nav-timeout for slow-loading sites."
                    }
                    NavigationErrorKind::Tls => {
                        "The certificate is invalid or self-signed; check the https URL or try http."
                    }
                    NavigationErrorKind::Other => "Re-run with --verbose to see the browser error.",
                };
                ErrorPayload::with_detail(
                    ErrorCategory::Navigation,
                    format!("{} ({})", kind.friendly_message(), url),
                    message.clone(),
                    remediation,
                )
            }
            DsxError::Browser(msg) => {
                let lower = msg.to_ascii_lowercase();
                let remediation = if lower.contains("playwright npm package is missing") {
                    "Install Playwright (e.g., `npm install playwright` and `npx playwright install chromium`)."
                } else if lower.contains("chromium") || lower.contains("executable doesn't exist") {
                    "Run `npx playwright install chromium` to download the browser."
                } else if lower.contains("not found on path") || lower.contains("node command") {
                    "Install Node.js and ensure the node binary is on PATH."
                } else if lower.contains("timed out") {
                    "Increase --process-timeout or use --slow for heavy pages."
                } else {
                    "Re-run with --verbose; check the Node/Playwright installation."
                };
                ErrorPayload::new(ErrorCategory::Browser, msg.to_string(), remediation)
            }
            DsxError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                let remediation = if lower.contains("unknown analyzer") {
                    "Use analyzer names from `dsx extract --help` (e.g., colors,typography,buttons)."
                } else if lower.contains("viewport") {
                    "Use WIDTHxHEIGHT with positive numbers (e.g., --viewport 1440x900)."
                } else {
                    "Check flags/config file values; CLI flags override the config file."
                };
                ErrorPayload::new(ErrorCategory::Config, msg.to_string(), remediation)
            }
            DsxError::Rules(msg) => ErrorPayload::new(
                ErrorCategory::Rules,
                msg.to_string(),
                "Check the rule store directory; each file must hold a JSON/YAML list of rules.",
            ),
            DsxError::Analysis(msg) => ErrorPayload::new(
                ErrorCategory::Analysis,
                msg.to_string(),
                "Re-run with --verbose; file an issue with the URL if persistent.",
            ),
            DsxError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Navigation,
    Browser,
    Rules,
    Analysis,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            cause: None,
            remediation: Some(remediation.into()),
        }
    }

    pub fn with_detail(
        category: ErrorCategory,
        message: String,
        cause: String,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message,
            cause: Some(cause),
            remediation: Some(remediation.into()),
        }
    }
}
