//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use bunker_config::ConfigError;
use bunker_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to inventory server at {url}")]
    #[diagnostic(
        code(bunker::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(bunker::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(
        code(bunker::not_found),
        help("Run: bunker list {list_kind} to see what exists")
    )]
    NotFound { message: String, list_kind: String },

    #[error("Server rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(bunker::rejected))]
    Rejected { status: u16, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(bunker::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bunker::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bunker::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bunker config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No inventory server configured")]
    #[diagnostic(
        code(bunker::no_config),
        help(
            "Create a profile with: bunker config init\n\
             Or pass --api-url / set BUNKER_API_URL.\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(bunker::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bunker::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(bunker::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(bunker::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(bunker::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { status: 409, .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoConfig { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound { message } => {
                // "food #3" -> list hint "food"
                let list_kind = message
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_owned();
                CliError::NotFound { message, list_kind }
            }

            CoreError::UnknownKind(kind) => CliError::Validation {
                field: "kind".into(),
                reason: format!("unknown resource kind '{kind}'"),
            },

            CoreError::Rejected { status, message } => CliError::Rejected { status, message },

            CoreError::Api { message, status } => CliError::ApiError {
                message: match status {
                    Some(code) => format!("{message} (HTTP {code})"),
                    None => message,
                },
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_kind_hint() {
        let err = CliError::from(CoreError::NotFound {
            message: "food #3".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(err, CliError::NotFound { ref list_kind, .. } if list_kind == "food"));
    }

    #[test]
    fn conflicts_get_their_own_exit_code() {
        let conflict = CliError::from(CoreError::Rejected {
            status: 409,
            message: "duplicate".into(),
        });
        assert_eq!(conflict.exit_code(), exit_code::CONFLICT);

        let bad_request = CliError::from(CoreError::Rejected {
            status: 400,
            message: "bad".into(),
        });
        assert_eq!(bad_request.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn connection_and_timeout_codes() {
        let err = CliError::from(CoreError::ConnectionFailed {
            url: "http://localhost:8080/api".into(),
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
    }
}
