// ── Core error types ──
//
// Cache-facing errors from bunker-core. Consumers never see raw reqwest
// or serde failures; the `From<bunker_api::Error>` impl translates
// transport-layer errors into these variants.
//
// `CoreError` is `Clone` because one load result is shared between every
// caller that joined it and is also published through `CacheState`.

use bunker_api::ResourceKind;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach inventory server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to inventory server timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Request rejected by server (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` when the server reported the record as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn not_found(kind: ResourceKind, id: bunker_api::RecordId) -> Self {
        Self::NotFound {
            message: format!("{kind} #{id}"),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bunker_api::Error> for CoreError {
    fn from(err: bunker_api::Error) -> Self {
        match err {
            bunker_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        message: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            bunker_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            bunker_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            bunker_api::Error::Api { status: 404, message } => CoreError::NotFound { message },
            bunker_api::Error::Api { status, message } if (400..500).contains(&status) => {
                CoreError::Rejected { status, message }
            }
            bunker_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            bunker_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            bunker_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            bunker_api::Error::EventParse { message, .. } => {
                CoreError::Internal(format!("Malformed change event: {message}"))
            }
            bunker_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<bunker_api::UnknownKind> for CoreError {
    fn from(err: bunker_api::UnknownKind) -> Self {
        CoreError::UnknownKind(err.0)
    }
}
