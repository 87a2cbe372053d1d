use thiserror::Error;

/// Top-level error type for the `bunker-api` crate.
///
/// Covers every failure mode of the REST client and the notification feed.
/// `bunker-core` maps these into cache-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── REST API ────────────────────────────────────────────────────
    /// Non-2xx response from the inventory API.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed by the server.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// A notification frame that is not a valid change event.
    #[error("Malformed change event: {message}")]
    EventParse { message: String, payload: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status code, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
