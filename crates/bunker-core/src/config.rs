// ── Runtime connection configuration ──
//
// These types describe *how* to reach an inventory server. They never
// touch disk: the CLI resolves a profile into an `InventoryConfig` and
// hands it in.

use std::time::Duration;

use bunker_api::transport::{TlsMode, TransportConfig};
use bunker_api::websocket::{DEFAULT_RECONNECT_DELAY, ReconnectConfig};
use url::Url;

use crate::error::CoreError;

/// Path of the backend's change-notification endpoint.
pub const WS_UPDATES_PATH: &str = "/ws/updates";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one inventory server.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// REST base URL (e.g., `http://localhost:8080/api`).
    pub api_url: Url,
    /// Change-notification WebSocket URL.
    pub ws_url: Url,
    pub tls: TlsVerification,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Fixed delay between a dropped notification connection and the redial.
    pub reconnect_delay: Duration,
}

impl InventoryConfig {
    /// Defaults for everything but the API URL; the WebSocket URL is derived.
    pub fn new(api_url: Url) -> Result<Self, CoreError> {
        let ws_url = derive_ws_url(&api_url)?;
        Ok(Self {
            api_url,
            ws_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        })
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        }
    }

    pub(crate) fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            delay: self.reconnect_delay,
        }
    }
}

/// `http://host:8080/api` becomes `ws://host:8080/ws/updates`; `https` maps to `wss`.
pub fn derive_ws_url(api_url: &Url) -> Result<Url, CoreError> {
    let scheme = match api_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(CoreError::Config {
                message: format!("unsupported URL scheme '{other}' in {api_url}"),
            });
        }
    };

    let mut ws_url = api_url.clone();
    ws_url.set_path(WS_UPDATES_PATH);
    ws_url.set_query(None);
    ws_url.set_fragment(None);
    ws_url.set_scheme(scheme).map_err(|()| CoreError::Config {
        message: format!("cannot derive WebSocket URL from {api_url}"),
    })?;
    Ok(ws_url)
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
