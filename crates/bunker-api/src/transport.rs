// Shared transport configuration for building reqwest::Client instances.
//
// The REST client and anything else that speaks HTTP to the inventory
// backend share TLS and timeout settings through this module.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("bunker/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed backends on a LAN).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_system_roots() {
        let config = TransportConfig::default();
        assert!(matches!(config.tls, TlsMode::System));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn missing_ca_file_is_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/ca.pem")),
            ..TransportConfig::default()
        };
        assert!(matches!(config.build_client(), Err(Error::Tls(_))));
    }
}
