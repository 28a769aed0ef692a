use std::path::PathBuf;

/// Inbound TLS material (spec §6 Configuration/TLS). Absent entirely means
/// the peer server listens in plaintext.
#[derive(Debug, Clone, Default)]
pub struct ServerTlsConfig {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

impl ServerTlsConfig {
    pub fn is_configured(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }
}

/// Outbound TLS material for dialing peers. `ca_path` alone yields
/// edge-terminated TLS (we verify the peer, we present nothing); adding
/// `client_cert`/`client_key` yields mutual TLS.
#[derive(Debug, Clone, Default)]
pub struct ClientTlsConfig {
    pub ca_path: Option<PathBuf>,
    pub client_cert_path: Option<PathBuf>,
    pub client_key_path: Option<PathBuf>,
}

impl ClientTlsConfig {
    pub fn is_configured(&self) -> bool {
        self.ca_path.is_some()
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_configured() {
            "https"
        } else {
            "http"
        }
    }
}
