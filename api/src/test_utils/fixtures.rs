//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use std::sync::Arc;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore, ServerConfig};

use crate::adapters::dns::tls::crypto_provider;
use crate::app::BoardRegistry;
use crate::test_utils::{MockPanelClient, MockResolver, StaticBoard};
use crate::AppState;

/// Clash configuration with a nameserver policy covering `*.node.example.com`.
///
/// Proxies: two covered hosts, one uncovered host and one IP literal.
pub fn clash_config() -> String {
    r#"port: 7890
mode: rule
dns:
  enable: true
  nameserver:
    - 223.5.5.5
  nameserver-policy:
    "+.node.example.com": 223.5.5.5
    "geosite:cn": 119.29.29.29
proxies:
  - name: HK
    type: ss
    server: hk.node.example.com
    port: 443
  - name: JP
    type: ss
    server: jp.node.example.com
    port: 443
  - name: US
    type: trojan
    server: us.elsewhere.net
    port: 443
  - name: Direct IP
    type: ss
    server: 198.51.100.7
    port: 8388
rules:
  - MATCH,DIRECT
"#
    .to_string()
}

/// App state over the standard boards wired to the given mocks
pub fn test_state(panel: Arc<MockPanelClient>, resolver: Arc<MockResolver>) -> AppState {
    AppState {
        registry: Arc::new(BoardRegistry::standard(panel, resolver)),
    }
}

/// App state over the standard boards followed by a static board with id `static`
pub fn test_state_with_static(board: Arc<StaticBoard>) -> AppState {
    let registry = BoardRegistry::standard(
        Arc::new(MockPanelClient::new()),
        Arc::new(MockResolver::new()),
    )
    .with_board(board);

    AppState {
        registry: Arc::new(registry),
    }
}

// ============================================================================
// DNS-over-TLS
// ============================================================================

const TEST_CA_PEM: &[u8] = include_bytes!("certs/ca.pem");
const LEAF_CERT_PEM: &[u8] = include_bytes!("certs/leaf.pem");
const LEAF_KEY_PEM: &[u8] = include_bytes!("certs/leaf.key");

/// Certificate of the CA that signed the test nameserver's certificate
pub fn test_ca() -> CertificateDer<'static> {
    CertificateDer::from_pem_slice(TEST_CA_PEM).unwrap()
}

/// Server config for a nameserver valid for `localhost` and `127.0.0.1`
pub fn tls_server_config() -> Arc<ServerConfig> {
    let cert = CertificateDer::from_pem_slice(LEAF_CERT_PEM).unwrap();
    let key = PrivateKeyDer::from_pem_slice(LEAF_KEY_PEM).unwrap();

    let config = ServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert, test_ca()], key)
        .unwrap();
    Arc::new(config)
}

/// Client config trusting only `roots`
pub fn tls_client_config_trusting(roots: Vec<CertificateDer<'static>>) -> Arc<ClientConfig> {
    let mut store = RootCertStore::empty();
    for root in roots {
        store.add(root).unwrap();
    }

    let config = ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(store)
        .with_no_client_auth();
    Arc::new(config)
}

/// Client config trusting the test CA
pub fn tls_client_config() -> Arc<ClientConfig> {
    tls_client_config_trusting(vec![test_ca()])
}
