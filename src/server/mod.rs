pub mod gateway_api;
pub mod orchestrator_api;
pub mod streaming;

use axum::Router;
use std::error::Error;
use std::net::SocketAddr;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn };

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert_path: String,
    pub key_path: String,
}

pub struct Server {
    addr: String,
    tls: Option<TlsPaths>,
}

/// Resolves the TLS flags shared by both binaries. Enabling TLS without both
/// paths is a startup error.
pub fn tls_paths(
    enable_tls: bool,
    cert_path: &Option<String>,
    key_path: &Option<String>
) -> Result<Option<TlsPaths>, Box<dyn Error + Send + Sync>> {
    if !enable_tls {
        return Ok(None);
    }
    match (cert_path, key_path) {
        (Some(cert), Some(key)) =>
            Ok(Some(TlsPaths { cert_path: cert.clone(), key_path: key.clone() })),
        _ => Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS".into()),
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

impl Server {
    pub fn new(addr: String, tls: Option<TlsPaths>) -> Self {
        Self { addr, tls }
    }

    pub async fn run(&self, app: Router) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;

        match &self.tls {
            Some(tls) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    tls.cert_path,
                    tls.key_path
                );
                let config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    &tls.cert_path,
                    &tls.key_path
                ).await?;
                info!("HTTPS server listening on: https://{}", addr);
                axum_server::bind_rustls(addr, config).serve(app.into_make_service()).await?;
            }
            None => {
                warn!("TLS not enabled. Serving plain HTTP.");
                let listener = tokio::net::TcpListener::bind(addr).await?;
                info!("HTTP server listening on: http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }
}
