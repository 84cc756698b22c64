//! Listener setup for plain HTTP and HTTPS

use crate::config::{ListenConfig, TlsFiles};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Grace period for in-flight requests once a shutdown signal arrives
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Bind the configured address and serve until a shutdown signal
pub async fn serve(app: Router, listen: &ListenConfig) -> io::Result<()> {
    let addr = resolve_addr(listen).await?;
    match &listen.tls {
        Some(tls) => serve_https(app, addr, tls).await,
        None => serve_http(app, addr).await,
    }
}

async fn resolve_addr(listen: &ListenConfig) -> io::Result<SocketAddr> {
    tokio::net::lookup_host((listen.hostname.as_str(), listen.port))
        .await?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("Could not resolve listen address {}", listen.hostname),
            )
        })
}

async fn serve_http(app: Router, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}, press Ctrl+C to stop", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn serve_https(app: Router, addr: SocketAddr, tls: &TlsFiles) -> io::Result<()> {
    let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

    let handle = axum_server::Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    info!("Listening on https://{}, press Ctrl+C to stop", addr);
    axum_server::bind_rustls(addr, rustls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install is logged
/// and never fires, so the listener keeps serving.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
