//! Binding and serving the ingestion endpoint.

use std::future::Future;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;
use worker::JobSender;

use crate::ingest::router;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Binds the listening socket.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })
}

/// Serves run task deliveries on `listener` until `shutdown` resolves.
///
/// The router owns `queue`, so once this returns no sender is left on the
/// ingestion side and the worker's receiver sees the queue close after the
/// remaining jobs.
pub async fn serve<F>(listener: TcpListener, queue: JobSender, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, capacity = queue.capacity(), "Listening for run task deliveries");

    axum::serve(listener, router(queue))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Ingestion endpoint stopped");
    Ok(())
}
