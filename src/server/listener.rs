//! TCP accept loop and per-connection HTTP/1 serving

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::store::RecordStore;
use crate::Result;

use super::limiter::ConnectionLimiter;
use super::{router, AppState, SHUTDOWN_TIMEOUT_MS};

/// HTTP server owning the listener and the shared application state
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    limiter: ConnectionLimiter,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind the configured address
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound
    pub async fn bind(config: &Config, store: Arc<RecordStore>) -> Result<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr).await?;

        Ok(Self::from_listener(listener, config, store))
    }

    /// Serve on an already bound listener
    ///
    /// # Panics
    ///
    /// Panics if `limits.max_connections` is 0
    #[must_use]
    pub fn from_listener(listener: TcpListener, config: &Config, store: Arc<RecordStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            listener,
            state: Arc::new(AppState::new(store, config.ui_dir.clone())),
            limiter: ConnectionLimiter::new(config.limits.max_connections),
            shutdown_tx,
        }
    }

    /// Address the listener is bound to
    ///
    /// # Errors
    ///
    /// Returns error if the socket address cannot be read
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` completes, then drain
    ///
    /// Open connections finish their in-flight request before closing;
    /// anything still running after the shutdown timeout is aborted.
    ///
    /// # Errors
    ///
    /// Returns error if the server cannot run
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!("Listening on http://{}", addr);

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let Some(permit) = self.limiter.try_acquire() else {
                                warn!(
                                    "Connection limit reached ({}/{}), rejecting {}",
                                    self.limiter.active_connections(),
                                    self.limiter.max_connections(),
                                    peer_addr
                                );
                                drop(stream);
                                continue;
                            };

                            let state = Arc::clone(&self.state);
                            let shutdown_rx = self.shutdown_tx.subscribe();

                            connections.spawn(async move {
                                let _permit = permit;
                                serve_connection(stream, peer_addr, state, shutdown_rx).await;
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                Some(result) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = result {
                        warn!("Connection task failed: {}", e);
                    }
                }
                () = &mut shutdown => {
                    info!("Initiating graceful shutdown");
                    break;
                }
            }
        }

        self.shutdown_tx.send(()).ok();

        let shutdown_timeout = Duration::from_millis(SHUTDOWN_TIMEOUT_MS);
        let drained = tokio::time::timeout(shutdown_timeout, async {
            while let Some(result) = connections.join_next().await {
                if let Err(e) = result {
                    warn!("Connection cleanup error: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "Aborting {} connections still open after {}ms",
                connections.len(),
                SHUTDOWN_TIMEOUT_MS
            );
            connections.shutdown().await;
        }

        let stats = self.state.store.stats();
        info!(
            buckets = stats.buckets,
            records = stats.records,
            body_bytes = stats.body_bytes,
            "Shutdown complete"
        );
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    debug!("Accepted connection from {}", peer_addr);

    let service = service_fn(move |request| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Infallible>(router::dispatch(request, peer_addr, &state).await) }
    });

    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut draining = false;
    loop {
        tokio::select! {
            result = connection.as_mut() => {
                if let Err(e) = result {
                    debug!("Connection from {} ended with error: {}", peer_addr, e);
                }
                break;
            }
            _ = shutdown_rx.recv(), if !draining => {
                draining = true;
                connection.as_mut().graceful_shutdown();
            }
        }
    }
}
