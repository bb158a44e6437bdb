//! HTTP server and graceful shutdown.
//!
//! A thin hyper adapter around [`Dispatcher`]: collect the body, dispatch,
//! write the response. Everything interesting happens in the dispatcher.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C (or when the future passed to
//! [`Server::serve_with_shutdown`] resolves) the server:
//! 1. stops accepting new connections;
//! 2. lets every in-flight connection task run to completion;
//! 3. returns from `serve`, which lets `main` exit cleanly.

use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::response::Response;

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    listener: Option<TcpListener>,
}

impl Server {
    /// Configures the server to bind to `addr` when it starts serving.
    ///
    /// ```rust
    /// use schemaroute::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// assert_eq!(server.local_addr().port(), 3000);
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| Error::InvalidAddress(addr.to_owned()))?;
        Ok(Self { addr, listener: None })
    }

    /// Serves on an already bound listener (e.g. port `0` in tests).
    pub fn from_listener(listener: TcpListener) -> Result<Self, Error> {
        let addr = listener.local_addr()?;
        Ok(Self { addr, listener: Some(listener) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until SIGTERM or Ctrl-C, then drains in-flight connections.
    pub async fn serve(self, dispatcher: Dispatcher) -> Result<(), Error> {
        self.serve_with_shutdown(dispatcher, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown(
        self,
        dispatcher: Dispatcher,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.listener {
            Some(listener) => listener,
            None => TcpListener::bind(self.addr).await?,
        };
        let addr = listener.local_addr()?;

        info!(%addr, routes = dispatcher.router().len(), "listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal immediately stops
                // accepting new connections, even if more are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = dispatcher.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let dispatcher = dispatcher.clone();
                            async move { handle(dispatcher, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Collects the body and hands the request to the dispatcher.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes a response, hyper never sees an error.
async fn handle(
    dispatcher: Dispatcher,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = %parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::empty(http::StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let response = dispatcher.dispatch(http::Request::from_parts(parts, body)).await;
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere. If a handler cannot be installed the
/// corresponding arm never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
