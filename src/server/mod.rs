// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTPS endpoint receiving eviction admission reviews from the API server

pub mod review;
pub mod tls;

use crate::config::Config;
use crate::constants::server::{
    DECISION_TIMEOUT_SECS, EVICTION_PATH, HEADER_READ_TIMEOUT_SECS, READINESS_PATH,
    SHUTDOWN_GRACE_SECS, TLS_HANDSHAKE_TIMEOUT_SECS,
};
use crate::eviction::{decide, Verdict};
use crate::kubernetes::KubeClusterState;
use anyhow::Context;
use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use kube::Client;
use openssl::ssl::SslAcceptor;
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};

pub use review::{parse_review, review_response, EvictionReview};

/// Shared by every connection
pub struct Webhook {
    config: Config,
    client: Client,
    decision_timeout: Duration,
}

impl Webhook {
    pub fn new(config: Config, client: Client) -> Self {
        Self {
            config,
            client,
            decision_timeout: Duration::from_secs(DECISION_TIMEOUT_SECS),
        }
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    /// Route a single HTTP request
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        let path = request.uri().path().to_string();
        match path.as_str() {
            EVICTION_PATH => self.handle_eviction(request).await,
            READINESS_PATH => empty(StatusCode::OK),
            _ => {
                error!("Unexpected request for {}", path);
                empty(StatusCode::NOT_FOUND)
            }
        }
    }

    async fn handle_eviction<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        if !is_json(&request) {
            warn!("Rejecting eviction review with unexpected content type");
            return empty(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }

        let body = match request.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("Failed to read eviction review body: {}", e);
                return empty(StatusCode::BAD_REQUEST);
            }
        };

        let review = match parse_review(&body) {
            Ok(review) => review,
            Err(e) => {
                warn!("{}", e);
                return empty(StatusCode::BAD_REQUEST);
            }
        };

        let verdict = self
            .review(&review)
            .instrument(info_span!("eviction", uid = %review.uid, dry_run = review.dry_run))
            .await;

        match serde_json::to_vec(&review_response(&review.uid, &verdict)) {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(body)))
                .unwrap_or_else(|_| empty(StatusCode::INTERNAL_SERVER_ERROR)),
            Err(e) => {
                error!("Failed to encode admission review response: {}", e);
                empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn review(&self, review: &EvictionReview) -> Verdict {
        let cluster = KubeClusterState::new(self.client.clone()).with_dry_run(review.dry_run);

        let verdict = tokio::time::timeout(
            self.decision_timeout,
            decide(&review.target, &self.config, &cluster),
        )
        .await
        .unwrap_or_else(|_| {
            error!(
                "Timed out deciding eviction of pod {}/{}",
                review.target.namespace, review.target.name
            );
            Verdict::timed_out()
        });

        info!(
            allowed = verdict.is_allowed(),
            code = verdict.code().map(|c| c.as_u16()),
            message = verdict.message().unwrap_or_default(),
            "Eviction decided"
        );
        verdict
    }
}

fn is_json<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Serve the webhook over TLS until SIGINT or SIGTERM
pub async fn serve(config: Config, client: Client) -> anyhow::Result<()> {
    let acceptor = Arc::new(
        tls::build_acceptor(&config.tls_cert_file, &config.tls_key_file)
            .context("Failed to prepare TLS acceptor")?,
    );
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind listener at {}", config.listen_addr))?;
    info!("Reschedule hook listening on {}", config.listen_addr);

    let webhook = Arc::new(Webhook::new(config, client));
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    connections.spawn(serve_connection(
                        acceptor.clone(),
                        webhook.clone(),
                        stream,
                        remote_addr,
                        stop_rx.clone(),
                    ));
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            },
            _ = &mut shutdown => break,
        }

        while connections.try_join_next().is_some() {}
    }

    info!("Shutting down, draining {} connection(s)", connections.len());
    let _ = stop_tx.send(true);
    let drained = tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Connections still open after grace period, aborting them");
        connections.shutdown().await;
    }

    info!("Reschedule hook stopped");
    Ok(())
}

async fn serve_connection(
    acceptor: Arc<SslAcceptor>,
    webhook: Arc<Webhook>,
    stream: TcpStream,
    remote_addr: SocketAddr,
    mut stop: watch::Receiver<bool>,
) {
    let handshake_deadline = Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS);
    let tls_stream = match tls::accept(&acceptor, stream, handshake_deadline).await {
        Ok(s) => s,
        Err(e) => {
            warn!("{} from {}", e, remote_addr);
            return;
        }
    };

    let service = service_fn(move |request| {
        let webhook = webhook.clone();
        async move { Ok::<_, Infallible>(webhook.handle(request).await) }
    });

    let connection = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(Duration::from_secs(HEADER_READ_TIMEOUT_SECS))
        .serve_connection(TokioIo::new(tls_stream), service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        _ = stop.changed() => {
            // Finishes an in-flight request, closes an idle keep-alive connection at once
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };

    if let Err(e) = result {
        if !(e.is_closed() || e.is_incomplete_message()) {
            error!("Error serving connection from {}: {}", remote_addr, e);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
