// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! TLS termination for the webhook listener

use crate::error::{HookError, Result};
use openssl::ssl::{select_next_proto, AlpnError, Ssl, SslAcceptor, SslFiletype, SslMethod};
use std::fmt::Display;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

const ALPN_PROTO_LIST: &[u8] = b"\x08http/1.1";

fn tls_error<E: Display>(context: &'static str) -> impl FnOnce(E) -> HookError {
    move |e| HookError::TlsError(format!("{}: {}", context, e))
}

/// Build an acceptor serving the PEM certificate chain and key at the given paths
pub fn build_acceptor(cert_file: &Path, key_file: &Path) -> Result<SslAcceptor> {
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())
        .map_err(tls_error("Failed to initialize TLS acceptor builder"))?;
    builder
        .set_private_key_file(key_file, SslFiletype::PEM)
        .map_err(tls_error("Failed to load private key"))?;
    builder
        .set_certificate_chain_file(cert_file)
        .map_err(tls_error("Failed to load certificate chain"))?;
    builder
        .check_private_key()
        .map_err(tls_error("Certificate and key mismatch"))?;

    builder
        .set_alpn_protos(ALPN_PROTO_LIST)
        .map_err(tls_error("Failed to configure ALPN protocols"))?;
    builder.set_alpn_select_callback(|_, client| {
        select_next_proto(client, ALPN_PROTO_LIST).ok_or(AlpnError::NOACK)
    });

    Ok(builder.build())
}

/// Complete the server side handshake, giving up after `deadline`
pub async fn accept(
    acceptor: &SslAcceptor,
    stream: TcpStream,
    deadline: Duration,
) -> Result<SslStream<TcpStream>> {
    let ssl = Ssl::new(acceptor.context()).map_err(tls_error("Failed to initialize TLS session"))?;
    let mut tls_stream =
        SslStream::new(ssl, stream).map_err(tls_error("Failed to bind TLS stream to socket"))?;
    tokio::time::timeout(deadline, Pin::new(&mut tls_stream).accept())
        .await
        .map_err(|_| HookError::TlsError(format!("TLS handshake timed out after {:?}", deadline)))?
        .map_err(tls_error("TLS handshake failed"))?;
    Ok(tls_stream)
}
