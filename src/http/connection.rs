use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::http::handler::BoxHandler;
use crate::http::parser::{parse_request, ParseLimits};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// One request/response exchange over an accepted stream.
pub struct Connection<S> {
    stream: BufReader<S>,
    peer: SocketAddr,
    limits: ParseLimits,
    state: ConnectionState,
}

#[derive(Debug)]
pub enum ConnectionState {
    Parsing,
    Dispatching(Request),
    Responding(Response),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, limits: ParseLimits) -> Self {
        Self {
            stream: BufReader::new(stream),
            peer,
            limits,
            state: ConnectionState::Parsing,
        }
    }

    /// Drives the connection to `Closed`.
    ///
    /// A malformed request is answered with 400 and a handler error with
    /// 500; only a failed write is returned as an error.
    pub async fn run(&mut self, service: &BoxHandler) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Parsing => {
                    match parse_request(&mut self.stream, self.limits).await {
                        Ok(req) => {
                            self.state = ConnectionState::Dispatching(req);
                        }
                        Err(e) => {
                            tracing::warn!(peer = %self.peer, error = %e, "Rejecting request");
                            self.state = ConnectionState::Responding(Response::bad_request());
                        }
                    }
                }

                ConnectionState::Dispatching(req) => {
                    let response = match service.call(req).await {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::error!(peer = %self.peer, error = %e, "Handler failed");
                            Response::internal_error()
                        }
                    };
                    self.state = ConnectionState::Responding(response);
                }

                ConnectionState::Responding(response) => {
                    let status = response.status().as_u16();
                    ResponseWriter::new(&mut self.stream)
                        .send(response)
                        .await
                        .context("failed to write response")?;

                    tracing::debug!(peer = %self.peer, status, "Response sent");
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    // Peer may already be gone.
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }
}
