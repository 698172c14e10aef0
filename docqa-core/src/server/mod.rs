//! Unix socket server for uploads and questions.
//!
//! The server is organized into separate concerns:
//! - `types`: Protocol types for requests and replies
//! - `handler`: Routes requests to the [`RagEngine`]
//! - `transport`: Unix socket communication layer
//!
//! Each connection carries one JSON request line and receives one JSON reply
//! line. Failures come back as `{"type":"error","error":{"kind":..,"message":..}}`.

mod handler;
pub mod transport;
mod types;

pub use handler::RequestHandler;
pub use transport::{send_request, TransportError};
pub use types::{ErrorBody, Reply, ReplyType, Request, RequestType, Source, Stats};

use crate::config::Config;
use crate::error::RagError;
use crate::provider::{self, ProviderError};
use crate::rag::RagEngine;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Engine(#[from] RagError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Main server coordinating transport and request handling.
pub struct Server {
    handler: Arc<RequestHandler>,
    transport: transport::UnixSocketTransport,
}

impl Server {
    /// Creates a server with a provider and engine built from `config`.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let provider = provider::from_config(&config)?;
        let engine = RagEngine::new(&config, provider)?;
        Ok(Self::with_engine(engine, &config.server.socket_path))
    }

    /// Creates a server around an existing engine.
    pub fn with_engine(engine: RagEngine, socket_path: &str) -> Self {
        Self {
            handler: Arc::new(RequestHandler::new(engine)),
            transport: transport::UnixSocketTransport::new(socket_path),
        }
    }

    pub fn engine(&self) -> &RagEngine {
        self.handler.engine()
    }

    /// Starts the server and listens for connections until Ctrl-C.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.serve(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Serves connections until `shutdown` resolves, then removes the socket file.
    pub async fn serve<F>(&self, shutdown: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = self.transport.bind().await?;
        info!(socket = %self.transport.socket_path().display(), "Server listening");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let handler = Arc::clone(&self.handler);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, handler).await {
                                error!(error = %e, "Connection error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
                _ = &mut shutdown => {
                    info!("Shutting down");
                    self.transport.cleanup();
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handles a single client connection.
async fn handle_connection(
    mut stream: tokio::net::UnixStream,
    handler: Arc<RequestHandler>,
) -> transport::Result<()> {
    let reply = match transport::read_request(&mut stream).await {
        Ok(request) => {
            debug!(request = ?request.request_type, "Request received");
            handler.handle(request).await
        }
        Err(TransportError::Json(e)) => handler::malformed_request(e),
        Err(e) => return Err(e),
    };

    transport::write_reply(&mut stream, &reply).await
}
