use super::types::{Reply, Request, RequestType, Stats};
use crate::error::{ErrorKind, RagError};
use crate::rag::RagEngine;
use std::path::Path;
use tracing::{error, info, warn};

/// Routes requests to the engine and turns outcomes into replies.
pub struct RequestHandler {
    engine: RagEngine,
}

impl RequestHandler {
    pub fn new(engine: RagEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RagEngine {
        &self.engine
    }

    /// Routes request to appropriate handler based on type.
    pub async fn handle(&self, request: Request) -> Reply {
        let request_type = request.request_type;
        let result = match request_type {
            RequestType::Upload => self.handle_upload(request).await,
            RequestType::Chat => self.handle_chat(request).await,
            RequestType::Stats => Ok(self.handle_stats().await),
            RequestType::Clear => {
                self.engine.clear().await;
                Ok(Reply::done("Document cleared"))
            }
        };

        result.unwrap_or_else(|e| {
            if e.kind().is_client_error() {
                warn!(request = ?request_type, error = %e, "Request rejected");
            } else {
                error!(request = ?request_type, error = %e, "Request failed");
            }
            Reply::from(&e)
        })
    }

    async fn handle_upload(&self, request: Request) -> Result<Reply, RagError> {
        let path = Path::new(request.content.trim());
        let file_name = match request.filename {
            Some(name) => name,
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RagError::Validation(format!("Cannot read upload {}: {}", path.display(), e))
        })?;

        let report = self.engine.process_upload(&file_name, &bytes).await?;
        info!(source = %report.source_name, chunks = report.chunk_count, "Upload processed");
        Ok(Reply::ingested(report))
    }

    async fn handle_chat(&self, request: Request) -> Result<Reply, RagError> {
        let result = self.engine.query(&request.content).await?;
        Ok(Reply::answer(result))
    }

    async fn handle_stats(&self) -> Reply {
        let stats = Stats {
            ready: self.engine.is_ready().await,
            chunks: self.engine.count().await,
            source: self.engine.source_name().await,
        };

        let summary = match &stats.source {
            Some(source) => format!("Index contains {} chunks from {}", stats.chunks, source),
            None => "No document loaded".to_string(),
        };
        Reply {
            content: summary,
            ..Reply::stats(stats)
        }
    }
}

/// Reply for a request line that could not be parsed.
pub fn malformed_request(err: impl std::fmt::Display) -> Reply {
    Reply::error(ErrorKind::Validation, format!("Malformed request: {}", err))
}
