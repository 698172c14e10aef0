use crate::error::{ErrorKind, RagError};
use crate::rag::{Chunk, IngestReport, QueryResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// Ingest the PDF at the path in `content`
    Upload,
    /// Ask the question in `content`
    Chat,
    Stats,
    Clear,
}

/// Request from client to server, one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub request_type: RequestType,

    #[serde(default)]
    pub content: String,

    /// Name to index an upload under; defaults to the file name of `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Request {
    pub fn upload(path: impl Into<String>) -> Self {
        Self {
            request_type: RequestType::Upload,
            content: path.into(),
            filename: None,
        }
    }

    pub fn chat(question: impl Into<String>) -> Self {
        Self {
            request_type: RequestType::Chat,
            content: question.into(),
            filename: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    Done,
    Error,
}

/// A chunk shown to the client as evidence for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Chunk identifier, `source#p{page}c{index}`
    pub id: String,
    pub text: String,
    pub page_number: usize,
    pub source_name: String,
}

impl From<Chunk> for Source {
    fn from(chunk: Chunk) -> Self {
        Self {
            id: chunk.id(),
            page_number: chunk.metadata.page,
            source_name: chunk.metadata.source,
            text: chunk.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub ready: bool,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Response sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "type")]
    pub reply_type: ReplyType,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,

    /// Outcome of an upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<IngestReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    pub fn done(content: impl Into<String>) -> Self {
        Self {
            reply_type: ReplyType::Done,
            content: content.into(),
            sources: None,
            stats: None,
            document: None,
            error: None,
        }
    }

    pub fn ingested(report: IngestReport) -> Self {
        Self {
            content: report.message.clone(),
            document: Some(report),
            ..Self::done(String::new())
        }
    }

    pub fn answer(result: QueryResult) -> Self {
        let sources = result.sources.into_iter().map(Source::from).collect();

        Self {
            sources: Some(sources),
            ..Self::done(result.answer)
        }
    }

    pub fn stats(stats: Stats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::done(String::new())
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            reply_type: ReplyType::Error,
            content: String::new(),
            sources: None,
            stats: None,
            document: None,
            error: Some(ErrorBody {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.reply_type == ReplyType::Error
    }
}

impl From<&RagError> for Reply {
    fn from(err: &RagError) -> Self {
        Reply::error(err.kind(), err.to_string())
    }
}
