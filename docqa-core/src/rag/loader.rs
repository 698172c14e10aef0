//! Document loading: turning a file on disk into page-tagged text.

use super::types::{Document, Page};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Leading bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Loads a file into a [`Document`] of numbered pages.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Reads `path` and tags the result with `source`, the name the file is known by.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] if the file cannot be read or parsed.
    async fn load(&self, path: &Path, source: &str) -> Result<Document>;
}

/// PDF loader backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path, source: &str) -> Result<Document> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RagError::Ingestion(format!("Failed to read {}: {}", path.display(), e)))?;

        if !bytes.starts_with(PDF_MAGIC) {
            return Err(RagError::Ingestion(format!("{} is not a PDF file", source)));
        }

        // Extraction is CPU bound and may panic on malformed input
        let extract = move || pdf_extract::extract_text_from_mem_by_pages(&bytes);
        let pages = tokio::task::spawn_blocking(extract)
            .await
            .map_err(|e| RagError::Ingestion(format!("PDF extraction task failed: {}", e)))?
            .map_err(|e| RagError::Ingestion(format!("Could not parse {}: {}", source, e)))?;

        if pages.is_empty() {
            return Err(RagError::Ingestion(format!("{} has no pages", source)));
        }
        debug!(source, pages = pages.len(), "Extracted PDF text");

        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page { number: i + 1, text })
            .collect();

        Ok(Document::new(source, pages))
    }
}

/// Whether an upload looks like a PDF: a `.pdf` name and `%PDF-` content.
pub fn is_pdf(file_name: &str, bytes: &[u8]) -> bool {
    let has_extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    has_extension && bytes.starts_with(PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf("report.pdf", b"%PDF-1.7\n..."));
        assert!(is_pdf("REPORT.PDF", b"%PDF-1.4"));
        assert!(!is_pdf("report.txt", b"%PDF-1.7"));
        assert!(!is_pdf("report.pdf", b"hello world"));
        assert!(!is_pdf("pdf", b"%PDF-1.7"));
        assert!(!is_pdf("report.pdf", b""));
    }

    #[tokio::test]
    async fn test_missing_file_is_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PdfLoader.load(&dir.path().join("absent.pdf"), "absent.pdf").await;
        assert!(matches!(result, Err(RagError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_non_pdf_content_is_ingestion_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"plain text pretending to be a pdf").unwrap();

        let result = PdfLoader.load(file.path(), "fake.pdf").await;
        assert!(matches!(result, Err(RagError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_truncated_pdf_is_ingestion_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.5\n%broken").unwrap();

        let result = PdfLoader.load(file.path(), "broken.pdf").await;
        assert!(matches!(result, Err(RagError::Ingestion(_))));
    }
}
