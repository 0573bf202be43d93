//! Resume Text Extractor: document reference in, plain text out.
//!
//! Callers that must never fail go through [`extract_or_empty`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetching {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Resume is neither a PDF nor UTF-8 text")]
    NotText,
}

#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract(&self, source: &str) -> Result<String, ExtractionError>;
}

/// Reads a resume from a local path or an http(s) URL.
/// PDFs go through `pdf-extract`; anything else must already be UTF-8 text.
#[derive(Clone, Default)]
pub struct PdfResumeExtractor {
    client: Client,
}

impl PdfResumeExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, source: &str) -> Result<Bytes, ExtractionError> {
        if is_remote(source) {
            let response = self.client.get(source).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExtractionError::Status {
                    url: source.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.bytes().await?)
        } else {
            Ok(Bytes::from(tokio::fs::read(source).await?))
        }
    }
}

#[async_trait]
impl ResumeExtractor for PdfResumeExtractor {
    async fn extract(&self, source: &str) -> Result<String, ExtractionError> {
        let bytes = self.fetch(source).await?;
        debug!("Fetched resume from {source} ({} bytes)", bytes.len());

        if bytes.starts_with(PDF_MAGIC) {
            // pdf-extract is synchronous and CPU-bound
            tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?
            .map_err(ExtractionError::Pdf)
        } else {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractionError::NotText)
        }
    }
}

/// Runs the extractor, degrading any failure to empty text.
pub async fn extract_or_empty(extractor: &dyn ResumeExtractor, source: &str) -> String {
    match extractor.extract(source).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to extract resume text from {source}: {e}");
            String::new()
        }
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_reads_local_text_resume() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resume.md");
        std::fs::write(&file, "Rust engineer, 8 years").unwrap();

        let text = PdfResumeExtractor::default()
            .extract(file.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(text, "Rust engineer, 8 years");
    }

    #[tokio::test]
    async fn test_fetches_remote_text_resume() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resume.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Compiler work"))
            .mount(&server)
            .await;

        let text = PdfResumeExtractor::default()
            .extract(&format!("{}/resume.txt", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "Compiler work");
    }

    #[tokio::test]
    async fn test_remote_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = PdfResumeExtractor::default()
            .extract(&format!("{}/missing.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_binary_garbage_is_not_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resume.bin");
        std::fs::write(&file, [0xff, 0xfe, 0x00, 0x81]).unwrap();

        let err = PdfResumeExtractor::default()
            .extract(file.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotText));
    }

    #[tokio::test]
    async fn test_broken_pdf_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("resume.pdf");
        std::fs::write(&file, b"%PDF-1.7 truncated").unwrap();

        let err = PdfResumeExtractor::default()
            .extract(file.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[tokio::test]
    async fn test_unreachable_source_degrades_to_empty() {
        let extractor = PdfResumeExtractor::default();
        let text = extract_or_empty(&extractor, "/definitely/not/here/resume.pdf").await;
        assert_eq!(text, "");
    }
}
