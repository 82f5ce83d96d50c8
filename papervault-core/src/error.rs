use thiserror::Error;

/// PDF access failures.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },
    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },
    #[error("failed to extract text from page {page}: {reason}")]
    Extract { page: usize, reason: String },
}

/// Completion-API failures, after the client's own retry policy ran out.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Rate limiting or undecodable responses persisted past the retry
    /// budget. Callers degrade to a skip placeholder on this.
    #[error("API call exceeded {0} retries")]
    RetriesExhausted(usize),
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
}

/// Outline generation failures. Schema failures are fatal for the run —
/// there is no partial recovery from an unparsable reading plan.
#[derive(Error, Debug)]
pub enum ArchitectError {
    #[error("outline schema parse failed: {0}")]
    SchemaParse(#[from] serde_json::Error),
    #[error(transparent)]
    Llm(#[from] LlmError),
}
