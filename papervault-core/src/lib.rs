// Papervault Core Library
//
// Turns an academic PDF into a hyperlinked study-note vault: an architect
// pass outlines the paper per page batch, a dedup pass compresses the
// outline and audits figure coverage, and an analyst pass deep-dives each
// section with a vision-language model under a length-validated retry loop.

pub mod analyst;
pub mod architect;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod generator;
pub mod llm;
pub mod pdf;
pub mod processor;
pub mod quality;
pub mod scanner;
pub mod similarity;
pub mod storage;
pub mod types;
pub mod vault;

// Re-export main types and functions for easy use
pub use config::AnalysisConfig;
pub use error::{ArchitectError, LlmError, PdfError};
pub use llm::VisionClient;
pub use pdf::{MupdfRenderer, PageRenderer};
pub use processor::PaperProcessor;
pub use storage::{FileStorage, NoOpStorage, OutlineStorage};
pub use types::*;
