//! PDF access behind a renderer seam.
//!
//! The pipeline only ever asks for a page count, one page's text, or one
//! page rendered to PNG — everything else about the PDF stays behind this
//! trait so tests can substitute canned pages.

use std::path::Path;

use mupdf::{Colorspace, Document, ImageFormat, Matrix, TextPageFlags};

use crate::error::PdfError;

/// Page access the pipeline needs from a PDF backend.
pub trait PageRenderer {
    fn page_count(&self) -> usize;

    /// Render one page to PNG bytes at the backend's configured DPI.
    fn page_image(&self, page: usize) -> Result<Vec<u8>, PdfError>;

    /// Extract one page's plain text.
    fn page_text(&self, page: usize) -> Result<String, PdfError>;

    /// Extract text for every page in order.
    fn all_page_texts(&self) -> Result<Vec<String>, PdfError> {
        (0..self.page_count()).map(|p| self.page_text(p)).collect()
    }
}

/// MuPDF-backed renderer. The document is opened once and pages are loaded
/// on demand.
pub struct MupdfRenderer {
    document: Document,
    page_count: usize,
    dpi: f32,
}

impl MupdfRenderer {
    pub fn open(path: &Path, dpi: f32) -> Result<Self, PdfError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| PdfError::Open("non-UTF-8 path".to_string()))?;
        let document =
            Document::open(path_str).map_err(|e| PdfError::Open(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| PdfError::Open(e.to_string()))? as usize;
        Ok(Self {
            document,
            page_count,
            dpi,
        })
    }

    fn load_page(&self, page: usize) -> Result<mupdf::Page, PdfError> {
        if page >= self.page_count {
            return Err(PdfError::PageOutOfRange {
                page,
                total: self.page_count,
            });
        }
        self.document
            .load_page(page as i32)
            .map_err(|e| PdfError::Render {
                page,
                reason: e.to_string(),
            })
    }
}

impl PageRenderer for MupdfRenderer {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_image(&self, page: usize) -> Result<Vec<u8>, PdfError> {
        let loaded = self.load_page(page)?;
        let zoom = self.dpi / 72.0;
        let matrix = Matrix::new_scale(zoom, zoom);
        let pixmap = loaded
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
            .map_err(|e| PdfError::Render {
                page,
                reason: e.to_string(),
            })?;
        let mut png = Vec::new();
        pixmap
            .write_to(&mut png, ImageFormat::PNG)
            .map_err(|e| PdfError::Render {
                page,
                reason: e.to_string(),
            })?;
        Ok(png)
    }

    fn page_text(&self, page: usize) -> Result<String, PdfError> {
        let loaded = self.load_page(page)?;
        loaded.to_text().map_err(|e| PdfError::Extract {
            page,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned renderer used across the crate's tests.
    pub struct FakeRenderer {
        pub pages: Vec<String>,
    }

    impl PageRenderer for FakeRenderer {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_image(&self, page: usize) -> Result<Vec<u8>, PdfError> {
            if page >= self.pages.len() {
                return Err(PdfError::PageOutOfRange {
                    page,
                    total: self.pages.len(),
                });
            }
            Ok(vec![0u8; 8])
        }

        fn page_text(&self, page: usize) -> Result<String, PdfError> {
            self.pages
                .get(page)
                .cloned()
                .ok_or(PdfError::PageOutOfRange {
                    page,
                    total: self.pages.len(),
                })
        }
    }

    #[test]
    fn test_all_page_texts_covers_every_page() {
        let renderer = FakeRenderer {
            pages: vec!["page one".to_string(), "page two".to_string()],
        };
        let texts = renderer.all_page_texts().unwrap();
        assert_eq!(texts, vec!["page one", "page two"]);
    }

    #[test]
    fn test_out_of_range_page_is_typed_error() {
        let renderer = FakeRenderer {
            pages: vec!["only page".to_string()],
        };
        match renderer.page_image(5) {
            Err(PdfError::PageOutOfRange { page: 5, total: 1 }) => {}
            other => panic!("expected PageOutOfRange, got {other:?}"),
        }
    }
}
