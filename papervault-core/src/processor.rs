//! End-to-end paper processing: extract → scan → outline → dedup →
//! analyze → write vault.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::analyst::AnalystAgent;
use crate::architect::ArchitectAgent;
use crate::cache::{calculate_config_hash, calculate_pdf_hash, OutlineCacheKey, OutlineCacheValue};
use crate::config::AnalysisConfig;
use crate::dedup;
use crate::llm::VisionClient;
use crate::pdf::PageRenderer;
use crate::scanner;
use crate::storage::OutlineStorage;
use crate::types::{DetectedElement, Outline, SectionAnalysis};
use crate::vault::{sanitize_slug, VaultWriter};

/// Soft structure audit keywords; a missing one warns, never aborts.
const IMRAD_KEYWORDS: [&str; 4] = ["intro", "method", "result", "discuss"];

/// Maximum length of the paper slug that prefixes every note filename.
const PAPER_SLUG_CAP: usize = 50;

pub struct PaperProcessor {
    renderer: Box<dyn PageRenderer>,
    storage: Box<dyn OutlineStorage>,
    client: VisionClient,
    config: AnalysisConfig,
}

impl PaperProcessor {
    /// Create PaperProcessor with full dependency injection
    pub fn new_with_dependencies(
        renderer: Box<dyn PageRenderer>,
        storage: Box<dyn OutlineStorage>,
        client: VisionClient,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            renderer,
            storage,
            client,
            config,
        }
    }

    /// Process one paper into its vault folder.
    ///
    /// An unparsable outline aborts the whole run; everything downstream
    /// of the outline degrades per sub-question instead of aborting.
    pub fn process(&self, pdf_path: &Path, vault_root: &Path, skip_cache: bool) -> Result<()> {
        let start_time = Instant::now();

        let paper_stem = pdf_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("paper");
        let paper_slug: String = sanitize_slug(paper_stem).chars().take(PAPER_SLUG_CAP).collect();

        // Stage 1: per-page text extraction
        let stage_start = Instant::now();
        let page_texts = self.renderer.all_page_texts()?;
        println!("✅ Extracted text from {} pages", page_texts.len());
        println!(
            "⏱️  Text extraction: {:.3}s",
            stage_start.elapsed().as_secs_f64()
        );

        // Stage 2: visual element scan
        println!("📊 Scanning for figure and table captions...");
        let detected = scanner::scan_pages(&page_texts);
        println!("✅ Detected {} captions", detected.len());

        // Stage 3: outline generation (cached on PDF + config)
        let stage_start = Instant::now();
        let outline = self.outline_with_cache(pdf_path, &page_texts, &detected, skip_cache)?;
        println!(
            "⏱️  Outline generation: {:.3}s",
            stage_start.elapsed().as_secs_f64()
        );

        // Soft structure check
        let titles: Vec<String> = outline
            .sections
            .iter()
            .map(|section| section.title.to_lowercase())
            .collect();
        let missing: Vec<&str> = IMRAD_KEYWORDS
            .iter()
            .filter(|keyword| !titles.iter().any(|title| title.contains(**keyword)))
            .copied()
            .collect();
        if !missing.is_empty() {
            println!(
                "⚠️  Outline may be missing core sections: {} (paper structure may be unusual)",
                missing.join(", ")
            );
        }

        println!("🗺️  Plan ready: {} sections to analyze", outline.sections.len());

        // Stage 4: per-section deep dive + vault writing
        let writer = VaultWriter::new(vault_root)?;
        let paper_folder = writer.paper_folder(&paper_slug)?;
        writer.write_hub_index(&outline, &paper_folder, &paper_slug)?;

        let analyst = AnalystAgent::new(&self.client, &self.config);
        for section in &outline.sections {
            println!("🔬 Analyzing: {}", section.title);

            let Some(&first_page) = section.target_pages.first() else {
                println!("⚠️  No target pages, skipping section");
                continue;
            };
            // Out-of-range pages happen when the model miscounts; fall
            // back to the first page rather than dropping the section.
            let page = if first_page >= self.renderer.page_count() {
                0
            } else {
                first_page
            };
            let page_image = self
                .renderer
                .page_image(page)
                .with_context(|| format!("rendering page {page} for '{}'", section.title))?;

            let mut analyses = Vec::new();
            for (index, sub_question) in section.sub_questions.iter().enumerate() {
                let n = index + 1;
                println!(
                    "  ❓ Sub-question {}/{} ({:?}): {}",
                    n,
                    section.sub_questions.len(),
                    sub_question.question_type,
                    question_preview(&sub_question.question)
                );
                let answer = analyst.analyze(&page_image, sub_question, section.content_type);
                analyses.push(SectionAnalysis {
                    question: sub_question.question.clone(),
                    answer,
                    anchor_id: format!("sub-q{n}"),
                });
            }

            let note_path =
                writer.write_spoke_note(section, &analyses, &paper_folder, &paper_slug)?;
            println!("💾 {}", note_path.display());
        }

        println!(
            "⏱️  Total processing time: {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        println!("🎉 Done! Vault folder: {}", paper_folder.display());
        Ok(())
    }

    fn outline_with_cache(
        &self,
        pdf_path: &Path,
        page_texts: &[String],
        detected: &[DetectedElement],
        skip_cache: bool,
    ) -> Result<Outline> {
        let pdf_bytes = std::fs::read(pdf_path)
            .with_context(|| format!("reading {}", pdf_path.display()))?;
        let cache_key = OutlineCacheKey::new(
            calculate_pdf_hash(&pdf_bytes),
            calculate_config_hash(&self.config)?,
        );

        if skip_cache {
            println!("🚫 Skipping outline cache (--skip-cache enabled)");
        } else if let Some(cached) = self.storage.get_outline(&cache_key)? {
            println!(
                "🎯 Cache hit: outline for this PDF + config (model {})",
                cached.model
            );
            return Ok(cached.outline);
        }

        let outline = self.generate_outline(page_texts, detected)?;

        if !skip_cache {
            let value = OutlineCacheValue::new(outline.clone(), self.config.architect_model.clone());
            self.storage.store_outline(&cache_key, &value)?;
        }
        Ok(outline)
    }

    /// Run the architect over page batches, then compress the result.
    fn generate_outline(
        &self,
        page_texts: &[String],
        detected: &[DetectedElement],
    ) -> Result<Outline> {
        let architect = ArchitectAgent::new(&self.client, &self.config);
        let per_batch = self.config.pages_per_batch.max(1);
        let batch_count = page_texts.len().div_ceil(per_batch);
        println!(
            "📚 {} pages, {} architect batches of up to {} pages",
            page_texts.len(),
            batch_count,
            per_batch
        );

        let mut all_sections = Vec::new();
        let mut paper_title = String::new();
        let mut summary = String::new();

        for (batch_index, chunk) in page_texts.chunks(per_batch).enumerate() {
            let first_page = batch_index * per_batch + 1;
            println!(
                "  📖 Batch {}/{} (pages {}-{})",
                batch_index + 1,
                batch_count,
                first_page,
                first_page + chunk.len() - 1
            );

            let batch_text = chunk.join("\n\n---\n\n");
            // The full figure checklist only goes to the first batch
            let checklist = if batch_index == 0 { Some(detected) } else { None };
            let batch_outline = architect
                .generate_outline(&batch_text, checklist)
                .with_context(|| format!("outline generation failed for batch {}", batch_index + 1))?;
            println!("  ✅ {} candidate sections", batch_outline.sections.len());

            // First batch sees the abstract, so its title/summary win
            if paper_title.is_empty() {
                paper_title = batch_outline.paper_title;
            }
            if summary.is_empty() {
                summary = batch_outline.summary;
            }
            all_sections.extend(batch_outline.sections);
        }

        println!(
            "✅ All batches complete: {} candidate sections",
            all_sections.len()
        );

        let (sections, report) = dedup::deduplicate(all_sections, detected);
        report.print();

        Ok(Outline {
            paper_title,
            summary,
            sections,
        })
    }
}

fn question_preview(question: &str) -> String {
    const MAX_CHARS: usize = 50;
    if question.chars().count() > MAX_CHARS {
        format!("{}...", question.chars().take(MAX_CHARS).collect::<String>())
    } else {
        question.to_string()
    }
}
