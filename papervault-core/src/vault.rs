//! Obsidian vault output: one hub index per paper, one spoke note per
//! section. Wikilinks are flat-namespace in Obsidian, so every spoke file
//! name is prefixed with the paper slug to stay unique across papers.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;

use crate::types::{Outline, Section, SectionAnalysis};

/// Clean a name for cross-platform filenames and Obsidian wikilinks:
/// invalid characters become underscores, runs collapse, edges trim.
pub fn sanitize_slug(name: &str) -> String {
    let mut clean = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for c in name.chars() {
        if matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
            if !last_was_underscore {
                clean.push('_');
                last_was_underscore = true;
            }
        } else {
            clean.push(c);
            last_was_underscore = false;
        }
    }
    let trimmed = clean.trim().trim_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

pub struct VaultWriter {
    vault_root: PathBuf,
}

impl VaultWriter {
    pub fn new(vault_root: &Path) -> Result<Self> {
        fs::create_dir_all(vault_root)?;
        Ok(Self {
            vault_root: vault_root.to_path_buf(),
        })
    }

    /// Folder for one paper inside the vault, created on first use.
    pub fn paper_folder(&self, paper_slug: &str) -> Result<PathBuf> {
        let folder = self.vault_root.join(paper_slug);
        fs::create_dir_all(&folder)?;
        Ok(folder)
    }

    /// Write the hub index: title, summary, and a linked table of contents
    /// with one anchor link per sub-question.
    pub fn write_hub_index(
        &self,
        outline: &Outline,
        paper_folder: &Path,
        paper_slug: &str,
    ) -> Result<()> {
        let mut content = String::new();
        content.push_str("---\n");
        content.push_str(&format!("created: {}\n", Utc::now().to_rfc3339()));
        content.push_str("tags: [paper, index]\n");
        content.push_str("---\n\n");
        content.push_str(&format!("# {}\n\n", outline.paper_title));
        content.push_str(&format!("## Summary\n{}\n\n", outline.summary));
        content.push_str("## Deep Dive Index\n");

        for section in &outline.sections {
            let unique_slug = format!("{paper_slug}_{}", sanitize_slug(&section.filename_slug));
            content.push_str(&format!("- [[{unique_slug}]] : **{}**\n", section.title));
            for (index, sub_question) in section.sub_questions.iter().enumerate() {
                let n = index + 1;
                content.push_str(&format!(
                    "  - [[{unique_slug}#sub-q{n}|🔍 子问题{n}]]: {}\n",
                    preview(&sub_question.question, 60)
                ));
            }
        }

        let path = paper_folder.join("00_Master_Index.md");
        fs::write(&path, content)?;
        println!("💾 {}", path.display());
        Ok(())
    }

    /// Write (or extend) the note for one analyzed section. Re-runs append
    /// under a separator instead of clobbering earlier analyses.
    pub fn write_spoke_note(
        &self,
        section: &Section,
        analyses: &[SectionAnalysis],
        paper_folder: &Path,
        paper_slug: &str,
    ) -> Result<PathBuf> {
        let unique_slug = format!("{paper_slug}_{}", sanitize_slug(&section.filename_slug));
        let path = paper_folder.join(format!("{unique_slug}.md"));

        let mut content = String::new();
        if path.exists() {
            content.push_str("\n\n---\n\n");
        } else {
            content.push_str("---\n");
            content.push_str("parent: [[00_Master_Index]]\n");
            content.push_str(&format!(
                "tags: [paper, analysis, {}]\n",
                section.content_type.tag()
            ));
            content.push_str("---\n\n");
            content.push_str(&format!("# {}\n\n", section.title));
        }

        for analysis in analyses {
            content.push_str(&format!(
                "## 🧐 探究问题: {} {{#{}}}\n\n",
                analysis.question, analysis.anchor_id
            ));
            content.push_str(&format!("### 💡 分析回答\n{}\n\n", analysis.answer));
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        file.write_all(content.as_bytes())?;
        Ok(path)
    }
}
