use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

// Import from papervault-core
use papervault_core::{
    AnalysisConfig, FileStorage, MupdfRenderer, PaperProcessor, VisionClient,
};

#[derive(Parser)]
#[command(name = "papervault")]
#[command(about = "Turn academic PDFs into hyperlinked study-note vaults with a vision-language model")]
struct Args {
    /// Path to the PDF file to analyze
    #[arg(short, long)]
    pdf: String,

    /// Path to the Obsidian vault root
    #[arg(short, long)]
    vault: String,

    /// Analyze the appendix too (skipped by default)
    #[arg(long)]
    include_appendix: bool,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Override both the architect and analyst models
    #[arg(short, long)]
    model: Option<String>,

    /// Render DPI for page images sent to the model
    #[arg(long)]
    dpi: Option<f32>,

    /// Cache directory for generated outlines
    /// If not specified, uses the platform cache dir
    #[arg(long)]
    cache_dir: Option<String>,

    /// Skip the outline cache and force fresh generation
    #[arg(long)]
    skip_cache: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("📚 Papervault Paper Analyzer");

    // Check if input file exists
    if !Path::new(&args.pdf).exists() {
        println!("⚠️  Input PDF not found at: {}", args.pdf);
        println!("   Please check the file path.");
        return Ok(());
    }

    let api_key = match std::env::var("OPENROUTER_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => bail!("OPENROUTER_API_KEY not found in environment (set it or add it to .env)"),
    };

    // Load config using the functional pattern, then apply CLI overrides
    let mut config = AnalysisConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }
    if args.include_appendix {
        config.include_appendix = true;
    }
    if let Some(model) = &args.model {
        config.architect_model = model.clone();
        config.analyst_model = model.clone();
    }
    if let Some(dpi) = args.dpi {
        config.render_dpi = dpi;
    }

    let cache_dir = args
        .cache_dir
        .clone()
        .map(PathBuf::from)
        .or_else(|| dirs::cache_dir().map(|dir| dir.join("papervault")))
        .unwrap_or_else(|| PathBuf::from("cache"));
    let storage = FileStorage::new(cache_dir.to_str().unwrap_or("cache"))?;

    let renderer = MupdfRenderer::open(Path::new(&args.pdf), config.render_dpi)?;
    let client = VisionClient::new(&config.base_url, &api_key, config.retry.clone());
    let processor = PaperProcessor::new_with_dependencies(
        Box::new(renderer),
        Box::new(storage),
        client,
        config,
    );

    println!("📄 Processing: {}", args.pdf);
    match processor.process(Path::new(&args.pdf), Path::new(&args.vault), args.skip_cache) {
        Ok(()) => {
            println!("✅ Successfully processed paper");
        }
        Err(e) => {
            eprintln!("❌ Processing failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}
