//! PDF Babel CLI - Command line tool for translating PDF documents.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_babel_core::{
    spawn_flow_job, spawn_layout_job, AppConfig, JobEvent, Lang, PdfBabel, PdfDocument, Phase,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// How the translated document is laid out.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Reflow the full translated text into a fresh paginated PDF
    Flow,
    /// Keep each page's appearance and overlay translations in place
    Layout,
}

#[derive(Parser, Debug)]
#[command(name = "pdf-babel")]
#[command(author, version, about = "Translate PDF documents", long_about = None)]
struct Args {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output PDF file (default: input-<target>.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code ("auto" to detect)
    #[arg(short = 's', long, default_value = "auto")]
    source: String,

    /// Target language code
    #[arg(short = 't', long, default_value = "en")]
    target: String,

    /// Translation mode
    #[arg(short, long, value_enum, default_value = "flow")]
    mode: Mode,

    /// Translation endpoint URL
    #[arg(long, env = "PDF_BABEL_ENDPOINT")]
    endpoint: Option<String>,

    /// Font file to try first for non-Latin targets
    #[arg(long)]
    font: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    config.source_lang = Lang::new(&args.source);
    config.target_lang = Lang::new(&args.target);
    if let Some(endpoint) = args.endpoint {
        config.translator.endpoint = endpoint;
    }
    if let Some(font) = args.font {
        config.fonts.search_paths.insert(0, font);
    }

    // Load input PDF
    info!("Loading PDF: {}", args.input.display());
    let doc = PdfDocument::from_file(&args.input)
        .context(format!("Failed to load PDF: {}", args.input.display()))?;
    info!("Document has {} pages", doc.page_count());

    // Determine output path
    let output_path = args.output.unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        args.input
            .with_file_name(format!("{}-{}.pdf", stem, args.target))
    });

    let babel = PdfBabel::new(config).context("Failed to initialize translator")?;

    let mut events = match args.mode {
        Mode::Flow => spawn_flow_job(babel.flow_pipeline(), doc, output_path),
        Mode::Layout => spawn_layout_job(babel.layout_pipeline(), doc, output_path),
    };

    // Setup progress bar; its length is known once the first progress
    // event arrives
    let pb = ProgressBar::new_spinner();
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut failure = None;
    while let Some(event) = events.recv().await {
        match event {
            JobEvent::Phase(phase) => {
                pb.set_message(phase.to_string());
                if phase == Phase::Translating {
                    pb.set_position(0);
                }
            }
            JobEvent::SourceResolved(lang) => {
                pb.println(format!("Source language: {lang}"));
            }
            JobEvent::ChunkTranslated { done, total }
            | JobEvent::PageComposed { done, total } => {
                #[allow(clippy::cast_possible_truncation)]
                pb.set_length(total as u64);
                #[allow(clippy::cast_possible_truncation)]
                pb.set_position(done as u64);
            }
            JobEvent::FontFallback { target } => {
                pb.println(format!(
                    "Warning: no usable font found for '{target}', falling back to a built-in Latin font"
                ));
            }
            JobEvent::Completed { output } => {
                pb.finish_with_message("Translation complete");
                // CLI output is intentional
                #[allow(clippy::print_stdout)]
                {
                    println!("Translated PDF saved to: {}", output.display());
                }
            }
            JobEvent::Failed { error } => {
                pb.abandon_with_message("Translation failed");
                failure = Some(error);
            }
        }
    }

    if let Some(error) = failure {
        anyhow::bail!("{error}");
    }

    Ok(())
}
