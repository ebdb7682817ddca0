//! novel-trans CLI - resumable novel translator with interleaved output.

use anyhow::{Context, Result};
use clap::Parser;
use novel_trans::chapter_store::{ChapterManifest, ChapterStore, PersistOutcome};
use novel_trans::config::Config;
use novel_trans::console::Console;
use novel_trans::gateway::{ChatGateway, TranslationGateway};
use novel_trans::operator::{DriveMode, TerminalOperator, select_mode};
use novel_trans::pipeline::Pipeline;
use novel_trans::progress::ProgressStore;
use novel_trans::{segment, source};
use std::path::PathBuf;

/// Translate a plain-text novel chapter by chapter, resuming where the last run stopped.
#[derive(Parser, Debug)]
#[command(name = "novel-trans")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the novel text file.
    novel_path: PathBuf,

    /// Drive mode. Prompted for when omitted.
    #[arg(long, value_enum)]
    mode: Option<DriveMode>,

    /// Config file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the source language code.
    #[arg(long)]
    source: Option<String>,

    /// Override the target language code.
    #[arg(long)]
    target: Option<String>,

    /// Override the maximum characters per chapter.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_chars: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    console.section("novel-trans - Chapter Translator");

    // Load configuration
    console.step("Loading configuration...");
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if !config.api.is_configured() {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        console.warning(&format!(
            "API key not configured. Please edit: {}",
            config_path.display()
        ));
        console.info("Set your OpenAI-compatible API key in the config file and run again.");
        return Ok(());
    }

    if let Some(source) = args.source {
        config.translation.source_language = source;
    }
    if let Some(target) = args.target {
        config.translation.target_language = target;
    }
    if let Some(max_chars) = args.max_chars {
        config.translation.max_chars_per_chapter =
            usize::try_from(max_chars).context("--max-chars is too large")?;
    }

    config.validate().context("Invalid configuration")?;
    console.success(&format!(
        "Configuration loaded ({} -> {})",
        config.translation.source_language, config.translation.target_language
    ));

    let paths = config.paths.resolve(&args.novel_path);

    // Read and split the novel
    console.step(&format!("Reading {}...", args.novel_path.display()));
    let source_text = source::load(&args.novel_path)?;
    if source_text.encoding != "UTF-8" {
        console.warning(&format!(
            "File is not valid UTF-8, decoded as {}",
            source_text.encoding
        ));
    }
    if source_text.had_errors {
        console.warning("Some bytes could not be decoded and were replaced");
    }

    let pipeline_config = config.pipeline().context("Invalid configuration")?;
    let chapters = segment(&source_text.text, pipeline_config.max_chars_per_chapter);
    console.success(&format!("Split into {} chapters", chapters.len()));

    // Persist chapters once
    let store = ChapterStore::new(&paths.chapters_dir);
    let manifest = ChapterManifest::new(
        &source_text.text,
        pipeline_config.max_chars_per_chapter,
        chapters.len(),
    );
    match store.persist(&chapters, &manifest) {
        Ok(PersistOutcome::Written { count }) => console.success(&format!(
            "Saved {} chapters to {}",
            count,
            store.dir().display()
        )),
        Ok(PersistOutcome::AlreadyPresent) => console.info(&format!(
            "Chapter directory {} already exists, not rewriting it",
            store.dir().display()
        )),
        Ok(PersistOutcome::Stale { stored }) => console.warning(&format!(
            "Chapter directory {} was written from a different split ({}); stored chapter files no longer match chapter numbers, and recorded progress may refer to the old split",
            store.dir().display(),
            match stored {
                Some(m) => format!("{} chapters, max {} chars", m.chapter_count, m.max_chars),
                None => "no manifest".to_string(),
            }
        )),
        Err(e) => console.warning(&format!("Failed to save chapter files: {}", e)),
    }

    if chapters.is_empty() {
        console.info("Nothing to translate.");
        return Ok(());
    }

    let gateway = ChatGateway::new(config.api.clone(), &config.prompts)
        .context("Failed to create translation gateway")?;
    console.info(&format!("Using {} gateway ({})", gateway.name(), config.api.model));

    let progress = ProgressStore::new(&paths.progress);
    let pipeline = Pipeline::new(pipeline_config, Box::new(gateway), progress, &paths.output)
        .with_console(console.clone());

    let record = pipeline.load_progress();
    pipeline.report_estimate(&chapters, &record);

    let mut operator = TerminalOperator::stdio();
    let mode = match args.mode {
        Some(mode) => mode,
        None => select_mode(&mut operator).context("No valid translation mode selected")?,
    };

    let summary = pipeline.run(&chapters, record, mode, &mut operator).await;

    console.section("Done!");
    console.info(&format!(
        "Translated {}, already done {}, declined {}, failed {}",
        summary.translated.len(),
        summary.already_done.len(),
        summary.declined.len(),
        summary.failed.len()
    ));
    console.info(&format!("Output: {}", pipeline.output_path().display()));

    if !summary.failed.is_empty() {
        anyhow::bail!(
            "{} chapter(s) failed; rerun to retry them",
            summary.failed.len()
        );
    }

    Ok(())
}
