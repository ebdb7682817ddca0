//! Resumable chapter translation pipeline.
//!
//! Each pending chapter is translated, appended and then recorded, ending
//! in `Done`, or in `Failed` if the append or the save did not succeed. It
//! goes straight to `Skipped` when it is already recorded as done or the
//! operator declines it. A chapter is recorded as done only after its block
//! was appended to the output, and the record is saved before the next
//! chapter starts.
//!
//! The output artifact is therefore written at least once per chapter, not
//! exactly once: a crash between the append and the progress save leaves the
//! chapter unrecorded, and the next run translates and appends it again.

use crate::assembler;
use crate::config::PipelineConfig;
use crate::console::{Console, preview};
use crate::gateway::TranslationGateway;
use crate::operator::{DriveMode, Operator, confirm};
use crate::progress::{LoadStatus, ProgressRecord, ProgressStore};
use crate::segmenter::Chapter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Characters of chapter text shown before translating it.
const PREVIEW_CHARS: usize = 200;

/// Characters of a line shown in per-line progress.
const LINE_PREVIEW_CHARS: usize = 50;

/// Where a pending chapter (one absent from the progress record) ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterState {
    /// Translated, but the append or the progress save failed.
    Failed,
    Done,
    /// Already recorded, or declined by the operator.
    Skipped,
}

/// A chapter's lines next to their translations.
///
/// `translated_lines` always has the same length as `original_lines`; lines
/// that were blank or failed to translate are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedChapter {
    pub chapter_id: usize,
    pub original_lines: Vec<String>,
    pub translated_lines: Vec<String>,
}

impl TranslatedChapter {
    /// Translated lines joined with `\n`.
    pub fn translated_text(&self) -> String {
        self.translated_lines.join("\n")
    }

    /// Number of lines left empty although the source line was not blank.
    pub fn failed_lines(&self) -> usize {
        self.original_lines
            .iter()
            .zip(&self.translated_lines)
            .filter(|(original, translated)| !original.trim().is_empty() && translated.is_empty())
            .count()
    }
}

/// What happened to each chapter in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Chapters translated, appended and recorded in this run.
    pub translated: Vec<usize>,
    /// Chapters skipped because they were already recorded.
    pub already_done: Vec<usize>,
    /// Chapters the operator declined.
    pub declined: Vec<usize>,
    /// Chapters whose append or progress save failed.
    pub failed: Vec<usize>,
}

/// Orchestrates translation of segmented chapters.
pub struct Pipeline {
    config: PipelineConfig,
    gateway: Box<dyn TranslationGateway>,
    progress: ProgressStore,
    output_path: PathBuf,
    console: Console,
}

impl Pipeline {
    /// Create a new Pipeline writing to `output_path` and recording progress in `progress`.
    pub fn new(
        config: PipelineConfig,
        gateway: Box<dyn TranslationGateway>,
        progress: ProgressStore,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            gateway,
            progress,
            output_path: output_path.into(),
            console: Console::new(),
        }
    }

    /// Uses the given console for output.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Path of the output artifact.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Loads the progress record, warning if an existing file was unusable.
    pub fn load_progress(&self) -> ProgressRecord {
        let (record, status) = self.progress.load();
        match status {
            LoadStatus::Loaded => self.console.info(&format!(
                "Loaded progress: {} chapter(s) already translated",
                record.len()
            )),
            LoadStatus::Missing => self.console.info(&format!(
                "{} not found, starting with no translated chapters",
                self.progress.path().display()
            )),
            LoadStatus::Corrupt(e) => self.console.warning(&format!(
                "{} is unusable ({}); starting from scratch, completed chapters may be translated again",
                self.progress.path().display(),
                e
            )),
        }
        record
    }

    /// Prints how much work remains in batch mode, where
    /// every pending chapter is estimated at the full chapter size.
    pub fn report_estimate(&self, chapters: &[Chapter], record: &ProgressRecord) {
        let remaining = chapters.iter().filter(|c| !record.contains(c.id)).count();
        self.console.info(&format!(
            "{} of {} chapter(s) remaining, estimated {} characters to translate in batch mode",
            self.console.count(remaining),
            chapters.len(),
            remaining * self.config.max_chars_per_chapter
        ));
    }

    /// Runs the pipeline over `chapters` in ascending id order.
    ///
    /// `record` is the state obtained from [`Pipeline::load_progress`]; it is
    /// updated and saved as chapters complete. `operator` is only consulted
    /// in interactive mode.
    pub async fn run(
        &self,
        chapters: &[Chapter],
        mut record: ProgressRecord,
        mode: DriveMode,
        operator: &mut dyn Operator,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        let mut ordered: Vec<&Chapter> = chapters.iter().collect();
        ordered.sort_by_key(|c| c.id);

        for chapter in ordered {
            let id = chapter.id;
            let state = if record.contains(id) {
                self.console
                    .info(&format!("{} already translated, skipping", chapter.label()));
                summary.already_done.push(id);
                ChapterState::Skipped
            } else if mode == DriveMode::Interactive && !self.offer(chapter, operator) {
                summary.declined.push(id);
                ChapterState::Skipped
            } else {
                self.process_chapter(chapter, &mut record).await
            };

            match state {
                ChapterState::Done => summary.translated.push(id),
                ChapterState::Skipped => {}
                ChapterState::Failed => summary.failed.push(id),
            }
        }

        summary
    }

    /// Shows a chapter to the operator and asks whether to translate it.
    fn offer(&self, chapter: &Chapter, operator: &mut dyn Operator) -> bool {
        let label = chapter.label();
        self.console.section(&label);
        self.console.info(&format!(
            "Estimated characters: {}",
            self.console.count(chapter.estimated_chars())
        ));
        self.console.info(&format!(
            "Content: {}",
            self.console.muted(&preview(&chapter.text, PREVIEW_CHARS))
        ));

        let accepted = confirm(operator, &label);
        if !accepted {
            self.console.info(&format!("Skipping {}", label));
        }
        accepted
    }

    /// Translates, appends and records one pending chapter.
    ///
    /// Line failures never fail the chapter; only the append or the
    /// progress save can end it in `Failed`. The output is appended before the record is
    /// saved, never the other way around.
    async fn process_chapter(&self, chapter: &Chapter, record: &mut ProgressRecord) -> ChapterState {
        let label = chapter.label();

        self.console.step(&format!(
            "Translating {} ({} lines)...",
            label,
            chapter.line_count()
        ));
        let translated = self.translate_chapter(chapter).await;
        let failed = translated.failed_lines();
        if failed > 0 {
            self.console.warning(&format!(
                "{} line(s) of {} could not be translated and were left empty",
                failed, label
            ));
        }

        let rendered = assembler::render(&chapter.text, &translated.translated_text());
        if let Err(e) = assembler::append(&rendered, &self.output_path) {
            self.console
                .error(&format!("Failed to append {}: {}", label, e));
            return ChapterState::Failed;
        }

        record.insert(chapter.id);
        if let Err(e) = self.progress.save(record) {
            record.rollback(chapter.id);
            self.console.error(&format!(
                "{} was appended to {} but progress could not be saved ({}); it will be translated again next run",
                label,
                self.output_path.display(),
                e
            ));
            return ChapterState::Failed;
        }

        self.console.success(&format!(
            "{} appended to {}",
            label,
            self.output_path.display()
        ));
        ChapterState::Done
    }

    /// Translates every line of a chapter, in order.
    ///
    /// Blank lines are not sent to the gateway. A line whose translation
    /// keeps failing becomes an empty line; the chapter always completes.
    pub async fn translate_chapter(&self, chapter: &Chapter) -> TranslatedChapter {
        let original_lines: Vec<String> = chapter.lines().map(str::to_string).collect();
        let total = original_lines.len();
        let label = chapter.label();
        let mut translated_lines = Vec::with_capacity(total);

        for (i, line) in original_lines.iter().enumerate() {
            if line.trim().is_empty() {
                translated_lines.push(String::new());
                continue;
            }

            self.console.info(&format!(
                "{} {}",
                self.console.line_info(&label, i + 1, total),
                preview(line, LINE_PREVIEW_CHARS)
            ));

            let translated = self.translate_line_with_retry(line).await;
            if let Some(ref text) = translated {
                self.console.info(&format!(
                    "Result: {}",
                    self.console.muted(&preview(text, LINE_PREVIEW_CHARS))
                ));
            }
            translated_lines.push(translated.unwrap_or_default());

            rate_limit(self.config.request_delay).await;
        }

        TranslatedChapter {
            chapter_id: chapter.id,
            original_lines,
            translated_lines,
        }
    }

    /// Calls the gateway up to `retries` times with exponential backoff.
    async fn translate_line_with_retry(&self, line: &str) -> Option<String> {
        let attempts = self.config.retries.max(1);
        let mut attempt = 0;

        loop {
            match self
                .gateway
                .translate_line(line, &self.config.source_lang, &self.config.target_lang)
                .await
            {
                Ok(translated) => return Some(translated),
                Err(e) => {
                    attempt += 1;
                    if attempt >= attempts {
                        self.console.warning(&format!(
                            "Translation failed after {} attempt(s): {}",
                            attempts, e
                        ));
                        return None;
                    }

                    let delay = Duration::from_secs(2u64.pow(attempt));
                    self.console.warning(&format!(
                        "Translation failed ({}), retrying in {:?} (attempt {}/{})",
                        e,
                        delay,
                        attempt + 1,
                        attempts
                    ));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Applies the fixed delay between gateway calls.
async fn rate_limit(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
