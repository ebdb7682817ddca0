//! novel-trans - resumable line-by-line novel translator.
//!
//! This library provides functionality for:
//! - Splitting a novel into bounded-size chapters at line boundaries
//! - Translating each chapter line by line through a pluggable gateway
//! - Writing interleaved original/translated output that survives restarts

pub mod assembler;
pub mod chapter_store;
pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod operator;
pub mod pipeline;
pub mod progress;
pub mod segmenter;
pub mod source;

// Re-export commonly used types
pub use chapter_store::{ChapterManifest, ChapterStore, PersistOutcome};
pub use config::{Config, PipelineConfig, WorkPaths};
pub use console::Console;
pub use error::{
    ConfigError, InputError, PipelineError, ProgressError, StorageError, TranslationError,
};
pub use gateway::{ChatGateway, TranslationGateway};
pub use operator::{DriveMode, Operator, TerminalOperator};
pub use pipeline::{ChapterState, Pipeline, RunSummary, TranslatedChapter};
pub use progress::{ProgressRecord, ProgressStore};
pub use segmenter::{Chapter, segment};
