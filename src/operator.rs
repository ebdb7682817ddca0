//! Operator interaction: mode selection and per-chapter confirmation.
//!
//! Both prompts are line-oriented. Only exact tokens are accepted; anything
//! else aborts the run (mode selection) or skips the chapter (confirmation).

use crate::error::PipelineError;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Which chapters enter translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DriveMode {
    /// Translate every pending chapter in id order.
    Batch,
    /// Ask before each pending chapter.
    Interactive,
}

impl FromStr for DriveMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "batch" => Ok(Self::Batch),
            "2" | "interactive" => Ok(Self::Interactive),
            other => Err(PipelineError::InvalidMode(other.to_string())),
        }
    }
}

/// Source of operator answers.
pub trait Operator {
    /// Shows `question` and returns the answer line without its line ending.
    /// End of input yields an empty answer.
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Operator reading from a line-oriented input and writing prompts to an output.
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
}

impl TerminalOperator<io::StdinLock<'static>, io::Stdout> {
    /// Operator bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Asks the operator for the drive mode.
pub fn select_mode(operator: &mut dyn Operator) -> Result<DriveMode, PipelineError> {
    let answer = operator.ask(
        "Select translation mode:\n  1. Translate all remaining chapters\n  2. Confirm each chapter\nYour choice (1/2): ",
    )?;
    answer.parse()
}

/// Asks whether a chapter should be translated. Only `y`/`yes` accepts.
pub fn confirm(operator: &mut dyn Operator, label: &str) -> bool {
    match operator.ask(&format!("Translate {}? (y/n): ", label)) {
        Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
