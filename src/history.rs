use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::result::TestResult;

/// Receiver of finished results, typically wired to the engine's
/// completion callback.
pub trait ResultSink {
    fn record(&mut self, result: &TestResult) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    date: String,
    mode: String,
    language: &'a str,
    duration_secs: f64,
    wpm: f64,
    raw_wpm: f64,
    accuracy: f64,
    correct_chars: usize,
    incorrect_chars: usize,
    confidence: f64,
    complexity: String,
}

impl<'a> From<&'a TestResult> for ResultRow<'a> {
    fn from(r: &'a TestResult) -> Self {
        Self {
            date: r.date.to_rfc3339(),
            mode: r.mode.to_string(),
            language: &r.language,
            duration_secs: (r.duration_secs * 100.0).round() / 100.0,
            wpm: r.wpm,
            raw_wpm: r.raw_wpm,
            accuracy: r.accuracy,
            correct_chars: r.correct_chars,
            incorrect_chars: r.incorrect_chars,
            confidence: (r.confidence * 1000.0).round() / 1000.0,
            complexity: r.complexity_level.to_string(),
        }
    }
}

/// Appends one summary row per result to a CSV file. Keystroke logs are
/// not written.
#[derive(Debug, Clone)]
pub struct CsvResultLog {
    path: PathBuf,
}

impl CsvResultLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::results_path().unwrap_or_else(|| PathBuf::from("devtyper_results.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvResultLog {
    fn record(&mut self, result: &TestResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(ResultRow::from(result))?;
        writer.flush()?;
        Ok(())
    }
}
