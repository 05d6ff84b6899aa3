use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::Serialize;

use crate::config::{Mode, ModeConfig};
use crate::metrics::{self, BurstSpeed, ComplexityLevel, CHARS_PER_WORD};
use crate::session::{KeystrokeRecord, Session};
use crate::time_series::TimeSeriesPoint;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypingPhysics {
    pub base_wpm: f64,
    pub confidence: f64,
    pub burst_speed: BurstSpeed,
    pub complexity_factor: f64,
    pub error_density: f64,
}

/// Immutable summary of one finished run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestResult {
    pub id: String,
    pub date: DateTime<Local>,
    pub mode: Mode,
    pub language: String,
    pub time_attack_mode: bool,

    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
    pub duration_secs: f64,
    pub remaining_secs: Option<f64>,
    pub progress_percent: f64,
    pub burst_speed: BurstSpeed,

    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
    pub error_map: BTreeMap<char, u32>,
    pub keystrokes: Vec<KeystrokeRecord>,
    pub wpm_history: Vec<TimeSeriesPoint>,

    pub confidence: f64,
    pub complexity_factor: f64,
    pub complexity_level: ComplexityLevel,
    pub physics: TypingPhysics,
}

/// Raw WPM from the instantaneous rate between consecutive correct
/// characters. `None` when no pair with a positive interval exists.
pub fn raw_wpm_from_keystrokes(keystrokes: &[KeystrokeRecord]) -> Option<f64> {
    let rates: Vec<f64> = keystrokes
        .iter()
        .filter(|k| k.was_correct && k.key != "Backspace")
        .tuple_windows()
        .map(|(a, b)| b.timestamp_ms.saturating_sub(a.timestamp_ms))
        .filter(|&ms| ms > 0)
        .map(|ms| 60_000.0 / ms as f64)
        .collect();

    if rates.is_empty() {
        return None;
    }
    Some((rates.iter().sum::<f64>() / CHARS_PER_WORD).round())
}

/// Build the result for a finished session. `now` is only consulted when
/// the session carries no finish time.
pub fn compile_result(
    session: &Session,
    mode: &ModeConfig,
    language: &str,
    wpm_history: Vec<TimeSeriesPoint>,
    now: Instant,
) -> TestResult {
    debug_assert!(session.is_finished(), "results are compiled from finished sessions");

    let completed_at = session.finished_at.unwrap_or(now);
    let live = metrics::live_metrics(session, mode, completed_at);
    let intervals = session.intervals_ms();

    let confidence = metrics::confidence(&intervals);
    let complexity_factor = metrics::complexity_factor(session.target_text());
    let total_chars = session.total_chars();
    let error_density = session.incorrect_count as f64 / total_chars.max(1) as f64;
    let date = Local::now();

    TestResult {
        id: format!("test-{}", date.timestamp_millis()),
        date,
        mode: mode.mode(),
        language: language.to_string(),
        time_attack_mode: mode.mode() == Mode::Time,

        wpm: live.wpm,
        raw_wpm: raw_wpm_from_keystrokes(&session.keystroke_log).unwrap_or(live.wpm),
        accuracy: live.accuracy,
        duration_secs: live.elapsed_secs,
        remaining_secs: live.remaining_secs,
        progress_percent: live.progress_percent,
        burst_speed: live.burst_speed,

        correct_chars: session.correct_count,
        incorrect_chars: session.incorrect_count,
        total_chars,
        error_map: session.error_map.clone(),
        keystrokes: session.keystroke_log.clone(),
        wpm_history,

        confidence,
        complexity_factor,
        complexity_level: ComplexityLevel::from_factor(complexity_factor),
        physics: TypingPhysics {
            base_wpm: live.wpm,
            confidence,
            burst_speed: live.burst_speed,
            complexity_factor,
            error_density,
        },
    }
}
