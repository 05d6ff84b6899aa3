//! Live and final typing statistics.
//!
//! Everything here is a pure function of a [`Session`] and a clock reading.
//! The live path ([`live_metrics`]) is cheap enough to run on every tick;
//! [`confidence`] and [`complexity_factor`] walk the whole log or text and
//! only run once, when a result is compiled.

use std::collections::HashSet;
use std::time::Instant;

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::config::ModeConfig;
use crate::session::{LifecycleState, Session};
use crate::util::{mean, variance};

/// Standard word length used for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;
/// Lower bound on elapsed time so rates right after the first key stay finite.
pub const MIN_ELAPSED_SECS: f64 = 0.1;
/// Number of most recent intervals the burst window looks at.
pub const BURST_WINDOW: usize = 10;
/// Cap on the share of raw WPM lost to mistakes.
pub const MAX_ERROR_PENALTY: f64 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BurstSpeed {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Snapshot recomputed on every tick; never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LiveMetrics {
    pub lifecycle: LifecycleState,
    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
    pub elapsed_secs: f64,
    pub remaining_secs: Option<f64>,
    pub progress_percent: f64,
    pub burst_speed: BurstSpeed,
    pub cursor: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComplexityLevel {
    Easy,
    Medium,
    Hard,
}

impl ComplexityLevel {
    /// Fixed thresholds: below 1 is easy, below 2 is medium.
    pub fn from_factor(factor: f64) -> Self {
        if factor < 1.0 {
            ComplexityLevel::Easy
        } else if factor < 2.0 {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::Hard
        }
    }
}

/// Seconds since the first key, floored at [`MIN_ELAPSED_SECS`].
/// Zero while idle; frozen at the finish time once finished.
pub fn elapsed_secs(session: &Session, now: Instant) -> f64 {
    let Some(started_at) = session.started_at else {
        return 0.0;
    };
    let end = session.finished_at.unwrap_or(now);
    let secs = end.saturating_duration_since(started_at).as_millis() as f64 / 1000.0;
    secs.max(MIN_ELAPSED_SECS)
}

pub fn remaining_secs(limit_secs: f64, elapsed_secs: f64) -> f64 {
    (limit_secs - elapsed_secs).max(0.0)
}

pub fn raw_wpm(correct_chars: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    ((correct_chars as f64 / CHARS_PER_WORD) / elapsed_secs * 60.0).round()
}

pub fn error_penalty(correct_chars: usize, incorrect_chars: usize) -> f64 {
    let total = (correct_chars + incorrect_chars).max(1);
    (incorrect_chars as f64 / total as f64).min(MAX_ERROR_PENALTY)
}

pub fn net_wpm(raw_wpm: f64, correct_chars: usize, incorrect_chars: usize) -> f64 {
    (raw_wpm * (1.0 - error_penalty(correct_chars, incorrect_chars))).round()
}

pub fn accuracy(correct_chars: usize, incorrect_chars: usize) -> f64 {
    let total = correct_chars + incorrect_chars;
    if total == 0 {
        return 100.0;
    }
    (correct_chars as f64 / total as f64 * 100.0).round()
}

pub fn progress_percent(mode: &ModeConfig, session: &Session, elapsed_secs: f64) -> f64 {
    let pct = match mode.time_limit_secs() {
        Some(limit) => elapsed_secs / limit * 100.0,
        None => session.cursor as f64 / session.target_len().max(1) as f64 * 100.0,
    };
    pct.clamp(0.0, 100.0)
}

/// Min, max and mean characters-per-minute over the most recent intervals.
pub fn burst_speed(intervals_ms: &[f64]) -> BurstSpeed {
    let start = intervals_ms.len().saturating_sub(BURST_WINDOW);
    let cpm: Vec<f64> = intervals_ms[start..]
        .iter()
        .filter(|&&ms| ms > 0.0)
        .map(|ms| 60_000.0 / ms)
        .collect();

    let (min, max) = match cpm.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => return BurstSpeed::default(),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };

    BurstSpeed {
        min,
        max,
        mean: mean(&cpm).unwrap_or(0.0),
    }
}

/// Timing consistency in `(0, 1]`; 1 when there are fewer than two intervals.
pub fn confidence(intervals_ms: &[f64]) -> f64 {
    if intervals_ms.len() < 2 {
        return 1.0;
    }
    let var = variance(intervals_ms).unwrap_or(0.0);
    // keep the lower bound open even when exp underflows
    (-var / 1000.0).exp().max(f64::MIN_POSITIVE)
}

/// Average word length times distinct character count, over 100.
pub fn complexity_factor(text: &str) -> f64 {
    let word_lengths: Vec<f64> = text
        .split_whitespace()
        .map(|w| w.chars().count() as f64)
        .collect();
    let Some(avg_word_len) = mean(&word_lengths) else {
        return 0.0;
    };
    let distinct = text.chars().collect::<HashSet<char>>().len();

    avg_word_len * distinct as f64 / 100.0
}

pub fn live_metrics(session: &Session, mode: &ModeConfig, now: Instant) -> LiveMetrics {
    let elapsed = elapsed_secs(session, now);
    let correct = session.correct_count;
    let incorrect = session.incorrect_count;

    let raw = if session.has_started() {
        raw_wpm(correct, elapsed)
    } else {
        0.0
    };

    LiveMetrics {
        lifecycle: session.lifecycle,
        wpm: net_wpm(raw, correct, incorrect),
        raw_wpm: raw,
        accuracy: accuracy(correct, incorrect),
        elapsed_secs: elapsed,
        remaining_secs: mode
            .time_limit_secs()
            .map(|limit| remaining_secs(limit, elapsed)),
        progress_percent: progress_percent(mode, session, elapsed),
        burst_speed: burst_speed(&session.intervals_ms()),
        cursor: session.cursor,
        correct_chars: correct,
        incorrect_chars: incorrect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::typing_policy::apply_key;
    use std::time::Duration;

    fn typed(text: &str, keys: &[(char, u64)]) -> (Session, Instant) {
        let base = Instant::now();
        let mut session = Session::new(text).unwrap();
        for &(c, ms) in keys {
            apply_key(&mut session, Key::Char(c), base + Duration::from_millis(ms));
        }
        (session, base)
    }

    #[test]
    fn idle_session_reports_defaults() {
        let session = Session::new("hello").unwrap();
        let m = live_metrics(&session, &ModeConfig::Time { limit_secs: 30.0 }, Instant::now());

        assert_eq!(m.lifecycle, LifecycleState::Idle);
        assert_eq!(m.elapsed_secs, 0.0);
        assert_eq!(m.wpm, 0.0);
        assert_eq!(m.raw_wpm, 0.0);
        assert_eq!(m.accuracy, 100.0);
        assert_eq!(m.remaining_secs, Some(30.0));
        assert_eq!(m.progress_percent, 0.0);
        assert_eq!(m.burst_speed, BurstSpeed::default());
    }

    #[test]
    fn elapsed_is_floored_right_after_start() {
        let (session, base) = typed("hello", &[('h', 0)]);
        assert_eq!(elapsed_secs(&session, base), MIN_ELAPSED_SECS);
        assert_eq!(elapsed_secs(&session, base + Duration::from_millis(2500)), 2.5);
    }

    #[test]
    fn wpm_from_correct_chars() {
        // 10 correct chars in 6 seconds: 2 words / 0.1 min = 20 wpm
        assert_eq!(raw_wpm(10, 6.0), 20.0);
        assert_eq!(net_wpm(20.0, 10, 0), 20.0);
    }

    #[test]
    fn error_penalty_is_capped_at_half() {
        assert_eq!(error_penalty(0, 0), 0.0);
        assert_eq!(error_penalty(3, 1), 0.25);
        assert_eq!(error_penalty(1, 9), 0.5);
        assert_eq!(net_wpm(40.0, 3, 1), 30.0);
        assert_eq!(net_wpm(40.0, 1, 9), 20.0);
    }

    #[test]
    fn accuracy_rounds_and_defaults_to_full() {
        assert_eq!(accuracy(0, 0), 100.0);
        assert_eq!(accuracy(3, 0), 100.0);
        assert_eq!(accuracy(2, 1), 67.0);
        assert_eq!(accuracy(0, 4), 0.0);
    }

    #[test]
    fn all_correct_keystrokes_mean_full_accuracy() {
        let (session, base) = typed("hello", &[('h', 0), ('e', 90), ('l', 200), ('l', 310)]);
        let m = live_metrics(&session, &ModeConfig::Words, base + Duration::from_secs(1));
        assert_eq!(m.accuracy, 100.0);
        assert_eq!(m.progress_percent, 80.0);
        assert_eq!(m.remaining_secs, None);
    }

    #[test]
    fn time_progress_is_clamped() {
        let (session, base) = typed("hello", &[('h', 0)]);
        let mode = ModeConfig::Time { limit_secs: 10.0 };

        let m = live_metrics(&session, &mode, base + Duration::from_secs(5));
        assert_eq!(m.progress_percent, 50.0);
        assert_eq!(m.remaining_secs, Some(5.0));

        let m = live_metrics(&session, &mode, base + Duration::from_secs(25));
        assert_eq!(m.progress_percent, 100.0);
        assert_eq!(m.remaining_secs, Some(0.0));
    }

    #[test]
    fn burst_uses_only_the_recent_window() {
        let mut intervals = vec![10.0; 5];
        intervals.extend([100.0, 200.0, 0.0, 100.0, 200.0, 100.0, 200.0, 100.0, 200.0, 100.0]);

        let burst = burst_speed(&intervals);

        assert_eq!(burst.min, 300.0);
        assert_eq!(burst.max, 600.0);
        // 5 intervals at 600 cpm and 4 at 300 cpm, the zero is skipped
        assert!((burst.mean - 4200.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn burst_without_valid_intervals_is_zero() {
        assert_eq!(burst_speed(&[]), BurstSpeed::default());
        assert_eq!(burst_speed(&[0.0, 0.0]), BurstSpeed::default());
        let one = burst_speed(&[250.0]);
        assert_eq!((one.min, one.max, one.mean), (240.0, 240.0, 240.0));
    }

    #[test]
    fn confidence_defaults_to_one_with_few_samples() {
        assert_eq!(confidence(&[]), 1.0);
        assert_eq!(confidence(&[120.0]), 1.0);
    }

    #[test]
    fn confidence_decays_with_variance() {
        assert_eq!(confidence(&[100.0, 100.0, 100.0]), 1.0);

        // variance 2500 -> exp(-2.5)
        let c = confidence(&[100.0, 200.0]);
        assert!((c - (-2.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn confidence_stays_positive_for_erratic_typing() {
        let c = confidence(&[10.0, 5000.0, 20.0, 9000.0]);
        assert!(c > 0.0 && c <= 1.0);
    }

    #[test]
    fn complexity_factor_and_levels() {
        // "cat": avg len 3, distinct 3 -> 0.09
        assert!((complexity_factor("cat") - 0.09).abs() < 1e-12);
        assert_eq!(complexity_factor("   "), 0.0);

        // two words of 5, distinct chars {a,b,c,d,e,' ',v,w,x,y,z} = 11 -> 0.55
        assert!((complexity_factor("abcde vwxyz") - 0.55).abs() < 1e-12);

        assert_eq!(ComplexityLevel::from_factor(0.99), ComplexityLevel::Easy);
        assert_eq!(ComplexityLevel::from_factor(1.0), ComplexityLevel::Medium);
        assert_eq!(ComplexityLevel::from_factor(1.99), ComplexityLevel::Medium);
        assert_eq!(ComplexityLevel::from_factor(2.0), ComplexityLevel::Hard);
        assert_eq!(ComplexityLevel::Hard.to_string(), "hard");
    }

    #[test]
    fn finished_sessions_freeze_the_clock() {
        let (mut session, base) = typed("hi", &[('h', 0), ('i', 500)]);
        session.finished_at = Some(base + Duration::from_secs(2));
        session.lifecycle = LifecycleState::Finished;

        assert_eq!(elapsed_secs(&session, base + Duration::from_secs(60)), 2.0);
    }
}
