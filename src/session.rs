use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleState {
    Idle,
    Running,
    Finished,
}

/// One accepted key event, content or backspace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeystrokeRecord {
    pub key: String,
    /// Milliseconds since the session started.
    pub timestamp_ms: u64,
    pub was_correct: bool,
    /// Elapsed time since the previous record, 0 for the first.
    pub inter_key_interval_ms: u64,
}

/// Display status of a single target character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect,
    Current,
    Upcoming,
}

/// State of one test run. Owned by the engine, mutated by the keystroke
/// processor while running and read-only once finished.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    target_text: String,
    target: Vec<char>,
    pub case_sensitive: bool,
    pub input_log: Vec<char>,
    pub cursor: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub error_map: BTreeMap<char, u32>,
    pub keystroke_log: Vec<KeystrokeRecord>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub lifecycle: LifecycleState,
}

impl Session {
    pub fn new(target_text: impl Into<String>) -> Result<Self> {
        let target_text = target_text.into();
        if target_text.is_empty() {
            return Err(Error::EmptyText);
        }

        Ok(Self {
            target: target_text.chars().collect(),
            target_text,
            case_sensitive: true,
            input_log: Vec::new(),
            cursor: 0,
            correct_count: 0,
            incorrect_count: 0,
            error_map: BTreeMap::new(),
            keystroke_log: Vec::new(),
            started_at: None,
            finished_at: None,
            lifecycle: LifecycleState::Idle,
        })
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    /// Length of the target in characters.
    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.target.get(idx).copied()
    }

    pub fn total_chars(&self) -> usize {
        self.correct_count + self.incorrect_count
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.target.len()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.lifecycle == LifecycleState::Finished
    }

    /// Compare a typed character against the expected one, honouring
    /// `case_sensitive`.
    pub fn chars_match(&self, typed: char, expected: char) -> bool {
        if self.case_sensitive {
            typed == expected
        } else {
            typed.to_lowercase().eq(expected.to_lowercase())
        }
    }

    /// Typed text so far.
    pub fn input_text(&self) -> String {
        self.input_log.iter().collect()
    }

    pub fn char_status(&self, idx: usize) -> CharStatus {
        match self.input_log.get(idx) {
            Some(&typed) if self.expected_char(idx).is_some_and(|e| self.chars_match(typed, e)) => {
                CharStatus::Correct
            }
            Some(_) => CharStatus::Incorrect,
            None if idx == self.cursor => CharStatus::Current,
            None => CharStatus::Upcoming,
        }
    }

    /// Milliseconds between the session start and `now`, 0 before start.
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        self.started_at
            .map(|start| now.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or(0)
    }

    /// Inter-key intervals in arrival order, first record excluded.
    pub fn intervals_ms(&self) -> Vec<f64> {
        self.keystroke_log
            .iter()
            .skip(1)
            .map(|r| r.inter_key_interval_ms as f64)
            .collect()
    }
}
