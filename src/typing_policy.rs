use std::time::Instant;

use log::debug;

use crate::key::Key;
use crate::session::{KeystrokeRecord, LifecycleState, Session};

/// What the keystroke processor did with one key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Non-content key; the session was not touched.
    Ignored,
    /// Late or overflowing event; the session was not touched.
    Dropped,
    /// Backspace recorded.
    Corrected,
    /// Content key recorded against the expected character.
    Typed { correct: bool },
}

impl KeyOutcome {
    pub fn mutated(&self) -> bool {
        matches!(self, KeyOutcome::Corrected | KeyOutcome::Typed { .. })
    }
}

fn start_if_idle(session: &mut Session, now: Instant) {
    if session.lifecycle == LifecycleState::Idle {
        session.started_at = Some(now);
        session.lifecycle = LifecycleState::Running;
        debug!("session started ({} chars)", session.target_len());
    }
}

fn push_record(session: &mut Session, key: &Key, was_correct: bool, now: Instant) {
    let timestamp_ms = session.elapsed_ms(now);
    let inter_key_interval_ms = session
        .keystroke_log
        .last()
        .map(|prev| timestamp_ms.saturating_sub(prev.timestamp_ms))
        .unwrap_or(0);

    session.keystroke_log.push(KeystrokeRecord {
        key: key.label(),
        timestamp_ms,
        was_correct,
        inter_key_interval_ms,
    });
}

fn write_backspace(session: &mut Session, now: Instant) -> KeyOutcome {
    start_if_idle(session, now);

    session.cursor = session.cursor.saturating_sub(1);
    session.input_log.pop();
    // counts and the error map are a permanent tally; only the cursor moves back
    push_record(session, &Key::Backspace, true, now);

    KeyOutcome::Corrected
}

fn write_char(session: &mut Session, c: char, now: Instant) -> KeyOutcome {
    let Some(expected) = session.expected_char(session.cursor) else {
        // only reachable in time mode once the text is exhausted
        return KeyOutcome::Dropped;
    };

    start_if_idle(session, now);

    let correct = session.chars_match(c, expected);
    if correct {
        session.correct_count += 1;
    } else {
        session.incorrect_count += 1;
        *session.error_map.entry(expected).or_insert(0) += 1;
    }

    session.input_log.push(c);
    session.cursor += 1;
    push_record(session, &Key::Char(c), correct, now);

    KeyOutcome::Typed { correct }
}

/// Apply one key event to the session, in arrival order.
pub fn apply_key(session: &mut Session, key: Key, now: Instant) -> KeyOutcome {
    if session.is_finished() {
        return KeyOutcome::Dropped;
    }

    match key {
        Key::Ignored => KeyOutcome::Ignored,
        Key::Backspace => write_backspace(session, now),
        Key::Char(c) => write_char(session, c, now),
    }
}
