//! Terminal event plumbing between crossterm and the [`Engine`].
//!
//! The runner waits for input no longer than the engine's next due tick, so
//! the metrics cadence is driven by the engine's own schedule rather than a
//! second timer in the host.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::engine::Engine;
use crate::key::Key;
use crate::typing_policy::KeyOutcome;

/// Terminal input as the runner sees it.
#[derive(Clone, Debug)]
pub enum HostEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived before the wait ran out.
    Tick,
}

pub trait EventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread.
pub struct CrosstermEventSource {
    rx: Receiver<HostEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        // exits once the receiver is dropped or the terminal read fails
        std::thread::spawn(move || loop {
            let event = match event::read() {
                // key releases would otherwise type every character twice
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Release => continue,
                Ok(CtEvent::Key(key)) => HostEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => HostEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events fed through a channel, for headless hosts and tests.
pub struct ChannelEventSource {
    rx: Receiver<HostEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<HostEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Keys the host keeps for itself instead of passing them to the test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Same text, fresh session.
    Retry,
    NewText,
}

impl Command {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Esc => Some(Command::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Quit)
            }
            KeyCode::Left => Some(Command::Retry),
            KeyCode::Right => Some(Command::NewText),
            _ => None,
        }
    }
}

/// What a single runner step did to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Command(Command),
    Key(KeyOutcome),
    /// The wait ran out; `ticked` tells whether the engine's cadence was due.
    Tick { ticked: bool },
    Resize,
}

impl Step {
    pub fn needs_redraw(&self) -> bool {
        match self {
            Step::Key(outcome) => outcome.mutated(),
            Step::Tick { ticked } => *ticked,
            Step::Command(_) | Step::Resize => true,
        }
    }
}

pub struct Runner<E: EventSource> {
    source: E,
    idle_wait: Duration,
}

impl<E: EventSource> Runner<E> {
    /// `idle_wait` bounds the wait while no test is running.
    pub fn new(source: E, idle_wait: Duration) -> Self {
        Self { source, idle_wait }
    }

    /// How long the next step may block for input.
    pub fn wait_for(&self, engine: &Engine, now: Instant) -> Duration {
        engine
            .ticker()
            .map_or(self.idle_wait, |t| t.next_due().saturating_duration_since(now))
    }

    /// Wait for input or the next due tick and apply it to the engine.
    pub fn step(&self, engine: &mut Engine) -> Step {
        let wait = self.wait_for(engine, Instant::now());
        let event = match self.source.recv_timeout(wait) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => HostEvent::Tick,
        };
        apply(engine, event, Instant::now())
    }
}

/// Route one event into the engine. Key events are followed by a poll so a
/// steady stream of keys cannot starve the metrics cadence.
pub fn apply(engine: &mut Engine, event: HostEvent, now: Instant) -> Step {
    match event {
        HostEvent::Key(key) => {
            if let Some(command) = Command::from_key(&key) {
                return Step::Command(command);
            }
            let outcome = engine.handle_key(Key::from(key), now);
            engine.poll(now);
            Step::Key(outcome)
        }
        HostEvent::Tick => Step::Tick {
            ticked: engine.poll(now),
        },
        HostEvent::Resize => Step::Resize,
    }
}
