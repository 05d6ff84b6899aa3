//! Lifecycle controller: idle → running → finished.
//!
//! The engine owns the one live [`Session`], feeds key events through the
//! keystroke processor, drives live metrics off its own tick schedule and
//! compiles exactly one [`TestResult`] per session. The tick schedule is a
//! plain value owned by the engine, so dropping or resetting the engine can
//! never leave a timer behind.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::{CompletionTrigger, Config, ModeConfig};
use crate::error::Result;
use crate::key::Key;
use crate::metrics::{self, LiveMetrics};
use crate::result::{compile_result, TestResult};
use crate::session::{LifecycleState, Session};
use crate::time_series::WpmHistory;
use crate::typing_policy::{apply_key, KeyOutcome};
use crate::TICK_RATE_MS;

pub type CompletionCallback = Box<dyn FnMut(&TestResult)>;

/// Shortest accepted tick interval; the cadence has to move forward.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Armed metrics cadence. Exists only while a session is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle {
    interval: Duration,
    next_due: Instant,
}

impl TickHandle {
    fn arm(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    fn advance(&mut self, now: Instant) {
        while self.next_due <= now {
            self.next_due += self.interval;
        }
    }
}

/// Ticket for one asynchronous text request. Only the most recent ticket
/// can start a session, and only once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartToken(u64);

pub struct Engine {
    session: Session,
    config: Config,
    mode: ModeConfig,
    tick_interval: Duration,
    ticker: Option<TickHandle>,
    history: WpmHistory,
    live: LiveMetrics,
    result: Option<TestResult>,
    on_complete: Option<CompletionCallback>,
    generation: u64,
    pending: Option<u64>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("session", &self.session)
            .field("mode", &self.mode)
            .field("ticker", &self.ticker)
            .field("finished", &self.result.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new(target_text: impl Into<String>, config: Config) -> Result<Self> {
        let session = Session::new(target_text)?.with_case_sensitive(config.case_sensitive);
        let mode = config.mode_config();
        let live = metrics::live_metrics(&session, &mode, Instant::now());

        Ok(Self {
            session,
            config,
            mode,
            tick_interval: Duration::from_millis(TICK_RATE_MS),
            ticker: None,
            history: WpmHistory::default(),
            live,
            result: None,
            on_complete: None,
            generation: 0,
            pending: None,
        })
    }

    /// Override the metrics cadence. Intervals below [`MIN_TICK_INTERVAL`]
    /// are raised to it.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        self
    }

    /// Register the receiver of the finished result.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&TestResult) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> &ModeConfig {
        &self.mode
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.session.lifecycle
    }

    /// Metrics as of the last tick (or completion).
    pub fn live_metrics(&self) -> &LiveMetrics {
        &self.live
    }

    /// Fresh metrics without waiting for the next tick.
    pub fn metrics_at(&self, now: Instant) -> LiveMetrics {
        metrics::live_metrics(&self.session, &self.mode, now)
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn ticker(&self) -> Option<&TickHandle> {
        self.ticker.as_ref()
    }

    /// Feed one key event. Completes the session when a cursor-driven mode
    /// reaches the end of the text.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> KeyOutcome {
        let was_idle = self.session.lifecycle == LifecycleState::Idle;
        let outcome = apply_key(&mut self.session, key, now);

        if was_idle && self.session.lifecycle == LifecycleState::Running {
            self.ticker = Some(TickHandle::arm(self.tick_interval, now));
            info!("test started in {} mode", self.mode.mode());
        }

        if matches!(outcome, KeyOutcome::Typed { .. })
            && self.mode.trigger() == CompletionTrigger::Cursor
            && self.mode.is_complete(&self.session, now)
        {
            self.complete(now);
        }

        outcome
    }

    /// Run one metrics tick. Returns false when no cadence is armed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(ticker) = self.ticker.as_mut() else {
            return false;
        };
        ticker.advance(now);

        self.live = metrics::live_metrics(&self.session, &self.mode, now);
        self.history.sample(self.live.elapsed_secs, self.live.wpm);

        if self.mode.trigger() == CompletionTrigger::Timer && self.mode.is_complete(&self.session, now) {
            self.complete(now);
        }
        true
    }

    /// Tick only if the cadence is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.ticker {
            Some(ticker) if ticker.is_due(now) => self.tick(now),
            _ => false,
        }
    }

    /// Finish a running session. Besides the mode's own completion this is
    /// the host's way to end a test early. Idle and finished sessions are
    /// left alone, so later calls are no-ops.
    pub fn complete(&mut self, now: Instant) {
        if self.session.lifecycle != LifecycleState::Running {
            return;
        }

        self.ticker = None;
        self.session.finished_at = Some(now);
        self.session.lifecycle = LifecycleState::Finished;
        self.live = metrics::live_metrics(&self.session, &self.mode, now);

        let result = compile_result(
            &self.session,
            &self.mode,
            &self.config.language,
            std::mem::take(&mut self.history).into_points(),
            now,
        );
        info!(
            "test finished: {} wpm, {}% acc, {:.2}s",
            result.wpm, result.accuracy, result.duration_secs
        );

        if let Some(callback) = self.on_complete.as_mut() {
            callback(&result);
        }
        self.result = Some(result);
    }

    /// Discard the current session and go back to idle with new text and
    /// options. Cancels the tick cadence and any outstanding text request.
    pub fn reset(&mut self, target_text: impl Into<String>, config: Config) -> Result<()> {
        let session = Session::new(target_text)?.with_case_sensitive(config.case_sensitive);

        self.ticker = None;
        self.pending = None;
        self.mode = config.mode_config();
        self.config = config;
        self.session = session;
        self.history = WpmHistory::default();
        self.result = None;
        self.live = metrics::live_metrics(&self.session, &self.mode, Instant::now());
        debug!("engine reset ({} chars)", self.session.target_len());
        Ok(())
    }

    /// Reset with the same text and options.
    pub fn restart(&mut self) -> Result<()> {
        let text = self.session.target_text().to_string();
        let config = self.config.clone();
        self.reset(text, config)
    }

    /// Issue a token for a new text request, invalidating older ones.
    pub fn request_text(&mut self) -> StartToken {
        self.generation += 1;
        self.pending = Some(self.generation);
        StartToken(self.generation)
    }

    /// Start a fresh session from requested text. Returns `Ok(false)` and
    /// leaves the engine alone if the token is stale or already used.
    pub fn start_with(
        &mut self,
        token: StartToken,
        target_text: impl Into<String>,
        config: Config,
    ) -> Result<bool> {
        if self.pending != Some(token.0) {
            debug!("ignoring text for abandoned request {}", token.0);
            return Ok(false);
        }
        self.reset(target_text, config)?;
        Ok(true)
    }
}
