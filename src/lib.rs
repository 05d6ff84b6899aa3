// Library surface for the typing engine, shared by the TUI binary and tests.
// UI code lives with the binary in main.rs and ui/.
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod key;
pub mod metrics;
pub mod result;
pub mod runtime;
pub mod session;
pub mod text;
pub mod time_series;
pub mod typing_policy;
pub mod util;

/// Metrics cadence while a test is running.
pub const TICK_RATE_MS: u64 = 100;

pub use config::{Config, Mode, ModeConfig};
pub use engine::{Engine, StartToken};
pub use error::{Error, Result};
pub use key::Key;
pub use metrics::LiveMetrics;
pub use result::TestResult;
pub use session::{LifecycleState, Session};
