use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::metrics;
use crate::session::Session;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Time,
    Words,
    Quote,
    Zen,
}

/// Options recognised by a test. Anything absent takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub time_limit_secs: u64,
    pub word_target: usize,
    pub language: String,
    pub punctuation: bool,
    pub numbers: bool,
    pub case_sensitive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Time,
            time_limit_secs: 60,
            word_target: 50,
            language: "english".to_string(),
            punctuation: false,
            numbers: false,
            case_sensitive: true,
        }
    }
}

impl Config {
    /// Build a config from stored options. An option whose value is not
    /// recognised keeps its default; the others are taken as stored.
    pub fn from_stored(stored: Map<String, Value>) -> Config {
        let Ok(Value::Object(mut merged)) = serde_json::to_value(Config::default()) else {
            return Config::default();
        };

        for (option, value) in stored {
            let mut candidate = merged.clone();
            candidate.insert(option.clone(), value);
            if serde_json::from_value::<Config>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                warn!("ignoring unrecognised value for config option `{option}`");
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or_default()
    }

    pub fn mode_config(&self) -> ModeConfig {
        match self.mode {
            Mode::Time => ModeConfig::Time {
                limit_secs: self.time_limit_secs.max(1) as f64,
            },
            Mode::Words => ModeConfig::Words,
            Mode::Quote => ModeConfig::Quote,
            Mode::Zen => ModeConfig::Zen,
        }
    }
}

/// Which event is allowed to end a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTrigger {
    /// Cursor reaching the end of the text, checked after each content key.
    Cursor,
    /// Timer expiry, checked on ticks only.
    Timer,
}

/// Mode configuration reduced to what the lifecycle needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeConfig {
    Time { limit_secs: f64 },
    Words,
    Quote,
    Zen,
}

impl ModeConfig {
    pub fn mode(&self) -> Mode {
        match self {
            ModeConfig::Time { .. } => Mode::Time,
            ModeConfig::Words => Mode::Words,
            ModeConfig::Quote => Mode::Quote,
            ModeConfig::Zen => Mode::Zen,
        }
    }

    pub fn time_limit_secs(&self) -> Option<f64> {
        match self {
            ModeConfig::Time { limit_secs } => Some(*limit_secs),
            _ => None,
        }
    }

    pub fn trigger(&self) -> CompletionTrigger {
        match self {
            ModeConfig::Time { .. } => CompletionTrigger::Timer,
            ModeConfig::Words | ModeConfig::Quote | ModeConfig::Zen => CompletionTrigger::Cursor,
        }
    }

    pub fn is_complete(&self, session: &Session, now: Instant) -> bool {
        match self {
            ModeConfig::Time { limit_secs } => {
                session.has_started()
                    && metrics::remaining_secs(*limit_secs, metrics::elapsed_secs(session, now))
                        <= 0.0
            }
            ModeConfig::Words | ModeConfig::Quote | ModeConfig::Zen => session.at_end(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("devtyper_config.json"));
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

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Map<String, Value>>(&bytes) {
            Ok(stored) => Config::from_stored(stored),
            Err(e) => {
                warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::typing_policy::apply_key;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            mode: Mode::Quote,
            time_limit_secs: 15,
            word_target: 25,
            language: "english".into(),
            punctuation: true,
            numbers: true,
            case_sensitive: false,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn absent_and_unknown_options_take_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"mode": "words", "wordsPerLine": 7}"#).unwrap();
        assert_eq!(cfg.mode, Mode::Words);
        assert_eq!(cfg.time_limit_secs, 60);

        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.mode, Mode::Time);
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn unrecognised_values_fall_back_per_option() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            br#"{"mode": "code", "time_limit_secs": 30, "word_target": -4, "numbers": true}"#,
        )
        .unwrap();

        let cfg = FileConfigStore::with_path(&path).load();

        assert_eq!(cfg.mode, Mode::Time);
        assert_eq!(cfg.time_limit_secs, 30);
        assert_eq!(cfg.word_target, 50);
        assert!(cfg.numbers);
    }

    #[test]
    fn non_object_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"[1, 2, 3]").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn mode_config_variants() {
        let cfg = Config {
            time_limit_secs: 30,
            ..Config::default()
        };
        assert_eq!(cfg.mode_config(), ModeConfig::Time { limit_secs: 30.0 });
        assert_eq!(cfg.mode_config().trigger(), CompletionTrigger::Timer);

        let cfg = Config {
            mode: Mode::Zen,
            ..Config::default()
        };
        assert_eq!(cfg.mode_config().trigger(), CompletionTrigger::Cursor);
        assert_eq!(cfg.mode_config().time_limit_secs(), None);
        assert_eq!(cfg.mode_config().mode().to_string(), "zen");
    }

    #[test]
    fn cursor_modes_complete_at_the_end_of_text() {
        let base = Instant::now();
        let mut session = Session::new("ab").unwrap();
        let mode = ModeConfig::Words;

        apply_key(&mut session, Key::Char('a'), base);
        assert!(!mode.is_complete(&session, base));
        apply_key(&mut session, Key::Char('b'), base);
        assert!(mode.is_complete(&session, base));
    }

    #[test]
    fn time_mode_completes_when_the_limit_elapses() {
        let base = Instant::now();
        let mut session = Session::new("abc").unwrap();
        let mode = ModeConfig::Time { limit_secs: 2.0 };

        assert!(!mode.is_complete(&session, base + Duration::from_secs(5)));

        apply_key(&mut session, Key::Char('a'), base);
        assert!(!mode.is_complete(&session, base + Duration::from_millis(1900)));
        assert!(mode.is_complete(&session, base + Duration::from_secs(2)));
    }
}
