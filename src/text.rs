//! Practice text acquisition.
//!
//! The engine only ever sees a non-empty string. Providers here produce it;
//! [`FallbackProvider`] guarantees one even when the inner source fails.

use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::{Config, Mode};
use crate::error::{Error, Result};

pub const FALLBACK_TEXT: &str = "The quick brown fox jumps over the lazy dog. Programming is the process of creating a set of instructions that tell a computer how to perform a task. Programming can be done using a variety of computer programming languages, such as JavaScript, Python, and C++. The art of programming lies in organizing your logic into meaningful steps that a computer can interpret.";

const QUOTES: [&str; 4] = [
    "Machine learning algorithms analyze vast amounts of data to identify patterns and make predictions without explicit programming.",
    "Web development involves creating and maintaining websites using a combination of frontend and backend technologies.",
    "Container orchestration platforms manage the deployment and scaling of application containers across environments.",
    "The process of mastering programming languages requires consistent practice and dedication to fundamentals.",
];

const ENGLISH_WORDS: [&str; 100] = [
    "the", "be", "of", "and", "a", "to", "in", "he", "have", "it", "that", "for", "they", "with",
    "as", "not", "on", "she", "at", "by", "this", "we", "you", "do", "but", "from", "or", "which",
    "one", "would", "all", "will", "there", "say", "who", "make", "when", "can", "more", "if",
    "no", "man", "out", "other", "so", "what", "time", "up", "go", "about", "than", "into",
    "could", "state", "only", "new", "year", "some", "take", "come", "these", "know", "see",
    "use", "get", "like", "then", "first", "any", "work", "now", "may", "such", "give", "over",
    "think", "most", "even", "find", "day", "also", "after", "way", "many", "must", "look",
    "before", "great", "back", "through", "long", "where", "much", "should", "well", "people",
    "down", "own", "just", "because",
];

/// Words needed so a timed test does not run out of text.
const WORDS_PER_SECOND: u64 = 3;
/// Upper bound on generated words, whatever the limits ask for.
pub const MAX_WORDS: usize = 5_000;

pub trait TextProvider {
    fn generate(&mut self, config: &Config) -> Result<String>;
}

/// Always returns the same text, e.g. a prompt given on the command line.
#[derive(Debug, Clone)]
pub struct FixedText(pub String);

impl TextProvider for FixedText {
    fn generate(&mut self, _config: &Config) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(Error::TextUnavailable("custom prompt is empty".into()));
        }
        Ok(self.0.clone())
    }
}

/// Random words from the built-in list, or a quote in quote mode.
#[derive(Debug)]
pub struct WordListProvider<R: Rng = StdRng> {
    rng: R,
}

impl WordListProvider<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for WordListProvider<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> WordListProvider<R> {
    fn word_count(config: &Config) -> usize {
        let count = match config.mode {
            Mode::Time => {
                let timed = config.time_limit_secs.saturating_mul(WORDS_PER_SECOND);
                config
                    .word_target
                    .max(usize::try_from(timed).unwrap_or(usize::MAX))
            }
            _ => config.word_target,
        };
        count.min(MAX_WORDS)
    }

    fn decorate(&mut self, words: Vec<String>, config: &Config) -> String {
        let last = words.len().saturating_sub(1);
        let mut sentence_start = true;
        let mut out = Vec::with_capacity(words.len());

        for (i, mut word) in words.into_iter().enumerate() {
            if config.numbers && self.rng.gen_bool(0.1) {
                word = self.rng.gen_range(0..1000).to_string();
            }
            if config.punctuation {
                if sentence_start {
                    word = capitalize(&word);
                }
                sentence_start = false;
                if i == last {
                    word.push('.');
                } else if self.rng.gen_bool(0.1) {
                    word.push('.');
                    sentence_start = true;
                } else if self.rng.gen_bool(0.1) {
                    word.push(',');
                }
            }
            out.push(word);
        }

        out.join(" ")
    }
}

impl<R: Rng> TextProvider for WordListProvider<R> {
    fn generate(&mut self, config: &Config) -> Result<String> {
        if config.mode == Mode::Quote {
            let quote = QUOTES
                .choose(&mut self.rng)
                .ok_or_else(|| Error::TextUnavailable("no quotes".into()))?;
            return Ok(quote.to_string());
        }

        let count = Self::word_count(config);
        if count == 0 {
            return Err(Error::TextUnavailable("word target is zero".into()));
        }
        let words: Vec<String> = (0..count)
            .filter_map(|_| ENGLISH_WORDS.choose(&mut self.rng))
            .map(|w| w.to_string())
            .collect();

        Ok(self.decorate(words, config))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Falls back to [`FALLBACK_TEXT`] whenever the inner provider fails or
/// returns only whitespace.
#[derive(Debug)]
pub struct FallbackProvider<P> {
    inner: P,
}

impl<P: TextProvider> FallbackProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: TextProvider> TextProvider for FallbackProvider<P> {
    fn generate(&mut self, config: &Config) -> Result<String> {
        match self.inner.generate(config) {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                warn!("text provider returned empty text, using fallback");
                Ok(FALLBACK_TEXT.to_string())
            }
            Err(e) => {
                warn!("text provider failed ({e}), using fallback");
                Ok(FALLBACK_TEXT.to_string())
            }
        }
    }
}
