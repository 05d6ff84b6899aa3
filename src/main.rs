pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use devtyper::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    engine::Engine,
    history::{CsvResultLog, ResultSink},
    runtime::{Command, CrosstermEventSource, Runner, Step},
    text::{FallbackProvider, FixedText, TextProvider, WordListProvider},
    Config, Mode, TICK_RATE_MS,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    time::Duration,
};

/// typing practice with live wpm, burst speed and consistency metrics
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// test mode; defaults to the saved config
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// number of seconds to run a time test (1 to 3600)
    #[clap(short = 's', long = "time", value_parser = clap::value_parser!(u64).range(1..=3600))]
    time_limit_secs: Option<u64>,

    /// number of words to generate for a words test
    #[clap(short = 'w', long = "words")]
    word_target: Option<usize>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// add capitalization and punctuation to generated text; `=false` turns it off
    #[clap(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    punctuation: Option<bool>,

    /// mix numbers into generated text; `=false` turns it off
    #[clap(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    numbers: Option<bool>,

    /// accept either case for letters; `=false` turns it off
    #[clap(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    ignore_case: Option<bool>,
}

impl Cli {
    /// Overlay command line flags on the stored config.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(secs) = self.time_limit_secs {
            cfg.time_limit_secs = secs;
        }
        if let Some(words) = self.word_target {
            cfg.word_target = words;
        }
        if let Some(punctuation) = self.punctuation {
            cfg.punctuation = punctuation;
        }
        if let Some(numbers) = self.numbers {
            cfg.numbers = numbers;
        }
        if let Some(ignore_case) = self.ignore_case {
            cfg.case_sensitive = !ignore_case;
        }
        cfg
    }

    fn text_provider(&self) -> Box<dyn TextProvider> {
        match self.prompt.clone() {
            Some(prompt) => Box::new(FallbackProvider::new(FixedText(prompt))),
            None => Box::new(FallbackProvider::new(WordListProvider::new())),
        }
    }
}

pub struct App {
    pub engine: Engine,
    pub config: Config,
    provider: Box<dyn TextProvider>,
}

impl App {
    fn new(cli: &Cli, config: Config) -> Result<Self, Box<dyn Error>> {
        let mut provider = cli.text_provider();
        let text = provider.generate(&config)?;
        let mut engine = Engine::new(text, config.clone())?;

        let mut sink = CsvResultLog::new();
        engine.on_complete(move |result| {
            if let Err(e) = sink.record(result) {
                warn!("could not append to {}: {e}", sink.path().display());
            }
        });

        Ok(Self {
            engine,
            config,
            provider,
        })
    }

    /// Request new text and start a fresh session with it.
    fn new_text(&mut self) -> Result<(), Box<dyn Error>> {
        let token = self.engine.request_text();
        let text = self.provider.generate(&self.config)?;
        self.engine.start_with(token, text, self.config.clone())?;
        Ok(())
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let env = env_logger::Env::new().filter_or("DEVTYPER_LOG", "warn");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    let mut app = App::new(&cli, config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&app.config) {
        warn!("could not save config to {}: {e}", store.path().display());
    }

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    loop {
        let step = runner.step(&mut app.engine);
        match step {
            Step::Command(Command::Quit) => break,
            Step::Command(Command::Retry) => app.engine.restart()?,
            Step::Command(Command::NewText) => app.new_text()?,
            _ => {}
        }

        if step.needs_redraw() {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    info!("exiting");
    Ok(())
}
