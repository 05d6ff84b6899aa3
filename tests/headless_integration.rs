use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use devtyper::runtime::{ChannelEventSource, Command, HostEvent, Runner, Step};
use devtyper::{Config, Engine, LifecycleState, Mode, TestResult};

fn key(code: KeyCode) -> HostEvent {
    HostEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn collecting(engine: &mut Engine) -> Rc<RefCell<Vec<TestResult>>> {
    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&results);
    engine.on_complete(move |r| sink.borrow_mut().push(r.clone()));
    results
}

// Headless integration using the runtime + Engine without a TTY
// Verifies that a minimal typing flow completes via Runner/ChannelEventSource.
#[test]
fn headless_typing_flow_completes() {
    let config = Config {
        mode: Mode::Words,
        ..Config::default()
    };
    let mut engine = Engine::new("hi", config)
        .unwrap()
        .with_tick_interval(Duration::from_millis(5));
    let results = collecting(&mut engine);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(5));

    tx.send(key(KeyCode::Char('h'))).unwrap();
    tx.send(key(KeyCode::Tab)).unwrap();
    tx.send(key(KeyCode::Char('i'))).unwrap();

    for _ in 0..100u32 {
        runner.step(&mut engine);
        if engine.lifecycle() == LifecycleState::Finished {
            break;
        }
    }

    assert_eq!(engine.lifecycle(), LifecycleState::Finished);
    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].correct_chars, 2);
    assert_eq!(results[0].accuracy, 100.0);
    assert_eq!(results[0].keystrokes.len(), 2);
}

#[test]
fn headless_timed_session_finishes_by_time() {
    let config = Config {
        mode: Mode::Time,
        time_limit_secs: 1,
        ..Config::default()
    };
    let mut engine = Engine::new("hello world", config)
        .unwrap()
        .with_tick_interval(Duration::from_millis(10));
    let results = collecting(&mut engine);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(10));
    tx.send(key(KeyCode::Char('h'))).unwrap();

    // up to ~3s
    for _ in 0..300u32 {
        runner.step(&mut engine);
        if engine.lifecycle() == LifecycleState::Finished {
            break;
        }
    }

    assert_eq!(
        engine.lifecycle(),
        LifecycleState::Finished,
        "timed session should finish by timeout"
    );
    assert!(!engine.is_ticking());
    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert!(results[0].time_attack_mode);
    assert!(results[0].duration_secs >= 1.0);
    assert_eq!(results[0].progress_percent, 100.0);
}

#[test]
fn host_commands_are_reported_not_typed() {
    let config = Config {
        mode: Mode::Words,
        ..Config::default()
    };
    let mut engine = Engine::new("hi", config).unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(5));
    tx.send(key(KeyCode::Char('h'))).unwrap();
    tx.send(key(KeyCode::Left)).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();

    assert!(matches!(runner.step(&mut engine), Step::Key(_)));
    assert_eq!(runner.step(&mut engine), Step::Command(Command::Retry));
    assert_eq!(runner.step(&mut engine), Step::Command(Command::Quit));
    assert_eq!(engine.session().cursor, 1);
}
