// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod executor;
mod render;

pub use executor::{ClipboardSink, Executor, InternalEvent};
pub use render::{
    help_overlay_text, key_list_title, render, status_text, tab_titles, value_text, value_title,
};

use anyhow::{Context, Result};
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use rediscope_app::{Event, Key, Session, SessionSettings};
use rediscope_store::KeyValueStore;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub settings: SessionSettings,
    /// Emit `Tick` this often so the highlighted value is re-fetched.
    pub refresh_interval: Option<Duration>,
}

pub fn run_app(
    store: Arc<dyn KeyValueStore>,
    clipboard: Box<dyn ClipboardSink>,
    options: RunOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = match Terminal::new(backend).context("create terminal") {
        Ok(mut terminal) => event_loop(&mut terminal, store, clipboard, options),
        Err(error) => Err(error),
    };

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: Arc<dyn KeyValueStore>,
    clipboard: Box<dyn ClipboardSink>,
    options: RunOptions,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let endpoint = store.endpoint();
    let database = store.database();
    let mut executor = Executor::new(clipboard, tx);
    let handle = executor.register(store);
    let session = Session::new(options.settings, database, handle);

    let size = terminal.size().context("read terminal size")?;
    let (session, _) = dispatch(
        session,
        &mut executor,
        Event::Resized {
            rows: size.height,
            cols: size.width,
        },
    );
    let (mut session, mut quit) = dispatch(session, &mut executor, Event::Started { endpoint });
    tracing::info!(database, "session started");

    let mut last_tick = Instant::now();
    while !quit {
        (session, quit) = drain_internal(session, &mut executor, &rx);
        if quit {
            break;
        }

        let view = session.view();
        terminal
            .draw(|frame| render(frame, &view))
            .context("draw frame")?;

        if event::poll(POLL_INTERVAL).context("poll event")? {
            let next = match event::read().context("read event")? {
                event::Event::Key(key) => translate_key(key).map(Event::KeyPressed),
                event::Event::Resize(cols, rows) => Some(Event::Resized { rows, cols }),
                _ => None,
            };
            if let Some(next) = next {
                (session, quit) = dispatch(session, &mut executor, next);
            }
        }

        let tick_due = options
            .refresh_interval
            .is_some_and(|interval| last_tick.elapsed() >= interval);
        if tick_due && !quit {
            last_tick = Instant::now();
            (session, quit) = dispatch(session, &mut executor, Event::Tick);
        }
    }

    tracing::info!("session ended");
    Ok(())
}

/// Feeds every pending worker result into the session. Newly verified stores
/// are registered first so the session can adopt their handle.
pub fn drain_internal(
    mut session: Session,
    executor: &mut Executor,
    rx: &Receiver<InternalEvent>,
) -> (Session, bool) {
    let mut quit = false;
    while let Ok(internal) = rx.try_recv() {
        let (event, switched) = match internal {
            InternalEvent::Session(event) => (event, false),
            InternalEvent::Switched { index, store } => {
                let handle = executor.register(store);
                (Event::DatabaseSwitched { index, handle }, true)
            }
        };
        let (next, event_quit) = dispatch(session, executor, event);
        session = next;
        quit |= event_quit;
        if switched {
            executor.retain_only(session.handle());
        }
    }
    (session, quit)
}

pub fn dispatch(session: Session, executor: &mut Executor, event: Event) -> (Session, bool) {
    let (session, commands) = session.reduce(event);
    let mut quit = false;
    for command in commands {
        quit |= executor.execute(command);
    }
    (session, quit)
}

pub fn translate_key(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let translated = match key.code {
        KeyCode::Char(value) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Key::Ctrl(value.to_ascii_lowercase())
        }
        KeyCode::Char(value) => Key::Char(value),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Key::BackTab,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };
    Some(translated)
}
