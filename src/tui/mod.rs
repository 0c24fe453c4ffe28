pub mod app;
pub mod ui;

use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Handle;
use tui_input::InputRequest;

use crate::analyzer::Analyzer;
use crate::pipeline::{spawn_analysis, Completion, Pipeline, Submission};
use crate::storage::KeyValueStore;
use crate::view::View;

use app::{App, Focus, Overlay};

/// Everything the event loop needs to start analyses off the UI thread.
struct Runner {
    handle: Handle,
    analyzer: Arc<dyn Analyzer>,
    tx: mpsc::Sender<Completion>,
}

impl Runner {
    fn start(&self, submission: Option<Submission>) {
        if let Some(submission) = submission {
            spawn_analysis(&self.handle, self.analyzer.clone(), submission, self.tx.clone());
        }
    }
}

pub fn run<S: KeyValueStore>(
    pipeline: Pipeline<S>,
    analyzer: Arc<dyn Analyzer>,
    handle: Handle,
    model: &str,
    initial_path: Option<&str>,
) -> Result<()> {
    let mut app = App::new(pipeline, model);
    let (tx, rx) = mpsc::channel::<Completion>();
    let runner = Runner {
        handle,
        analyzer,
        tx,
    };

    if let Some(path) = initial_path {
        runner.start(app.submit_path(path));
    }

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    io::stdout().execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &runner, rx);

    // Restore terminal
    io::stdout().execute(DisableBracketedPaste)?;
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    runner: &Runner,
    rx: mpsc::Receiver<Completion>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;
        // Note: ui::render updates app.visible_rows each frame

        // Apply settled analyses
        while let Ok(completion) = rx.try_recv() {
            let outcome = app
                .pipeline
                .complete(completion.submission, completion.result);
            app.apply(outcome);
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(app, runner, key);
                }
                // Dropping a file onto the terminal pastes its path
                Event::Paste(text) => {
                    if app.overlay == Overlay::None && !app.pipeline.is_loading() {
                        runner.start(app.submit_path(&text));
                    }
                }
                _ => {}
            }
        } else {
            app.on_tick();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key<S: KeyValueStore>(app: &mut App<S>, runner: &Runner, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.overlay {
        Overlay::About => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                app.overlay = Overlay::None;
            }
            return;
        }
        Overlay::ClearConfirm => {
            match key.code {
                KeyCode::Char('y') => app.confirm_clear(),
                KeyCode::Char('n') | KeyCode::Esc => app.overlay = Overlay::None,
                _ => {}
            }
            return;
        }
        Overlay::None => {}
    }

    let view = app.pipeline.view();
    let is_upload = view == View::Upload;
    let is_error = matches!(view, View::Error(_));

    if key.code == KeyCode::Tab {
        app.toggle_focus();
        return;
    }

    if is_upload && app.focus == Focus::Upload {
        match key.code {
            KeyCode::Enter => runner.start(app.submit_input()),
            KeyCode::Esc => app.focus = Focus::History,
            KeyCode::Char(c) => app.edit_input(InputRequest::InsertChar(c)),
            KeyCode::Backspace => app.edit_input(InputRequest::DeletePrevChar),
            KeyCode::Delete => app.edit_input(InputRequest::DeleteNextChar),
            KeyCode::Left => app.edit_input(InputRequest::GoToPrevChar),
            KeyCode::Right => app.edit_input(InputRequest::GoToNextChar),
            KeyCode::Home => app.edit_input(InputRequest::GoToStart),
            KeyCode::End => app.edit_input(InputRequest::GoToEnd),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('r') | KeyCode::Enter if is_error => app.reset_to_upload(),
        KeyCode::Char('n') => app.reset_to_upload(),
        KeyCode::Char('a') | KeyCode::Char('?') => app.overlay = Overlay::About,
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('c') => app.request_clear(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char(' ') | KeyCode::Enter => {
            app.toggle_at_cursor();
        }
        KeyCode::PageDown => app.scroll_detail(5),
        KeyCode::PageUp => app.scroll_detail(-5),
        _ => {}
    }
}
