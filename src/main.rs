use anyhow::{anyhow, Error};
use crossterm::cursor::{DisableBlinking, EnableBlinking, SetCursorStyle};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{debug, error};
use pretty_der6y::app::{App, AppState};
use pretty_der6y::commands::OfflineBackend;
use pretty_der6y::config::{setup_logging, Args, Config, USAGE};
use pretty_der6y::event::Outcome;
use pretty_der6y::toast::ToastQueue;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(1);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let config = Config::load(args)?;
    let toasts = ToastQueue::new();
    setup_logging(&config, &toasts)?;
    debug!("config {:?}", config);

    let backend = OfflineBackend::new(config.daily_limit, config.record_dir.clone());
    let mut state = AppState::new(&config, Arc::new(backend), toasts);

    run_ui(&mut state)
}

fn run_ui(state: &mut AppState) -> Result<(), Error> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    stdout().execute(EnableBlinking)?;
    stdout().execute(SetCursorStyle::BlinkingBar)?;
    stdout().execute(EnableBracketedPaste)?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let r = event_loop(&mut terminal, state);

    stdout().execute(DisableBracketedPaste)?;
    stdout().execute(SetCursorStyle::DefaultUserShape)?;
    stdout().execute(DisableBlinking)?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;

    if let Err(e) = &r {
        error!("{:?}", e);
    }
    r
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &mut AppState,
) -> Result<(), Error> {
    repaint(terminal, state)?;

    loop {
        let event = match crossterm::event::poll(Duration::from_millis(10)) {
            Ok(true) => Some(crossterm::event::read().map_err(|e| anyhow!(e))?),
            Ok(false) => None,
            Err(e) => return Err(anyhow!(e)),
        };
        let o = state.update(event.as_ref(), Instant::now());

        if state.quit {
            break Ok(());
        }

        if o == Outcome::Changed {
            repaint(terminal, state)?;
        }
    }
}

fn repaint(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &mut AppState,
) -> Result<(), Error> {
    terminal.draw(|frame| {
        frame.render_stateful_widget(App, frame.area(), state);
        if let Some((x, y)) = state.screen_cursor() {
            frame.set_cursor_position((x, y));
        }
    })?;
    Ok(())
}
