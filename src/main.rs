mod actions;
mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use app::AppController;
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use race_tracker::config::{init_logging, Config};
use race_tracker::RefreshScheduler;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.log_file.as_deref(), false)?;
    info!("Starting with endpoint {}", config.endpoint);

    // Set up panic handler to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let scheduler = RefreshScheduler::with_selected(
        Arc::new(config.client()),
        config.refresh_interval(),
        config.initial_filter(),
    );
    let mut app_controller = AppController::new(scheduler);
    app_controller.initialize();

    let res = run_app(&mut terminal, &mut app_controller).await;
    app_controller.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app_controller: &mut AppController,
) -> Result<()> {
    loop {
        app_controller.sync_state();

        // Countdowns are derived from the clock, so redraw every pass
        let now = Utc::now().timestamp();
        terminal.draw(|f| ui::render_ui(f, &mut app_controller.ui_app, now))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if app_controller.handle_key_event(key.code) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => {}
            }
        }

        // Yield so refresh tasks make progress between frames
        sleep(Duration::from_millis(16)).await;

        if app_controller.should_quit() {
            break;
        }
    }

    Ok(())
}
