//! Dossier TUI - terminal frontend for schema-driven profile forms
//!
//! Loads a section schema from a JSON file, seeds it from the local data
//! directory and lets the user edit and save it with the keyboard.

mod app;
mod rewriter;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dossier::config::DossierConfig;
use dossier::schema::Section;
use dossier::services::{JsonFileStore, SectionStore};
use dossier::state::FormSession;
use ratatui::{backend::CrosstermBackend, Terminal};
use rewriter::TidyRewriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the section schema file when no argument is given
const SECTION_ENV: &str = "DOSSIER_SECTION";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dossier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = DossierConfig::load().context("failed to load config")?;
    let mut app = build_app(&config).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

fn section_path() -> Result<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(SECTION_ENV))
        .map(PathBuf::from)
        .with_context(|| format!("usage: dossier-tui <section.json> (or set {SECTION_ENV})"))
}

async fn build_app(config: &DossierConfig) -> Result<App> {
    let path = section_path()?;
    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let section = Section::from_json(&json)
        .with_context(|| format!("invalid section schema in {}", path.display()))?;

    let data_dir = config
        .data_dir()
        .context("no data directory available; set DOSSIER_DATA_DIR")?;
    let store = JsonFileStore::new(data_dir);
    let initial = store
        .load(&section.id)
        .await
        .with_context(|| format!("failed to load saved data for `{}`", section.id))?;
    tracing::info!(section = %section.id, dir = %store.dir().display(), "section loaded");

    let session = FormSession::new(section, config.viewer(), &initial);
    Ok(App::new(session, Arc::new(store), Arc::new(TidyRewriter)))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.poll_background();

        let view = app.view();
        let focus = app.focused();
        terminal.draw(|frame| dossier::ui::draw(frame, &app.screen(&view, focus.as_ref())))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Global quit: Ctrl+C
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }
                app.handle_key(key).await?;
            }
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
