//! chemvis-tui - A terminal client for the chemical equipment analytics service
//!
//! This is the main entry point for the chemvis-tui application.
//! It uses the Component Architecture pattern from ratatui.

mod action;
mod app;
mod component;
mod components;
mod config;
mod logging;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::config::Config;
use crate::model::AuthSession;
use crate::services::{Dispatcher, HttpApi, TokenStore};
use crate::tui::Tui;
use anyhow::{Context, Result};
use crossterm::event::Event;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let config = Config::load();
    let first_run = Config::write_default_if_missing();

    if let Some(log_path) = Config::log_path() {
        if let Err(e) = logging::init(&log_path) {
            eprintln!("Logging disabled: {:#}", e);
        }
    }
    if let Err(e) = first_run {
        tracing::warn!("could not write default config: {:#}", e);
    }
    tracing::info!("starting against {}", config.api_base_url);

    let session_path =
        Config::session_path().context("Could not determine home directory for session storage")?;
    let tokens = TokenStore::at(session_path);
    tracing::debug!("session file: {}", tokens.path().display());
    let api = HttpApi::new(&config.api_base_url, config.request_timeout(), tokens.clone())?;
    let auth = AuthSession::restore(tokens);
    let dispatcher = Dispatcher::threaded(Arc::new(api));

    // Setup terminal
    let mut tui = Tui::new()?.with_tick_rate(Duration::from_millis(100));
    tui.enter()?;

    // Create app state
    let mut app = App::new(config, auth, dispatcher);
    let result = app.init().and_then(|()| run_app(&mut tui, &mut app));

    // Cleanup terminal
    tui.exit()?;

    // Handle any errors
    if let Err(err) = result {
        tracing::error!("fatal: {:#}", err);
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    tracing::info!("exiting");
    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        // Draw the UI
        tui.draw(|frame| {
            if let Err(e) = app.draw(frame, frame.area()) {
                tracing::error!("draw error: {}", e);
            }
        })?;

        // Poll for events
        if let Some(event) = tui.next_event()? {
            // Convert event to action
            let action = match event {
                Event::Key(key) => app.handle_key_event(key)?,
                Event::Mouse(mouse) => app.handle_mouse_event(mouse)?,
                Event::Paste(text) => app.handle_paste_event(&text)?,
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                _ => None,
            };

            // Action might produce a follow-up action
            let mut current_action = action;
            while let Some(a) = current_action {
                tracing::debug!("action: {}", a);
                current_action = app.update(a)?;
            }
        } else {
            // No event - send a tick to apply finished requests
            app.update(Action::Tick)?;
        }
    }

    Ok(())
}
