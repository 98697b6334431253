use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use monitor_core::{update, AppState, Effect, Msg};
use monitor_engine::ensure_artifact_dir;
use monitor_logging::{monitor_info, monitor_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::ui;

/// Everything the single UI loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Msg(Msg),
    /// Print the full status block on demand.
    Status,
    Help,
    Invalid(String),
    Quit,
}

pub fn run_app(config: AppConfig) -> Result<()> {
    monitor_info!("Starting job monitor against {}", config.api_base);
    if let Err(err) = ensure_artifact_dir(&config.download_dir) {
        monitor_warn!("Download directory unavailable: {}", err);
    }

    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>();
    let runner = EffectRunner::new(config.engine_config(), ui_tx.clone())
        .with_context(|| format!("Invalid api_base {:?}", config.api_base))?;

    spawn_input_reader(ui_tx.clone());

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut renderer = ui::render::Renderer::new(stdout.lock(), color);
    renderer.help()?;

    let _ = ui_tx.send(UiEvent::Msg(Msg::Init));
    drop(ui_tx);

    let mut state = AppState::new();
    while let Ok(event) = ui_rx.recv() {
        match event {
            UiEvent::Msg(msg) => {
                let (next, effects) = update(state, msg);
                state = next;
                runner.enqueue(effects);
                if state.consume_dirty() {
                    renderer.render(&state.view())?;
                }
            }
            UiEvent::Status => renderer.status(&state.view())?,
            UiEvent::Help => renderer.help()?,
            UiEvent::Invalid(reason) => renderer.invalid(&reason)?,
            UiEvent::Quit => break,
        }
    }

    if state.phase().is_active() {
        runner.enqueue(vec![Effect::StopPolling]);
    }
    monitor_info!("Job monitor exiting");
    Ok(())
}

/// Reads operator commands from stdin; end of input quits.
fn spawn_input_reader(ui_tx: mpsc::Sender<UiEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(event) = ui::commands::parse(&line) else {
                continue;
            };
            let quit = event == UiEvent::Quit;
            if ui_tx.send(event).is_err() || quit {
                return;
            }
        }
        let _ = ui_tx.send(UiEvent::Quit);
    });
}
