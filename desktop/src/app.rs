//! Application bootstrap and the host event loop.

use crate::config::DesktopConfig;
use crate::console_shell::ConsoleShell;
use crate::lifecycle::{ApplicationLifecycle, HostShell, TrayAction};
use crate::logging::{current_log_path, setup_logging};
use crate::readiness::{HttpHealthProbe, OverlayAction, ReadinessOverlay, ReadinessPoller};
use crate::supervisor::BackendSupervisor;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const CONFIG_DIR_ENV: &str = "KS_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".knowledge-studio";
const HELP_TEXT: &str = "Commands: show | quit | close | status | retry | exit";

/// Triggers coming from outside the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The primary window's close button (SIGINT on the console)
    CloseRequested,
    /// Application quit (SIGTERM)
    QuitRequested,
}

/// Config directory: `$KS_CONFIG_DIR`, else `./.knowledge-studio`.
pub fn config_dir() -> PathBuf {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

/// Run the desktop host until a shutdown sequence terminates it. Returns
/// the process exit code.
pub async fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let config_dir = config_dir();
    let config = DesktopConfig::load_or_create(&config_dir)?;
    let logs_dir = setup_logging(&config_dir, &config.logging)?;

    info!("Starting Knowledge Studio v{}", env!("CARGO_PKG_VERSION"));
    info!("Config directory: {}", config_dir.display());
    info!("Log file: {}", current_log_path(&logs_dir).display());

    let launch_root = std::env::current_dir()?;
    let supervisor = Arc::new(BackendSupervisor::from_config(&config, &launch_root));
    info!("Backend directory: {}", supervisor.working_dir().display());

    let (shell, mut exit_rx) = ConsoleShell::new(supervisor.backend_base_url());
    let shell = Arc::new(shell);
    let lifecycle = ApplicationLifecycle::new(supervisor.clone(), shell.clone());

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    install_signal_handlers(events_tx);

    // Launch failures are logged only; the readiness timeout reports them
    if let Err(e) = lifecycle.launch_backend().await {
        warn!("{}", e.recovery_hint());
    }

    shell.show_window();

    let probe = Arc::new(HttpHealthProbe::new(
        supervisor.health_url(),
        config.readiness.probe_timeout(),
    )?);
    info!("Polling backend health at {}", probe.url());
    let poller = ReadinessPoller::from_settings(probe, &config.readiness);
    let mut readiness_rx = poller.subscribe();
    let mut process_rx = supervisor.subscribe();
    let mut last_overlay = None;
    let mut stdin_open = true;

    loop {
        tokio::select! {
            code = &mut exit_rx => {
                poller.teardown();
                return Ok(code.unwrap_or_default());
            }
            Some(event) = events_rx.recv() => match event {
                HostEvent::CloseRequested => {
                    let outcome = lifecycle.handle_close_request().await;
                    debug!("Close request outcome: {outcome:?}");
                }
                HostEvent::QuitRequested => {
                    lifecycle.handle_quit_request().await;
                }
            },
            line = shell.next_line(), if stdin_open => match line {
                Some(line) => handle_input(line.trim(), &shell, &lifecycle, &poller).await,
                None => stdin_open = false,
            },
            Ok(()) = readiness_rx.changed() => {
                let overlay = ReadinessOverlay::from(&*readiness_rx.borrow_and_update());
                render_overlay(overlay, &mut last_overlay);
            }
            Ok(()) = process_rx.changed() => {
                let state = process_rx.borrow_and_update().clone();
                debug!("Backend process state: {state:?}");
            }
        }
    }
}

async fn handle_input(
    input: &str,
    shell: &ConsoleShell,
    lifecycle: &ApplicationLifecycle,
    poller: &ReadinessPoller,
) {
    if input.is_empty() {
        return;
    }

    if let Some(action) = TrayAction::from_menu_id(input) {
        lifecycle.handle_tray_action(action).await;
        return;
    }

    if let Some(action) = OverlayAction::from_input(input) {
        if poller.state().has_failed() {
            lifecycle.handle_overlay_action(action, poller).await;
        } else {
            println!("'{}' is only available after the backend check failed", action.label());
        }
        return;
    }

    match input {
        "close" => {
            lifecycle.handle_close_request().await;
        }
        "status" => {
            let readiness = poller.state();
            println!(
                "backend: {:?} | ready: {} | attempts: {} | elapsed: {}ms | window: {} | tray: {}",
                lifecycle.supervisor().state(),
                readiness.ready,
                readiness.attempts,
                readiness.elapsed_ms,
                if shell.is_window_open() { "open" } else { "closed" },
                if shell.has_tray() { "present" } else { "disposed" },
            );
        }
        _ => println!("{HELP_TEXT}"),
    }
}

fn render_overlay(overlay: ReadinessOverlay, last: &mut Option<ReadinessOverlay>) {
    if last.as_ref() == Some(&overlay) {
        return;
    }
    println!("{}", overlay.headline());
    *last = Some(overlay);
}

#[cfg(unix)]
fn install_signal_handlers(events_tx: mpsc::UnboundedSender<HostEvent>) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to register signal handlers: {e}");
            return;
        }
    };

    std::thread::spawn(move || {
        for sig in signals.forever() {
            let event = if sig == SIGINT {
                HostEvent::CloseRequested
            } else {
                HostEvent::QuitRequested
            };
            info!("Received signal {sig}, forwarding {event:?}");
            if events_tx.send(event).is_err() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn install_signal_handlers(events_tx: mpsc::UnboundedSender<HostEvent>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if events_tx.send(HostEvent::CloseRequested).is_err() {
                break;
            }
        }
        error!("Ctrl-C handler stopped");
    });
}
