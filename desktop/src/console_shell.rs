//! Terminal stand-in for the desktop window and tray.

use crate::lifecycle::HostShell;

use std::sync::Mutex as StdMutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};

const EXIT_PROMPT: &str = "Quit Knowledge Studio? The window and the backend service will both close. [y/N] ";

/// Console host: stdin answers prompts, stdout plays the window, and
/// `terminate` resolves the receiver returned by [`ConsoleShell::new`].
pub struct ConsoleShell {
    backend_url: String,
    input: Mutex<mpsc::UnboundedReceiver<String>>,
    exit_tx: StdMutex<Option<oneshot::Sender<i32>>>,
    window_open: AtomicBool,
    tray_present: AtomicBool,
}

impl ConsoleShell {
    /// Must be called inside a Tokio runtime; spawns the stdin reader.
    pub fn new(backend_url: String) -> (Self, oneshot::Receiver<i32>) {
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line_tx.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });

        let shell = Self {
            backend_url,
            input: Mutex::new(line_rx),
            exit_tx: StdMutex::new(Some(exit_tx)),
            window_open: AtomicBool::new(false),
            tray_present: AtomicBool::new(true),
        };
        (shell, exit_rx)
    }

    /// Next line typed by the user, `None` once stdin is closed.
    pub async fn next_line(&self) -> Option<String> {
        self.input.lock().await.recv().await
    }

    pub fn is_window_open(&self) -> bool {
        self.window_open.load(Ordering::Acquire)
    }

    pub fn has_tray(&self) -> bool {
        self.tray_present.load(Ordering::Acquire)
    }
}

#[async_trait]
impl HostShell for ConsoleShell {
    async fn confirm_exit(&self) -> bool {
        print!("{EXIT_PROMPT}");
        // Prompt text only; a failed flush just delays it
        let _ = std::io::Write::flush(&mut std::io::stdout());

        match self.next_line().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            None => {
                warn!("stdin closed while asking for exit confirmation, staying open");
                false
            }
        }
    }

    fn show_window(&self) {
        if !self.window_open.swap(true, Ordering::AcqRel) {
            info!("Opened main window");
        }
        println!("Knowledge Studio (backend: {})", self.backend_url);
    }

    fn dispose_tray(&self) {
        if self.tray_present.swap(false, Ordering::AcqRel) {
            debug!("Tray disposed");
        }
    }

    fn close_window_without_confirmation(&self) {
        if self.window_open.swap(false, Ordering::AcqRel) {
            debug!("Main window closed");
        }
    }

    fn terminate(&self, code: i32) {
        let exit_tx = self
            .exit_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match exit_tx {
            Some(tx) => {
                info!("Exiting with code {code}");
                let _ = tx.send(code);
            }
            None => debug!("Terminate already requested"),
        }
    }
}
