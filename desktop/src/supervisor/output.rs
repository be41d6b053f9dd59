//! Diagnostic logging of the backend's stdout/stderr.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub(crate) enum StreamKind {
    Stdout,
    Stderr,
}

/// Forward every line of `stream` to the log until EOF. Output is never
/// parsed.
pub(crate) fn observe<R>(stream: R, kind: StreamKind, pid: u32)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match kind {
                    StreamKind::Stdout => info!(target: "backend", pid, "{line}"),
                    StreamKind::Stderr => warn!(target: "backend", pid, "{line}"),
                },
                Ok(None) => break,
                Err(e) => {
                    debug!("Stopped reading backend {kind:?}: {e}");
                    break;
                }
            }
        }
    });
}
