use std::path::PathBuf;

/// The spawned backend child as seen by the supervisor.
///
/// The `tokio::process::Child` itself lives in the exit-watcher task; this
/// record keeps what is needed to describe and signal it by pid.
#[derive(Debug)]
pub struct SupervisedProcess {
    pub strategy: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub pid: u32,
    stop_requested: bool,
}

impl SupervisedProcess {
    pub(crate) fn new(
        strategy: String,
        program: String,
        args: Vec<String>,
        working_dir: PathBuf,
        pid: u32,
    ) -> Self {
        Self {
            strategy,
            program,
            args,
            working_dir,
            pid,
            stop_requested: false,
        }
    }

    /// Record that termination was requested. Only the first call returns
    /// `true`.
    pub(crate) fn mark_stop_requested(&mut self) -> bool {
        !std::mem::replace(&mut self.stop_requested, true)
    }

    /// Command line as it would be typed, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
