use serde::{Deserialize, Serialize};

const HOST_PLACEHOLDER: &str = "{host}";
const PORT_PLACEHOLDER: &str = "{port}";

/// One way of starting the backend. Strategies are tried in order until a
/// spawn succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchStrategy {
    /// Short label used in logs
    pub name: String,

    /// Executable looked up on PATH (or an absolute path)
    pub program: String,

    /// Arguments; `{host}` and `{port}` are substituted at launch
    #[serde(default)]
    pub args: Vec<String>,
}

impl LaunchStrategy {
    pub fn new(name: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// `uv run uvicorn ...`, the preferred launcher.
    pub fn uv() -> Self {
        Self::new(
            "uv",
            "uv",
            &[
                "run",
                "uvicorn",
                "app.main:app",
                "--host",
                HOST_PLACEHOLDER,
                "--port",
                PORT_PLACEHOLDER,
            ],
        )
    }

    /// `python -m uvicorn ...`, used when `uv` is unavailable.
    pub fn python() -> Self {
        let program = if cfg!(windows) { "python" } else { "python3" };
        Self::new(
            "python",
            program,
            &[
                "-m",
                "uvicorn",
                "app.main:app",
                "--host",
                HOST_PLACEHOLDER,
                "--port",
                PORT_PLACEHOLDER,
            ],
        )
    }

    /// Arguments with placeholders filled in.
    pub fn resolved_args(&self, host: &str, port: u16) -> Vec<String> {
        let port = port.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(HOST_PLACEHOLDER, host)
                    .replace(PORT_PLACEHOLDER, &port)
            })
            .collect()
    }
}
