mod backend_supervisor;
mod error;
mod output;
mod process_state;
mod supervised_process;

pub use backend_supervisor::BackendSupervisor;
#[cfg(test)]
pub(crate) use backend_supervisor::pid_of;
pub use error::{Result as SupervisorResult, SupervisorError};
pub use process_state::ProcessState;
pub use supervised_process::SupervisedProcess;
