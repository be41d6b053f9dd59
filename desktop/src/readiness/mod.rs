mod cancel_token;
mod error;
mod health_probe;
mod overlay;
mod poller;
mod readiness_state;

pub use cancel_token::CancelToken;
pub use error::{ReadinessError, Result as ReadinessResult};
pub use health_probe::{HealthProbe, HttpHealthProbe};
pub use overlay::{OverlayAction, ReadinessOverlay};
pub use poller::{ReadinessPoller, observe_readiness};
pub use readiness_state::{BACKEND_UNAVAILABLE_MESSAGE, ReadinessState};
