use hce::{DeactivationReason, Lifecycle};
use tracing::info;

/// Reports the session boundaries through the log.
pub struct TracingLifecycle;

impl Lifecycle for TracingLifecycle {
    fn on_session_start(&self) {
        info!("Reader connected");
    }

    fn on_session_end(&self, reason: DeactivationReason) {
        info!(%reason, "Reader disconnected");
    }
}
