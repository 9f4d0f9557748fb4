use boxoffice_core::RunHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use turnstile_sinks::StatusSink;

/// Publishes a pool snapshot every `interval` until the pool closes or the
/// run ends. The last snapshot is published after the run ends, so
/// observers always see the final counters.
pub(crate) fn sample_status(run: RunHandle, status: Arc<dyn StatusSink>, interval: Duration) {
    let mut ended = false;
    loop {
        let snap = run.pool().snapshot();
        if let Err(e) = status.publish_status(&snap.status()) {
            warn!(error = %e, "status publish failed");
        }
        if snap.is_closed() || ended {
            break;
        }
        ended = run.wait_timeout(interval);
    }
    debug!("status sampler finished");
}
