use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::pipeline::{CycleError, Pipeline};

/// Run the pipeline every `interval` until cancelled.
///
/// Each cycle runs to completion before the next sleep starts, so cycles
/// never overlap. Cancellation is observed between cycles. Fetch and lookup
/// failures skip the cycle; a delivered post that could not be recorded ends
/// the loop with that error.
///
/// # Errors
///
/// Returns the first fatal [`CycleError`].
pub async fn poll_loop(
    pipeline: Pipeline,
    interval: Duration,
    shutdown: CancellationToken,
) -> Result<(), CycleError> {
    info!(interval_secs = interval.as_secs(), "Diary polling started");

    loop {
        match pipeline.run_cycle().await {
            Ok(report) if report.novel > 0 => {
                info!(
                    extracted = report.extracted,
                    novel = report.novel,
                    delivered = report.delivered,
                    failed = report.failed,
                    "Cycle complete"
                );
            }
            Ok(report) => {
                debug!(extracted = report.extracted, "Cycle complete, nothing new");
            }
            Err(e) if e.is_fatal() => {
                error!("Stopping poll loop: {e}");
                return Err(e);
            }
            Err(e) => {
                warn!("Cycle skipped: {e}");
            }
        }

        tokio::select! {
            () = shutdown.cancelled() => {
                info!("Diary polling stopped");
                return Ok(());
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}
