use std::{sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, timeout},
};
use tracing::{debug, info, warn};

use crate::{
    client::Backend,
    snapshot::{Progress, Snapshot, SnapshotKind},
};

pub const AUTOSAVE_PERIOD: Duration = Duration::from_secs(60);

/// How long an exiting process waits for its abandonment report.
pub const ABANDON_GRACE: Duration = Duration::from_secs(2);

/// Sends an AUTO-SAVE snapshot every `period` while the session is reportable.
///
/// Runs until the publishing wizard is dropped. Delivery failures are logged and the
/// next tick carries on as normal.
pub fn spawn_autosave(
    mut progress: watch::Receiver<Progress>,
    backend: Arc<dyn Backend>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if progress.has_changed().is_err() {
                debug!("Wizard closed, stopping auto-save");
                break;
            }

            let current = progress.borrow_and_update().clone();
            if !current.is_reportable() {
                continue;
            }

            let snapshot = Snapshot::new(&current, SnapshotKind::AutoSave);
            match backend.send_partial_form_data(&snapshot).await {
                Ok(()) => info!("Auto-saved form data at step {}", current.step),
                Err(e) => warn!("Auto-save failed: {e}"),
            }
        }
    })
}

/// Detaches an ABANDONED snapshot send and returns at once.
///
/// `None` when there is nothing worth reporting or no runtime to run the send on.
pub fn report_abandoned(progress: Progress, backend: Arc<dyn Backend>) -> Option<JoinHandle<()>> {
    if !progress.is_reportable() {
        return None;
    }

    let Ok(runtime) = Handle::try_current() else {
        warn!("No async runtime, dropping abandonment report");
        return None;
    };

    let snapshot = Snapshot::new(&progress, SnapshotKind::Abandoned);
    Some(runtime.spawn(async move {
        if let Err(e) = backend.send_partial_form_data(&snapshot).await {
            warn!("Abandonment report failed: {e}");
        }
    }))
}

/// Sends the ABANDONED snapshot and waits at most `grace` for it, for callers about to
/// shut their runtime down. Returns whether the send finished in time.
pub async fn flush_abandoned(
    progress: Progress,
    backend: Arc<dyn Backend>,
    grace: Duration,
) -> bool {
    let Some(handle) = report_abandoned(progress, backend) else {
        return false;
    };

    match timeout(grace, handle).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Abandonment report task failed: {e}");
            false
        }
        Err(_) => {
            warn!("Abandonment report still pending after {grace:?}, exiting anyway");
            false
        }
    }
}
