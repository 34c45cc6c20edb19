//! Auto-refresh
//!
//! Re-fetches the ticket list on a fixed interval while enabled. The task
//! holds only a weak reference, so dropping the last handle to the
//! view-model ends it.

use super::{FetchOutcome, TicketViewModel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// View-model shared between user commands and the refresh task
pub type SharedViewModel = Arc<Mutex<TicketViewModel>>;

/// Start (or restart) periodic refreshes every `period`
///
/// The first refresh happens one `period` from now. Stopped by
/// [`TicketViewModel::stop_auto_refresh`] or any 401.
pub async fn enable_auto_refresh(shared: &SharedViewModel, period: Duration) {
    let weak = Arc::downgrade(shared);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(model) = weak.upgrade() else {
                break;
            };
            let mut model = model.lock().await;

            tracing::debug!("Running scheduled ticket refresh");
            if model.refresh().await == FetchOutcome::Unauthorized {
                break;
            }
        }
    });

    shared.lock().await.set_refresh_task(task.abort_handle());
    tracing::info!(interval_secs = period.as_secs_f64(), "Auto-refresh started");
}

/// Cancel periodic refreshes, if running
pub async fn disable_auto_refresh(shared: &SharedViewModel) {
    shared.lock().await.stop_auto_refresh();
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::client::ClientError;

    const TICK: Duration = Duration::from_millis(40);

    #[tokio::test]
    async fn test_refreshes_until_disabled() {
        let h = harness();
        let backend = h.backend.clone();
        let shared = h.model.into_shared();

        enable_auto_refresh(&shared, TICK).await;
        assert!(shared.lock().await.is_auto_refresh_enabled());

        tokio::time::sleep(TICK * 3 + TICK / 2).await;
        let calls = backend.list_calls.lock().unwrap().len();
        assert!(calls >= 2, "expected at least two refreshes, got {}", calls);

        disable_auto_refresh(&shared).await;
        assert!(!shared.lock().await.is_auto_refresh_enabled());

        let settled = backend.list_calls.lock().unwrap().len();
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(backend.list_calls.lock().unwrap().len(), settled);
    }

    #[tokio::test]
    async fn test_unauthorized_patch_cancels_timer() {
        let h = harness();
        let backend = h.backend.clone();
        let shared = h.model.into_shared();
        *backend.unauthorized.lock().unwrap() = true;

        enable_auto_refresh(&shared, Duration::from_secs(30)).await;

        let outcome = shared
            .lock()
            .await
            .patch("T1", &crate::client::PatchRequest::status_only(crate::ticket::Status::Wip))
            .await;

        assert_eq!(outcome, super::super::PatchOutcome::Unauthorized);
        assert!(!shared.lock().await.is_auto_refresh_enabled());
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_ends_refreshing() {
        let h = harness();
        let backend = h.backend.clone();
        backend.push_error(ClientError::Unauthorized);
        let shared = h.model.into_shared();

        enable_auto_refresh(&shared, TICK).await;
        tokio::time::sleep(TICK * 4).await;

        assert_eq!(backend.list_calls.lock().unwrap().len(), 1);
        assert!(!shared.lock().await.is_auto_refresh_enabled());
        assert_eq!(*h.shell.navigations.lock().unwrap(), vec!["/admin/login"]);
    }
}
