use crate::store::Store;

/// Purge expired sessions, one batch per run.
pub async fn run(store: &Store) {
    match store.cleanup_expired_sessions() {
        Ok(0) => tracing::debug!("session_cleanup: nothing expired"),
        Ok(count) => tracing::info!(cleaned = count, "session_cleanup: done"),
        Err(e) => tracing::error!(error = %e, "session_cleanup failed"),
    }
}
