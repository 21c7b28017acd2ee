use std::sync::Arc;

use chrono::Duration;

use crate::store::Store;

/// Write the ratings file when it is dirty and the last save is at least
/// `min_age_secs` old.
pub async fn run(store: Arc<Store>, min_age_secs: u64) {
    let min_age = Duration::seconds(min_age_secs as i64);
    let result = tokio::task::spawn_blocking(move || store.flush_if_due(min_age)).await;

    match result {
        Ok(Ok(true)) => tracing::info!("autosave: ratings saved"),
        Ok(Ok(false)) => tracing::trace!("autosave: nothing to save"),
        Ok(Err(e)) => tracing::error!(error = %e, "autosave failed, will retry"),
        Err(e) => tracing::error!(error = %e, "autosave task panicked"),
    }
}
