use tracing::debug;

use crate::SyncEngine;
use crate::helpers;

/// Minimum spacing between acknowledgement flushes.
const DELETE_COOLDOWN_SECS: i64 = 60;

impl SyncEngine {
    /// Flush successfully executed commands to the remote delete endpoint.
    ///
    /// The ID list is built at flush time and only those IDs are cleared on
    /// confirmed success, so commands executed while the delete is in flight
    /// stay queued for the next window. Remote deletion is idempotent; a
    /// failed flush simply resends the same IDs later.
    pub async fn delete_executed_commands(&self, force: bool) {
        debug!("deleting executed commands");
        let now = helpers::now();
        {
            let cooldowns = self.cooldowns.lock().unwrap();
            if !force && now < cooldowns.delete_commands {
                debug!("skipping check for completed commands; not time to be processed");
                return;
            }
        }

        let ids: Vec<u64> = self.executed.lock().unwrap().iter().map(|c| c.id).collect();
        if ids.is_empty() {
            debug!("no commands to flush");
            return;
        }
        debug!(count = ids.len(), "commands to flush");

        self.cooldowns.lock().unwrap().delete_commands = now + DELETE_COOLDOWN_SECS;

        match self.api.delete_commands(&ids).await {
            Ok(()) => {
                let mut executed = self.executed.lock().unwrap();
                executed.retain(|command| !ids.contains(&command.id));
                debug!("successfully flushed completed commands");
            }
            Err(err) => {
                debug!(%err, "failed to flush completed commands; they will be retried");
            }
        }
    }
}
