use tracing::{debug, error, warn};
use vendlink_api::JoinEvent;

use crate::SyncEngine;
use crate::helpers;

/// Buffered events beyond this count trigger an immediate flush.
const JOIN_FLUSH_THRESHOLD: usize = 10;

/// Bound on the join buffer during a sustained remote outage; the oldest
/// events are dropped past this point.
const JOIN_QUEUE_CAP: usize = 1000;

/// Minimum spacing between timer-driven join flushes.
const JOIN_COOLDOWN_SECS: i64 = 60;

impl SyncEngine {
    /// Record a player-connect event for batched submission.
    pub fn on_player_connected(&self, player_id: &str, ip: &str) {
        let event = JoinEvent::server_join(player_id, ip, helpers::now());

        let pending = {
            let mut queue = self.join_queue.lock().unwrap();
            if queue.len() >= JOIN_QUEUE_CAP {
                queue.remove(0);
                warn!(cap = JOIN_QUEUE_CAP, "join-event buffer is full; dropping the oldest event");
            }
            queue.push(event);
            queue.len()
        };

        // Already over the threshold; flush without waiting for the timer.
        if pending > JOIN_FLUSH_THRESHOLD {
            if let Some(engine) = self.weak_self.upgrade() {
                tokio::spawn(async move {
                    engine.process_join_queue(true).await;
                });
            }
        }
    }

    /// Submit buffered join events as one batch.
    ///
    /// Only the events present at flush time are drained, and only on
    /// confirmed submission; on failure everything stays buffered for the
    /// next threshold or timer trigger.
    pub async fn process_join_queue(&self, force: bool) {
        debug!("processing player join queue");
        let now = helpers::now();
        {
            let mut cooldowns = self.cooldowns.lock().unwrap();
            if !force && now < cooldowns.join_queue {
                debug!("skipping join queue; not time to be processed");
                return;
            }
            cooldowns.join_queue = now + JOIN_COOLDOWN_SECS;
        }

        let batch: Vec<JoinEvent> = self.join_queue.lock().unwrap().clone();
        if batch.is_empty() {
            debug!("no recent join events");
            return;
        }
        debug!(count = batch.len(), "join events to submit");

        match self.api.player_join_events(&batch).await {
            Ok(()) => {
                // Drain exactly the submitted prefix; arrivals during the
                // flight stay buffered.
                let mut queue = self.join_queue.lock().unwrap();
                let submitted = batch.len().min(queue.len());
                queue.drain(..submitted);
                debug!("join queue cleared successfully");
            }
            Err(err) => {
                error!(%err, "could not process join queue; events remain buffered");
            }
        }
    }
}
