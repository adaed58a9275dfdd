use std::sync::Arc;

use tracing::{debug, error};
use vendlink_api::{ApiError, Command, DuePlayer};

use crate::SyncEngine;
use crate::dispatch::DispatchOutcome;
use crate::helpers;

impl SyncEngine {
    /// Poll the remote queue and dispatch due work.
    ///
    /// The server, not the client, controls poll cadence: each successful
    /// poll advances the gate by the advised `next_check`. `force` bypasses
    /// the gate for manual triggers.
    pub async fn process_command_queue(&self, force: bool) {
        debug!("processing command queue");
        let now = helpers::now();
        {
            let cooldowns = self.cooldowns.lock().unwrap();
            if !force && now < cooldowns.command_queue {
                debug!(
                    wait_secs = cooldowns.command_queue - now,
                    "tried to run command queue before the advised check time"
                );
                return;
            }
        }

        let response = match self.api.command_queue().await {
            Ok(response) => response,
            Err(err) => {
                if let ApiError::Parse { body, .. } = &err {
                    error!(response = %body, "failed to get command queue; could not parse response");
                } else {
                    error!(%err, "failed to get command queue");
                }
                // Nothing was mutated; the next tick retries from scratch.
                return;
            }
        };

        self.cooldowns.lock().unwrap().command_queue =
            helpers::now() + response.meta.next_check as i64;

        if response.meta.execute_offline {
            self.run_offline_commands().await;
        } else {
            debug!("no offline commands to execute");
        }

        debug!(due_players = response.players.len(), "due players in the queue");
        for due in &response.players {
            // Failures are per-player; one player's failure never aborts the
            // rest of the cycle.
            self.run_online_commands_for(due).await;
        }
    }

    async fn run_offline_commands(&self) {
        debug!("requesting offline commands from api");
        let response = match self.api.offline_commands().await {
            Ok(response) => response,
            Err(err) => {
                if let ApiError::Parse { body, .. } = &err {
                    error!(response = %body, "failed to get offline commands; could not parse response");
                } else {
                    error!(%err, "error response from api while processing offline commands");
                }
                return;
            }
        };

        debug!(count = response.commands.len(), "offline commands to execute");
        for command in response.commands {
            let outcome = self.dispatch_offline(command.clone());
            if outcome == DispatchOutcome::Executed {
                self.mark_executed(command);
            }
        }
    }

    async fn run_online_commands_for(&self, due: &DuePlayer) {
        debug!(player = %due.name, "processing online commands");

        // Expected transient state: the player may have disconnected since
        // the server computed due players.
        let Some(handle) = self.host.find_player(&due.uuid) else {
            debug!(player = %due.name, "player has online commands but no live reference; skipping this cycle");
            return;
        };
        if !handle.is_connected() {
            debug!(player = %due.name, "player has online commands but is not connected; skipping this cycle");
            return;
        }

        let response = match self.api.online_commands(due.id).await {
            Ok(response) => response,
            Err(err) => {
                if let ApiError::Parse { body, .. } = &err {
                    error!(player = %due.name, response = %body, "failed to parse online commands response");
                } else {
                    error!(player = %due.name, %err, "failed to get due online commands");
                }
                return;
            }
        };

        debug!(count = response.commands.len(), player = %due.name, "dispatching online commands");
        for command in response.commands {
            let outcome = self.dispatch_online(command.clone(), Arc::clone(&handle));
            if outcome == DispatchOutcome::Executed {
                self.mark_executed(command);
            }
        }
    }

    /// Record a command as successfully executed, making it eligible for the
    /// next acknowledgement flush.
    pub(crate) fn mark_executed(&self, command: Command) {
        let mut executed = self.executed.lock().unwrap();
        executed.push(command);
        debug!(queued = executed.len(), "commands awaiting acknowledgement");
    }
}
