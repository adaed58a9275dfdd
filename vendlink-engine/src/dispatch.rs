use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};
use vendlink_api::{Command, PlayerInfo};

use crate::SyncEngine;
use crate::host::PlayerHandle;

/// Result of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Ran to completion; eligible for acknowledgement.
    Executed,
    /// Scheduled to run after its delay; acknowledged when the deferred run
    /// actually completes, not at schedule time.
    Deferred,
    /// A gating condition (inventory capacity) is unmet; the command stays
    /// queued for a future cycle. Not an error.
    ConditionNotMet,
    /// The host failed to run the command; it stays queued and is retried.
    /// Repeated execution after a host-side failure is possible: delivery is
    /// at-least-once, and command payloads must tolerate a rerun.
    Failed,
}

impl SyncEngine {
    /// Execute a command addressed by persisted identity, regardless of
    /// connection state.
    pub(crate) fn dispatch_offline(&self, command: Command) -> DispatchOutcome {
        let expanded = expand_offline_variables(&command.command, &command.player);
        debug!(command = %expanded, "executing offline command");

        if command.conditions.delay > 0 {
            self.defer_command(command, expanded, None);
            return DispatchOutcome::Deferred;
        }
        self.run_host_command(&command, &expanded, None)
    }

    /// Execute a command against a resolved live player.
    pub(crate) fn dispatch_online(
        &self,
        command: Command,
        player: Arc<dyn PlayerHandle>,
    ) -> DispatchOutcome {
        let expanded = expand_player_variables(&command.command, player.as_ref());
        debug!(command = %expanded, "executing online command");

        if command.conditions.slots > 0 {
            match player.available_inventory_slots() {
                Some(available) => {
                    debug!(available, required = command.conditions.slots, "checking inventory capacity");
                    if available < command.conditions.slots {
                        warn!(
                            command = %command.command,
                            required = command.conditions.slots,
                            "player lacks inventory capacity; command stays queued"
                        );
                        return DispatchOutcome::ConditionNotMet;
                    }
                }
                None => {
                    warn!("command has a slots condition, but this host has no inventory concept");
                }
            }
        }

        if command.conditions.delay > 0 {
            self.defer_command(command, expanded, Some(player));
            return DispatchOutcome::Deferred;
        }
        self.run_host_command(&command, &expanded, Some(player.as_ref()))
    }

    /// Schedule a delayed command. The command is marked executed only once
    /// the deferred run completes, so a failure before then leaves it queued
    /// upstream.
    fn defer_command(
        &self,
        command: Command,
        expanded: String,
        player: Option<Arc<dyn PlayerHandle>>,
    ) {
        debug!(id = command.id, delay = command.conditions.delay, "deferring command");
        let Some(engine) = self.weak_self.upgrade() else {
            return;
        };
        let delay = Duration::from_secs(command.conditions.delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = engine.run_host_command(&command, &expanded, player.as_deref());
            if outcome == DispatchOutcome::Executed {
                engine.mark_executed(command);
            }
        });
    }

    /// Run an expanded command on the host, reshaping chat deliveries.
    fn run_host_command(
        &self,
        command: &Command,
        expanded: &str,
        player: Option<&dyn PlayerHandle>,
    ) -> DispatchOutcome {
        let mut parts = expanded.split_whitespace();
        let Some(name) = parts.next() else {
            warn!(id = command.id, "command expanded to an empty string; nothing to run");
            return DispatchOutcome::Executed;
        };
        let args: Vec<&str> = parts.collect();

        // chat.add carries an already-quoted payload; deliver it through the
        // player handle so the console does not re-quote it.
        if name == "chat.add" && args.len() >= 2 {
            if let Some(player) = player {
                if args[0] == player.id() {
                    let mut message = args[2..].join(" ");
                    if let Some(stripped) = message.strip_prefix('"') {
                        message = stripped.to_string();
                    }
                    if let Some(stripped) = message.strip_suffix('"') {
                        message = stripped.to_string();
                    }
                    player.send_message(&message);
                    return DispatchOutcome::Executed;
                }
            }
        }

        match self.host.run_command(expanded) {
            Ok(()) => DispatchOutcome::Executed,
            Err(err) => {
                error!(id = command.id, %err, "host failed to run command; it stays queued for retry");
                self.api.report_auto_triage(
                    "Host failed to execute a queued command",
                    HashMap::from([
                        ("command".to_string(), command.command.clone()),
                        ("error".to_string(), err.to_string()),
                    ]),
                );
                DispatchOutcome::Failed
            }
        }
    }
}

/// Expand `{id}`, `{username}` and `{name}` from a live player handle.
pub fn expand_player_variables(input: &str, player: &dyn PlayerHandle) -> String {
    let id = player.id();
    let name = player.name();
    if id.is_empty() || name.is_empty() {
        error!(input, "player id or name is empty while expanding command variables");
        return input.to_string();
    }

    let expanded = input
        .replace("{id}", &id)
        .replace("{username}", &name)
        .replace("{name}", &name);
    warn_on_lingering_braces(input, &expanded);
    expanded
}

/// Expand variables from persisted identity when no live handle exists.
/// Offline commands address players through the platform uuid.
pub fn expand_offline_variables(input: &str, info: &PlayerInfo) -> String {
    let id = if info.uuid.is_empty() { &info.id } else { &info.uuid };
    let expanded = input
        .replace("{id}", id)
        .replace("{username}", &info.username)
        .replace("{name}", &info.username);
    warn_on_lingering_braces(input, &expanded);
    expanded
}

fn warn_on_lingering_braces(input: &str, expanded: &str) {
    // Lingering braces mean an unrecognized token; execution proceeds anyway.
    if expanded.contains('{') || expanded.contains('}') {
        debug!(input, expanded, "lingering braces after expanding command variables");
    }
}
