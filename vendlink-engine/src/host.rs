use std::sync::Arc;

/// A live player handle exposed by the host process.
///
/// The engine never inspects a concrete player type; host adapters implement
/// this capability surface and the dispatcher works entirely through it.
pub trait PlayerHandle: Send + Sync {
    fn id(&self) -> String;
    fn name(&self) -> String;
    fn is_connected(&self) -> bool;
    /// Deliver a chat message to this player.
    fn send_message(&self, message: &str);
    /// Free inventory capacity, or `None` where the host has no such concept.
    fn available_inventory_slots(&self) -> Option<u32>;
}

/// Host-process services the engine depends on.
pub trait Host: Send + Sync {
    /// Resolve a live player by id, platform uuid, or name.
    fn find_player(&self, id_or_name: &str) -> Option<Arc<dyn PlayerHandle>>;
    /// Run a console command on the host server.
    fn run_command(&self, command: &str) -> anyhow::Result<()>;
}
