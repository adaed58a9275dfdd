use std::collections::HashMap;

use serde::Serialize;

/// A diagnostic record describing an unexpected failure, submitted to the
/// plugin-logs endpoint for operator visibility. Not user-facing.
#[derive(Debug, Clone, Serialize)]
pub struct TriageEvent {
  pub game_id: String,
  pub framework_id: String,
  pub runtime_version: String,
  pub plugin_version: String,
  pub server_ip: String,
  pub error_message: String,
  pub trace: String,
  pub metadata: HashMap<String, String>,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub store_name: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub store_url: String,
}

/// Static platform identity attached to every triage event.
#[derive(Debug, Clone, Default)]
pub struct PlatformInfo {
  /// Game and version, e.g. "Rust 2511 | 2567"
  pub game_id: String,
  /// Modding framework the host runs under
  pub framework_id: String,
  pub runtime_version: String,
  pub plugin_version: String,
  pub server_ip: String,
}

impl PlatformInfo {
  /// Build a triage event carrying this platform identity.
  pub fn event(&self, message: impl Into<String>, metadata: HashMap<String, String>) -> TriageEvent {
    TriageEvent {
      game_id: self.game_id.clone(),
      framework_id: self.framework_id.clone(),
      runtime_version: self.runtime_version.clone(),
      plugin_version: self.plugin_version.clone(),
      server_ip: self.server_ip.clone(),
      error_message: message.into(),
      trace: String::new(),
      metadata,
      store_name: String::new(),
      store_url: String::new(),
    }
  }
}
