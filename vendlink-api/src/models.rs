use serde::{Deserialize, Serialize};

/// Store identity returned by `/information`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
  pub account: AccountInfo,
  pub server: ServerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
  pub id: u64,
  /// Webstore domain, e.g. "https://store.example.com"
  pub domain: String,
  pub name: String,
  pub currency: CurrencyInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyInfo {
  pub iso_4217: String,
  pub symbol: String,
}

/// The game server this secret key is registered to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
  pub id: u64,
  pub name: String,
}

/// A purchasable package. Immutable once fetched; lives for one cache TTL
/// window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
  pub id: u64,
  pub name: String,
  /// Only populated by the verbose packages listing.
  #[serde(default)]
  pub description: String,
  pub price: f64,
  #[serde(default, rename = "payFrequency")]
  pub pay_frequency: Option<String>,
  /// Display ordering; shortcodes are assigned by ascending order.
  #[serde(default)]
  pub order: i64,
  #[serde(default)]
  pub category: Option<PackageCategory>,
  #[serde(default)]
  pub sale: Option<Sale>,
}

impl Package {
  /// Price after any active sale discount.
  pub fn effective_price(&self) -> f64 {
    match &self.sale {
      Some(sale) if sale.active => self.price - sale.discount,
      _ => self.price,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageCategory {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
  pub active: bool,
  pub discount: f64,
}

/// A category and its packages as returned by `/listing` (no package
/// descriptions in this payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub order: i64,
  #[serde(default)]
  pub packages: Vec<Package>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingResponse {
  pub categories: Vec<Category>,
}

/// A queued command to run against a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
  pub id: u64,
  /// Command template; `{id}`, `{username}` and `{name}` are expanded
  /// before dispatch.
  pub command: String,
  pub player: PlayerInfo,
  #[serde(default)]
  pub conditions: CommandConditions,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommandConditions {
  /// Seconds to wait before the command may run.
  #[serde(default)]
  pub delay: u64,
  /// Free inventory slots the player must have before the command may run.
  #[serde(default)]
  pub slots: u32,
}

/// Persisted player identity, used for variable expansion when no live
/// handle exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInfo {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub username: String,
  /// Platform-level identity (e.g. a Steam64 id). Offline commands address
  /// players through this field.
  #[serde(default)]
  pub uuid: String,
  #[serde(default)]
  pub ip: String,
}

/// A player the queue reports as having online commands ready to execute.
#[derive(Debug, Clone, Deserialize)]
pub struct DuePlayer {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueMeta {
  #[serde(default)]
  pub execute_offline: bool,
  /// Server-advised seconds until the next queue poll.
  pub next_check: u64,
  #[serde(default)]
  pub more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandQueueResponse {
  pub meta: QueueMeta,
  #[serde(default)]
  pub players: Vec<DuePlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineCommandsResponse {
  #[serde(default)]
  pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnlineCommandsResponse {
  pub player: PlayerInfo,
  #[serde(default)]
  pub commands: Vec<Command>,
}

/// A buffered player-connect telemetry event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEvent {
  pub username_id: String,
  pub event_type: String,
  /// Unix seconds at which the player connected.
  pub event_date: i64,
  pub ip: String,
}

impl JoinEvent {
  pub fn server_join(username_id: impl Into<String>, ip: impl Into<String>, now: i64) -> Self {
    Self {
      username_id: username_id.into(),
      event_type: "server.join".to_string(),
      event_date: now,
      ip: ip.into(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutUrl {
  pub url: String,
  #[serde(default)]
  pub expires: Option<String>,
}

/// Structured business-error body returned by the API on 4xx failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
  pub error_code: u32,
  pub error_message: String,
}

/// Store-side record for a player, as returned by `/users/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
  pub player: UserPlayer,
  #[serde(default)]
  pub ban_count: u32,
  #[serde(default)]
  pub chargeback_rate: f64,
  #[serde(default)]
  pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPlayer {
  pub id: String,
  pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
  pub price: f64,
}

/// An entitlement currently active for a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivePackage {
  pub package: Package,
  #[serde(default)]
  pub quantity: u32,
}
