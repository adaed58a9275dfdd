mod error;
mod models;
mod ratelimit;
mod telemetry;
mod transport;

pub use error::{ApiError, Result};
pub use models::{
  AccountInfo, ActivePackage, Category, CheckoutUrl, Command, CommandConditions,
  CommandQueueResponse, CurrencyInfo, DuePlayer, ErrorPayload, JoinEvent, ListingResponse,
  OfflineCommandsResponse, OnlineCommandsResponse, Package, PackageCategory, Payment, PlayerInfo,
  QueueMeta, Sale, ServerInfo, StoreInfo, UserInfoResponse, UserPlayer,
};
pub use ratelimit::RateLimitState;
pub use telemetry::{PlatformInfo, TriageEvent};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError, Verb};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, warn};

/// Seconds all outbound traffic stays suppressed after a remote 429.
const RATE_LIMIT_COOLDOWN_SECS: i64 = 300;

/// Client for the vendlink plugin API.
///
/// Cheap to clone; clones share the transport, the global rate-limit state
/// and the cached store identity. Every call funnels through one classified
/// dispatch path, so rate limiting and triage reporting behave the same for
/// every endpoint.
#[derive(Clone)]
pub struct ApiClient {
  inner: Arc<ClientInner>,
}

struct ClientInner {
  transport: Arc<dyn Transport>,
  secret_key: String,
  base_url: String,
  logs_url: String,
  platform: PlatformInfo,
  auto_report: bool,
  rate_limit: Mutex<RateLimitState>,
  /// Store name and domain, filled once `/information` has been fetched so
  /// triage events can identify the store.
  store_identity: Mutex<Option<(String, String)>>,
}

impl ApiClient {
  pub fn new(
    secret_key: impl Into<String>,
    base_url: impl Into<String>,
    logs_url: impl Into<String>,
    platform: PlatformInfo,
    auto_report: bool,
    timeout: Duration,
  ) -> Self {
    Self::with_transport(
      secret_key,
      base_url,
      logs_url,
      platform,
      auto_report,
      Arc::new(HttpTransport::new(timeout)),
    )
  }

  pub fn with_transport(
    secret_key: impl Into<String>,
    base_url: impl Into<String>,
    logs_url: impl Into<String>,
    platform: PlatformInfo,
    auto_report: bool,
    transport: Arc<dyn Transport>,
  ) -> Self {
    Self {
      inner: Arc::new(ClientInner {
        transport,
        secret_key: secret_key.into(),
        base_url: base_url.into(),
        logs_url: logs_url.into(),
        platform,
        auto_report,
        rate_limit: Mutex::new(RateLimitState::new()),
        store_identity: Mutex::new(None),
      }),
    }
  }

  /// Global suppression state shared by every clone of this client.
  pub fn rate_limit(&self) -> &Mutex<RateLimitState> {
    &self.inner.rate_limit
  }

  /// Record the store identity used to annotate triage events.
  pub fn set_store_identity(&self, name: &str, domain: &str) {
    let mut identity = self.inner.store_identity.lock().unwrap();
    *identity = Some((name.to_string(), domain.to_string()));
  }

  // ==========================================================================
  // Store metadata
  // ==========================================================================

  pub async fn information(&self) -> Result<StoreInfo> {
    self.get_json("/information").await
  }

  pub async fn listing(&self) -> Result<ListingResponse> {
    self.get_json("/listing").await
  }

  pub async fn all_packages(&self, verbose: bool) -> Result<Vec<Package>> {
    let path = if verbose { "/packages?verbose=true" } else { "/packages" };
    self.get_json(path).await
  }

  // ==========================================================================
  // Command queue
  // ==========================================================================

  pub async fn command_queue(&self) -> Result<CommandQueueResponse> {
    self.get_json("/queue").await
  }

  pub async fn offline_commands(&self) -> Result<OfflineCommandsResponse> {
    self.get_json("/queue/offline-commands").await
  }

  pub async fn online_commands(&self, player_id: u64) -> Result<OnlineCommandsResponse> {
    self
      .get_json(&format!("/queue/online-commands/{player_id}"))
      .await
  }

  /// Delete acknowledged commands from the remote queue. Idempotent on the
  /// remote side; resending the same ids is safe.
  pub async fn delete_commands(&self, ids: &[u64]) -> Result<()> {
    let body = json!({ "ids": ids });
    self
      .dispatch(Verb::Delete, self.url("/queue/commands"), Some(body.to_string()))
      .await
      .map(|_| ())
  }

  // ==========================================================================
  // Checkout, bans, users
  // ==========================================================================

  pub async fn create_checkout(&self, package_id: u64, username: &str) -> Result<CheckoutUrl> {
    let body = json!({ "package_id": package_id, "username": username });
    let response = self
      .dispatch(Verb::Post, self.url("/queue/checkout"), Some(body.to_string()))
      .await?;
    self.decode(&response)
  }

  pub async fn create_ban(&self, reason: &str, ip: &str, user: &str) -> Result<()> {
    let body = json!({ "reason": reason, "ip": ip, "user": user });
    self
      .dispatch(Verb::Post, self.url("/bans"), Some(body.to_string()))
      .await
      .map(|_| ())
  }

  pub async fn user(&self, user_id: &str) -> Result<UserInfoResponse> {
    self.get_json(&format!("/users/{user_id}")).await
  }

  pub async fn active_packages(&self, player_id: &str) -> Result<Vec<ActivePackage>> {
    self.get_json(&format!("/player/{player_id}/packages")).await
  }

  // ==========================================================================
  // Telemetry
  // ==========================================================================

  pub async fn player_join_events(&self, events: &[JoinEvent]) -> Result<()> {
    let body = json!(events);
    self
      .dispatch(Verb::Post, self.url("/events/join"), Some(body.to_string()))
      .await
      .map(|_| ())
  }

  /// Submit a triage event to the plugin-logs endpoint.
  pub async fn send_triage(&self, mut event: TriageEvent) -> Result<()> {
    if let Some((name, domain)) = self.inner.store_identity.lock().unwrap().clone() {
      event.store_name = name;
      event.store_url = domain;
    }
    // The logs endpoint expects a batch.
    let body = json!([event]);
    self
      .dispatch(Verb::Post, self.inner.logs_url.clone(), Some(body.to_string()))
      .await
      .map(|_| ())
  }

  /// Fire-and-forget triage submission for automatically detected issues.
  /// Failures of the logs endpoint itself are never re-reported.
  pub fn report_auto_triage(&self, message: &str, metadata: HashMap<String, String>) {
    if !self.inner.auto_report {
      return;
    }
    if metadata
      .get("request")
      .is_some_and(|request| request.contains(&self.inner.logs_url))
    {
      return;
    }

    let event = self.inner.platform.event(message, metadata);
    let client = self.clone();
    tokio::spawn(async move {
      if let Err(err) = client.send_triage(event).await {
        debug!(%err, "failed to submit triage event");
      }
    });
  }

  // ==========================================================================
  // Dispatch
  // ==========================================================================

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.inner.base_url, path)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let body = self.dispatch(Verb::Get, self.url(path), None).await?;
    self.decode(&body)
  }

  fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| ApiError::Parse {
      message: err.to_string(),
      body: body.to_string(),
    })
  }

  /// Send one request and classify the outcome. This is the single path all
  /// outbound traffic takes; see the per-status arms for the contract.
  async fn dispatch(&self, verb: Verb, url: String, body: Option<String>) -> Result<String> {
    let now = unix_now();
    {
      let rate_limit = self.inner.rate_limit.lock().unwrap();
      if rate_limit.suppressed(now) {
        debug!(%url, "skipping web request while rate limit cooldown is active");
        return Err(ApiError::Suppressed);
      }
    }

    let request_line = format!("{} {} | {}", verb, url, body.as_deref().unwrap_or(""));
    debug!("-> {request_line}");

    let request = ApiRequest {
      verb,
      url: url.clone(),
      body,
      secret: self.inner.secret_key.clone(),
    };

    let response = match self.inner.transport.send(request).await {
      Ok(response) => response,
      Err(err) => {
        error!(%url, %err, "no response from api; the next scheduled cycle retries");
        self.report_auto_triage(
          "Request timeout to plugin API",
          HashMap::from([
            ("request".to_string(), request_line),
            ("error".to_string(), err.to_string()),
          ]),
        );
        return Err(ApiError::Transport(err));
      }
    };

    let response_line = format!("{} | '{}' <- {} {}", response.status, response.body, verb, url);
    debug!("{response_line}");

    match response.status {
      200 | 201 | 202 | 204 => Ok(response.body),
      403 => {
        if url.starts_with(&self.inner.base_url) {
          error!("the server's secret key is either not set or incorrect");
          error!("set the secret key issued for your webstore in the plugin configuration");
        }
        Err(ApiError::AuthRejected)
      }
      429 => {
        // Rate limits sent by the logs server are ignored.
        if url.starts_with(&self.inner.logs_url) {
          return Err(ApiError::RateLimited);
        }
        warn!(
          "rate limited by the remote api; outbound requests resume in {} seconds",
          RATE_LIMIT_COOLDOWN_SECS
        );
        self
          .inner
          .rate_limit
          .lock()
          .unwrap()
          .engage(now + RATE_LIMIT_COOLDOWN_SECS);
        Err(ApiError::RateLimited)
      }
      status if status >= 500 => {
        error!(status, %url, "internal server error from api");
        self.report_auto_triage(
          "Internal server error from plugin API",
          HashMap::from([
            ("request".to_string(), request_line),
            ("response".to_string(), response_line),
          ]),
        );
        Err(ApiError::Server { status, body: response.body })
      }
      status => match serde_json::from_str::<ErrorPayload>(&response.body) {
        Ok(payload) => {
          debug!(status, %url, code = payload.error_code, "api reported a structured failure");
          self.report_auto_triage(
            "Plugin API reported general failure",
            HashMap::from([
              ("request".to_string(), request_line),
              ("response".to_string(), response_line),
            ]),
          );
          Err(ApiError::Api(payload))
        }
        Err(_) => {
          error!(status, %url, "could not interpret error response from api");
          self.report_auto_triage(
            "Unhandled error response from plugin API",
            HashMap::from([
              ("request".to_string(), request_line),
              ("response".to_string(), response_line),
            ]),
          );
          Err(ApiError::Server { status, body: response.body })
        }
      },
    }
  }
}

fn unix_now() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap()
    .as_secs() as i64
}
