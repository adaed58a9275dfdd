pub mod cache;
pub mod config;
pub mod dispatch;
pub mod helpers;
pub mod host;
pub mod logging;

mod ack;
mod events;
mod listings;
mod queue;

use std::sync::{Arc, Mutex, Weak};

use tokio::task::JoinHandle;
use tracing::info;
use vendlink_api::{
    ActivePackage, ApiClient, CheckoutUrl, Command, HttpTransport, JoinEvent, Package, Result,
    Transport, TriageEvent, UserInfoResponse,
};

use crate::cache::TtlCache;
use crate::config::EngineConfig;
use crate::host::Host;

/// Per-operation "next allowed run" timestamps, unix seconds.
///
/// These gates, not the timer drivers, decide whether an operation runs.
/// Timer facilities can catch up after a stall by firing missed ticks
/// back-to-back; a burst of redundant ticks is a series of cheap no-ops
/// because each operation re-checks its own gate.
#[derive(Debug, Default)]
pub(crate) struct Cooldowns {
    pub command_queue: i64,
    pub delete_commands: i64,
    pub join_queue: i64,
    pub info_refresh: i64,
}

/// The command-queue synchronization engine.
///
/// One explicitly constructed instance is shared by reference with every
/// collaborator (chat commands, host hooks, timer drivers); there are no
/// process-wide statics. All remote traffic goes through the wrapped
/// [`ApiClient`] and inherits its rate limiting and triage reporting.
pub struct SyncEngine {
    pub(crate) api: ApiClient,
    pub(crate) host: Arc<dyn Host>,
    pub(crate) config: EngineConfig,
    pub(crate) cache: TtlCache,
    /// Commands that ran successfully and await remote deletion.
    pub(crate) executed: Mutex<Vec<Command>>,
    /// Buffered player-connect events awaiting batch submission.
    pub(crate) join_queue: Mutex<Vec<JoinEvent>>,
    pub(crate) cooldowns: Mutex<Cooldowns>,
    /// Self-handle for spawning deferred work (delayed commands, threshold
    /// flushes) from `&self` methods.
    pub(crate) weak_self: Weak<SyncEngine>,
}

impl SyncEngine {
    pub fn new(config: EngineConfig, host: Arc<dyn Host>) -> Arc<Self> {
        let transport = Arc::new(HttpTransport::new(config.request_timeout));
        Self::with_transport(config, host, transport)
    }

    /// Construct the engine over an explicit transport. Tests script the
    /// transport; production callers use [`SyncEngine::new`].
    pub fn with_transport(
        config: EngineConfig,
        host: Arc<dyn Host>,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        if config.secret_key.is_empty() {
            info!("no secret key configured; set VENDLINK_SECRET_KEY to the key issued for your webstore");
        }

        let api = ApiClient::with_transport(
            &config.secret_key,
            &config.base_url,
            &config.logs_url,
            config.platform.clone(),
            config.auto_report,
            transport,
        );

        Arc::new_cyclic(|weak| Self {
            api,
            host,
            config,
            cache: TtlCache::new(),
            executed: Mutex::new(Vec::new()),
            join_queue: Mutex::new(Vec::new()),
            cooldowns: Mutex::new(Cooldowns::default()),
            weak_self: weak.clone(),
        })
    }

    /// The wrapped API client (shared rate-limit state lives here).
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// IDs of commands that executed locally and await remote deletion.
    pub fn pending_acknowledgements(&self) -> Vec<u64> {
        self.executed.lock().unwrap().iter().map(|c| c.id).collect()
    }

    /// Create a checkout URL for a player to purchase the given package.
    pub async fn create_checkout_url(&self, player_name: &str, package: &Package) -> Result<CheckoutUrl> {
        self.api.create_checkout(package.id, player_name).await
    }

    /// Ban a player from the webstore. Bans placed here can only be lifted
    /// from the webstore itself.
    pub async fn ban_player(&self, player_name: &str, player_ip: &str, reason: &str) -> Result<()> {
        self.api.create_ban(reason, player_ip, player_name).await
    }

    /// Store-side record for a player: payments, bans, chargeback rate.
    pub async fn get_user(&self, user_id: &str) -> Result<UserInfoResponse> {
        self.api.user(user_id).await
    }

    /// Entitlements currently active for a customer.
    pub async fn get_active_packages(&self, player_id: &str) -> Result<Vec<ActivePackage>> {
        self.api.active_packages(player_id).await
    }

    /// Submit an operator-initiated triage report.
    pub async fn report_triage(&self, event: TriageEvent) -> Result<()> {
        self.api.send_triage(event).await
    }

    /// Spawn the periodic drivers on the current tokio runtime.
    ///
    /// Intervals fire their first tick immediately, which doubles as the
    /// startup poll and store-info fetch. The default missed-tick behavior
    /// replays missed ticks as a burst after a stall; the cooldown gates
    /// absorb that, matching how the engine survives host timer catch-up.
    pub fn spawn_timers(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        let Some(this) = self.weak_self.upgrade() else {
            return handles;
        };

        let engine = Arc::clone(&this);
        let period = self.config.command_queue_interval;
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                engine.process_command_queue(false).await;
            }
        }));

        let engine = Arc::clone(&this);
        let period = self.config.delete_interval;
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                engine.delete_executed_commands(false).await;
            }
        }));

        let engine = Arc::clone(&this);
        let period = self.config.join_interval;
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                engine.process_join_queue(false).await;
            }
        }));

        let engine = Arc::clone(&this);
        let period = self.config.info_refresh_interval;
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                engine.refresh_store_information(false).await;
            }
        }));

        handles
    }
}
