//! Registry of pooled clients keyed by connection id

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};
use serde::Serialize;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connector::{Connector, MongoConnector};
use super::uri::ConnectionTarget;
use crate::config::PoolConfig;
use crate::error::{ConfigError, ConnectionError, MongoConsoleError, Result};
use crate::store::{ConnectionRecord, ConnectionStore};

/// Lookups retried when the client is invalidated mid-connect
const MAX_CONNECT_ROUNDS: usize = 3;

/// One cached client, or the attempt to create it.
struct Slot<H> {
    /// URI the client is built from
    fingerprint: String,

    /// Filled once the first connect attempt succeeds
    handle: OnceCell<H>,

    /// Refreshed on every lookup
    last_used: Mutex<Instant>,

    /// Set once the client has been handed to the connector for closing
    closed: AtomicBool,
}

impl<H> Slot<H> {
    fn new(fingerprint: String) -> Self {
        Self {
            fingerprint,
            handle: OnceCell::new(),
            last_used: Mutex::new(Instant::now()),
            closed: AtomicBool::new(false),
        }
    }

    fn touch(&self) {
        *self.last_used.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Snapshot of one cached client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PooledClientStatus {
    /// Connection id
    pub connection_id: String,

    /// False while the first connect attempt is still in flight
    pub connected: bool,

    /// Time since the client was last handed out
    #[serde(rename = "idleSeconds", serialize_with = "serialize_secs")]
    pub idle_for: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// Outcome of [`ConnectionPool::test_connection`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestConnectionResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub message: String,
}

/// Maps connection ids to live pooled clients.
///
/// At most one client exists per connection id. Concurrent callers asking
/// for the same id while it is being created wait on the same attempt; a
/// failed attempt leaves no trace, so the next call retries.
///
/// Records are read from the [`ConnectionStore`] on every lookup. A record
/// that disappeared evicts its client, and a record whose URI changed gets a
/// fresh client.
pub struct ConnectionPool<C: Connector = MongoConnector> {
    store: Arc<dyn ConnectionStore>,
    connector: C,
    config: PoolConfig,
    slots: Mutex<HashMap<String, Arc<Slot<C::Handle>>>>,
}

impl ConnectionPool<MongoConnector> {
    /// Create a pool backed by the MongoDB driver
    pub fn new(store: Arc<dyn ConnectionStore>, config: PoolConfig) -> Self {
        Self::with_connector(store, MongoConnector, config)
    }

    /// Get a database handle for a saved connection
    ///
    /// # Arguments
    /// * `connection_id` - Saved connection id
    /// * `database` - Database name
    pub async fn get_database(&self, connection_id: &str, database: &str) -> Result<Database> {
        let client: Client = self.get_client(connection_id).await?;
        Ok(client.database(database))
    }

    /// Get a collection handle for a saved connection
    ///
    /// # Arguments
    /// * `connection_id` - Saved connection id
    /// * `database` - Database name
    /// * `collection` - Collection name
    pub async fn get_collection(
        &self,
        connection_id: &str,
        database: &str,
        collection: &str,
    ) -> Result<Collection<Document>> {
        let db = self.get_database(connection_id, database).await?;
        Ok(db.collection::<Document>(collection))
    }
}

impl<C: Connector> ConnectionPool<C> {
    /// Create a pool with a custom connector
    pub fn with_connector(store: Arc<dyn ConnectionStore>, connector: C, config: PoolConfig) -> Self {
        Self {
            store,
            connector,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Pool settings in effect
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Store the records are read from
    pub fn store(&self) -> &Arc<dyn ConnectionStore> {
        &self.store
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot<C::Handle>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the pooled client for a saved connection, creating it if needed
    ///
    /// # Arguments
    /// * `connection_id` - Saved connection id
    ///
    /// # Returns
    /// * `Result<C::Handle>` - Client handle, `NotFound` when no record
    ///   exists, or a connection error when the client cannot be created
    pub async fn get_client(&self, connection_id: &str) -> Result<C::Handle> {
        for _ in 0..MAX_CONNECT_ROUNDS {
            let Some(record) = self.store.find(connection_id).await? else {
                self.close_connection(connection_id).await;
                return Err(ConfigError::NotFound(connection_id.to_string()).into());
            };

            let target = ConnectionTarget::from_record(&record)?;
            let (slot, stale) = self.acquire_slot(connection_id, &target.uri);

            if let Some(stale) = stale {
                info!("Connection '{}' changed, replacing its client", connection_id);
                self.close_slot(connection_id, stale).await;
            }

            let created = slot
                .handle
                .get_or_try_init(|| async {
                    info!(
                        "Opening client for connection '{}' ({})",
                        connection_id,
                        target.sanitized_uri()
                    );
                    self.connector.connect(&target, &self.config).await
                })
                .await;

            match created {
                Ok(handle) => {
                    let handle = handle.clone();
                    if self.is_current(connection_id, &slot) {
                        slot.touch();
                        return Ok(handle);
                    }

                    // Closed, deleted or edited while connecting. The map no
                    // longer holds this client, so close it and read the record again.
                    debug!(
                        "Client for connection '{}' was invalidated while connecting",
                        connection_id
                    );
                    self.close_slot(connection_id, slot).await;
                }
                Err(e) => {
                    self.discard_failed_slot(connection_id, &slot);
                    warn!("Failed to open connection '{}': {}", connection_id, e);
                    return Err(e);
                }
            }
        }

        Err(ConnectionError::ConnectionFailed(format!(
            "connection '{connection_id}' was invalidated while connecting"
        ))
        .into())
    }

    /// Whether `slot` is still the map entry for `connection_id`
    fn is_current(&self, connection_id: &str, slot: &Arc<Slot<C::Handle>>) -> bool {
        self.slots()
            .get(connection_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Drop a slot whose connect attempt failed, unless other callers are
    /// still waiting on it. Waiters retry on the same slot.
    fn discard_failed_slot(&self, connection_id: &str, slot: &Arc<Slot<C::Handle>>) {
        let mut slots = self.slots();
        let owned_by_map = slots
            .get(connection_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot));

        // Slots are only cloned under the map lock: map + this caller means no waiters.
        if owned_by_map && Arc::strong_count(slot) == 2 {
            slots.remove(connection_id);
        }
    }

    /// Find or insert the slot for `connection_id`, touching it under the map lock
    /// so the idle sweep never evicts a slot that was just handed out.
    fn acquire_slot(
        &self,
        connection_id: &str,
        fingerprint: &str,
    ) -> (Arc<Slot<C::Handle>>, Option<Arc<Slot<C::Handle>>>) {
        let mut slots = self.slots();

        let stale = match slots.get(connection_id) {
            Some(slot) if slot.fingerprint == fingerprint => {
                slot.touch();
                return (Arc::clone(slot), None);
            }
            Some(_) => slots.remove(connection_id),
            None => None,
        };

        let slot = Arc::new(Slot::new(fingerprint.to_string()));
        slots.insert(connection_id.to_string(), Arc::clone(&slot));
        (slot, stale)
    }

    /// Close a slot's client if it was ever created, at most once.
    ///
    /// A slot still connecting is left alone: its connecting caller notices
    /// the slot is gone from the map and closes the client itself.
    async fn close_slot(&self, connection_id: &str, slot: Arc<Slot<C::Handle>>) {
        let Some(handle) = slot.handle.get().cloned() else {
            return;
        };
        if slot.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.connector.close(handle).await {
            Ok(()) => debug!("Closed client for connection '{}'", connection_id),
            Err(e) => warn!("Error closing connection '{}': {}", connection_id, e),
        }
    }

    /// Close and forget the client for a connection
    ///
    /// Idempotent: closing an unknown id is a no-op. Close errors are logged
    /// and swallowed.
    pub async fn close_connection(&self, connection_id: &str) {
        let removed = self.slots().remove(connection_id);
        if let Some(slot) = removed {
            self.close_slot(connection_id, slot).await;
        }
    }

    /// Close every cached client
    pub async fn close_all_connections(&self) {
        let drained: Vec<_> = self.slots().drain().collect();
        if !drained.is_empty() {
            info!("Closing {} pooled connection(s)", drained.len());
        }
        for (connection_id, slot) in drained {
            self.close_slot(&connection_id, slot).await;
        }
    }

    /// Close clients idle for longer than the configured idle timeout
    ///
    /// # Returns
    /// * `usize` - Number of evicted clients
    pub async fn evict_idle(&self) -> usize {
        let threshold = self.config.idle_timeout();
        let expired: Vec<_> = {
            let mut slots = self.slots();
            let ids: Vec<String> = slots
                .iter()
                .filter(|(_, slot)| slot.handle.initialized() && slot.idle_for() > threshold)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| slots.remove(&id).map(|slot| (id, slot)))
                .collect()
        };

        for (connection_id, slot) in &expired {
            info!(
                "Evicting idle connection '{}' (idle {}s)",
                connection_id,
                slot.idle_for().as_secs()
            );
            self.close_slot(connection_id, Arc::clone(slot)).await;
        }

        expired.len()
    }

    /// Close clients whose connection records no longer exist
    ///
    /// # Returns
    /// * `Result<usize>` - Number of evicted clients
    pub async fn prune_missing(&self) -> Result<usize> {
        let known: HashSet<String> = self
            .store
            .load_connections()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let orphaned: Vec<_> = {
            let mut slots = self.slots();
            let ids: Vec<String> = slots
                .keys()
                .filter(|id| !known.contains(*id))
                .cloned()
                .collect();
            ids.into_iter()
                .filter_map(|id| slots.remove(&id).map(|slot| (id, slot)))
                .collect()
        };

        for (connection_id, slot) in &orphaned {
            info!("Connection '{}' was removed, closing its client", connection_id);
            self.close_slot(connection_id, Arc::clone(slot)).await;
        }

        Ok(orphaned.len())
    }

    /// Snapshot of cached clients, sorted by connection id
    pub fn status(&self) -> Vec<PooledClientStatus> {
        let mut status: Vec<_> = self
            .slots()
            .iter()
            .map(|(id, slot)| PooledClientStatus {
                connection_id: id.clone(),
                connected: slot.handle.initialized(),
                idle_for: slot.idle_for(),
            })
            .collect();
        status.sort_by(|a, b| a.connection_id.cmp(&b.connection_id));
        status
    }

    /// Number of cached clients
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Whether no client is cached
    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    /// Check that a connection record can reach its server
    ///
    /// Uses a separate short-lived client that is never cached. Never fails:
    /// problems are reported through the returned value.
    pub async fn test_connection(&self, record: &ConnectionRecord) -> TestConnectionResult {
        let target = match ConnectionTarget::from_record(record) {
            Ok(target) => target,
            Err(e) => {
                return TestConnectionResult {
                    success: false,
                    version: None,
                    message: e.to_string(),
                };
            }
        };

        match self
            .connector
            .describe(&target, self.config.test_timeout())
            .await
        {
            Ok(description) => TestConnectionResult {
                success: true,
                message: match &description.version {
                    Some(version) => format!("Connected successfully (MongoDB {version})"),
                    None => "Connected successfully".to_string(),
                },
                version: description.version,
            },
            Err(e) => TestConnectionResult {
                success: false,
                version: None,
                message: describe_test_failure(&e),
            },
        }
    }

    /// Run [`ConnectionPool::evict_idle`] periodically until `cancel` fires
    pub fn spawn_idle_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        let period = self.config.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = pool.evict_idle().await;
                        if evicted > 0 {
                            debug!("Idle sweep evicted {} client(s)", evicted);
                        }
                    }
                }
            }

            debug!("Idle sweeper stopped");
        })
    }
}

/// Human-readable reason a connection test failed.
fn describe_test_failure(error: &MongoConsoleError) -> String {
    match error {
        MongoConsoleError::Connection(ConnectionError::AuthenticationFailed(_)) => {
            "Authentication failed: check the username, password and authentication database"
                .to_string()
        }
        MongoConsoleError::Connection(ConnectionError::Timeout) => {
            "Connection timed out: the server did not respond".to_string()
        }
        MongoConsoleError::Connection(ConnectionError::ConnectionFailed(msg)) => {
            format!("Connection failed: {msg}")
        }
        MongoConsoleError::Connection(ConnectionError::InvalidUri(msg)) => {
            format!("Invalid connection URI: {msg}")
        }
        other => other.to_string(),
    }
}
