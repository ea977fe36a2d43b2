//! Driver seam for the connection pool

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;
use tracing::debug;

use super::uri::ConnectionTarget;
use crate::config::PoolConfig;
use crate::error::mongo::{classify_connect_error, scrub_secrets};
use crate::error::{ConnectionError, Result};

/// Information reported by a server during a connection test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerDescription {
    /// Server version from `buildInfo`
    pub version: Option<String>,
}

/// Opens, probes and closes driver clients.
///
/// The pool only deals in opaque handles, so its caching and eviction rules
/// do not depend on a reachable server.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Client handle; clones share the same underlying sockets
    type Handle: Clone + Send + Sync + 'static;

    /// Open a pooled client and verify it answers.
    async fn connect(&self, target: &ConnectionTarget, config: &PoolConfig)
    -> Result<Self::Handle>;

    /// Open a short-lived client, describe the server, then shut it down.
    async fn describe(
        &self,
        target: &ConnectionTarget,
        timeout: Duration,
    ) -> Result<ServerDescription>;

    /// Close a client previously returned by [`Connector::connect`].
    async fn close(&self, handle: Self::Handle) -> Result<()>;
}

/// [`Connector`] backed by the official MongoDB driver
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

impl MongoConnector {
    /// Parse the target URI into client options.
    async fn client_options(target: &ConnectionTarget) -> Result<ClientOptions> {
        ClientOptions::parse(&target.uri).await.map_err(|e| {
            ConnectionError::InvalidUri(scrub_secrets(&e.to_string(), &target.secrets())).into()
        })
    }

    /// Run `ping` against the admin database.
    async fn ping(client: &Client) -> mongodb::error::Result<()> {
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
    }

    /// Ping then read the server version.
    async fn probe(client: &Client) -> mongodb::error::Result<ServerDescription> {
        Self::ping(client).await?;
        let admin: Database = client.database("admin");
        let info = admin.run_command(doc! { "buildInfo": 1 }).await?;
        Ok(ServerDescription {
            version: info.get_str("version").ok().map(str::to_string),
        })
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = Client;

    async fn connect(&self, target: &ConnectionTarget, config: &PoolConfig) -> Result<Client> {
        let mut options = Self::client_options(target).await?;
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.max_idle_time = Some(config.max_idle_time());
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.server_selection_timeout());
        if options.app_name.is_none() {
            options.app_name = Some(config.app_name.clone());
        }

        let client = Client::with_options(options)
            .map_err(|e| classify_connect_error(&e, &target.secrets()))?;

        if let Err(e) = Self::ping(&client).await {
            client.shutdown().immediate(true).await;
            return Err(classify_connect_error(&e, &target.secrets()).into());
        }

        debug!("Verified client for {}", target.sanitized_uri());
        Ok(client)
    }

    async fn describe(
        &self,
        target: &ConnectionTarget,
        timeout: Duration,
    ) -> Result<ServerDescription> {
        let mut options = Self::client_options(target).await?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.max_pool_size = Some(1);
        options.min_pool_size = Some(0);

        let client = Client::with_options(options)
            .map_err(|e| classify_connect_error(&e, &target.secrets()))?;

        // Server selection bounds each step; the outer limit covers DNS and TLS stalls.
        let outcome = tokio::time::timeout(timeout.saturating_mul(2), Self::probe(&client)).await;
        client.shutdown().immediate(true).await;

        match outcome {
            Ok(Ok(description)) => Ok(description),
            Ok(Err(e)) => Err(classify_connect_error(&e, &target.secrets()).into()),
            Err(_) => Err(ConnectionError::Timeout.into()),
        }
    }

    async fn close(&self, handle: Client) -> Result<()> {
        handle.shutdown().immediate(true).await;
        Ok(())
    }
}
