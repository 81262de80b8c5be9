//! MongoDB lease lock provider implementation.

use std::time::Duration;

use lease_lock_core::error::{LockError, LockResult};
use lease_lock_core::lock::LeaseLock;
use lease_lock_core::options::LeaseLockOptions;
use lease_lock_core::traits::LeaseLockProvider;
use mongodb::Client;

use crate::error::map_mongo_error;
use crate::store::MongoLeaseStore;

/// Environment variable read by [`MongoLeaseLockProvider::from_env`].
pub const MONGODB_URI_ENV: &str = "MONGODB_URI";

/// URI used when [`MONGODB_URI_ENV`] is not set.
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";

/// Builder for MongoDB lease lock provider configuration.
pub struct MongoLeaseLockProviderBuilder {
    uri: Option<String>,
    client: Option<Client>,
    options: LeaseLockOptions,
    ensure_collection: bool,
}

impl MongoLeaseLockProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            uri: None,
            client: None,
            options: LeaseLockOptions::default(),
            ensure_collection: false,
        }
    }

    /// Sets the connection string.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Uses an existing client. Takes precedence over [`uri`](Self::uri).
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the database holding the lock collection.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.options.database = database.into();
        self
    }

    /// Sets the lock collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.options.collection = collection.into();
        self
    }

    /// Sets the TTL written when a lock creates its lease.
    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.options.expiration = expiration;
        self
    }

    /// Creates the collection and its indexes during [`build`](Self::build).
    ///
    /// Off by default. Mutual exclusion relies on the unique index on `name`,
    /// so leave it off only when the collection is provisioned elsewhere.
    pub fn ensure_collection(mut self, ensure: bool) -> Self {
        self.ensure_collection = ensure;
        self
    }

    /// Builds the provider.
    pub async fn build(self) -> LockResult<MongoLeaseLockProvider> {
        self.options.validate()?;

        let client = match (self.client, self.uri) {
            (Some(client), _) => client,
            (None, Some(uri)) => Client::with_uri_str(&uri).await.map_err(map_mongo_error)?,
            (None, None) => {
                return Err(LockError::InvalidConfiguration(
                    "no MongoDB client or URI provided".to_string(),
                ));
            }
        };

        let store = MongoLeaseStore::new(client);
        if self.ensure_collection {
            store
                .ensure_collection(&self.options.database, &self.options.collection)
                .await?;
        }

        Ok(MongoLeaseLockProvider {
            store,
            options: self.options,
        })
    }
}

impl Default for MongoLeaseLockProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for MongoDB-backed lease locks.
#[derive(Debug, Clone)]
pub struct MongoLeaseLockProvider {
    store: MongoLeaseStore,
    options: LeaseLockOptions,
}

impl MongoLeaseLockProvider {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> MongoLeaseLockProviderBuilder {
        MongoLeaseLockProviderBuilder::new()
    }

    /// Creates a provider for `uri` with the default namespace and TTL.
    ///
    /// Also runs [`MongoLeaseStore::ensure_collection`] on the default
    /// namespace: without the unique index on `name`, two racing first
    /// acquires can both insert a lease. Use [`builder`](Self::builder) to
    /// skip this when the collection is provisioned elsewhere.
    pub async fn new(uri: impl Into<String>) -> LockResult<Self> {
        Self::builder().uri(uri).ensure_collection(true).build().await
    }

    /// Creates a provider for `$MONGODB_URI`, falling back to localhost.
    ///
    /// Bootstraps the default collection like [`new`](Self::new).
    pub async fn from_env() -> LockResult<Self> {
        Self::new(uri_from_env()).await
    }

    pub fn store(&self) -> &MongoLeaseStore {
        &self.store
    }

    pub fn options(&self) -> &LeaseLockOptions {
        &self.options
    }
}

impl LeaseLockProvider for MongoLeaseLockProvider {
    type Store = MongoLeaseStore;

    fn create_lock(&self, name: &str) -> LockResult<LeaseLock<Self::Store>> {
        LeaseLock::with_options(self.store.clone(), name, &self.options)
    }
}

fn uri_from_env() -> String {
    std::env::var(MONGODB_URI_ENV).unwrap_or_else(|_| DEFAULT_MONGODB_URI.to_string())
}
