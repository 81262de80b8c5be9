//! MongoDB lease store.

use std::time::{Duration, SystemTime};

use lease_lock_core::error::LockResult;
use lease_lock_core::lease::{Lease, LockKey, expiry_after};
use lease_lock_core::traits::LeaseStore;
use mongodb::{
    Client, Collection,
    bson::{DateTime, Document, doc},
    options::ReturnDocument,
};
use tracing::{Span, debug, field, instrument};

use crate::document::MongoLeaseDocument;
use crate::error::{is_duplicate_key, map_mongo_error};

/// [`LeaseStore`] backed by MongoDB.
///
/// Each operation is a single command against
/// `client.database(key.database()).collection(key.collection())`:
///
/// - acquire-or-refresh: `findOneAndUpdate` with `upsert`, returning the
///   post-image, `$setOnInsert` for the identity fields and `$set` for
///   `lastAccessed`
/// - probe: `find` on `name` and `token`
/// - release: `findOneAndDelete` on `name` and `token`
///
/// Exclusion relies on the unique index on `name`; see
/// [`ensure_collection`](Self::ensure_collection).
#[derive(Debug, Clone)]
pub struct MongoLeaseStore {
    client: Client,
}

impl MongoLeaseStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn collection(&self, key: &LockKey) -> Collection<MongoLeaseDocument> {
        self.client
            .database(key.database())
            .collection(key.collection())
    }
}

impl LeaseStore for MongoLeaseStore {
    #[instrument(
        skip(self, key, token),
        fields(lock.key = %key, backend = "mongo", found = field::Empty)
    )]
    async fn acquire_or_refresh(
        &self,
        key: &LockKey,
        token: &str,
        ttl: Duration,
    ) -> LockResult<Option<Lease>> {
        let result = self
            .collection(key)
            .find_one_and_update(name_filter(key), acquire_update(token, SystemTime::now(), ttl))
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(document) => {
                Span::current().record("found", document.is_some());
                Ok(document.map(Lease::from))
            }
            Err(e) if is_duplicate_key(&e) => {
                debug!("concurrent insert won the upsert race");
                Ok(None)
            }
            Err(e) => Err(map_mongo_error(e)),
        }
    }

    #[instrument(
        skip(self, key, token),
        fields(lock.key = %key, backend = "mongo", found = field::Empty)
    )]
    async fn probe(&self, key: &LockKey, token: &str) -> LockResult<Option<Lease>> {
        let document = self
            .collection(key)
            .find_one(owner_filter(key, token))
            .await
            .map_err(map_mongo_error)?;

        Span::current().record("found", document.is_some());
        Ok(document.map(Lease::from))
    }

    #[instrument(
        skip(self, key, token),
        fields(lock.key = %key, backend = "mongo", found = field::Empty)
    )]
    async fn release_if_owned(&self, key: &LockKey, token: &str) -> LockResult<Option<Lease>> {
        let document = self
            .collection(key)
            .find_one_and_delete(owner_filter(key, token))
            .await
            .map_err(map_mongo_error)?;

        Span::current().record("found", document.is_some());
        Ok(document.map(Lease::from))
    }
}

fn name_filter(key: &LockKey) -> Document {
    doc! { "name": key.name() }
}

fn owner_filter(key: &LockKey, token: &str) -> Document {
    doc! { "name": key.name(), "token": token }
}

/// Update for acquire-or-refresh.
///
/// `name` is not listed: an upsert copies it from the equality filter.
fn acquire_update(token: &str, now: SystemTime, ttl: Duration) -> Document {
    let now_bson = DateTime::from_system_time(now);
    doc! {
        "$setOnInsert": {
            "token": token,
            "expireAt": DateTime::from_system_time(expiry_after(now, ttl)),
            "created": now_bson,
        },
        "$set": {
            "lastAccessed": now_bson,
        },
    }
}
