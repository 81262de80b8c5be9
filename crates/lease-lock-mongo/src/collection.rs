//! Lock collection bootstrap.
//!
//! The lock protocol only needs a collection with a unique index on `name`.
//! The TTL index on `expireAt` is what reaps abandoned leases; the lock
//! handle itself never looks at expiry.

use std::time::Duration;

use lease_lock_core::error::LockResult;
use mongodb::{
    IndexModel,
    bson::{Document, doc},
    error::ErrorKind,
    options::IndexOptions,
};
use tracing::{info, instrument};

use crate::error::map_mongo_error;
use crate::store::MongoLeaseStore;

/// Server error code returned when creating a collection that already exists.
const NAMESPACE_EXISTS_CODE: i32 = 48;

/// Server-assigned name of the unique index on `name`.
///
/// Indexes are left unnamed so collections bootstrapped by other tooling,
/// which get the same default names, are accepted as they are.
pub const NAME_INDEX: &str = "name_1";

/// Server-assigned name of the TTL index on `expireAt`.
pub const EXPIRE_INDEX: &str = "expireAt_1";

impl MongoLeaseStore {
    /// Creates the lock collection, its schema validator and its indexes.
    ///
    /// Safe to run repeatedly and from several processes at once. An existing
    /// collection keeps its current validator.
    #[instrument(skip(self), fields(backend = "mongo"))]
    pub async fn ensure_collection(&self, database: &str, collection: &str) -> LockResult<()> {
        let db = self.client().database(database);

        let existing = db.list_collection_names().await.map_err(map_mongo_error)?;
        if !existing.iter().any(|name| name == collection) {
            match db.create_collection(collection).validator(lease_validator()).await {
                Ok(()) => info!("created lock collection"),
                Err(e) if is_namespace_exists(&e) => {}
                Err(e) => return Err(map_mongo_error(e)),
            }
        }

        db.collection::<Document>(collection)
            .create_indexes(lease_indexes())
            .await
            .map_err(map_mongo_error)?;

        Ok(())
    }
}

/// `$jsonSchema` validator for lease documents.
pub fn lease_validator() -> Document {
    doc! {
        "$jsonSchema": {
            "description": "Lock collection",
            "bsonType": "object",
            "required": ["name", "token", "expireAt", "lastAccessed", "created"],
            "properties": {
                "name": {
                    "bsonType": "string",
                    "description": "name of the lock, indexed and unique",
                },
                "token": {
                    "bsonType": "string",
                    "description": "token of the current holder",
                },
                "expireAt": {
                    "bsonType": "date",
                    "description": "when the store may reap this lease",
                },
                "lastAccessed": {
                    "bsonType": "date",
                    "description": "last time this lock was taken or attempted",
                },
                "created": {
                    "bsonType": "date",
                    "description": "creation time of the lease",
                },
            },
        }
    }
}

/// Unique index on `name` and TTL index on `expireAt`.
pub fn lease_indexes() -> [IndexModel; 2] {
    let name_index = IndexModel::builder()
        .keys(doc! { "name": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    let expire_index = IndexModel::builder()
        .keys(doc! { "expireAt": 1 })
        .options(IndexOptions::builder().expire_after(Duration::ZERO).build())
        .build();

    [name_index, expire_index]
}

fn is_namespace_exists(error: &mongodb::error::Error) -> bool {
    matches!(error.kind.as_ref(), ErrorKind::Command(err) if err.code == NAMESPACE_EXISTS_CODE)
}
