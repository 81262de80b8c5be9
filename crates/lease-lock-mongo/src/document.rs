use lease_lock_core::lease::{Lease, LeaseIdentity, LeaseLiveness};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Lease document as stored in the lock collection.
///
/// Field names are fixed so existing collections (and their unique and TTL
/// indexes) keep working. The server-assigned `_id` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoLeaseDocument {
    pub name: String,

    pub token: String,

    #[serde(rename = "expireAt")]
    pub expire_at: DateTime,

    pub created: DateTime,

    #[serde(rename = "lastAccessed")]
    pub last_accessed: DateTime,
}

impl From<MongoLeaseDocument> for Lease {
    fn from(doc: MongoLeaseDocument) -> Self {
        Lease {
            name: doc.name,
            identity: LeaseIdentity {
                token: doc.token,
                created: doc.created.to_system_time(),
                expire_at: doc.expire_at.to_system_time(),
            },
            liveness: LeaseLiveness {
                last_accessed: doc.last_accessed.to_system_time(),
            },
        }
    }
}

impl From<&Lease> for MongoLeaseDocument {
    fn from(lease: &Lease) -> Self {
        Self {
            name: lease.name.clone(),
            token: lease.token().to_string(),
            expire_at: DateTime::from_system_time(lease.expire_at()),
            created: DateTime::from_system_time(lease.created()),
            last_accessed: DateTime::from_system_time(lease.last_accessed()),
        }
    }
}
