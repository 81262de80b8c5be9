//! MongoDB error classification.

use lease_lock_core::error::LockError;
use mongodb::error::{Error, ErrorKind, WriteFailure};

/// Server error code for a unique index violation.
pub(crate) const DUPLICATE_KEY_CODE: i32 = 11000;

/// Maps a driver error onto [`LockError`].
///
/// Failures to reach or authenticate with the deployment become
/// `Connection`; everything else is `Backend`.
pub(crate) fn map_mongo_error(error: Error) -> LockError {
    match error.kind.as_ref() {
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::Authentication { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => LockError::Connection(Box::new(error)),
        _ => LockError::Backend(Box::new(error)),
    }
}

/// Returns `true` for a unique index violation.
///
/// Two upserts racing to insert the same name can both miss the filter; the
/// unique index on `name` rejects the slower one.
pub(crate) fn is_duplicate_key(error: &Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Command(err) => err.code == DUPLICATE_KEY_CODE,
        ErrorKind::Write(WriteFailure::WriteError(err)) => err.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
