//! Ownership token generation.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Creates a new ownership token.
///
/// Format: `{unix_millis}_{random_u64}`. The random part comes from the
/// calling thread's own RNG, so concurrent callers need no coordination.
pub fn generate_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut rng = rand::thread_rng();
    let random: u64 = rng.r#gen();

    format!("{}_{}", millis, random)
}
