//! ID generation and timestamp utilities.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sha2::{Digest, Sha256};

/// Length of a generated issue id, in hex characters.
pub const ID_LENGTH: usize = 24;

// ============================================================================
// ID Generation
// ============================================================================

/// Generate a unique issue ID.
///
/// SHA-256 over the seed fields and a nonce, rendered as the first
/// [`ID_LENGTH`] hex characters. The `exists` closure checks for collisions;
/// the nonce is bumped until a free id is found.
pub fn generate_id<F>(
    project: &str,
    title: &str,
    creator: &str,
    created_on: DateTime<Utc>,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let mut nonce = 0u64;
    loop {
        let seed = generate_id_seed(project, title, creator, created_on, nonce);
        let id = compute_id_hash(&seed);
        if !exists(&id) {
            return id;
        }
        nonce += 1;
    }
}

fn generate_id_seed(
    project: &str,
    title: &str,
    creator: &str,
    created_on: DateTime<Utc>,
    nonce: u64,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        project,
        title,
        creator,
        created_on.timestamp_nanos_opt().unwrap_or(0),
        nonce
    )
}

fn compute_id_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..ID_LENGTH].to_string()
}

/// Whether `id` has the shape of a generated id (24 lowercase hex characters).
#[must_use]
pub fn is_valid_id_format(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

// ============================================================================
// Timestamps
// ============================================================================

/// Current time at millisecond precision.
///
/// Millisecond precision keeps stored timestamps identical across the JSON,
/// JSONL and SQLite representations.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Whether `ts` carries no digits below the millisecond.
#[must_use]
pub fn is_millisecond_precision(ts: DateTime<Utc>) -> bool {
    ts.timestamp_subsec_nanos() % 1_000_000 == 0
}

/// Canonical text form used for storage and exact comparisons.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
