//! Record fingerprints for duplicate suppression.

use super::normalize::Record;
use kgraph_cypher::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 over a record's canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Fingerprint([u8; 32]);

/// Fingerprints a record.
///
/// The canonical form is the JSON encoding of the record. Maps are
/// key-sorted at every level, so two records differing only in key order
/// hash the same. Records that have no faithful JSON form (non-finite
/// floats) hash their debug text instead, which is still stable.
pub(crate) fn fingerprint(record: &Record) -> Fingerprint {
    let canonical = if record.values().all(is_finite) {
        serde_json::to_vec(record).ok()
    } else {
        None
    };

    let mut hasher = Sha256::new();
    match canonical {
        Some(bytes) => hasher.update(&bytes),
        None => {
            debug!("record has no canonical JSON form, fingerprinting its debug text");
            hasher.update(b"degraded:");
            hasher.update(format!("{:?}", record).as_bytes());
        }
    }
    Fingerprint(hasher.finalize().into())
}

fn is_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => f.is_finite(),
        Value::List(items) => items.iter().all(is_finite),
        Value::Map(map) => map.values().all(is_finite),
        _ => true,
    }
}
