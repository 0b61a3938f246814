// src/core/fingerprint.rs

use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;

const PATH_SEPARATOR: &[u8] = b";";

/// Computes the stable identifier of a set of template paths.
///
/// Paths are compared by their raw OS bytes (case-sensitive, never lossily
/// decoded), deduplicated, sorted by ordinal byte order and joined with `;`
/// before hashing, so the result does not depend on argument order or
/// repetition. The digest is the full 256-bit blake3 hash rendered as
/// lowercase hex.
pub fn fingerprint(paths: &[PathBuf]) -> String {
    let unique: BTreeSet<&[u8]> = paths
        .iter()
        .map(|p| p.as_os_str().as_encoded_bytes())
        .collect();

    let mut hasher = blake3::Hasher::new();
    for (i, bytes) in unique.iter().enumerate() {
        if i > 0 {
            hasher.update(PATH_SEPARATOR);
        }
        hasher.update(bytes);
    }

    let digest = hex::encode(hasher.finalize().as_bytes());
    debug!("Fingerprint of {} unique path(s): {}", unique.len(), digest);
    digest
}
