use gsep_types::ArtifactDigest;
use serde_json::Value;

use crate::canonical::{canonicalize, CanonicalError};

/// Domain prefix for artifact content digests.
pub const ARTIFACT_DOMAIN: &[u8] = b"gsep-artifact-v1:";
/// Domain prefix for stage lock values.
pub const LOCK_DOMAIN: &[u8] = b"gsep-lock-v1:";
/// Domain prefix for root key material digests.
pub const KEY_DOMAIN: &[u8] = b"gsep-key-v1:";

/// Hex BLAKE3 digest over a domain prefix and an ordered list of parts.
///
/// Each part is length-prefixed so that concatenation cannot be ambiguous
/// across part boundaries.
pub fn digest_hex(domain: &[u8], parts: &[&[u8]]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().to_hex().to_string()
}

/// Digest of a canonically serialized artifact.
pub fn artifact_digest(artifact: &Value) -> Result<ArtifactDigest, CanonicalError> {
    let bytes = canonicalize(artifact)?;
    Ok(ArtifactDigest(digest_hex(ARTIFACT_DOMAIN, &[&bytes])))
}

/// Deterministic digest of root key material, used as the chain's key
/// reference. Raw key material is never stored or compared directly.
pub fn key_digest(material: &str) -> String {
    digest_hex(KEY_DOMAIN, &[material.as_bytes()])
}
