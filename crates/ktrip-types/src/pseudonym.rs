use sha2::{Digest, Sha256};

/// Marker prefixed to every stored lead email hash.
pub const HASH_PREFIX: &str = "sha256:";

/// One-way hash of a lead email.
///
/// The email is trimmed and lowercased before hashing so the same address
/// typed differently maps to the same value. Empty input stays empty, and a
/// value already carrying the marker is returned as is (lowercased), so the
/// function is safe to apply more than once.
pub fn pseudonymize_lead_email(lead_email: &str) -> String {
    let normalized = lead_email.trim().to_lowercase();
    if normalized.is_empty() {
        return String::new();
    }
    if is_pseudonymized(&normalized) {
        return normalized;
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{}{:x}", HASH_PREFIX, hasher.finalize())
}

/// Check whether a stored value is a hash produced by [`pseudonymize_lead_email`].
pub fn is_pseudonymized(value: &str) -> bool {
    value
        .strip_prefix(HASH_PREFIX)
        .is_some_and(|digest| digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()))
}
