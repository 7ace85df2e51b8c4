use sha2::{Digest, Sha256};

/// Normalize a PII value the way the ad platforms expect it before hashing:
/// lowercase, with all whitespace and hyphens removed.
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// SHA-256 hex digest of the normalized value. None when the value
/// normalizes to nothing, so empty fields never produce a hash.
pub fn hash_pii(value: &str) -> Option<String> {
    let normalized = normalize(value);
    if normalized.is_empty() {
        return None;
    }
    Some(hex::encode(Sha256::digest(normalized.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_case_whitespace_and_hyphens() {
        assert_eq!(normalize(" John Doe "), "johndoe");
        assert_eq!(normalize("+1 555-123-4567"), "+15551234567");
        assert_eq!(normalize("A@B.com"), "a@b.com");
    }

    #[test]
    fn hashing_is_deterministic_and_normalization_sensitive() {
        // sha256("abc"), the standard test vector
        assert_eq!(
            hash_pii("Abc").unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_pii(" a B-c "), hash_pii("abc"));
        assert_eq!(hash_pii("John Doe"), hash_pii("johndoe"));
        assert_ne!(hash_pii("John Doe"), hash_pii("jane doe"));
    }

    #[test]
    fn empty_values_hash_to_none() {
        assert_eq!(hash_pii(""), None);
        assert_eq!(hash_pii("  - "), None);
    }
}
