use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of a text's UTF-8 bytes.
///
/// Chunk identity and the document-level fast path both key on this
/// digest, so two texts share a hash exactly when they are byte-equal.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
