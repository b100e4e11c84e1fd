//! SHA-256 digests of rendered content.

use sha2::{Digest, Sha256};

use scaffold_renderer::OutputTree;

/// Hex SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Hex SHA-256 over every `(path, content)` pair in path order.
///
/// Paths are hashed with `/` separators and each field is length-prefixed, so
/// moving bytes between a path and its content changes the digest.
pub fn tree_digest(tree: &OutputTree) -> String {
    let mut h = Sha256::new();
    for (path, file) in tree.iter() {
        let path = path.to_string_lossy().replace('\\', "/");
        h.update((path.len() as u64).to_le_bytes());
        h.update(path.as_bytes());
        let bytes = file.as_bytes();
        h.update((bytes.len() as u64).to_le_bytes());
        h.update(bytes);
        h.update([u8::from(file.executable)]);
    }
    hex::encode(h.finalize())
}
