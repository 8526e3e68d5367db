//! Key-value store port.

/// Ordered key-value store backing all module state.
///
/// Collaborator adapters keep their own state behind the same trait so a
/// single staged-write buffer covers every side effect of an operation.
pub trait KvStore {
    /// Read a value.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write a value.
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// Remove a value. Removing a missing key is a no-op.
    fn delete(&mut self, key: &[u8]);

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// Whether `key` is present.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}
