use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Monotonic generator for scene and component identifiers.
///
/// Identifiers are `<prefix>-<n>`. Every issued or observed identifier is remembered, so ids loaded
/// from a backend never collide with fresh ones even when the counter wraps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdGen {
    next: u64,
    taken: BTreeSet<String>,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next unused identifier with the given prefix.
    pub fn next(&mut self, prefix: &str) -> String {
        loop {
            self.next = self.next.wrapping_add(1);
            let id = format!("{prefix}-{}", self.next);
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Reserve a loaded identifier and move the counter past a `<prefix>-<n>` suffix.
    pub fn observe(&mut self, id: &str) {
        if let Some(n) = id.rsplit('-').next().and_then(|n| n.parse::<u64>().ok()) {
            self.next = self.next.max(n);
        }
        self.taken.insert(id.to_string());
    }
}
