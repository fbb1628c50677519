pub mod cold;
pub mod hot;

pub use cold::ColdStore;
pub use hot::HotStore;

use crate::error::{EmberError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A named key-value mapping, the unit of tiering and persistence.
pub type Collection = HashMap<String, String>;

static COLLECTION_ID: OnceLock<Regex> = OnceLock::new();

/// Collection ids become file names, so only path-safe identifiers are
/// accepted.
pub fn validate_collection_id(id: &str) -> Result<()> {
    let pattern = COLLECTION_ID
        .get_or_init(|| Regex::new("^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("collection id pattern"));
    if pattern.is_match(id) {
        Ok(())
    } else {
        Err(EmberError::InvalidCollectionId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_path_safe_ids() {
        for id in ["metrics", "a", "node-7", "cpu_usage", "0temps"] {
            assert!(validate_collection_id(id).is_ok(), "rejected {id}");
        }
    }

    #[test]
    fn rejects_unsafe_ids() {
        for id in ["", "../etc", "a/b", "a.b", ".hidden", "-dash", "with space"] {
            assert!(
                matches!(
                    validate_collection_id(id),
                    Err(EmberError::InvalidCollectionId(_))
                ),
                "accepted {id:?}"
            );
        }
    }
}
