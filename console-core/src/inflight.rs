//! Duplicate-submission guard keyed by operation and entity id.

use crate::error::AppError;
use crate::record::RecordId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Instant;

/// Tracks which operations are currently awaiting the server. A second
/// `acquire` for the same key is rejected until the first permit drops.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<DashMap<String, Instant>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(
        &self,
        operation: &str,
        id: Option<&RecordId>,
    ) -> Result<InFlightPermit, AppError> {
        let key = match id {
            Some(id) => format!("{}:{}", operation, id.as_key()),
            None => operation.to_string(),
        };

        match self.active.entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::warn!(
                    key = %key,
                    elapsed_ms = entry.get().elapsed().as_millis() as u64,
                    "Rejecting duplicate request"
                );
                Err(AppError::DuplicateRequest(key))
            }
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                Ok(InFlightPermit {
                    registry: self.active.clone(),
                    key,
                })
            }
        }
    }

    pub fn is_active(&self, operation: &str, id: Option<&RecordId>) -> bool {
        let key = match id {
            Some(id) => format!("{}:{}", operation, id.as_key()),
            None => operation.to_string(),
        };
        self.active.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Releases its key when dropped, including on error and cancellation.
#[derive(Debug)]
pub struct InFlightPermit {
    registry: Arc<DashMap<String, Instant>>,
    key: String,
}

impl InFlightPermit {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_is_rejected() {
        let registry = InFlightRegistry::new();
        let id = RecordId::Int(4);

        let _permit = registry.acquire("invoice.update", Some(&id)).unwrap();
        let second = registry.acquire("invoice.update", Some(&id));

        assert!(matches!(second, Err(AppError::DuplicateRequest(key)) if key == "invoice.update:4"));
    }

    #[test]
    fn different_ids_do_not_conflict() {
        let registry = InFlightRegistry::new();
        let _a = registry.acquire("invoice.update", Some(&RecordId::Int(1))).unwrap();
        let _b = registry.acquire("invoice.update", Some(&RecordId::Int(2))).unwrap();
        let _c = registry.acquire("invoice.delete", Some(&RecordId::Int(1))).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn dropping_permit_releases_key() {
        let registry = InFlightRegistry::new();
        {
            let permit = registry.acquire("client.create", None).unwrap();
            assert_eq!(permit.key(), "client.create");
            assert!(registry.is_active("client.create", None));
        }
        assert!(registry.is_empty());
        assert!(registry.acquire("client.create", None).is_ok());
    }
}
