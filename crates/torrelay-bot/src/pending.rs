//! Per-requester store of links awaiting a category choice.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::event::RequesterId;

/// Concurrent map from requester to the raw text of their pending link.
///
/// At most one link is held per requester; a newer link replaces the older one.
#[derive(Debug, Default)]
pub struct PendingLinks {
    links: Mutex<HashMap<RequesterId, String>>,
}

impl PendingLinks {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `link` for `requester`, returning the link it replaced.
    pub fn insert(&self, requester: RequesterId, link: impl Into<String>) -> Option<String> {
        self.lock().insert(requester, link.into())
    }

    /// Remove and return the pending link, if any.
    pub fn take(&self, requester: RequesterId) -> Option<String> {
        self.lock().remove(&requester)
    }

    /// Pending link for `requester` without removing it.
    #[must_use]
    pub fn get(&self, requester: RequesterId) -> Option<String> {
        self.lock().get(&requester).cloned()
    }

    /// Number of requesters with a pending link.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no requester has a pending link.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequesterId, String>> {
        self.links
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
