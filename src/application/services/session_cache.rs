use std::sync::{PoisonError, RwLock};

use crate::domain::models::ServiceSession;

/// Single slot holding the current service session.
///
/// Sessions are replaced whole, never merged. `clear` is only called by the
/// credential exchange retry path when the backend rejects a stale session.
#[derive(Debug, Default)]
pub struct ServiceSessionCache {
    slot: RwLock<Option<ServiceSession>>,
}

impl ServiceSessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ServiceSession> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, session: ServiceSession) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_session() {
        let cache = ServiceSessionCache::new();
        assert!(cache.get().is_none());

        cache.set(ServiceSession::new("first"));
        cache.set(ServiceSession::new("second"));

        let current = cache.get().unwrap();
        assert!(current.same_as(&ServiceSession::new("second")));

        cache.clear();
        assert!(cache.get().is_none());
    }
}
