use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

type Attribute = Arc<dyn Any + Send + Sync>;

/// Handle to a client session's attribute map.
///
/// Cloning shares the same map. Storage and expiry belong to the transport; the
/// dispatcher only reads and writes attributes.
#[derive(Clone, Default)]
pub struct Session {
    attributes: Arc<RwLock<HashMap<String, Attribute>>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed lookup; `None` when the key is missing or holds another type.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get_raw(key)?.downcast::<T>().ok()
    }

    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<Attribute> {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.set_shared(key, Arc::new(value));
    }

    pub fn set_shared<T: Any + Send + Sync>(&self, key: &str, value: Arc<T>) {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Attribute> {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Session").field("keys", &keys).finish()
    }
}
