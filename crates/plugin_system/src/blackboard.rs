//! Named registry through which plugins find each other's shared objects.

use crate::error::{PluginError, Result};
use compact_str::CompactString;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Shared objects keyed by name.
///
/// Objects are posted during `BlackboardPost` and looked up during
/// `BlackboardRetrieve`; a plugin keeps the returned `Rc` rather than asking
/// again every frame. Mutable objects are posted as `Rc<RefCell<T>>`.
#[derive(Default)]
pub struct Blackboard {
    entries: BTreeMap<CompactString, Rc<dyn Any>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `value` under `key`. Each key can be posted once.
    pub fn post<T: 'static>(&mut self, key: &str, value: Rc<T>) -> Result<()> {
        if self.entries.contains_key(key) {
            return Err(PluginError::DuplicateBlackboardKey(key.to_string()));
        }
        debug!("📌 Blackboard post: {} ({})", key, type_name::<T>());
        self.entries.insert(CompactString::new(key), value);
        Ok(())
    }

    /// Looks up `key`, returning `None` when it is missing or holds another
    /// type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
        self.entries.get(key)?.clone().downcast::<T>().ok()
    }

    /// Looks up a required `key`.
    ///
    /// # Returns
    ///
    /// `PluginError::MissingBlackboardKey` when nothing was posted under the
    /// key, `PluginError::BlackboardTypeMismatch` when it holds another type.
    pub fn retrieve<T: 'static>(&self, key: &str) -> Result<Rc<T>> {
        let value = self
            .entries
            .get(key)
            .ok_or_else(|| PluginError::MissingBlackboardKey(key.to_string()))?;
        value
            .clone()
            .downcast::<T>()
            .map_err(|_| PluginError::BlackboardTypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|key| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn post_and_retrieve() {
        let mut blackboard = Blackboard::new();
        let shared = Rc::new(RefCell::new(vec![1u16, 2, 3]));
        blackboard.post("scene.ids", shared.clone()).unwrap();

        let found = blackboard.retrieve::<RefCell<Vec<u16>>>("scene.ids").unwrap();
        found.borrow_mut().push(4);
        assert_eq!(shared.borrow().len(), 4);
        assert!(Rc::ptr_eq(&found, &shared));
    }

    #[test]
    fn lookup_failures() {
        let mut blackboard = Blackboard::new();
        blackboard.post("answer", Rc::new(42u32)).unwrap();

        assert_eq!(
            blackboard.post("answer", Rc::new(0u32)),
            Err(PluginError::DuplicateBlackboardKey("answer".into()))
        );
        assert_eq!(
            blackboard.retrieve::<u32>("question").unwrap_err(),
            PluginError::MissingBlackboardKey("question".into())
        );
        assert!(matches!(
            blackboard.retrieve::<String>("answer"),
            Err(PluginError::BlackboardTypeMismatch { .. })
        ));
        assert!(blackboard.get::<String>("answer").is_none());
        assert_eq!(blackboard.get::<u32>("answer").as_deref(), Some(&42));
    }
}
