//! Entry storage and the lookup rule.
//!
//! The registry is an ordered list of entries, each identified by a
//! [`ServiceKey`] and holding the producers registered under it. Entries are
//! handed out as `Arc`s: a forked (child) registry clones the list but keeps
//! the same entry objects, so producers appended to a pre-fork entry are
//! visible on both sides, while entries created after the fork are not.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::key::{ServiceKey, ServiceType};
use crate::producer::Producer;

/// A registry record: identity plus an ordered, in-place-mutable list of
/// producers.
pub(crate) struct Entry {
    key: ServiceKey,
    producers: RwLock<Vec<Producer>>,
}

impl Entry {
    fn new(key: ServiceKey) -> Self {
        Self {
            key,
            producers: RwLock::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn push_producer(&self, producer: Producer) {
        self.producers.write().push(producer);
    }

    /// First producer in registration order — the one single-value
    /// resolution uses.
    pub fn first_producer(&self) -> Option<Producer> {
        self.producers.read().first().cloned()
    }

    /// Snapshot of the current producer list for lazy iteration.
    pub fn producers(&self) -> Vec<Producer> {
        self.producers.read().clone()
    }

    pub fn producer_count(&self) -> usize {
        self.producers.read().len()
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("producers", &self.producer_count())
            .finish()
    }
}

/// Ordered entry list for one container.
#[derive(Debug)]
pub(crate) struct Registry {
    entries: Vec<Arc<Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// The lookup rule, shared by resolution and registration.
    ///
    /// - wildcard service: first entry whose key equals the query key;
    /// - service without key: first entry with that service and no key,
    ///   else first entry with that service under *any* key;
    /// - service with key: exact match on both.
    ///
    /// The fallback is deliberately asymmetric: type-only queries fall back
    /// across keys, key-only and exact queries never fall back.
    fn position(&self, service: Option<ServiceType>, name: Option<&str>) -> Option<usize> {
        match service {
            None => self.entries.iter().position(|e| e.key().name() == name),
            Some(service) => match name {
                None => self
                    .entries
                    .iter()
                    .position(|e| e.key().service() == Some(service) && e.key().name().is_none())
                    .or_else(|| {
                        self.entries
                            .iter()
                            .position(|e| e.key().service() == Some(service))
                    }),
                Some(name) => self.entries.iter().position(|e| {
                    e.key().service() == Some(service) && e.key().name() == Some(name)
                }),
            },
        }
    }

    pub fn find(&self, service: Option<ServiceType>, name: Option<&str>) -> Option<Arc<Entry>> {
        self.position(service, name)
            .map(|index| Arc::clone(&self.entries[index]))
    }

    /// Finds the entry the lookup rule matches for `key`, creating a fresh
    /// one only when nothing matches.
    ///
    /// Because this reuses the lookup rule, registering (T, no key) while
    /// only (T, "A") exists appends to the (T, "A") entry. That quirk is
    /// part of the contract.
    pub fn get_or_create(&mut self, key: ServiceKey) -> Arc<Entry> {
        if let Some(index) = self.position(key.service(), key.name()) {
            return Arc::clone(&self.entries[index]);
        }

        debug!(key = %key, "Created entry");
        let entry = Arc::new(Entry::new(key));
        self.entries.push(Arc::clone(&entry));
        entry
    }

    /// Removes the entry matching the exact (service, key) pair.
    ///
    /// Unlike lookup, removal never falls back.
    pub fn remove(&mut self, service: Option<ServiceType>, name: Option<&str>) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.key().service() == service && e.key().name() == name));

        let removed = self.entries.len() != before;
        if removed {
            debug!(
                service = service.map(|s| s.type_name()).unwrap_or("any"),
                key = ?name,
                "Removed entry"
            );
        }
        removed
    }

    /// Shallow copy for a child container: a new list over the same entry
    /// objects.
    pub fn fork(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    fn tag(value: u8) -> Producer {
        Producer::instance(value)
    }

    fn realize(registry: &Registry, service: Option<ServiceType>, name: Option<&str>) -> u8 {
        let container = Container::new();
        let entry = registry.find(service, name).expect("entry");
        let producer = entry.first_producer().expect("producer");
        *producer
            .produce(&container)
            .unwrap()
            .downcast::<u8>()
            .unwrap()
    }

    #[test]
    fn exact_lookup_after_create() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::named::<String>("a"))
            .push_producer(tag(1));

        assert!(registry
            .find(Some(ServiceType::of::<String>()), Some("a"))
            .is_some());
        assert!(registry
            .find(Some(ServiceType::of::<String>()), Some("b"))
            .is_none());
        assert!(registry.find(Some(ServiceType::of::<i32>()), Some("a")).is_none());
    }

    #[test]
    fn registering_unkeyed_after_keyed_extends_keyed_entry() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::named::<String>("a"))
            .push_producer(tag(1));
        // (String, no key) matches the "a" entry through the fallback, so
        // this producer lands there instead of creating a second entry.
        registry
            .get_or_create(ServiceKey::of::<String>())
            .push_producer(tag(2));

        assert_eq!(realize(&registry, Some(ServiceType::of::<String>()), None), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn type_only_prefers_unkeyed_entry() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::of::<String>())
            .push_producer(tag(2));
        registry
            .get_or_create(ServiceKey::named::<String>("a"))
            .push_producer(tag(1));

        assert_eq!(realize(&registry, Some(ServiceType::of::<String>()), None), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn type_only_falls_back_to_any_key() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::named::<String>("only"))
            .push_producer(tag(9));

        assert_eq!(realize(&registry, Some(ServiceType::of::<String>()), None), 9);
    }

    #[test]
    fn keyed_lookup_never_falls_back() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::of::<String>())
            .push_producer(tag(1));

        assert!(registry
            .find(Some(ServiceType::of::<String>()), Some("missing"))
            .is_none());
    }

    #[test]
    fn wildcard_matches_by_key_alone() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::named::<String>("shared"))
            .push_producer(tag(5));

        assert_eq!(realize(&registry, None, Some("shared")), 5);
        assert!(registry.find(None, Some("other")).is_none());
    }

    #[test]
    fn registration_appends_to_fallback_match() {
        let mut registry = Registry::new();
        let keyed = registry.get_or_create(ServiceKey::named::<String>("a"));
        keyed.push_producer(tag(1));

        let via_type_only = registry.get_or_create(ServiceKey::of::<String>());
        via_type_only.push_producer(tag(2));

        assert!(Arc::ptr_eq(&keyed, &via_type_only));
        assert_eq!(keyed.producer_count(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removal_requires_exact_pair() {
        let mut registry = Registry::new();
        registry
            .get_or_create(ServiceKey::named::<String>("a"))
            .push_producer(tag(1));

        // Type-only removal does not fall back to the keyed entry.
        assert!(!registry.remove(Some(ServiceType::of::<String>()), None));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(Some(ServiceType::of::<String>()), Some("a")));
        assert_eq!(registry.len(), 0);
        assert!(!registry.remove(Some(ServiceType::of::<String>()), Some("a")));
    }

    #[test]
    fn fork_shares_existing_entries_only() {
        let mut parent = Registry::new();
        parent
            .get_or_create(ServiceKey::of::<String>())
            .push_producer(tag(1));

        let child = parent.fork();

        // Producer appended to a pre-fork entry is visible through the fork.
        parent
            .get_or_create(ServiceKey::of::<String>())
            .push_producer(tag(2));
        let shared = child.find(Some(ServiceType::of::<String>()), None).unwrap();
        assert_eq!(shared.producer_count(), 2);

        // A brand-new entry is not.
        parent
            .get_or_create(ServiceKey::of::<i64>())
            .push_producer(tag(3));
        assert!(child.find(Some(ServiceType::of::<i64>()), None).is_none());
        assert_eq!(child.len(), 1);
    }

    #[test]
    fn first_producer_is_registration_order() {
        let mut registry = Registry::new();
        let entry = registry.get_or_create(ServiceKey::of::<u8>());
        entry.push_producer(tag(10));
        entry.push_producer(tag(20));

        assert_eq!(realize(&registry, Some(ServiceType::of::<u8>()), None), 10);
        assert_eq!(entry.producers().len(), 2);
    }
}
