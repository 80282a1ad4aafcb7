//! Standing subscriptions to custom batches, keyed by stable identity.
//!
//! Mesh caches come and go: the evaluated mesh is replaced on every
//! re-evaluation and its cache with it. The registry remembers which custom
//! batch kinds an external consumer subscribed to, so a freshly created cache
//! can request them again without the consumer asking.
//!
//! Per (identity, kind) pair the state moves
//! `Pending -> SatisfiedUnverified -> SatisfiedVerified`, and back to
//! `Pending` on any invalidation of that identity. Entries leave the
//! registry only through [`PreservationRegistry::release`].
//!
//! The registry stores identifiers only, never batches or buffers. It is
//! owned by the application and passed by `&mut` into cache operations.

use std::collections::{BTreeMap, HashMap};

use meshdraw_core::object::SceneObject;
use meshdraw_core::{MeshId, ObjectId};

use super::flags::{BatchFlags, BatchKind};

/// Identity a subscription survives under.
///
/// The object key is preferred; the mesh key is used until an object is known
/// for that mesh, then folded into the object key once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StableKey {
    Object(ObjectId),
    Mesh(MeshId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubscriptionState {
    #[default]
    Unregistered,
    /// Registered, batch not built yet.
    Pending,
    /// The cache reports the batch ready; drawability not confirmed.
    SatisfiedUnverified,
    /// The batch was handed out and passed the validity guard.
    SatisfiedVerified,
}

#[derive(Debug, Default)]
pub struct PreservationRegistry {
    entries: HashMap<StableKey, BTreeMap<BatchKind, SubscriptionState>>,
    /// Original mesh id to the object key its entries were migrated to.
    aliases: HashMap<MeshId, ObjectId>,
}

impl PreservationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for an object/mesh pair, migrating a mesh-keyed entry to the
    /// object key the first time the object is seen.
    pub fn resolve_key(&mut self, object: Option<&SceneObject>, mesh: MeshId) -> StableKey {
        let Some(object) = object else {
            return self.lookup_key(mesh);
        };
        let object_id = object.original_id();
        if self.aliases.insert(mesh, object_id) != Some(object_id)
            && let Some(old) = self.entries.remove(&StableKey::Mesh(mesh))
        {
            log::info!(
                "preservation: migrating {} subscriptions from {mesh} to {object_id}",
                old.len()
            );
            let target = self.entries.entry(StableKey::Object(object_id)).or_default();
            for (kind, state) in old {
                target.entry(kind).or_insert(state);
            }
        }
        StableKey::Object(object_id)
    }

    /// Key for a mesh without touching the registry.
    pub fn lookup_key(&self, mesh: MeshId) -> StableKey {
        self.aliases
            .get(&mesh)
            .map_or(StableKey::Mesh(mesh), |object| StableKey::Object(*object))
    }

    /// Subscribe `key` to `kind`. Returns `false` if it already was.
    pub fn register_pending(&mut self, key: StableKey, kind: BatchKind) -> bool {
        let states = self.entries.entry(key).or_default();
        if states.contains_key(&kind) {
            return false;
        }
        states.insert(kind, SubscriptionState::Pending);
        log::debug!("preservation: {key:?} subscribed to {kind:?}");
        true
    }

    /// Every kind `key` subscribes to.
    pub fn subscriptions(&self, key: StableKey) -> BatchFlags {
        self.entries
            .get(&key)
            .map(|states| states.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Kinds of `key` still waiting for a batch.
    pub fn pending(&self, key: StableKey) -> BatchFlags {
        self.kinds_in(key, SubscriptionState::Pending)
    }

    fn kinds_in(&self, key: StableKey, wanted: SubscriptionState) -> BatchFlags {
        self.entries
            .get(&key)
            .map(|states| {
                states
                    .iter()
                    .filter(|(_, state)| **state == wanted)
                    .map(|(kind, _)| *kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn state(&self, key: StableKey, kind: BatchKind) -> SubscriptionState {
        self.entries
            .get(&key)
            .and_then(|states| states.get(&kind))
            .copied()
            .unwrap_or_default()
    }

    /// `Pending -> SatisfiedUnverified` for the given kinds.
    pub fn mark_satisfied_unverified(&mut self, key: StableKey, kinds: BatchFlags) {
        self.transition(key, kinds, |state| match state {
            SubscriptionState::Pending => Some(SubscriptionState::SatisfiedUnverified),
            _ => None,
        });
    }

    /// Any satisfied or pending state `-> SatisfiedVerified`.
    pub fn mark_verified(&mut self, key: StableKey, kinds: BatchFlags) {
        self.transition(key, kinds, |state| match state {
            SubscriptionState::Pending | SubscriptionState::SatisfiedUnverified => {
                Some(SubscriptionState::SatisfiedVerified)
            }
            _ => None,
        });
    }

    /// Return subscribed kinds to `Pending` after an invalidation.
    pub fn mark_pending(&mut self, key: StableKey, kinds: BatchFlags) {
        self.transition(key, kinds, |state| match state {
            SubscriptionState::SatisfiedUnverified | SubscriptionState::SatisfiedVerified => {
                Some(SubscriptionState::Pending)
            }
            _ => None,
        });
    }

    fn transition(
        &mut self,
        key: StableKey,
        kinds: BatchFlags,
        next: impl Fn(SubscriptionState) -> Option<SubscriptionState>,
    ) {
        let Some(states) = self.entries.get_mut(&key) else {
            return;
        };
        for kind in kinds.kinds() {
            if let Some(state) = states.get_mut(&kind)
                && let Some(new) = next(*state)
            {
                log::trace!("preservation: {key:?} {kind:?} {state:?} -> {new:?}");
                *state = new;
            }
        }
    }

    /// Drop the subscriptions of `key` to `kinds`. Returns the kinds removed.
    pub fn release(&mut self, key: StableKey, kinds: BatchFlags) -> BatchFlags {
        let Some(states) = self.entries.get_mut(&key) else {
            return BatchFlags::empty();
        };
        let mut removed = BatchFlags::empty();
        for kind in kinds.kinds() {
            if states.remove(&kind).is_some() {
                removed |= kind.flag();
            }
        }
        if states.is_empty() {
            self.entries.remove(&key);
        }
        if !removed.is_empty() {
            log::debug!("preservation: {key:?} released {removed:?}");
        }
        removed
    }

    /// Number of identities with at least one subscription.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total (identity, kind) pairs.
    pub fn subscription_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn contains(&self, key: StableKey) -> bool {
        self.entries.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_set_union() {
        let mut registry = PreservationRegistry::new();
        let key = StableKey::Mesh(MeshId::next());
        assert!(registry.register_pending(key, BatchKind::CustomEdges));
        assert!(!registry.register_pending(key, BatchKind::CustomEdges));
        assert_eq!(registry.subscription_count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_state_machine() {
        let mut registry = PreservationRegistry::new();
        let key = StableKey::Mesh(MeshId::next());
        let kind = BatchKind::CustomTriangles;
        assert_eq!(registry.state(key, kind), SubscriptionState::Unregistered);

        registry.register_pending(key, kind);
        registry.mark_verified(key, BatchFlags::empty());
        assert_eq!(registry.state(key, kind), SubscriptionState::Pending);

        registry.mark_satisfied_unverified(key, kind.flag());
        assert_eq!(registry.state(key, kind), SubscriptionState::SatisfiedUnverified);
        registry.mark_verified(key, kind.flag());
        assert_eq!(registry.state(key, kind), SubscriptionState::SatisfiedVerified);

        // Satisfied subscriptions are never dropped on their own.
        assert!(registry.contains(key));

        registry.mark_pending(key, kind.flag());
        assert_eq!(registry.pending(key), kind.flag());
    }

    #[test]
    fn test_unverified_only_from_pending() {
        let mut registry = PreservationRegistry::new();
        let key = StableKey::Mesh(MeshId::next());
        registry.register_pending(key, BatchKind::CustomVertices);
        registry.mark_verified(key, BatchFlags::CUSTOM);
        registry.mark_satisfied_unverified(key, BatchFlags::CUSTOM);
        assert_eq!(
            registry.state(key, BatchKind::CustomVertices),
            SubscriptionState::SatisfiedVerified
        );
    }

    #[test]
    fn test_mesh_key_migrates_to_object() {
        let mut registry = PreservationRegistry::new();
        let mesh = MeshId::next();
        let key = registry.resolve_key(None, mesh);
        assert_eq!(key, StableKey::Mesh(mesh));
        registry.register_pending(key, BatchKind::CustomEdges);

        let object = SceneObject::new(mesh);
        let object_key = registry.resolve_key(Some(&object), mesh);
        assert_eq!(object_key, StableKey::Object(object.id()));
        assert!(!registry.contains(StableKey::Mesh(mesh)));
        assert_eq!(registry.subscriptions(object_key), BatchFlags::CUSTOM_EDGES);
        assert_eq!(registry.lookup_key(mesh), object_key);
        assert_eq!(registry.resolve_key(None, mesh), object_key);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_evaluated_object_resolves_to_original() {
        let mut registry = PreservationRegistry::new();
        let mesh = MeshId::next();
        let original = SceneObject::new(mesh);
        let evaluated = original.evaluated_copy(MeshId::next());
        assert_eq!(
            registry.resolve_key(Some(&evaluated), mesh),
            StableKey::Object(original.id())
        );
    }

    #[test]
    fn test_release_is_the_only_removal() {
        let mut registry = PreservationRegistry::new();
        let key = StableKey::Mesh(MeshId::next());
        registry.register_pending(key, BatchKind::CustomEdges);
        registry.register_pending(key, BatchKind::CustomVertices);

        assert_eq!(
            registry.release(key, BatchFlags::CUSTOM_EDGES | BatchFlags::SURFACE),
            BatchFlags::CUSTOM_EDGES
        );
        assert!(registry.contains(key));
        registry.release(key, BatchFlags::CUSTOM);
        assert!(registry.is_empty());
    }
}
