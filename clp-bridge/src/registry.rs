//! Defines the [`Registry`] type, which tracks every native reference owned
//! by a host-side term.
//!
//! Provides slot allocation, lookup, and the teardown / re-initialization
//! sweeps that keep references consistent with the engine lifecycle.

use crate::InternalRegistryError;
use core::fmt;
use std::rc::{Rc, Weak};

/// The registry keeps one slot per native reference created by the bridge.
/// A [`Reference`] owned by a term stores only the index of its slot;
/// the slot stores the native handle and a *weak* pointer back to the
/// owner, so the registry can enumerate references without keeping any of
/// them alive.
///
/// ### Slots
/// Slot indices are stable for the lifetime of the owning [`Reference`].
/// When the last clone of a [`Reference`] is dropped its slot becomes
/// *dead*.  Dead slots are reaped lazily: [`Registry::reap`] hands their
/// native handles back to the caller (who destroys them through the
/// engine) and recycles the indices.
///
/// ### Engine lifecycle
/// The native handles are only meaningful while the engine is initialized:
/// - [`Registry::invalidate_all`] is called right before engine teardown.
///   It takes every native handle out of its slot.  Live slots stay
///   registered but invalid.
/// - [`Registry::recreate_all`] is called right after engine
///   initialization.  Every live slot without a handle gets a fresh one.
///
/// The value a reference held before teardown is never restored; after
/// re-initialization it is whatever the freshly created handle holds
/// (an unbound variable).
///
/// ```
/// # use clp_bridge::Registry;
/// let mut registry: Registry<u32> = Registry::new();
/// assert_eq!(registry.stats().live, 0);
/// ```
#[derive(Debug)]
pub struct Registry<R> {
    /// Randomly generated registry ID.
    /// Every [`RefId`] carries it, so a reference presented to the wrong
    /// registry is detected instead of silently aliasing another slot.
    pub(crate) registry_id: RegistryID,

    /// Slot storage; indices are handed out to [`Reference`]s.
    pub(crate) slots: Vec<Slot<R>>,

    /// Indices of reaped slots, reused by [`Registry::register`].
    pub(crate) free: Vec<u32>,
}

#[derive(Debug)]
pub(crate) struct Slot<R> {
    /// `None` marks a free slot.
    owner: Option<Weak<Owner>>,
    handle: Option<R>,
}

impl<R> Slot<R> {
    #[inline]
    fn is_live(&self) -> bool {
        self.owner.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    #[inline]
    fn is_dead(&self) -> bool {
        self.owner.as_ref().is_some_and(|w| w.strong_count() == 0)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryID(pub(crate) u32); // Random Registry ID

/// Identifies a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId {
    pub(crate) registry_id: RegistryID,
    pub(crate) index: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryStats {
    pub registry_id: RegistryID,
    /// Allocated slots, including free ones.
    pub slots: usize,
    /// Slots whose owner is still reachable.
    pub live: usize,
    /// Live slots currently holding a native handle.
    pub valid: usize,
    /// Recycled indices waiting for reuse.
    pub free: usize,
}

#[derive(Debug)]
struct Owner {
    id: RefId,
}

/// Host-side ownership of one registry slot.
///
/// Clones share the slot; the slot dies when the last clone is dropped.
#[derive(Clone)]
pub struct Reference(Rc<Owner>);

impl Reference {
    /// Returns the slot identifier.
    #[inline]
    pub fn id(&self) -> RefId {
        self.0.id
    }

    /// Returns `true` if both references share the same slot.
    #[inline]
    pub fn same_slot(&self, other: &Reference) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("registry_id", &self.0.id.registry_id)
            .field("index", &self.0.id.index)
            .finish()
    }
}

impl<R> Default for Registry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Registry<R> {
    /// Create a new, empty registry with a random ID.
    pub fn new() -> Self {
        Self {
            registry_id: RegistryID(rand::random()),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Returns the registry ID.
    #[inline]
    pub fn id(&self) -> RegistryID {
        self.registry_id
    }

    /// Returns stats.
    pub fn stats(&self) -> RegistryStats {
        let live = self.slots.iter().filter(|s| s.is_live()).count();
        let valid = self
            .slots
            .iter()
            .filter(|s| s.is_live() && s.handle.is_some())
            .count();
        RegistryStats {
            registry_id: self.registry_id,
            slots: self.slots.len(),
            live,
            valid,
            free: self.free.len(),
        }
    }

    /// Stores `handle` in a slot and returns the owning [`Reference`].
    pub(crate) fn register(&mut self, handle: R) -> Reference {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    owner: None,
                    handle: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let owner = Rc::new(Owner {
            id: RefId {
                registry_id: self.registry_id,
                index,
            },
        });
        let slot = &mut self.slots[index as usize];
        slot.owner = Some(Rc::downgrade(&owner));
        slot.handle = Some(handle);
        Reference(owner)
    }

    /// Returns the native handle of a live reference.
    #[inline]
    pub(crate) fn handle(&self, r: &Reference) -> Result<&R, InternalRegistryError> {
        let id = r.id();
        if id.registry_id != self.registry_id {
            return Err(InternalRegistryError::Foreign(id.registry_id));
        }
        // Registry ids are random, so a colliding foreign reference can
        // still get here; the slot must be owned by this very reference.
        let slot = self
            .slots
            .get(id.index as usize)
            .filter(|slot| {
                slot.owner
                    .as_ref()
                    .is_some_and(|w| w.as_ptr() == Rc::as_ptr(&r.0))
            })
            .ok_or(InternalRegistryError::Foreign(id.registry_id))?;
        slot.handle.as_ref().ok_or(InternalRegistryError::Invalid(id))
    }

    /// Frees the slots of dropped references and returns their native
    /// handles for destruction.
    pub(crate) fn reap(&mut self) -> Vec<R> {
        let mut released = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_dead() {
                continue;
            }
            if let Some(handle) = slot.handle.take() {
                released.push(handle);
            }
            slot.owner = None;
            self.free.push(index as u32);
        }
        if !released.is_empty() {
            log::trace!(
                "registry {:?}: reaped {} references",
                self.registry_id,
                released.len()
            );
        }
        released
    }

    /// Takes every native handle out of the registry.  Live slots stay
    /// registered but invalid; dead slots are freed.
    pub(crate) fn invalidate_all(&mut self) -> Vec<R> {
        let mut released = self.reap();
        for slot in self.slots.iter_mut() {
            if let Some(handle) = slot.handle.take() {
                released.push(handle);
            }
        }
        log::debug!(
            "registry {:?}: invalidated {} references",
            self.registry_id,
            released.len()
        );
        released
    }

    /// Gives every live, invalid slot a fresh native handle produced by
    /// `make`.  Returns the number of recreated slots.
    pub(crate) fn recreate_all(&mut self, mut make: impl FnMut() -> R) -> usize {
        let mut count = 0;
        for slot in self.slots.iter_mut() {
            if slot.is_live() && slot.handle.is_none() {
                slot.handle = Some(make());
                count += 1;
            }
        }
        log::debug!(
            "registry {:?}: recreated {} references",
            self.registry_id,
            count
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut reg: Registry<u32> = Registry::new();
        let a = reg.register(10);
        let b = reg.register(20);
        assert_eq!(*reg.handle(&a).unwrap(), 10);
        assert_eq!(*reg.handle(&b).unwrap(), 20);
        assert_ne!(a.id(), b.id());
        let stats = reg.stats();
        assert_eq!(stats.live, 2);
        assert_eq!(stats.valid, 2);
    }

    #[test]
    fn colliding_registry_ids_are_still_foreign() {
        let mut reg: Registry<u32> = Registry::new();
        let mut other: Registry<u32> = Registry::new();
        other.registry_id = reg.registry_id;
        let _mine = reg.register(1);
        let theirs: Vec<Reference> = (0..3).map(|i| other.register(i)).collect();

        // out of range in `reg`
        let err = reg.handle(&theirs[2]).unwrap_err();
        assert!(matches!(err, InternalRegistryError::Foreign(id) if id == reg.registry_id));
        // in range, but the slot belongs to another reference
        let err = reg.handle(&theirs[0]).unwrap_err();
        assert!(matches!(err, InternalRegistryError::Foreign(_)));
    }

    #[test]
    fn clones_share_a_slot() {
        let mut reg: Registry<u32> = Registry::new();
        let a = reg.register(1);
        let a2 = a.clone();
        assert!(a.same_slot(&a2));
        drop(a);
        assert!(reg.reap().is_empty());
        assert_eq!(*reg.handle(&a2).unwrap(), 1);
    }

    #[test]
    fn reap_releases_dropped_and_recycles() {
        let mut reg: Registry<u32> = Registry::new();
        let a = reg.register(1);
        let b = reg.register(2);
        let index = b.id().index;
        drop(b);
        assert_eq!(reg.stats().live, 1);
        assert_eq!(reg.reap(), vec![2]);
        assert_eq!(reg.stats().free, 1);
        // reaping twice releases nothing
        assert!(reg.reap().is_empty());
        let c = reg.register(3);
        assert_eq!(c.id().index, index);
        assert_eq!(*reg.handle(&c).unwrap(), 3);
        assert_eq!(*reg.handle(&a).unwrap(), 1);
        assert_eq!(reg.stats().slots, 2);
    }

    #[test]
    fn invalidate_then_recreate() {
        let mut reg: Registry<u32> = Registry::new();
        let a = reg.register(1);
        let b = reg.register(2);
        let dropped = reg.register(3);
        drop(dropped);

        let mut released = reg.invalidate_all();
        released.sort();
        assert_eq!(released, vec![1, 2, 3]);
        assert!(matches!(
            reg.handle(&a),
            Err(InternalRegistryError::Invalid(_))
        ));
        assert_eq!(reg.stats().valid, 0);
        assert_eq!(reg.stats().live, 2);

        let mut next = 100;
        let n = reg.recreate_all(|| {
            next += 1;
            next
        });
        assert_eq!(n, 2);
        assert_eq!(*reg.handle(&a).unwrap(), 101);
        assert_eq!(*reg.handle(&b).unwrap(), 102);
    }

    #[test]
    fn dropped_while_invalid_is_freed() {
        let mut reg: Registry<u32> = Registry::new();
        let a = reg.register(1);
        reg.invalidate_all();
        drop(a);
        assert_eq!(reg.recreate_all(|| 7), 0);
        assert!(reg.reap().is_empty());
        assert_eq!(reg.stats().free, 1);
    }

    #[test]
    fn foreign_reference() {
        let mut r1: Registry<u32> = Registry::new();
        let mut r2: Registry<u32> = Registry::new();
        let _a = r1.register(1);
        let b = r2.register(2);
        if r1.id() != r2.id() {
            assert!(matches!(
                r1.handle(&b),
                Err(InternalRegistryError::Foreign(_))
            ));
        }
    }
}
