//! Id-indexed object containers
//!
//! One generic [`ObjectContainer`] serves entities, views, symbol surfaces and
//! symbols. A container is the strong owner of its objects and removes each
//! one as soon as the object reports that it has been destroyed:
//!
//! 1. `add` subscribes to the object's state signal,
//! 2. the object's state turns to destroyed and emits,
//! 3. the subscription calls `remove`, which unsubscribes and drops the
//!    container's reference.
//!
//! [`ObjectContainer::flag_all_as_destroyed`] therefore only changes states
//! and lets each object leave through the same path.

use ig_event_system::{ReceiverId, Signal, SlotId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Object that can live in an [`ObjectContainer`].
pub trait Contained: 'static {
    type Id: Copy + Ord + Debug;

    fn object_id(&self) -> Self::Id;

    fn is_destroyed(&self) -> bool;

    /// Moves the object to its destroyed state, triggering its cascade.
    fn flag_destroyed(&self);

    /// Emitted with the object whenever its state changes.
    fn state_signal(&self) -> &Signal<Rc<Self>>;

    /// Short label used in logs ("entity", "symbol" ...).
    fn label() -> &'static str;
}

struct Slot<T> {
    object: Rc<T>,
    subscription: SlotId,
}

pub struct ObjectContainer<T: Contained> {
    receiver: ReceiverId,
    objects: RefCell<BTreeMap<T::Id, Slot<T>>>,
    self_ref: Weak<ObjectContainer<T>>,
    /// Emitted after an object was inserted
    pub added: Signal<Rc<T>>,
    /// Emitted after an object was taken out
    pub removed: Signal<Rc<T>>,
}

impl<T: Contained> ObjectContainer<T> {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            receiver: ReceiverId::new(),
            objects: RefCell::new(BTreeMap::new()),
            self_ref: self_ref.clone(),
            added: Signal::new(),
            removed: Signal::new(),
        })
    }

    /// Inserts `object`.
    ///
    /// `None` and objects that are already destroyed are ignored. An object
    /// with the id of a stored one replaces it; the replaced object is
    /// released (not destroyed) and reported through `removed`.
    pub fn add(&self, object: impl Into<Option<Rc<T>>>) {
        let Some(object) = object.into() else {
            return;
        };
        if object.is_destroyed() {
            debug!("Ignoring destroyed {} {:?}", T::label(), object.object_id());
            return;
        }

        let id = object.object_id();
        if let Some(existing) = self.get(id) {
            if Rc::ptr_eq(&existing, &object) {
                return;
            }
            warn!(
                "⚠️ {} {:?} replaced by a new object with the same id",
                T::label(),
                id
            );
            self.remove(&existing);
        }

        let container = self.self_ref.clone();
        let subscription = object.state_signal().connect(self.receiver, move |changed: &Rc<T>| {
            if changed.is_destroyed() {
                if let Some(container) = container.upgrade() {
                    container.remove(changed);
                }
            }
        });
        self.objects.borrow_mut().insert(
            id,
            Slot {
                object: object.clone(),
                subscription,
            },
        );
        self.added.emit(&object);
    }

    /// Takes `object` out of the container.
    ///
    /// Does nothing unless this exact object is stored.
    pub fn remove(&self, object: &Rc<T>) {
        let id = object.object_id();
        let slot = {
            let mut objects = self.objects.borrow_mut();
            match objects.get(&id) {
                Some(slot) if Rc::ptr_eq(&slot.object, object) => objects.remove(&id),
                _ => None,
            }
        };
        let Some(slot) = slot else {
            return;
        };

        // Keeps the object alive through the notification below.
        let object = slot.object;
        object.state_signal().disconnect(self.receiver, slot.subscription);
        self.removed.emit(&object);
    }

    /// Destroys every stored object; each one leaves through its own state
    /// signal. Children created by the cascade are handled the same way.
    pub fn flag_all_as_destroyed(&self) {
        loop {
            let next = self
                .objects
                .borrow()
                .values()
                .next()
                .map(|slot| slot.object.clone());
            let Some(object) = next else {
                break;
            };
            if !object.is_destroyed() {
                object.flag_destroyed();
            }
            // Covers objects that were already destroyed when they were met
            // here; a no-op when the state signal removed them.
            self.remove(&object);
        }
    }

    pub fn get(&self, id: T::Id) -> Option<Rc<T>> {
        self.objects.borrow().get(&id).map(|slot| slot.object.clone())
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.objects.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<T::Id> {
        self.objects.borrow().keys().copied().collect()
    }

    /// Snapshot of the stored objects in id order; safe to mutate the
    /// container while walking it.
    pub fn objects(&self) -> Vec<Rc<T>> {
        self.objects
            .borrow()
            .values()
            .map(|slot| slot.object.clone())
            .collect()
    }
}

impl<T: Contained> Drop for ObjectContainer<T> {
    fn drop(&mut self) {
        for slot in self.objects.get_mut().values() {
            slot.object
                .state_signal()
                .disconnect(self.receiver, slot.subscription);
        }
    }
}

impl<T: Contained> Debug for ObjectContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContainer")
            .field("kind", &T::label())
            .field("ids", &self.ids())
            .finish()
    }
}
