//! Entities: the 3D participants of the scene
//!
//! An entity owns its child entities (through its own [`EntityContainer`])
//! and the symbol surfaces attached to it. Moving an entity to
//! [`EntityState::Remove`] destroys both sets before the entity announces its
//! own removal, so every container holding it lets go of it in turn.

use crate::container::{Contained, ObjectContainer};
use crate::error::{Result, SceneError};
use crate::surface::SymbolSurfaceContainer;
use crate::types::{EntityId, GeodeticPosition, Orientation, Vec3, NO_PARENT};
use ig_event_system::Signal;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type EntityContainer = ObjectContainer<Entity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    Standby,
    Active,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimationState {
    #[default]
    Stop,
    Pause,
    Play,
    Continue,
}

/// Numeric sub-control of an entity (lights, switches, damage states ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub component_id: u16,
    pub state: u8,
    pub data: [u32; 6],
}

/// Movable sub-part of an entity, offset from the entity's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Articulation {
    pub part_id: u8,
    pub enabled: bool,
    pub offset: Vec3,
    pub orientation: Orientation,
}

pub struct Entity {
    id: EntityId,
    self_ref: Weak<Entity>,
    entity_type: Cell<u16>,
    state: Cell<EntityState>,
    alpha: Cell<u8>,
    geodetic: Cell<GeodeticPosition>,
    local: Cell<Vec3>,
    orientation: Cell<Orientation>,
    velocity: Cell<Vec3>,
    acceleration: Cell<Vec3>,
    animation: Cell<AnimationState>,
    parent: RefCell<Weak<Entity>>,
    children: Rc<EntityContainer>,
    surfaces: Rc<SymbolSurfaceContainer>,
    components: RefCell<BTreeMap<u16, Component>>,
    articulations: RefCell<BTreeMap<u8, Articulation>>,

    pub state_changed: Signal<Rc<Entity>>,
    pub type_changed: Signal<Rc<Entity>>,
    pub parent_changed: Signal<Rc<Entity>>,
    /// Position, orientation, velocity or acceleration changed
    pub position_changed: Signal<Rc<Entity>>,
    pub alpha_changed: Signal<Rc<Entity>>,
    pub animation_changed: Signal<Rc<Entity>>,
    pub component_changed: Signal<(Rc<Entity>, Component)>,
    pub articulation_changed: Signal<(Rc<Entity>, Articulation)>,
}

impl Entity {
    /// Creates a standby, top-level entity.
    pub fn new(id: EntityId, entity_type: u16) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            id,
            self_ref: self_ref.clone(),
            entity_type: Cell::new(entity_type),
            state: Cell::new(EntityState::Standby),
            alpha: Cell::new(255),
            geodetic: Cell::new(GeodeticPosition::default()),
            local: Cell::new(Vec3::ZERO),
            orientation: Cell::new(Orientation::default()),
            velocity: Cell::new(Vec3::ZERO),
            acceleration: Cell::new(Vec3::ZERO),
            animation: Cell::new(AnimationState::Stop),
            parent: RefCell::new(Weak::new()),
            children: EntityContainer::new(),
            surfaces: SymbolSurfaceContainer::new(),
            components: RefCell::new(BTreeMap::new()),
            articulations: RefCell::new(BTreeMap::new()),
            state_changed: Signal::new(),
            type_changed: Signal::new(),
            parent_changed: Signal::new(),
            position_changed: Signal::new(),
            alpha_changed: Signal::new(),
            animation_changed: Signal::new(),
            component_changed: Signal::new(),
            articulation_changed: Signal::new(),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> u16 {
        self.entity_type.get()
    }

    pub fn set_entity_type(&self, entity_type: u16) {
        if self.entity_type.replace(entity_type) != entity_type {
            self.notify(&self.type_changed);
        }
    }

    pub fn state(&self) -> EntityState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == EntityState::Active
    }

    /// Changes the state. Leaving `Remove` is not possible.
    ///
    /// Entering `Remove` destroys children and surfaces first, detaches from
    /// the parent, then emits `state_changed`.
    pub fn set_state(&self, state: EntityState) {
        let current = self.state.get();
        if current == state || current == EntityState::Remove {
            return;
        }
        self.state.set(state);
        if state == EntityState::Remove {
            debug!("Removing entity {}", self.id);
            self.children.flag_all_as_destroyed();
            self.surfaces.flag_all_as_destroyed();
            self.parent.replace(Weak::new());
        }
        self.notify(&self.state_changed);
    }

    pub fn alpha(&self) -> u8 {
        self.alpha.get()
    }

    pub fn set_alpha(&self, alpha: u8) {
        if self.alpha.replace(alpha) != alpha {
            self.notify(&self.alpha_changed);
        }
    }

    pub fn geodetic_position(&self) -> GeodeticPosition {
        self.geodetic.get()
    }

    pub fn set_geodetic_position(&self, position: GeodeticPosition) {
        if self.geodetic.replace(position) != position {
            self.notify(&self.position_changed);
        }
    }

    /// Offset from the parent entity, in the parent's body frame.
    pub fn local_position(&self) -> Vec3 {
        self.local.get()
    }

    pub fn set_local_position(&self, position: Vec3) {
        if self.local.replace(position) != position {
            self.notify(&self.position_changed);
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation.get()
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        if self.orientation.replace(orientation) != orientation {
            self.notify(&self.position_changed);
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity.get()
    }

    pub fn set_velocity(&self, velocity: Vec3) {
        if self.velocity.replace(velocity) != velocity {
            self.notify(&self.position_changed);
        }
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration.get()
    }

    pub fn set_acceleration(&self, acceleration: Vec3) {
        if self.acceleration.replace(acceleration) != acceleration {
            self.notify(&self.position_changed);
        }
    }

    pub fn animation_state(&self) -> AnimationState {
        self.animation.get()
    }

    pub fn set_animation_state(&self, animation: AnimationState) {
        if self.animation.replace(animation) != animation {
            self.notify(&self.animation_changed);
        }
    }

    pub fn component(&self, component_id: u16) -> Option<Component> {
        self.components.borrow().get(&component_id).copied()
    }

    pub fn components(&self) -> Vec<Component> {
        self.components.borrow().values().copied().collect()
    }

    pub fn set_component(&self, component: Component) {
        let previous = self
            .components
            .borrow_mut()
            .insert(component.component_id, component);
        if previous != Some(component) {
            if let Some(this) = self.self_ref.upgrade() {
                self.component_changed.emit(&(this, component));
            }
        }
    }

    pub fn articulation(&self, part_id: u8) -> Option<Articulation> {
        self.articulations.borrow().get(&part_id).copied()
    }

    pub fn articulations(&self) -> Vec<Articulation> {
        self.articulations.borrow().values().copied().collect()
    }

    pub fn set_articulation(&self, articulation: Articulation) {
        let previous = self
            .articulations
            .borrow_mut()
            .insert(articulation.part_id, articulation);
        if previous != Some(articulation) {
            if let Some(this) = self.self_ref.upgrade() {
                self.articulation_changed.emit(&(this, articulation));
            }
        }
    }

    pub fn parent(&self) -> Option<Rc<Entity>> {
        self.parent.borrow().upgrade()
    }

    /// Id of the parent, or [`NO_PARENT`].
    pub fn parent_id(&self) -> EntityId {
        self.parent().map_or(NO_PARENT, |parent| parent.id())
    }

    /// Child entities attached to this one.
    pub fn children(&self) -> &Rc<EntityContainer> {
        &self.children
    }

    /// Symbol surfaces attached to this entity.
    pub fn surfaces(&self) -> &Rc<SymbolSurfaceContainer> {
        &self.surfaces
    }

    /// Moves this entity under `parent`.
    ///
    /// The entity leaves its previous parent's children and joins the new
    /// parent's. Attaching to the current parent is a no-op.
    ///
    /// # Returns
    ///
    /// `SceneError::ParentCycle` if `parent` is this entity or one of its
    /// descendants, `SceneError::ParentDestroyed` if `parent` is removed.
    pub fn attach_to(&self, parent: &Rc<Entity>) -> Result<()> {
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };
        if let Some(current) = self.parent() {
            if Rc::ptr_eq(&current, parent) {
                return Ok(());
            }
        }
        if parent.state() == EntityState::Remove {
            return Err(SceneError::ParentDestroyed {
                child: self.id,
                parent_id: parent.id(),
            });
        }
        let mut cursor = Some(parent.clone());
        while let Some(ancestor) = cursor {
            if Rc::ptr_eq(&ancestor, &this) {
                return Err(SceneError::ParentCycle {
                    child: self.id,
                    parent_id: parent.id(),
                });
            }
            cursor = ancestor.parent();
        }

        if let Some(previous) = self.parent() {
            previous.children.remove(&this);
        }
        self.parent.replace(Rc::downgrade(parent));
        parent.children.add(this.clone());
        self.parent_changed.emit(&this);
        Ok(())
    }

    /// Leaves the current parent, if any. The caller decides where the
    /// entity lives next.
    pub fn detach(&self) {
        let Some(previous) = self.parent() else {
            return;
        };
        let Some(this) = self.self_ref.upgrade() else {
            return;
        };
        previous.children.remove(&this);
        self.parent.replace(Weak::new());
        self.parent_changed.emit(&this);
    }

    fn notify(&self, signal: &Signal<Rc<Entity>>) {
        if let Some(this) = self.self_ref.upgrade() {
            signal.emit(&this);
        }
    }
}

impl Contained for Entity {
    type Id = EntityId;

    fn object_id(&self) -> EntityId {
        self.id
    }

    fn is_destroyed(&self) -> bool {
        self.state.get() == EntityState::Remove
    }

    fn flag_destroyed(&self) {
        self.set_state(EntityState::Remove);
    }

    fn state_signal(&self) -> &Signal<Rc<Self>> {
        &self.state_changed
    }

    fn label() -> &'static str {
        "entity"
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("type", &self.entity_type.get())
            .field("state", &self.state.get())
            .field("parent", &self.parent_id())
            .field("children", &self.children.len())
            .field("surfaces", &self.surfaces.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ig_event_system::ReceiverId;

    #[test]
    fn state_changes_are_edge_triggered() {
        let entity = Entity::new(1, 10);
        let changes = Rc::new(Cell::new(0));
        let sink = changes.clone();
        entity
            .state_changed
            .connect(ReceiverId::new(), move |_| sink.set(sink.get() + 1));

        entity.set_state(EntityState::Active);
        entity.set_state(EntityState::Active);
        entity.set_state(EntityState::Remove);
        entity.set_state(EntityState::Remove);
        entity.set_state(EntityState::Active);

        assert_eq!(changes.get(), 2);
        assert_eq!(entity.state(), EntityState::Remove);
    }

    #[test]
    fn attach_moves_between_parents() {
        let first = Entity::new(1, 0);
        let second = Entity::new(2, 0);
        let child = Entity::new(3, 0);

        child.attach_to(&first).unwrap();
        assert!(first.children().contains(3));
        assert_eq!(child.parent_id(), 1);

        child.attach_to(&second).unwrap();
        assert!(!first.children().contains(3));
        assert!(second.children().contains(3));

        child.detach();
        assert!(second.children().is_empty());
        assert_eq!(child.parent_id(), NO_PARENT);
    }

    #[test]
    fn attach_rejects_cycles() {
        let root = Entity::new(1, 0);
        let middle = Entity::new(2, 0);
        let leaf = Entity::new(3, 0);
        middle.attach_to(&root).unwrap();
        leaf.attach_to(&middle).unwrap();

        assert_eq!(
            root.attach_to(&leaf),
            Err(SceneError::ParentCycle {
                child: 1,
                parent_id: 3
            })
        );
        assert_eq!(
            root.attach_to(&root),
            Err(SceneError::ParentCycle {
                child: 1,
                parent_id: 1
            })
        );
        assert_eq!(root.parent_id(), NO_PARENT);
    }

    #[test]
    fn component_and_articulation_updates_notify_once() {
        let entity = Entity::new(5, 0);
        let seen = Rc::new(Cell::new(0));
        let sink = seen.clone();
        entity
            .component_changed
            .connect(ReceiverId::new(), move |(_, component)| {
                assert_eq!(component.component_id, 7);
                sink.set(sink.get() + 1);
            });
        let component = Component {
            component_id: 7,
            state: 1,
            data: [0; 6],
        };
        entity.set_component(component);
        entity.set_component(component);
        assert_eq!(seen.get(), 1);
        assert_eq!(entity.component(7), Some(component));

        entity.set_articulation(Articulation {
            part_id: 2,
            enabled: true,
            ..Default::default()
        });
        assert!(entity.articulation(2).is_some_and(|part| part.enabled));
    }
}
