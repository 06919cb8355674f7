//! # Entity Manager
//!
//! Keeps the entity population in step with the Host's Entity Control,
//! Component Control and Articulated Part Control packets.
//!
//! Every live entity is indexed by id in one flat [`EntityContainer`],
//! whether it is top-level or attached to a parent. Attached entities are
//! also owned by their parent's child container, so removing a parent
//! removes the whole subtree from the index through the usual cascade.
//!
//! The entity type catalog is read from the definition tree:
//!
//! ```toml
//! [[entity]]
//! type = 100
//! name = "F-16"
//! ```

use cigi_protocol::{
    AnimationStateField, ArticulatedPartControl, ArticulationEnables, ComponentClass,
    ComponentControl, EntityControl, EntityStateField, IgControl, IgMode, PacketRouter,
};
use ig_event_system::ReceiverId;
use ig_scene::{
    AnimationState, Articulation, Component, Entity, EntityContainer, EntityId, EntityState,
    GeodeticPosition, Orientation, Vec3,
};
use plugin_system::{DefFileGroup, Plugin, PluginState, Result, StateContext, DEF_FILE_ROOT_KEY};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

use crate::keys;

/// Catalog entry for one entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityType {
    pub id: u16,
    pub name: String,
}

pub struct EntityManager {
    entities: Rc<EntityContainer>,
    catalog: RefCell<BTreeMap<u16, EntityType>>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            entities: EntityContainer::new(),
            catalog: RefCell::new(BTreeMap::new()),
        }
    }

    /// Every live entity by id.
    pub fn entities(&self) -> &Rc<EntityContainer> {
        &self.entities
    }

    /// Reads the `entity` groups of `root` into the type catalog.
    ///
    /// # Returns
    ///
    /// The number of types read, or `PluginError::Definition` for a group
    /// without a valid `type`.
    pub fn load_catalog(&self, root: &DefFileGroup) -> Result<usize> {
        let mut catalog = self.catalog.borrow_mut();
        for group in root.groups("entity") {
            let id = group.require_int::<u16>("type")?;
            let name = group
                .string("name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("type {id}"));
            catalog.insert(id, EntityType { id, name });
        }
        Ok(catalog.len())
    }

    pub fn entity_type(&self, id: u16) -> Option<EntityType> {
        self.catalog.borrow().get(&id).cloned()
    }

    pub fn get(&self, id: EntityId) -> Option<Rc<Entity>> {
        self.entities.get(id)
    }

    pub fn apply_entity_control(&self, packet: &EntityControl) {
        let id = packet.entity_id;
        if packet.entity_state == EntityStateField::Destroyed {
            match self.entities.get(id) {
                Some(entity) => entity.set_state(EntityState::Remove),
                None => debug!("Entity {} is already gone", id),
            }
            return;
        }

        let entity = match self.entities.get(id) {
            Some(entity) => entity,
            None => self.create(id, packet.entity_type),
        };
        entity.set_entity_type(packet.entity_type);
        entity.set_state(match packet.entity_state {
            EntityStateField::Active => EntityState::Active,
            _ => EntityState::Standby,
        });
        entity.set_alpha(packet.alpha);
        entity.set_animation_state(match packet.animation_state {
            AnimationStateField::Stop => AnimationState::Stop,
            AnimationStateField::Pause => AnimationState::Pause,
            AnimationStateField::Play => AnimationState::Play,
            AnimationStateField::Continue => AnimationState::Continue,
        });

        if packet.attached {
            match self.entities.get(packet.parent_id) {
                Some(parent) => {
                    if let Err(e) = entity.attach_to(&parent) {
                        warn!("⚠️ Rejected attachment of entity {}: {}", id, e);
                    }
                }
                None => warn!(
                    "⚠️ Entity {} cannot attach to unknown parent {}",
                    id, packet.parent_id
                ),
            }
            entity.set_local_position(Vec3::new(packet.lat_or_x, packet.lon_or_y, packet.alt_or_z));
        } else {
            entity.detach();
            entity.set_geodetic_position(GeodeticPosition {
                latitude: packet.lat_or_x,
                longitude: packet.lon_or_y,
                altitude: packet.alt_or_z,
            });
        }
        entity.set_orientation(Orientation::new(packet.roll, packet.pitch, packet.yaw));
    }

    pub fn apply_component_control(&self, packet: &ComponentControl) {
        if packet.class != ComponentClass::Entity {
            trace!("Ignoring component control for {:?}", packet.class);
            return;
        }
        let Some(entity) = self.entities.get(packet.instance_id) else {
            debug!("Component control for unknown entity {}", packet.instance_id);
            return;
        };
        entity.set_component(Component {
            component_id: packet.component_id,
            state: packet.state,
            data: packet.data,
        });
    }

    /// Updates only the fields the packet enables.
    pub fn apply_articulated_part(&self, packet: &ArticulatedPartControl) {
        let Some(entity) = self.entities.get(packet.entity_id) else {
            debug!("Articulated part control for unknown entity {}", packet.entity_id);
            return;
        };
        let mut part = entity.articulation(packet.part_id).unwrap_or(Articulation {
            part_id: packet.part_id,
            ..Default::default()
        });
        let enables = packet.enables;
        part.enabled = enables.contains(ArticulationEnables::PART_ENABLED);
        if enables.contains(ArticulationEnables::X_OFFSET) {
            part.offset.x = f64::from(packet.x_offset);
        }
        if enables.contains(ArticulationEnables::Y_OFFSET) {
            part.offset.y = f64::from(packet.y_offset);
        }
        if enables.contains(ArticulationEnables::Z_OFFSET) {
            part.offset.z = f64::from(packet.z_offset);
        }
        if enables.contains(ArticulationEnables::ROLL) {
            part.orientation.roll = packet.roll;
        }
        if enables.contains(ArticulationEnables::PITCH) {
            part.orientation.pitch = packet.pitch;
        }
        if enables.contains(ArticulationEnables::YAW) {
            part.orientation.yaw = packet.yaw;
        }
        entity.set_articulation(part);
    }

    /// Removes every entity.
    pub fn reset(&self) {
        if !self.entities.is_empty() {
            info!("🧹 Removing {} entities", self.entities.len());
        }
        self.entities.flag_all_as_destroyed();
    }

    fn create(&self, id: EntityId, entity_type: u16) -> Rc<Entity> {
        let catalog = self.catalog.borrow();
        match catalog.get(&entity_type) {
            Some(known) => debug!("Creating entity {} ({})", id, known.name),
            None if catalog.is_empty() => debug!("Creating entity {} of type {}", id, entity_type),
            None => warn!("⚠️ Entity {} uses unknown type {}", id, entity_type),
        }
        let entity = Entity::new(id, entity_type);
        self.entities.add(entity.clone());
        entity
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EntityManagerPlugin {
    manager: Rc<EntityManager>,
    router: Option<Rc<PacketRouter>>,
    definitions: Option<Rc<DefFileGroup>>,
    receiver: ReceiverId,
}

impl EntityManagerPlugin {
    pub fn new() -> Self {
        Self {
            manager: Rc::new(EntityManager::new()),
            router: None,
            definitions: None,
            receiver: ReceiverId::new(),
        }
    }

    pub fn manager(&self) -> Rc<EntityManager> {
        self.manager.clone()
    }

    fn subscribe(&self, router: &PacketRouter) {
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &EntityControl| {
            manager.apply_entity_control(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &ComponentControl| {
            manager.apply_component_control(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &ArticulatedPartControl| {
            manager.apply_articulated_part(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &IgControl| {
            if packet.ig_mode == IgMode::Reset {
                manager.reset();
            }
        });
    }
}

impl Default for EntityManagerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EntityManagerPlugin {
    fn name(&self) -> &str {
        "entity_manager"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn dependencies(&self) -> &[&str] {
        &["host_link"]
    }

    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
        match state {
            PluginState::BlackboardPost => {
                context
                    .blackboard_mut()
                    .post(keys::ENTITIES, self.manager.entities().clone())?;
            }
            PluginState::BlackboardRetrieve => {
                let blackboard = context.blackboard();
                self.router = Some(blackboard.retrieve::<PacketRouter>(keys::PACKET_ROUTER)?);
                self.definitions = blackboard.get::<DefFileGroup>(DEF_FILE_ROOT_KEY);
            }
            PluginState::LoadConfiguration => {
                if let Some(definitions) = &self.definitions {
                    let types = self.manager.load_catalog(definitions)?;
                    info!("📚 Loaded {} entity types", types);
                }
            }
            PluginState::Initialize => {
                if let Some(router) = &self.router {
                    self.subscribe(router);
                }
            }
            PluginState::Shutdown => {
                if let Some(router) = &self.router {
                    router.disconnect_receiver(self.receiver);
                }
                self.manager.reset();
            }
            PluginState::Operate | PluginState::Debug | PluginState::Exit => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cigi_protocol::CigiPacket;
    use ig_scene::NO_PARENT;

    fn control(id: EntityId, state: EntityStateField) -> EntityControl {
        EntityControl {
            entity_id: id,
            entity_state: state,
            entity_type: 100,
            alpha: 255,
            ..Default::default()
        }
    }

    #[test]
    fn creates_updates_and_removes_entities() {
        let manager = EntityManager::new();
        let mut packet = control(1, EntityStateField::Active);
        packet.lat_or_x = 21.3;
        packet.lon_or_y = -157.9;
        packet.yaw = 90.0;
        manager.apply_entity_control(&packet);

        let entity = manager.get(1).unwrap();
        assert_eq!(entity.state(), EntityState::Active);
        assert_eq!(entity.geodetic_position().latitude, 21.3);
        assert_eq!(entity.orientation().yaw, 90.0);

        manager.apply_entity_control(&control(1, EntityStateField::Inactive));
        assert_eq!(entity.state(), EntityState::Standby);

        manager.apply_entity_control(&control(1, EntityStateField::Destroyed));
        assert!(manager.entities().is_empty());
        manager.apply_entity_control(&control(1, EntityStateField::Destroyed));
    }

    #[test]
    fn attached_entities_follow_their_parent() {
        let manager = EntityManager::new();
        manager.apply_entity_control(&control(1, EntityStateField::Active));
        let mut child = control(2, EntityStateField::Active);
        child.attached = true;
        child.parent_id = 1;
        child.lat_or_x = 5.0;
        manager.apply_entity_control(&child);

        let parent = manager.get(1).unwrap();
        let attached = manager.get(2).unwrap();
        assert_eq!(attached.parent_id(), 1);
        assert_eq!(attached.local_position().x, 5.0);
        assert!(parent.children().contains(2));

        manager.apply_entity_control(&control(1, EntityStateField::Destroyed));
        assert!(manager.entities().is_empty());
        assert_eq!(attached.state(), EntityState::Remove);
    }

    #[test]
    fn invalid_attachments_are_rejected() {
        let manager = EntityManager::new();
        manager.apply_entity_control(&control(1, EntityStateField::Active));
        let mut child = control(2, EntityStateField::Active);
        child.attached = true;
        child.parent_id = 1;
        manager.apply_entity_control(&child);

        let mut cycle = control(1, EntityStateField::Active);
        cycle.attached = true;
        cycle.parent_id = 2;
        manager.apply_entity_control(&cycle);
        assert_eq!(manager.get(1).unwrap().parent_id(), NO_PARENT);

        let mut orphan = control(3, EntityStateField::Active);
        orphan.attached = true;
        orphan.parent_id = 99;
        manager.apply_entity_control(&orphan);
        assert_eq!(manager.get(3).unwrap().parent_id(), NO_PARENT);
    }

    #[test]
    fn components_and_articulations() {
        let manager = EntityManager::new();
        manager.apply_entity_control(&control(7, EntityStateField::Active));
        manager.apply_component_control(&ComponentControl {
            component_id: 3,
            instance_id: 7,
            class: ComponentClass::Entity,
            state: 2,
            data: [1, 2, 3, 4, 5, 6],
        });
        manager.apply_component_control(&ComponentControl {
            component_id: 9,
            instance_id: 7,
            class: ComponentClass::View,
            ..Default::default()
        });
        let entity = manager.get(7).unwrap();
        assert_eq!(entity.component(3).map(|c| c.state), Some(2));
        assert!(entity.component(9).is_none());

        manager.apply_articulated_part(&ArticulatedPartControl {
            entity_id: 7,
            part_id: 1,
            enables: ArticulationEnables::PART_ENABLED | ArticulationEnables::YAW,
            yaw: 45.0,
            x_offset: 3.0,
            ..Default::default()
        });
        let part = entity.articulation(1).unwrap();
        assert!(part.enabled);
        assert_eq!(part.orientation.yaw, 45.0);
        assert_eq!(part.offset.x, 0.0);
    }

    #[test]
    fn catalog_from_definitions() {
        let root = DefFileGroup::parse(
            "ig",
            "[[entity]]\ntype = 100\nname = \"F-16\"\n[[entity]]\ntype = 200\n",
        )
        .unwrap();
        let manager = EntityManager::new();
        assert_eq!(manager.load_catalog(&root).unwrap(), 2);
        assert_eq!(manager.entity_type(100).unwrap().name, "F-16");
        assert_eq!(manager.entity_type(200).unwrap().name, "type 200");

        let broken = DefFileGroup::parse("ig", "[[entity]]\nname = \"nameless\"\n").unwrap();
        assert!(manager.load_catalog(&broken).is_err());
    }

    #[test]
    fn plugin_subscribes_through_the_blackboard() {
        let router = Rc::new(PacketRouter::new());
        let mut context = StateContext::new();
        context
            .blackboard_mut()
            .post(keys::PACKET_ROUTER, router.clone())
            .unwrap();

        let mut plugin = EntityManagerPlugin::new();
        for state in [
            PluginState::BlackboardPost,
            PluginState::BlackboardRetrieve,
            PluginState::LoadConfiguration,
            PluginState::Initialize,
        ] {
            plugin.act(state, &mut context).unwrap();
        }
        let entities = context
            .blackboard()
            .retrieve::<EntityContainer>(keys::ENTITIES)
            .unwrap();

        router.route(&CigiPacket::from(control(5, EntityStateField::Active)));
        assert!(entities.contains(5));

        router.route(&CigiPacket::from(IgControl {
            ig_mode: IgMode::Reset,
            ..Default::default()
        }));
        assert!(entities.is_empty());

        plugin.act(PluginState::Shutdown, &mut context).unwrap();
        assert!(!router.has_subscribers(cigi_protocol::PacketKind::EntityControl));
    }
}
