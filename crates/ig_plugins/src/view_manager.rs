//! # View Manager
//!
//! Owns the views (eyepoints) the image generator renders. The initial
//! layout comes from the `view` groups of the definition tree; without any,
//! a single default view 0 is created. At run time the Host reshapes views
//! with View Definition and moves them with View Control.
//!
//! ```toml
//! [[view]]
//! id = 0
//! group = 0
//! near = 0.5
//! far = 80000.0
//! viewport = [0, 0, 1920, 1080]
//! fullscreen = true
//! ```

use cigi_protocol::{
    FrustumEnables, IgControl, IgMode, PacketRouter, Projection, ViewControl, ViewControlEnables,
    ViewDefinition,
};
use ig_event_system::ReceiverId;
use ig_scene::{
    Entity, EntityContainer, Frustum, Orientation, ProjectionKind, Vec3, View, ViewContainer,
    ViewId, Viewport,
};
use plugin_system::{
    DefFileGroup, Plugin, PluginError, PluginState, Result, StateContext, DEF_FILE_ROOT_KEY,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::keys;

pub struct ViewManager {
    views: Rc<ViewContainer>,
    entities: RefCell<Option<Rc<EntityContainer>>>,
    receiver: ReceiverId,
}

impl ViewManager {
    pub fn new() -> Self {
        Self {
            views: ViewContainer::new(),
            entities: RefCell::new(None),
            receiver: ReceiverId::new(),
        }
    }

    pub fn views(&self) -> &Rc<ViewContainer> {
        &self.views
    }

    pub fn get(&self, id: ViewId) -> Option<Rc<View>> {
        self.views.get(id)
    }

    /// Uses `entities` to validate View Control attachments. Views attached
    /// to an entity fall back to world space when that entity goes away.
    pub fn track_entities(&self, entities: Rc<EntityContainer>) {
        let views = Rc::downgrade(&self.views);
        entities.removed.connect(self.receiver, move |entity: &Rc<Entity>| {
            let Some(views) = views.upgrade() else {
                return;
            };
            for view in views.objects() {
                if view.entity_id() == Some(entity.id()) {
                    debug!("View {} lost its entity {}", view.id(), entity.id());
                    view.set_entity_id(None);
                }
            }
        });
        if let Some(previous) = self.entities.replace(Some(entities)) {
            previous.removed.disconnect_receiver(self.receiver);
        }
    }

    /// Builds the views named in `root`, or the default view 0.
    ///
    /// # Returns
    ///
    /// The number of views created.
    pub fn load_layout(&self, root: &DefFileGroup) -> Result<usize> {
        let mut created = 0;
        for group in root.groups("view") {
            let id = group.require_int::<u16>("id")?;
            let group_id = match group.int("group") {
                Some(_) => group.require_int::<u8>("group")?,
                None => 0,
            };
            let view = View::new(id, group_id);
            view.set_frustum(frustum_from(group)?);
            if let Some(rect) = group.float_array("viewport") {
                view.set_viewport(viewport_from(group.name(), rect)?);
            }
            view.set_fullscreen(group.bool("fullscreen").unwrap_or(false));
            self.views.add(view);
            created += 1;
        }
        if created == 0 {
            self.views.add(View::new(0, 0));
            created = 1;
        }
        Ok(created)
    }

    /// Creates the view if needed and updates the frustum sides the packet
    /// enables. A frustum whose near plane is not in front of its far plane
    /// is rejected.
    pub fn apply_view_definition(&self, packet: &ViewDefinition) {
        let view = self.get_or_create(packet.view_id, packet.group_id);
        view.set_group_id(packet.group_id);

        let mut frustum = view.frustum();
        frustum.projection = match packet.projection {
            Projection::Perspective => ProjectionKind::Perspective,
            Projection::Orthographic => ProjectionKind::Orthographic,
        };
        let enables = packet.enables;
        if enables.contains(FrustumEnables::NEAR) {
            frustum.near = packet.near;
        }
        if enables.contains(FrustumEnables::FAR) {
            frustum.far = packet.far;
        }
        if enables.contains(FrustumEnables::LEFT) {
            frustum.left = packet.left;
        }
        if enables.contains(FrustumEnables::RIGHT) {
            frustum.right = packet.right;
        }
        if enables.contains(FrustumEnables::TOP) {
            frustum.top = packet.top;
        }
        if enables.contains(FrustumEnables::BOTTOM) {
            frustum.bottom = packet.bottom;
        }
        if !(frustum.near > 0.0 && frustum.near < frustum.far) {
            warn!(
                "⚠️ Rejected frustum for view {}: near {} far {}",
                packet.view_id, frustum.near, frustum.far
            );
            return;
        }
        view.set_frustum(frustum);
    }

    /// Creates the view if needed, then updates its entity attachment and
    /// the eye offsets the packet enables.
    pub fn apply_view_control(&self, packet: &ViewControl) {
        let view = self.get_or_create(packet.view_id, packet.group_id);

        let known = self
            .entities
            .borrow()
            .as_ref()
            .map_or(true, |entities| entities.contains(packet.entity_id));
        if known {
            view.set_entity_id(Some(packet.entity_id));
        } else {
            warn!(
                "⚠️ View {} cannot attach to unknown entity {}",
                packet.view_id, packet.entity_id
            );
        }

        let enables = packet.enables;
        let mut offset = view.eye_offset();
        if enables.contains(ViewControlEnables::X_OFFSET) {
            offset.x = f64::from(packet.x_offset);
        }
        if enables.contains(ViewControlEnables::Y_OFFSET) {
            offset.y = f64::from(packet.y_offset);
        }
        if enables.contains(ViewControlEnables::Z_OFFSET) {
            offset.z = f64::from(packet.z_offset);
        }
        view.set_eye_offset(offset);

        let mut orientation = view.eye_orientation();
        if enables.contains(ViewControlEnables::ROLL) {
            orientation.roll = packet.roll;
        }
        if enables.contains(ViewControlEnables::PITCH) {
            orientation.pitch = packet.pitch;
        }
        if enables.contains(ViewControlEnables::YAW) {
            orientation.yaw = packet.yaw;
        }
        view.set_eye_orientation(orientation);
    }

    /// Returns every view to world space with a neutral eyepoint. Views are
    /// display configuration and survive a Host reset.
    pub fn reset(&self) {
        for view in self.views.objects() {
            view.set_entity_id(None);
            view.set_eye_offset(Vec3::ZERO);
            view.set_eye_orientation(Orientation::default());
        }
    }

    /// Destroys every view along with its surfaces.
    pub fn destroy_all(&self) {
        self.views.flag_all_as_destroyed();
        if let Some(entities) = self.entities.borrow_mut().take() {
            entities.removed.disconnect_receiver(self.receiver);
        }
    }

    fn get_or_create(&self, id: ViewId, group_id: u8) -> Rc<View> {
        match self.views.get(id) {
            Some(view) => view,
            None => {
                debug!("Creating view {} in group {}", id, group_id);
                let view = View::new(id, group_id);
                self.views.add(view.clone());
                view
            }
        }
    }
}

impl Default for ViewManager {
    fn default() -> Self {
        Self::new()
    }
}

fn frustum_from(group: &DefFileGroup) -> Result<Frustum> {
    let defaults = Frustum::default();
    let side = |key: &str, default: f32| group.float(key).map_or(default, |value| value as f32);
    let projection = match group.string("projection") {
        None | Some("perspective") => ProjectionKind::Perspective,
        Some("orthographic") => ProjectionKind::Orthographic,
        Some(other) => {
            return Err(PluginError::Definition(format!(
                "{}.projection: unknown projection '{other}'",
                group.name()
            )))
        }
    };
    let frustum = Frustum {
        projection,
        near: side("near", defaults.near),
        far: side("far", defaults.far),
        left: side("left", defaults.left),
        right: side("right", defaults.right),
        top: side("top", defaults.top),
        bottom: side("bottom", defaults.bottom),
    };
    if !(frustum.near > 0.0 && frustum.near < frustum.far) {
        return Err(PluginError::Definition(format!(
            "{}: near plane must be positive and in front of the far plane",
            group.name()
        )));
    }
    Ok(frustum)
}

fn viewport_from(group: &str, rect: &[f64]) -> Result<Viewport> {
    match *rect {
        [x, y, width, height] if x >= 0.0 && y >= 0.0 && width >= 1.0 && height >= 1.0 => {
            Ok(Viewport {
                x: x as u32,
                y: y as u32,
                width: width as u32,
                height: height as u32,
            })
        }
        _ => Err(PluginError::Definition(format!(
            "{group}.viewport must be [x, y, width, height] with a non-empty size"
        ))),
    }
}

pub struct ViewManagerPlugin {
    manager: Rc<ViewManager>,
    router: Option<Rc<PacketRouter>>,
    definitions: Option<Rc<DefFileGroup>>,
    receiver: ReceiverId,
}

impl ViewManagerPlugin {
    pub fn new() -> Self {
        Self {
            manager: Rc::new(ViewManager::new()),
            router: None,
            definitions: None,
            receiver: ReceiverId::new(),
        }
    }

    pub fn manager(&self) -> Rc<ViewManager> {
        self.manager.clone()
    }

    fn subscribe(&self, router: &PacketRouter) {
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &ViewDefinition| {
            manager.apply_view_definition(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &ViewControl| {
            manager.apply_view_control(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &IgControl| {
            if packet.ig_mode == IgMode::Reset {
                manager.reset();
            }
        });
    }
}

impl Default for ViewManagerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ViewManagerPlugin {
    fn name(&self) -> &str {
        "view_manager"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn dependencies(&self) -> &[&str] {
        &["host_link", "entity_manager"]
    }

    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
        match state {
            PluginState::BlackboardPost => {
                context
                    .blackboard_mut()
                    .post(keys::VIEWS, self.manager.views().clone())?;
            }
            PluginState::BlackboardRetrieve => {
                let blackboard = context.blackboard();
                self.router = Some(blackboard.retrieve::<PacketRouter>(keys::PACKET_ROUTER)?);
                self.definitions = blackboard.get::<DefFileGroup>(DEF_FILE_ROOT_KEY);
                self.manager
                    .track_entities(blackboard.retrieve::<EntityContainer>(keys::ENTITIES)?);
            }
            PluginState::LoadConfiguration => {
                let root = self
                    .definitions
                    .clone()
                    .unwrap_or_else(|| Rc::new(DefFileGroup::new("root")));
                let views = self.manager.load_layout(&root)?;
                info!("🎥 Configured {} views", views);
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
                self.manager.destroy_all();
            }
            PluginState::Operate | PluginState::Debug | PluginState::Exit => {}
        }
        Ok(())
    }
}
