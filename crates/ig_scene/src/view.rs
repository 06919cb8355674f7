//! Views: eyepoints rendered by the image generator

use crate::container::{Contained, ObjectContainer};
use crate::surface::SymbolSurfaceContainer;
use crate::types::{EntityId, Orientation, Vec3, ViewId};
use ig_event_system::Signal;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type ViewContainer = ObjectContainer<View>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewState {
    Active,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

/// Viewing volume. Half-angles in degrees for perspective views, extents in
/// metres for orthographic ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub projection: ProjectionKind,
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Perspective,
            near: 1.0,
            far: 50_000.0,
            left: -30.0,
            right: 30.0,
            top: 22.5,
            bottom: -22.5,
        }
    }
}

/// Pixel rectangle of the output window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1280,
            height: 720,
        }
    }
}

pub struct View {
    id: ViewId,
    self_ref: Weak<View>,
    group_id: Cell<u8>,
    state: Cell<ViewState>,
    entity_id: Cell<Option<EntityId>>,
    eye_offset: Cell<Vec3>,
    eye_orientation: Cell<Orientation>,
    frustum: Cell<Frustum>,
    viewport: Cell<Viewport>,
    fullscreen: Cell<bool>,
    surfaces: Rc<SymbolSurfaceContainer>,

    pub state_changed: Signal<Rc<View>>,
    /// Attached entity, eye offset or eye orientation changed
    pub eyepoint_changed: Signal<Rc<View>>,
    pub frustum_changed: Signal<Rc<View>>,
    /// Viewport or fullscreen flag changed
    pub window_changed: Signal<Rc<View>>,
}

impl View {
    pub fn new(id: ViewId, group_id: u8) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            id,
            self_ref: self_ref.clone(),
            group_id: Cell::new(group_id),
            state: Cell::new(ViewState::Active),
            entity_id: Cell::new(None),
            eye_offset: Cell::new(Vec3::ZERO),
            eye_orientation: Cell::new(Orientation::default()),
            frustum: Cell::new(Frustum::default()),
            viewport: Cell::new(Viewport::default()),
            fullscreen: Cell::new(false),
            surfaces: SymbolSurfaceContainer::new(),
            state_changed: Signal::new(),
            eyepoint_changed: Signal::new(),
            frustum_changed: Signal::new(),
            window_changed: Signal::new(),
        })
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn group_id(&self) -> u8 {
        self.group_id.get()
    }

    pub fn set_group_id(&self, group_id: u8) {
        self.group_id.set(group_id);
    }

    pub fn state(&self) -> ViewState {
        self.state.get()
    }

    /// A destroyed view stays destroyed; its surfaces are destroyed with it.
    pub fn set_state(&self, state: ViewState) {
        let current = self.state.get();
        if current == state || current == ViewState::Destroyed {
            return;
        }
        self.state.set(state);
        if state == ViewState::Destroyed {
            debug!("Destroying view {}", self.id);
            self.surfaces.flag_all_as_destroyed();
        }
        self.notify(&self.state_changed);
    }

    /// Entity the eyepoint rides on, if any.
    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id.get()
    }

    pub fn set_entity_id(&self, entity_id: Option<EntityId>) {
        if self.entity_id.replace(entity_id) != entity_id {
            self.notify(&self.eyepoint_changed);
        }
    }

    pub fn eye_offset(&self) -> Vec3 {
        self.eye_offset.get()
    }

    pub fn set_eye_offset(&self, offset: Vec3) {
        if self.eye_offset.replace(offset) != offset {
            self.notify(&self.eyepoint_changed);
        }
    }

    pub fn eye_orientation(&self) -> Orientation {
        self.eye_orientation.get()
    }

    pub fn set_eye_orientation(&self, orientation: Orientation) {
        if self.eye_orientation.replace(orientation) != orientation {
            self.notify(&self.eyepoint_changed);
        }
    }

    pub fn frustum(&self) -> Frustum {
        self.frustum.get()
    }

    pub fn set_frustum(&self, frustum: Frustum) {
        if self.frustum.replace(frustum) != frustum {
            self.notify(&self.frustum_changed);
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        if self.viewport.replace(viewport) != viewport {
            self.notify(&self.window_changed);
        }
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen.get()
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        if self.fullscreen.replace(fullscreen) != fullscreen {
            self.notify(&self.window_changed);
        }
    }

    /// Symbol surfaces overlaid on this view.
    pub fn surfaces(&self) -> &Rc<SymbolSurfaceContainer> {
        &self.surfaces
    }

    fn notify(&self, signal: &Signal<Rc<View>>) {
        if let Some(this) = self.self_ref.upgrade() {
            signal.emit(&this);
        }
    }
}

impl Contained for View {
    type Id = ViewId;

    fn object_id(&self) -> ViewId {
        self.id
    }

    fn is_destroyed(&self) -> bool {
        self.state.get() == ViewState::Destroyed
    }

    fn flag_destroyed(&self) {
        self.set_state(ViewState::Destroyed);
    }

    fn state_signal(&self) -> &Signal<Rc<Self>> {
        &self.state_changed
    }

    fn label() -> &'static str {
        "view"
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("group", &self.group_id.get())
            .field("state", &self.state.get())
            .field("entity", &self.entity_id.get())
            .field("surfaces", &self.surfaces.len())
            .finish()
    }
}
