//! Symbol surfaces: 2D drawing canvases attached to a view or an entity

use crate::container::{Contained, ObjectContainer};
use crate::symbol::SymbolContainer;
use crate::types::{EntityId, Orientation, SurfaceId, Vec3, ViewId};
use ig_event_system::Signal;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type SymbolSurfaceContainer = ObjectContainer<SymbolSurface>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceState {
    Active,
    Destroyed,
}

/// What a surface is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceHost {
    Entity(EntityId),
    View(ViewId),
}

/// Where the surface sits relative to its host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SurfacePlacement {
    /// Rectangle in the entity's body frame, in metres
    Entity {
        position: Vec3,
        orientation: Orientation,
        width: f32,
        height: f32,
        billboard: bool,
        perspective_growth: bool,
    },
    /// Normalized view coordinates, 0 to 1 across the viewport
    View {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}

impl SurfacePlacement {
    /// A full-viewport rectangle.
    pub const FULL_VIEW: SurfacePlacement = SurfacePlacement::View {
        left: 0.0,
        right: 1.0,
        top: 1.0,
        bottom: 0.0,
    };
}

/// Range of surface coordinates mapped onto the placement rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvBounds {
    pub min_u: f32,
    pub max_u: f32,
    pub min_v: f32,
    pub max_v: f32,
}

impl Default for UvBounds {
    fn default() -> Self {
        Self {
            min_u: 0.0,
            max_u: 1.0,
            min_v: 0.0,
            max_v: 1.0,
        }
    }
}

pub struct SymbolSurface {
    id: SurfaceId,
    self_ref: Weak<SymbolSurface>,
    host: Cell<SurfaceHost>,
    state: Cell<SurfaceState>,
    placement: Cell<SurfacePlacement>,
    uv_bounds: Cell<UvBounds>,
    symbols: Rc<SymbolContainer>,

    pub state_changed: Signal<Rc<SymbolSurface>>,
    /// Placement or surface coordinate range changed
    pub geometry_changed: Signal<Rc<SymbolSurface>>,
}

impl SymbolSurface {
    pub fn new(id: SurfaceId, host: SurfaceHost) -> Rc<Self> {
        let placement = match host {
            SurfaceHost::View(_) => SurfacePlacement::FULL_VIEW,
            SurfaceHost::Entity(_) => SurfacePlacement::Entity {
                position: Vec3::ZERO,
                orientation: Orientation::default(),
                width: 1.0,
                height: 1.0,
                billboard: false,
                perspective_growth: false,
            },
        };
        Rc::new_cyclic(|self_ref| Self {
            id,
            self_ref: self_ref.clone(),
            host: Cell::new(host),
            state: Cell::new(SurfaceState::Active),
            placement: Cell::new(placement),
            uv_bounds: Cell::new(UvBounds::default()),
            symbols: SymbolContainer::new(),
            state_changed: Signal::new(),
            geometry_changed: Signal::new(),
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn host(&self) -> SurfaceHost {
        self.host.get()
    }

    pub fn state(&self) -> SurfaceState {
        self.state.get()
    }

    /// Changes the state. A destroyed surface stays destroyed and takes its
    /// symbols with it.
    pub fn set_state(&self, state: SurfaceState) {
        let current = self.state.get();
        if current == state || current == SurfaceState::Destroyed {
            return;
        }
        self.state.set(state);
        if state == SurfaceState::Destroyed {
            debug!("Destroying symbol surface {}", self.id);
            self.symbols.flag_all_as_destroyed();
        }
        self.notify(&self.state_changed);
    }

    pub fn placement(&self) -> SurfacePlacement {
        self.placement.get()
    }

    pub fn set_placement(&self, placement: SurfacePlacement) {
        if self.placement.replace(placement) != placement {
            self.notify(&self.geometry_changed);
        }
    }

    pub fn uv_bounds(&self) -> UvBounds {
        self.uv_bounds.get()
    }

    pub fn set_uv_bounds(&self, bounds: UvBounds) {
        if self.uv_bounds.replace(bounds) != bounds {
            self.notify(&self.geometry_changed);
        }
    }

    /// Symbols drawn on this surface.
    pub fn symbols(&self) -> &Rc<SymbolContainer> {
        &self.symbols
    }

    fn notify(&self, signal: &Signal<Rc<SymbolSurface>>) {
        if let Some(this) = self.self_ref.upgrade() {
            signal.emit(&this);
        }
    }
}

impl Contained for SymbolSurface {
    type Id = SurfaceId;

    fn object_id(&self) -> SurfaceId {
        self.id
    }

    fn is_destroyed(&self) -> bool {
        self.state.get() == SurfaceState::Destroyed
    }

    fn flag_destroyed(&self) {
        self.set_state(SurfaceState::Destroyed);
    }

    fn state_signal(&self) -> &Signal<Rc<Self>> {
        &self.state_changed
    }

    fn label() -> &'static str {
        "symbol surface"
    }
}

impl std::fmt::Debug for SymbolSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolSurface")
            .field("id", &self.id)
            .field("host", &self.host.get())
            .field("state", &self.state.get())
            .field("symbols", &self.symbols.len())
            .finish()
    }
}
