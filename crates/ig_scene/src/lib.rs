//! # IG Scene
//!
//! The live state model of the image generator: what the Host has created
//! and how it is configured, independent of any renderer.
//!
//! ## Object Graph
//!
//! - [`Entity`]: 3D participants, with child entities and attached surfaces
//! - [`View`]: eyepoints, with surfaces overlaid on the viewport
//! - [`SymbolSurface`]: 2D canvases holding [`Symbol`]s
//! - [`Symbol`]: text and circle primitives, optionally parented to another
//!   symbol on the same surface
//!
//! Every object is shared through `Rc` and stored by id in an
//! [`ObjectContainer`]. Parents are observed through `Weak` back-references.
//! Destruction is a state change: a container drops an object when the
//! object reports its destroyed state, and destroying an owner first destroys
//! everything it contains.
//!
//! ```rust
//! use ig_scene::{Entity, EntityContainer, EntityState, SurfaceHost, SymbolSurface};
//!
//! let entities = EntityContainer::new();
//! let aircraft = Entity::new(1, 100);
//! aircraft.surfaces().add(SymbolSurface::new(5, SurfaceHost::Entity(1)));
//! entities.add(aircraft.clone());
//!
//! aircraft.set_state(EntityState::Remove);
//! assert!(entities.is_empty());
//! assert!(aircraft.surfaces().is_empty());
//! ```

pub mod container;
pub mod entity;
pub mod error;
pub mod flash;
pub mod surface;
pub mod symbol;
pub mod types;
pub mod view;

#[cfg(test)]
mod tests;

pub use container::{Contained, ObjectContainer};
pub use entity::{AnimationState, Articulation, Component, Entity, EntityContainer, EntityState};
pub use error::{Result, SceneError};
pub use flash::FlashState;
pub use surface::{
    SurfaceHost, SurfacePlacement, SurfaceState, SymbolSurface, SymbolSurfaceContainer, UvBounds,
};
pub use symbol::{
    Circle, CircleSymbol, DrawingMode, Symbol, SymbolContainer, SymbolKind, SymbolState, TextSymbol,
};
pub use types::{
    Color, EntityId, GeodeticPosition, Orientation, SurfaceId, SymbolId, Vec2, Vec3, ViewId,
    NO_PARENT,
};
pub use view::{Frustum, ProjectionKind, View, ViewContainer, ViewState, Viewport};
