//! 2D symbols drawn on symbol surfaces
//!
//! A symbol may be attached to a parent symbol. A child follows its parent's
//! flash sequence, may inherit its color, and is destroyed together with it.
//! The parent is held as a [`Weak`] back-reference; the surface's
//! [`SymbolContainer`] stays the only strong owner.

use crate::container::{Contained, ObjectContainer};
use crate::error::{Result, SceneError};
use crate::flash::FlashState;
use crate::types::{Color, SurfaceId, SymbolId, Vec2, NO_PARENT};
use ig_event_system::{ReceiverId, Signal, SlotId};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::debug;

pub type SymbolContainer = ObjectContainer<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolState {
    Hidden,
    Visible,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSymbol {
    pub text: String,
    /// Anchor code, 0 (top left) to 8 (bottom right)
    pub alignment: u8,
    pub vertical: bool,
    pub font_id: u8,
    /// Height in surface units
    pub font_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawingMode {
    Line,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
    pub inner_radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleSymbol {
    pub drawing: DrawingMode,
    pub stipple_pattern: u16,
    pub line_width: f32,
    pub stipple_length: f32,
    pub stipple_factor: f32,
    pub circles: Vec<Circle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolKind {
    Text(TextSymbol),
    Circle(CircleSymbol),
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Text(_) => "text",
            SymbolKind::Circle(_) => "circle",
        }
    }
}

/// Subscriptions a child holds on its parent.
#[derive(Clone, Copy)]
struct ParentLinks {
    color: SlotId,
    flash: SlotId,
    state: SlotId,
}

pub struct Symbol {
    id: SymbolId,
    self_ref: Weak<Symbol>,
    receiver: ReceiverId,
    kind: RefCell<SymbolKind>,
    state: Cell<SymbolState>,
    surface_id: Cell<SurfaceId>,
    layer: Cell<u8>,
    position: Cell<Vec2>,
    rotation: Cell<f32>,
    scale: Cell<Vec2>,
    color: Cell<Color>,
    inherit_color: Cell<bool>,
    flash: FlashState,
    is_child: Cell<bool>,
    parent_id: Cell<SymbolId>,
    parent: RefCell<Weak<Symbol>>,
    parent_links: Cell<Option<ParentLinks>>,

    pub state_changed: Signal<Rc<Symbol>>,
    /// Effective color may have changed
    pub color_changed: Signal<Rc<Symbol>>,
    /// Effective flash value may have changed
    pub flash_state_changed: Signal<Rc<Symbol>>,
    pub parent_changed: Signal<Rc<Symbol>>,
    pub kind_changed: Signal<Rc<Symbol>>,
    /// Position, rotation or scale changed
    pub transform_changed: Signal<Rc<Symbol>>,
    pub layer_changed: Signal<Rc<Symbol>>,
    pub surface_changed: Signal<Rc<Symbol>>,
}

impl Symbol {
    /// Creates a hidden, unattached symbol on `surface_id`.
    pub fn new(id: SymbolId, surface_id: SurfaceId, kind: SymbolKind) -> Rc<Self> {
        Rc::new_cyclic(|self_ref: &Weak<Symbol>| {
            let receiver = ReceiverId::new();
            let flash = FlashState::new();
            let symbol = self_ref.clone();
            flash.changed.connect(receiver, move |_| {
                if let Some(symbol) = symbol.upgrade() {
                    symbol.flash_state_changed.emit(&symbol);
                }
            });

            Self {
                id,
                self_ref: self_ref.clone(),
                receiver,
                kind: RefCell::new(kind),
                state: Cell::new(SymbolState::Hidden),
                surface_id: Cell::new(surface_id),
                layer: Cell::new(0),
                position: Cell::new(Vec2::default()),
                rotation: Cell::new(0.0),
                scale: Cell::new(Vec2::new(1.0, 1.0)),
                color: Cell::new(Color::WHITE),
                inherit_color: Cell::new(false),
                flash,
                is_child: Cell::new(false),
                parent_id: Cell::new(NO_PARENT),
                parent: RefCell::new(Weak::new()),
                parent_links: Cell::new(None),
                state_changed: Signal::new(),
                color_changed: Signal::new(),
                flash_state_changed: Signal::new(),
                parent_changed: Signal::new(),
                kind_changed: Signal::new(),
                transform_changed: Signal::new(),
                layer_changed: Signal::new(),
                surface_changed: Signal::new(),
            }
        })
    }

    /// Copies this symbol's definition and appearance under `id`.
    ///
    /// The clone starts hidden, unattached and at the beginning of its flash
    /// sequence.
    pub fn clone_as(&self, id: SymbolId) -> Rc<Symbol> {
        let clone = Symbol::new(id, self.surface_id.get(), self.kind.borrow().clone());
        clone.layer.set(self.layer.get());
        clone.position.set(self.position.get());
        clone.rotation.set(self.rotation.get());
        clone.scale.set(self.scale.get());
        clone.color.set(self.color.get());
        clone.inherit_color.set(self.inherit_color.get());
        clone.flash.set_duty_cycle(self.flash.duty_cycle());
        clone.flash.set_period(self.flash.period());
        clone
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind.borrow().clone()
    }

    /// Runs `f` with the definition without cloning it.
    pub fn with_kind<R>(&self, f: impl FnOnce(&SymbolKind) -> R) -> R {
        f(&self.kind.borrow())
    }

    pub fn set_kind(&self, kind: SymbolKind) {
        if *self.kind.borrow() == kind {
            return;
        }
        self.kind.replace(kind);
        self.notify(&self.kind_changed);
    }

    pub fn state(&self) -> SymbolState {
        self.state.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.get() == SymbolState::Destroyed
    }

    /// Changes the state; repeating the current state does nothing and a
    /// destroyed symbol stays destroyed.
    pub fn set_state(&self, state: SymbolState) {
        let current = self.state.get();
        if current == state || current == SymbolState::Destroyed {
            return;
        }
        self.state.set(state);
        if state == SymbolState::Destroyed {
            debug!("Destroying symbol {}", self.id);
            self.unlink_parent();
        }
        self.notify(&self.state_changed);
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id.get()
    }

    pub fn set_surface_id(&self, surface_id: SurfaceId) {
        if self.surface_id.replace(surface_id) != surface_id {
            self.notify(&self.surface_changed);
        }
    }

    pub fn layer(&self) -> u8 {
        self.layer.get()
    }

    pub fn set_layer(&self, layer: u8) {
        if self.layer.replace(layer) != layer {
            self.notify(&self.layer_changed);
        }
    }

    /// Position in the parent's frame, or on the surface for root symbols.
    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    pub fn set_position(&self, position: Vec2) {
        if self.position.replace(position) != position {
            self.notify(&self.transform_changed);
        }
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> f32 {
        self.rotation.get()
    }

    pub fn set_rotation(&self, degrees: f32) {
        if self.rotation.replace(degrees) != degrees {
            self.notify(&self.transform_changed);
        }
    }

    pub fn scale(&self) -> Vec2 {
        self.scale.get()
    }

    pub fn set_scale(&self, scale: Vec2) {
        if self.scale.replace(scale) != scale {
            self.notify(&self.transform_changed);
        }
    }

    /// Effective color: the parent's when inheriting, else the symbol's own.
    pub fn color(&self) -> Color {
        if self.inherit_color.get() {
            if let Some(parent) = self.parent() {
                return parent.color();
            }
        }
        self.color.get()
    }

    /// The color set on this symbol, ignoring inheritance.
    pub fn own_color(&self) -> Color {
        self.color.get()
    }

    pub fn set_color(&self, color: Color) {
        if self.color.replace(color) != color {
            self.notify(&self.color_changed);
        }
    }

    pub fn inherits_color(&self) -> bool {
        self.inherit_color.get()
    }

    pub fn set_inherit_color(&self, inherit: bool) {
        if self.inherit_color.replace(inherit) != inherit {
            self.notify(&self.color_changed);
        }
    }

    /// The symbol's own flash timer.
    pub fn flash(&self) -> &FlashState {
        &self.flash
    }

    /// Effective flash value: on only while this symbol and every ancestor
    /// are on.
    pub fn flash_state(&self) -> bool {
        self.flash.is_on() && self.parent().map_or(true, |parent| parent.flash_state())
    }

    /// Whether this symbol or any ancestor alternates.
    pub fn is_flashing(&self) -> bool {
        self.flash.is_flashing() || self.parent().is_some_and(|parent| parent.is_flashing())
    }

    /// Advances the symbol's own flash timer by `dt` seconds.
    pub fn update_flash(&self, dt: f64) {
        self.flash.update(dt);
    }

    pub fn is_child(&self) -> bool {
        self.is_child.get()
    }

    /// Id of the parent, or [`NO_PARENT`].
    pub fn parent_id(&self) -> SymbolId {
        self.parent_id.get()
    }

    pub fn parent(&self) -> Option<Rc<Symbol>> {
        self.parent.borrow().upgrade()
    }

    /// Attaches this symbol to `parent` (`is_child`), or detaches it.
    ///
    /// Repeating the current attachment does nothing. When attaching,
    /// `parent` must be present, carry `parent_id`, still exist, and must not
    /// have this symbol among its ancestors. A rejected request leaves both
    /// symbols untouched.
    pub fn set_parent(
        &self,
        is_child: bool,
        parent_id: SymbolId,
        parent: Option<&Rc<Symbol>>,
    ) -> Result<()> {
        let current = self.parent();
        let same_object = match (&current, parent) {
            (Some(current), Some(requested)) => Rc::ptr_eq(current, requested),
            (None, None) => true,
            _ => false,
        };
        if !is_child && !self.is_child.get() {
            return Ok(());
        }
        if is_child == self.is_child.get() && parent_id == self.parent_id.get() && same_object {
            return Ok(());
        }
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };

        if !is_child {
            self.unlink_parent();
            self.is_child.set(false);
            self.parent_id.set(NO_PARENT);
            self.parent.replace(Weak::new());
            self.parent_changed.emit(&this);
            return Ok(());
        }

        let Some(parent) = parent else {
            return Err(SceneError::NullParent {
                child: self.id,
                parent_id,
            });
        };
        if parent.id() != parent_id {
            return Err(SceneError::ParentIdMismatch {
                expected: parent_id,
                actual: parent.id(),
            });
        }
        if parent.is_destroyed() {
            return Err(SceneError::ParentDestroyed {
                child: self.id,
                parent_id,
            });
        }
        let mut cursor = Some(parent.clone());
        while let Some(ancestor) = cursor {
            if Rc::ptr_eq(&ancestor, &this) || ancestor.id() == self.id {
                return Err(SceneError::ParentCycle {
                    child: self.id,
                    parent_id,
                });
            }
            cursor = ancestor.parent();
        }

        self.unlink_parent();
        self.is_child.set(true);
        self.parent_id.set(parent_id);
        self.parent.replace(Rc::downgrade(parent));
        self.link_parent(parent);

        self.parent_changed.emit(&this);
        self.flash_state_changed.emit(&this);
        if self.inherit_color.get() {
            self.color_changed.emit(&this);
        }
        Ok(())
    }

    fn link_parent(&self, parent: &Rc<Symbol>) {
        let child = self.self_ref.clone();
        let color = parent.color_changed.connect(self.receiver, move |_| {
            if let Some(child) = child.upgrade() {
                if child.inherit_color.get() {
                    child.color_changed.emit(&child);
                }
            }
        });
        let child = self.self_ref.clone();
        let flash = parent.flash_state_changed.connect(self.receiver, move |_| {
            if let Some(child) = child.upgrade() {
                child.flash_state_changed.emit(&child);
            }
        });
        let child = self.self_ref.clone();
        let state = parent.state_changed.connect(self.receiver, move |parent: &Rc<Symbol>| {
            if parent.is_destroyed() {
                if let Some(child) = child.upgrade() {
                    child.set_state(SymbolState::Destroyed);
                }
            }
        });
        self.parent_links.set(Some(ParentLinks { color, flash, state }));
    }

    fn unlink_parent(&self) {
        let Some(links) = self.parent_links.take() else {
            return;
        };
        if let Some(parent) = self.parent() {
            parent.color_changed.disconnect(self.receiver, links.color);
            parent.flash_state_changed.disconnect(self.receiver, links.flash);
            parent.state_changed.disconnect(self.receiver, links.state);
        }
    }

    fn notify(&self, signal: &Signal<Rc<Symbol>>) {
        if let Some(this) = self.self_ref.upgrade() {
            signal.emit(&this);
        }
    }
}

impl Drop for Symbol {
    fn drop(&mut self) {
        self.unlink_parent();
    }
}

impl Contained for Symbol {
    type Id = SymbolId;

    fn object_id(&self) -> SymbolId {
        self.id
    }

    fn is_destroyed(&self) -> bool {
        Symbol::is_destroyed(self)
    }

    fn flag_destroyed(&self) {
        self.set_state(SymbolState::Destroyed);
    }

    fn state_signal(&self) -> &Signal<Rc<Self>> {
        &self.state_changed
    }

    fn label() -> &'static str {
        "symbol"
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbol")
            .field("id", &self.id)
            .field("kind", &self.kind.borrow().name())
            .field("state", &self.state.get())
            .field("surface", &self.surface_id.get())
            .field("parent", &self.parent_id.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: SymbolId) -> Rc<Symbol> {
        Symbol::new(
            id,
            1,
            SymbolKind::Text(TextSymbol {
                text: format!("T{id}"),
                alignment: 0,
                vertical: false,
                font_id: 0,
                font_size: 0.05,
            }),
        )
    }

    fn counter(signal: &Signal<Rc<Symbol>>) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        signal.connect(ReceiverId::new(), move |_| sink.set(sink.get() + 1));
        count
    }

    #[test]
    fn attach_validates_the_request() {
        let parent = text(1);
        let child = text(2);

        assert_eq!(
            child.set_parent(true, 1, None),
            Err(SceneError::NullParent {
                child: 2,
                parent_id: 1
            })
        );
        assert_eq!(
            child.set_parent(true, 9, Some(&parent)),
            Err(SceneError::ParentIdMismatch {
                expected: 9,
                actual: 1
            })
        );
        assert!(!child.is_child());

        child.set_parent(true, 1, Some(&parent)).unwrap();
        assert!(child.is_child());
        assert_eq!(child.parent_id(), 1);
    }

    #[test]
    fn attach_to_destroyed_parent_is_rejected() {
        let parent = text(1);
        let child = text(2);
        parent.set_state(SymbolState::Destroyed);
        assert_eq!(
            child.set_parent(true, 1, Some(&parent)),
            Err(SceneError::ParentDestroyed {
                child: 2,
                parent_id: 1
            })
        );
    }

    #[test]
    fn repeating_the_attachment_is_silent() {
        let parent = text(1);
        let child = text(2);
        let parent_changes = counter(&child.parent_changed);

        child.set_parent(true, 1, Some(&parent)).unwrap();
        child.set_parent(true, 1, Some(&parent)).unwrap();
        assert_eq!(parent_changes.get(), 1);

        child.set_parent(false, NO_PARENT, None).unwrap();
        child.set_parent(false, NO_PARENT, None).unwrap();
        assert_eq!(parent_changes.get(), 2);
        assert_eq!(child.parent_id(), NO_PARENT);
        assert!(child.parent().is_none());
    }

    #[test]
    fn color_is_inherited_on_request() {
        let parent = text(1);
        let child = text(2);
        parent.set_color(Color::rgba(255, 0, 0, 255));
        child.set_color(Color::rgba(0, 255, 0, 255));
        child.set_parent(true, 1, Some(&parent)).unwrap();
        assert_eq!(child.color(), Color::rgba(0, 255, 0, 255));

        let color_changes = counter(&child.color_changed);
        child.set_inherit_color(true);
        assert_eq!(child.color(), Color::rgba(255, 0, 0, 255));

        parent.set_color(Color::rgba(0, 0, 255, 255));
        assert_eq!(child.color(), Color::rgba(0, 0, 255, 255));
        assert_eq!(color_changes.get(), 2);
        assert_eq!(child.own_color(), Color::rgba(0, 255, 0, 255));
    }

    #[test]
    fn flash_combines_with_the_parent() {
        let parent = text(1);
        let child = text(2);
        child.set_parent(true, 1, Some(&parent)).unwrap();
        parent.flash().set_duty_cycle(50);
        parent.flash().set_period(1.0);
        assert!(child.is_flashing());

        let child_flash = counter(&child.flash_state_changed);
        parent.update_flash(0.6);
        assert!(!parent.flash_state());
        assert!(!child.flash_state());
        assert!(child.flash().is_on());
        assert_eq!(child_flash.get(), 1);
    }

    #[test]
    fn parent_destruction_destroys_the_child() {
        let parent = text(1);
        let child = text(2);
        child.set_parent(true, 1, Some(&parent)).unwrap();

        parent.set_state(SymbolState::Destroyed);
        assert!(child.is_destroyed());
        assert_eq!(parent.state_changed.slot_count(), 0);
    }

    #[test]
    fn clone_copies_appearance_only() {
        let parent = text(1);
        let original = text(2);
        original.set_color(Color::rgba(1, 2, 3, 4));
        original.set_layer(7);
        original.set_state(SymbolState::Visible);
        original.set_parent(true, 1, Some(&parent)).unwrap();

        let clone = original.clone_as(20);
        assert_eq!(clone.id(), 20);
        assert_eq!(clone.kind(), original.kind());
        assert_eq!(clone.own_color(), Color::rgba(1, 2, 3, 4));
        assert_eq!(clone.layer(), 7);
        assert_eq!(clone.state(), SymbolState::Hidden);
        assert_eq!(clone.parent_id(), NO_PARENT);
    }
}
