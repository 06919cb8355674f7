//! # Symbology Manager
//!
//! Builds 2D symbology from the Host's symbol surface, symbol definition,
//! clone and control packets.
//!
//! ## Ownership
//!
//! - A surface lives in its host's surface container (entity or view) and
//!   in the flat surface index posted on the blackboard.
//! - A symbol lives in the flat symbol index from its definition on, and in
//!   its surface's symbol container once a Symbol Control places it.
//!
//! Destroying an entity or a view therefore removes its surfaces, their
//! symbols and all child symbols from every index through the scene's
//! cascade; this manager never walks the graph itself.

use cigi_protocol::{
    CloneSource, DrawingStyle, IgControl, IgMode, PacketRouter, SurfaceAttachType,
    SurfaceStateField, SymbolCircleDefinition, SymbolClone, SymbolControl, SymbolStateField,
    SymbolSurfaceDefinition, SymbolTextDefinition, TextOrientation,
};
use ig_event_system::ReceiverId;
use ig_scene::{
    Circle, CircleSymbol, Color, DrawingMode, EntityContainer, Orientation, SceneError,
    SurfaceHost, SurfaceId, SurfacePlacement, SurfaceState, Symbol, SymbolContainer, SymbolId,
    SymbolKind, SymbolState, SymbolSurface, SymbolSurfaceContainer, TextSymbol, UvBounds, Vec2,
    Vec3, ViewContainer,
};
use plugin_system::{Plugin, PluginState, Result, StateContext};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::keys;

/// Surface id of a symbol no Symbol Control has placed yet.
pub const UNPLACED: SurfaceId = 0xFFFF;

pub struct SymbologyManager {
    surfaces: Rc<SymbolSurfaceContainer>,
    symbols: Rc<SymbolContainer>,
    entities: RefCell<Option<Rc<EntityContainer>>>,
    views: RefCell<Option<Rc<ViewContainer>>>,
}

impl SymbologyManager {
    pub fn new() -> Self {
        Self {
            surfaces: SymbolSurfaceContainer::new(),
            symbols: SymbolContainer::new(),
            entities: RefCell::new(None),
            views: RefCell::new(None),
        }
    }

    /// Every live surface by id.
    pub fn surfaces(&self) -> &Rc<SymbolSurfaceContainer> {
        &self.surfaces
    }

    /// Every live symbol by id, placed or not.
    pub fn symbols(&self) -> &Rc<SymbolContainer> {
        &self.symbols
    }

    /// Sets the entity and view indexes surfaces are attached through.
    pub fn set_hosts(&self, entities: Rc<EntityContainer>, views: Rc<ViewContainer>) {
        *self.entities.borrow_mut() = Some(entities);
        *self.views.borrow_mut() = Some(views);
    }

    pub fn apply_surface_definition(&self, packet: &SymbolSurfaceDefinition) {
        let id = packet.surface_id;
        if packet.state == SurfaceStateField::Destroyed {
            match self.surfaces.get(id) {
                Some(surface) => surface.set_state(SurfaceState::Destroyed),
                None => debug!("Surface {} is already gone", id),
            }
            return;
        }

        let host = match packet.attach_type {
            SurfaceAttachType::Entity => SurfaceHost::Entity(packet.host_id),
            SurfaceAttachType::View => SurfaceHost::View(packet.host_id),
        };
        let surface = match self.surfaces.get(id) {
            Some(existing) if existing.host() == host => existing,
            existing => {
                let Some(host_surfaces) = self.host_surfaces(host) else {
                    warn!("⚠️ Surface {} refers to unknown host {:?}", id, host);
                    return;
                };
                if let Some(existing) = existing {
                    debug!("Surface {} moves to {:?}; recreating it", id, host);
                    existing.set_state(SurfaceState::Destroyed);
                }
                let surface = SymbolSurface::new(id, host);
                host_surfaces.add(surface.clone());
                self.surfaces.add(surface.clone());
                surface
            }
        };

        surface.set_placement(match host {
            SurfaceHost::Entity(_) => SurfacePlacement::Entity {
                position: Vec3::new(
                    f64::from(packet.x_or_left),
                    f64::from(packet.y_or_right),
                    f64::from(packet.z_or_top),
                ),
                orientation: Orientation::new(packet.roll, packet.pitch, packet.yaw_or_bottom),
                width: packet.width,
                height: packet.height,
                billboard: packet.billboard,
                perspective_growth: packet.perspective_growth,
            },
            SurfaceHost::View(_) => SurfacePlacement::View {
                left: packet.x_or_left,
                right: packet.y_or_right,
                top: packet.z_or_top,
                bottom: packet.yaw_or_bottom,
            },
        });
        surface.set_uv_bounds(UvBounds {
            min_u: packet.min_u,
            max_u: packet.max_u,
            min_v: packet.min_v,
            max_v: packet.max_v,
        });
    }

    pub fn apply_text_definition(&self, packet: &SymbolTextDefinition) {
        let vertical = matches!(
            packet.orientation,
            TextOrientation::TopToBottom | TextOrientation::BottomToTop
        );
        self.define(
            packet.symbol_id,
            SymbolKind::Text(TextSymbol {
                text: packet.text.clone(),
                alignment: packet.alignment as u8,
                vertical,
                font_id: packet.font_id,
                font_size: packet.font_size,
            }),
        );
    }

    pub fn apply_circle_definition(&self, packet: &SymbolCircleDefinition) {
        let circles = packet
            .circles
            .iter()
            .map(|circle| Circle {
                center: Vec2::new(circle.center_u, circle.center_v),
                radius: circle.radius,
                inner_radius: circle.inner_radius,
                start_angle: circle.start_angle,
                end_angle: circle.end_angle,
            })
            .collect();
        self.define(
            packet.symbol_id,
            SymbolKind::Circle(CircleSymbol {
                drawing: match packet.drawing_style {
                    DrawingStyle::Line => DrawingMode::Line,
                    DrawingStyle::Fill => DrawingMode::Fill,
                },
                stipple_pattern: packet.stipple_pattern,
                line_width: packet.line_width,
                stipple_length: packet.stipple_length,
                stipple_factor: packet.stipple_factor,
                circles,
            }),
        );
    }

    /// Copies an existing symbol under a new id. The copy is unplaced.
    pub fn apply_clone(&self, packet: &SymbolClone) {
        if packet.source_type == CloneSource::Template {
            warn!(
                "⚠️ Symbol {} requests template {}; symbol templates are not supported",
                packet.symbol_id, packet.source_id
            );
            return;
        }
        if packet.symbol_id == packet.source_id {
            warn!("⚠️ Symbol {} cannot be cloned onto itself", packet.symbol_id);
            return;
        }
        let Some(source) = self.symbols.get(packet.source_id) else {
            warn!(
                "⚠️ Symbol {} cannot be cloned from unknown symbol {}",
                packet.symbol_id, packet.source_id
            );
            return;
        };
        if let Some(existing) = self.symbols.get(packet.symbol_id) {
            existing.set_state(SymbolState::Destroyed);
        }
        let clone = source.clone_as(packet.symbol_id);
        clone.set_surface_id(UNPLACED);
        self.symbols.add(clone);
    }

    pub fn apply_symbol_control(&self, packet: &SymbolControl) {
        let Some(symbol) = self.symbols.get(packet.symbol_id) else {
            debug!("Symbol control for undefined symbol {}", packet.symbol_id);
            return;
        };
        if packet.state == SymbolStateField::Destroyed {
            symbol.set_state(SymbolState::Destroyed);
            return;
        }
        if let Err(e) = self.place(&symbol, packet.surface_id) {
            warn!("⚠️ {}", e);
            return;
        }

        let parent = if packet.attached {
            self.symbols.get(packet.parent_symbol_id)
        } else {
            None
        };
        if let Err(e) = symbol.set_parent(packet.attached, packet.parent_symbol_id, parent.as_ref())
        {
            warn!("⚠️ Rejected parent for symbol {}: {}", packet.symbol_id, e);
        }

        symbol.set_inherit_color(packet.inherit_color);
        symbol.set_color(Color::from(packet.color));
        symbol.set_layer(packet.layer);
        symbol.set_position(Vec2::new(packet.position_u, packet.position_v));
        symbol.set_rotation(packet.rotation);
        symbol.set_scale(Vec2::new(packet.scale_u, packet.scale_v));
        symbol.flash().set_duty_cycle(packet.flash_duty_cycle);
        symbol.flash().set_period(f64::from(packet.flash_period));
        if packet.flash_reset {
            symbol.flash().reset_sequence();
        }
        symbol.set_state(match packet.state {
            SymbolStateField::Visible => SymbolState::Visible,
            _ => SymbolState::Hidden,
        });
    }

    /// Advances every symbol's flash sequence by `dt` seconds.
    pub fn update_flash(&self, dt: f64) {
        for symbol in self.symbols.objects() {
            symbol.update_flash(dt);
        }
    }

    /// Destroys every surface and symbol.
    pub fn reset(&self) {
        if !self.surfaces.is_empty() || !self.symbols.is_empty() {
            info!(
                "🧹 Removing {} surfaces and {} symbols",
                self.surfaces.len(),
                self.symbols.len()
            );
        }
        self.surfaces.flag_all_as_destroyed();
        self.symbols.flag_all_as_destroyed();
    }

    fn define(&self, id: SymbolId, kind: SymbolKind) {
        match self.symbols.get(id) {
            Some(existing) if existing.with_kind(|current| current.name() == kind.name()) => {
                existing.set_kind(kind);
            }
            existing => {
                if let Some(existing) = existing {
                    debug!("Symbol {} changes to {}; replacing it", id, kind.name());
                    existing.set_state(SymbolState::Destroyed);
                }
                debug!("Defining {} symbol {}", kind.name(), id);
                self.symbols.add(Symbol::new(id, UNPLACED, kind));
            }
        }
    }

    /// Moves `symbol` onto `surface_id`.
    fn place(&self, symbol: &Rc<Symbol>, surface_id: SurfaceId) -> ig_scene::Result<()> {
        let Some(surface) = self.surfaces.get(surface_id) else {
            return Err(SceneError::UnknownSurface {
                symbol: symbol.id(),
                surface_id,
            });
        };
        if surface.symbols().contains(symbol.id()) && symbol.surface_id() == surface_id {
            return Ok(());
        }
        if let Some(previous) = self.surfaces.get(symbol.surface_id()) {
            previous.symbols().remove(symbol);
        }
        symbol.set_surface_id(surface_id);
        surface.symbols().add(symbol.clone());
        Ok(())
    }

    fn host_surfaces(&self, host: SurfaceHost) -> Option<Rc<SymbolSurfaceContainer>> {
        match host {
            SurfaceHost::Entity(id) => {
                let entities = self.entities.borrow();
                let entity = entities.as_ref()?.get(id)?;
                Some(entity.surfaces().clone())
            }
            SurfaceHost::View(id) => {
                let views = self.views.borrow();
                let view = views.as_ref()?.get(id)?;
                Some(view.surfaces().clone())
            }
        }
    }
}

impl Default for SymbologyManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SymbologyManagerPlugin {
    manager: Rc<SymbologyManager>,
    router: Option<Rc<PacketRouter>>,
    receiver: ReceiverId,
}

impl SymbologyManagerPlugin {
    pub fn new() -> Self {
        Self {
            manager: Rc::new(SymbologyManager::new()),
            router: None,
            receiver: ReceiverId::new(),
        }
    }

    pub fn manager(&self) -> Rc<SymbologyManager> {
        self.manager.clone()
    }

    fn subscribe(&self, router: &PacketRouter) {
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &SymbolSurfaceDefinition| {
            manager.apply_surface_definition(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &SymbolTextDefinition| {
            manager.apply_text_definition(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &SymbolCircleDefinition| {
            manager.apply_circle_definition(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &SymbolClone| manager.apply_clone(packet));
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &SymbolControl| {
            manager.apply_symbol_control(packet)
        });
        let manager = self.manager.clone();
        router.on(self.receiver, move |packet: &IgControl| {
            if packet.ig_mode == IgMode::Reset {
                manager.reset();
            }
        });
    }
}

impl Default for SymbologyManagerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SymbologyManagerPlugin {
    fn name(&self) -> &str {
        "symbology_manager"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn dependencies(&self) -> &[&str] {
        &["host_link", "entity_manager", "view_manager"]
    }

    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
        match state {
            PluginState::BlackboardPost => {
                let blackboard = context.blackboard_mut();
                blackboard.post(keys::SURFACES, self.manager.surfaces().clone())?;
                blackboard.post(keys::SYMBOLS, self.manager.symbols().clone())?;
            }
            PluginState::BlackboardRetrieve => {
                let blackboard = context.blackboard();
                self.router = Some(blackboard.retrieve::<PacketRouter>(keys::PACKET_ROUTER)?);
                self.manager.set_hosts(
                    blackboard.retrieve::<EntityContainer>(keys::ENTITIES)?,
                    blackboard.retrieve::<ViewContainer>(keys::VIEWS)?,
                );
            }
            PluginState::Initialize => {
                if let Some(router) = &self.router {
                    self.subscribe(router);
                }
            }
            PluginState::Operate | PluginState::Debug => {
                self.manager.update_flash(context.delta_time());
            }
            PluginState::Shutdown => {
                if let Some(router) = &self.router {
                    router.disconnect_receiver(self.receiver);
                }
                self.manager.reset();
            }
            PluginState::LoadConfiguration | PluginState::Exit => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cigi_protocol::CircleGeometry;
    use ig_scene::{Entity, EntityState, View, NO_PARENT};

    struct Scene {
        entities: Rc<EntityContainer>,
        views: Rc<ViewContainer>,
        manager: SymbologyManager,
    }

    fn scene() -> Scene {
        let entities = EntityContainer::new();
        entities.add(Entity::new(1, 100));
        let views = ViewContainer::new();
        views.add(View::new(0, 0));
        let manager = SymbologyManager::new();
        manager.set_hosts(entities.clone(), views.clone());
        Scene {
            entities,
            views,
            manager,
        }
    }

    fn surface_on(id: SurfaceId, attach_type: SurfaceAttachType, host_id: u16) -> SymbolSurfaceDefinition {
        SymbolSurfaceDefinition {
            surface_id: id,
            attach_type,
            host_id,
            x_or_left: 0.1,
            y_or_right: 0.9,
            z_or_top: 0.9,
            yaw_or_bottom: 0.1,
            max_u: 1.0,
            max_v: 1.0,
            ..Default::default()
        }
    }

    fn text(id: SymbolId, text: &str) -> SymbolTextDefinition {
        SymbolTextDefinition {
            symbol_id: id,
            text: text.to_string(),
            font_size: 0.05,
            ..Default::default()
        }
    }

    fn control(id: SymbolId, surface_id: SurfaceId) -> SymbolControl {
        SymbolControl {
            symbol_id: id,
            state: SymbolStateField::Visible,
            surface_id,
            parent_symbol_id: NO_PARENT,
            color: [0, 255, 0, 255],
            flash_duty_cycle: 100,
            scale_u: 1.0,
            scale_v: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn surfaces_attach_to_views_and_entities() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        scene
            .manager
            .apply_surface_definition(&surface_on(2, SurfaceAttachType::Entity, 1));
        scene
            .manager
            .apply_surface_definition(&surface_on(3, SurfaceAttachType::Entity, 42));

        let view = scene.views.get(0).unwrap();
        assert!(view.surfaces().contains(1));
        assert_eq!(
            scene.manager.surfaces().get(1).unwrap().placement(),
            SurfacePlacement::View {
                left: 0.1,
                right: 0.9,
                top: 0.9,
                bottom: 0.1
            }
        );
        assert!(scene.entities.get(1).unwrap().surfaces().contains(2));
        assert!(!scene.manager.surfaces().contains(3));
    }

    #[test]
    fn surface_moving_hosts_is_recreated() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        let first = scene.manager.surfaces().get(1).unwrap();
        scene.manager.apply_text_definition(&text(5, "ALT"));
        scene.manager.apply_symbol_control(&control(5, 1));

        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::Entity, 1));
        let second = scene.manager.surfaces().get(1).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(first.state(), SurfaceState::Destroyed);
        assert!(!scene.views.get(0).unwrap().surfaces().contains(1));
        assert!(!scene.manager.symbols().contains(5));
    }

    #[test]
    fn definitions_and_control_place_symbols() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        scene.manager.apply_text_definition(&text(10, "HDG 090"));
        let symbol = scene.manager.symbols().get(10).unwrap();
        assert_eq!(symbol.surface_id(), UNPLACED);
        assert_eq!(symbol.state(), SymbolState::Hidden);

        let mut packet = control(10, 1);
        packet.layer = 3;
        packet.position_u = 0.5;
        scene.manager.apply_symbol_control(&packet);
        let surface = scene.manager.surfaces().get(1).unwrap();
        assert!(surface.symbols().contains(10));
        assert_eq!(symbol.state(), SymbolState::Visible);
        assert_eq!(symbol.layer(), 3);
        assert_eq!(symbol.position().u, 0.5);
        assert_eq!(symbol.color(), Color::rgba(0, 255, 0, 255));

        scene.manager.apply_text_definition(&text(10, "HDG 095"));
        assert!(Rc::ptr_eq(&symbol, &scene.manager.symbols().get(10).unwrap()));
        assert!(matches!(symbol.kind(), SymbolKind::Text(ref t) if t.text == "HDG 095"));

        scene.manager.apply_symbol_control(&control(10, 9));
        assert!(surface.symbols().contains(10));
    }

    #[test]
    fn type_change_replaces_the_symbol() {
        let scene = scene();
        scene.manager.apply_text_definition(&text(4, "A"));
        let original = scene.manager.symbols().get(4).unwrap();
        scene.manager.apply_circle_definition(&SymbolCircleDefinition {
            symbol_id: 4,
            circles: vec![CircleGeometry {
                radius: 0.2,
                end_angle: 360.0,
                ..Default::default()
            }],
            ..Default::default()
        });
        let replaced = scene.manager.symbols().get(4).unwrap();
        assert!(original.is_destroyed());
        assert_eq!(replaced.kind().name(), "circle");
    }

    #[test]
    fn children_follow_their_parent() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        scene.manager.apply_text_definition(&text(1, "parent"));
        scene.manager.apply_text_definition(&text(2, "child"));
        let mut parent = control(1, 1);
        parent.flash_duty_cycle = 50;
        parent.flash_period = 1.0;
        scene.manager.apply_symbol_control(&parent);
        let mut child = control(2, 1);
        child.attached = true;
        child.parent_symbol_id = 1;
        child.inherit_color = true;
        child.color = [255, 0, 0, 255];
        scene.manager.apply_symbol_control(&child);

        let child = scene.manager.symbols().get(2).unwrap();
        assert_eq!(child.parent_id(), 1);
        assert_eq!(child.color(), Color::rgba(0, 255, 0, 255));
        assert!(child.is_flashing());
        assert!(child.flash_state());

        scene.manager.update_flash(0.75);
        assert!(!child.flash_state());

        let mut destroy = control(1, 1);
        destroy.state = SymbolStateField::Destroyed;
        scene.manager.apply_symbol_control(&destroy);
        assert!(scene.manager.symbols().is_empty());
    }

    #[test]
    fn rejected_parent_keeps_the_symbol_detached() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        scene.manager.apply_text_definition(&text(1, "lonely"));
        let mut packet = control(1, 1);
        packet.attached = true;
        packet.parent_symbol_id = 99;
        scene.manager.apply_symbol_control(&packet);

        let symbol = scene.manager.symbols().get(1).unwrap();
        assert!(!symbol.is_child());
        assert_eq!(symbol.state(), SymbolState::Visible);
    }

    #[test]
    fn clones_start_unplaced() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        scene.manager.apply_text_definition(&text(1, "WPT"));
        scene.manager.apply_symbol_control(&control(1, 1));

        scene.manager.apply_clone(&SymbolClone {
            symbol_id: 2,
            source_type: CloneSource::Symbol,
            source_id: 1,
        });
        let clone = scene.manager.symbols().get(2).unwrap();
        assert_eq!(clone.surface_id(), UNPLACED);
        assert_eq!(clone.state(), SymbolState::Hidden);
        assert_eq!(clone.own_color(), Color::rgba(0, 255, 0, 255));

        scene.manager.apply_clone(&SymbolClone {
            symbol_id: 3,
            source_type: CloneSource::Template,
            source_id: 1,
        });
        scene.manager.apply_clone(&SymbolClone {
            symbol_id: 4,
            source_type: CloneSource::Symbol,
            source_id: 77,
        });
        assert_eq!(scene.manager.symbols().len(), 2);
    }

    #[test]
    fn destroying_a_host_entity_clears_its_symbology() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(7, SurfaceAttachType::Entity, 1));
        scene.manager.apply_text_definition(&text(1, "TGT"));
        scene.manager.apply_symbol_control(&control(1, 7));

        scene.entities.get(1).unwrap().set_state(EntityState::Remove);
        assert!(scene.manager.surfaces().is_empty());
        assert!(scene.manager.symbols().is_empty());
    }

    #[test]
    fn reset_destroys_unplaced_symbols_too() {
        let scene = scene();
        scene
            .manager
            .apply_surface_definition(&surface_on(1, SurfaceAttachType::View, 0));
        scene.manager.apply_text_definition(&text(1, "placed"));
        scene.manager.apply_text_definition(&text(2, "unplaced"));
        scene.manager.apply_symbol_control(&control(1, 1));

        scene.manager.reset();
        assert!(scene.manager.surfaces().is_empty());
        assert!(scene.manager.symbols().is_empty());
        assert!(scene.views.get(0).unwrap().surfaces().is_empty());
    }
}
