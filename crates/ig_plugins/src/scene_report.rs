//! # Scene Report
//!
//! While the image generator is in `Debug`, logs a JSON summary of the
//! scene: link status, entities, views, surfaces and symbols. The first
//! report is written on entering `Debug`, then one every `interval` frames.

use ig_scene::{
    EntityContainer, EntityId, EntityState, Frustum, GeodeticPosition, Orientation, SurfaceHost,
    SurfaceId, SymbolContainer, SymbolId, SymbolState, SymbolSurfaceContainer, ViewContainer,
    ViewId, NO_PARENT,
};
use plugin_system::{Plugin, PluginState, Result, StateContext};
use serde::Serialize;
use std::rc::Rc;
use tracing::{info, warn};

use crate::host_link::{LinkSnapshot, LinkStatus};
use crate::keys;

/// Frames between two reports while in `Debug`.
pub const DEFAULT_REPORT_INTERVAL: u64 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub frame: u64,
    pub link: Option<LinkSnapshot>,
    pub entities: Vec<EntitySummary>,
    pub views: Vec<ViewSummary>,
    pub surfaces: Vec<SurfaceSummary>,
    pub symbols: Vec<SymbolSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitySummary {
    pub id: EntityId,
    pub entity_type: u16,
    pub state: EntityState,
    pub parent: Option<EntityId>,
    pub alpha: u8,
    pub position: GeodeticPosition,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub id: ViewId,
    pub group: u8,
    pub entity: Option<EntityId>,
    pub frustum: Frustum,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurfaceSummary {
    pub id: SurfaceId,
    pub host: SurfaceHost,
    pub symbols: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolSummary {
    pub id: SymbolId,
    pub kind: &'static str,
    pub surface: SurfaceId,
    pub state: SymbolState,
    pub parent: Option<SymbolId>,
    pub layer: u8,
    /// Effective flash value this frame
    pub lit: bool,
}

pub struct SceneReportPlugin {
    interval: u64,
    frames_until_report: u64,
    reports: u64,
    link: Option<Rc<LinkStatus>>,
    entities: Option<Rc<EntityContainer>>,
    views: Option<Rc<ViewContainer>>,
    surfaces: Option<Rc<SymbolSurfaceContainer>>,
    symbols: Option<Rc<SymbolContainer>>,
}

impl SceneReportPlugin {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_REPORT_INTERVAL)
    }

    /// Reports every `interval` frames in `Debug` (at least every frame).
    pub fn with_interval(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            frames_until_report: 0,
            reports: 0,
            link: None,
            entities: None,
            views: None,
            surfaces: None,
            symbols: None,
        }
    }

    /// Number of reports written so far.
    pub fn reports(&self) -> u64 {
        self.reports
    }

    /// Snapshot of the scene as seen through the blackboard.
    pub fn summarize(&self, frame: u64) -> SceneSummary {
        let entities = self
            .entities
            .iter()
            .flat_map(|entities| entities.objects())
            .map(|entity| EntitySummary {
                id: entity.id(),
                entity_type: entity.entity_type(),
                state: entity.state(),
                parent: entity.parent().map(|parent| parent.id()),
                alpha: entity.alpha(),
                position: entity.geodetic_position(),
                orientation: entity.orientation(),
            })
            .collect();
        let views = self
            .views
            .iter()
            .flat_map(|views| views.objects())
            .map(|view| ViewSummary {
                id: view.id(),
                group: view.group_id(),
                entity: view.entity_id(),
                frustum: view.frustum(),
            })
            .collect();
        let surfaces = self
            .surfaces
            .iter()
            .flat_map(|surfaces| surfaces.objects())
            .map(|surface| SurfaceSummary {
                id: surface.id(),
                host: surface.host(),
                symbols: surface.symbols().len(),
            })
            .collect();
        let symbols = self
            .symbols
            .iter()
            .flat_map(|symbols| symbols.objects())
            .map(|symbol| SymbolSummary {
                id: symbol.id(),
                kind: symbol.with_kind(|kind| kind.name()),
                surface: symbol.surface_id(),
                state: symbol.state(),
                parent: Some(symbol.parent_id()).filter(|id| symbol.is_child() && *id != NO_PARENT),
                layer: symbol.layer(),
                lit: symbol.flash_state(),
            })
            .collect();

        SceneSummary {
            frame,
            link: self.link.as_ref().map(|link| link.snapshot()),
            entities,
            views,
            surfaces,
            symbols,
        }
    }

    fn report(&mut self, frame: u64) {
        match serde_json::to_string(&self.summarize(frame)) {
            Ok(json) => {
                self.reports += 1;
                info!("📋 Scene report: {}", json);
            }
            Err(e) => warn!("⚠️ Failed to serialize scene report: {}", e),
        }
    }
}

impl Default for SceneReportPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SceneReportPlugin {
    fn name(&self) -> &str {
        "scene_report"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn dependencies(&self) -> &[&str] {
        &["symbology_manager"]
    }

    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
        match state {
            PluginState::BlackboardRetrieve => {
                let blackboard = context.blackboard();
                self.link = blackboard.get::<LinkStatus>(keys::LINK_STATUS);
                self.entities = blackboard.get::<EntityContainer>(keys::ENTITIES);
                self.views = blackboard.get::<ViewContainer>(keys::VIEWS);
                self.surfaces = blackboard.get::<SymbolSurfaceContainer>(keys::SURFACES);
                self.symbols = blackboard.get::<SymbolContainer>(keys::SYMBOLS);
            }
            PluginState::Debug => {
                if self.frames_until_report == 0 {
                    self.report(context.frame());
                    self.frames_until_report = self.interval;
                }
                self.frames_until_report -= 1;
            }
            PluginState::Operate => self.frames_until_report = 0,
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ig_scene::{Entity, Symbol, SymbolKind, SymbolSurface, TextSymbol, View};

    fn posted_scene(context: &mut StateContext) {
        let entities = EntityContainer::new();
        let parent = Entity::new(1, 100);
        entities.add(parent.clone());
        let child = Entity::new(2, 200);
        entities.add(child.clone());
        child.attach_to(&parent).unwrap();

        let views = ViewContainer::new();
        views.add(View::new(0, 0));

        let surfaces = SymbolSurfaceContainer::new();
        let surface = SymbolSurface::new(3, SurfaceHost::View(0));
        surfaces.add(surface.clone());

        let symbols = SymbolContainer::new();
        let symbol = Symbol::new(
            8,
            3,
            SymbolKind::Text(TextSymbol {
                text: "SPD".into(),
                alignment: 0,
                vertical: false,
                font_id: 0,
                font_size: 0.1,
            }),
        );
        symbols.add(symbol.clone());
        surface.symbols().add(symbol);

        let blackboard = context.blackboard_mut();
        blackboard.post(keys::ENTITIES, entities).unwrap();
        blackboard.post(keys::VIEWS, views).unwrap();
        blackboard.post(keys::SURFACES, surfaces).unwrap();
        blackboard.post(keys::SYMBOLS, symbols).unwrap();
    }

    #[test]
    fn summary_covers_the_scene() {
        let mut context = StateContext::new();
        posted_scene(&mut context);
        let mut plugin = SceneReportPlugin::new();
        plugin
            .act(PluginState::BlackboardRetrieve, &mut context)
            .unwrap();

        let summary = plugin.summarize(12);
        assert_eq!(summary.frame, 12);
        assert!(summary.link.is_none());
        assert_eq!(summary.entities.len(), 2);
        assert_eq!(summary.entities[1].parent, Some(1));
        assert_eq!(summary.views.len(), 1);
        assert_eq!(summary.surfaces[0].symbols, 1);
        assert_eq!(summary.symbols[0].kind, "text");
        assert_eq!(summary.symbols[0].parent, None);

        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["entities"][0]["state"], "Standby");
        assert_eq!(json["surfaces"][0]["host"]["View"], 0);
    }

    #[test]
    fn reports_only_in_debug_at_the_interval() {
        let mut context = StateContext::new();
        let mut plugin = SceneReportPlugin::with_interval(3);
        plugin
            .act(PluginState::BlackboardRetrieve, &mut context)
            .unwrap();

        for _ in 0..5 {
            plugin.act(PluginState::Operate, &mut context).unwrap();
        }
        assert_eq!(plugin.reports(), 0);

        for _ in 0..7 {
            plugin.act(PluginState::Debug, &mut context).unwrap();
        }
        assert_eq!(plugin.reports(), 3);

        plugin.act(PluginState::Operate, &mut context).unwrap();
        plugin.act(PluginState::Debug, &mut context).unwrap();
        assert_eq!(plugin.reports(), 4);
    }
}
