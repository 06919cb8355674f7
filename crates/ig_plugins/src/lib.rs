//! # Image Generator Plugins
//!
//! The collaborator plugins that turn Host traffic into scene state.
//!
//! ## Core Features
//!
//! - **Host Link**: exchanges CIGI messages with the Host every frame and
//!   routes incoming packets to subscribers
//! - **Entity Manager**: entities, their components and articulated parts
//! - **View Manager**: views and their eyepoints, seeded from the definition
//!   tree
//! - **Symbology Manager**: symbol surfaces and symbols, including parent
//!   links and flashing
//! - **Scene Report**: JSON summaries of the scene while in `Debug`
//!
//! Plugins find each other's objects on the blackboard under the names in
//! [`keys`]. Dependencies are declared, so registration order does not
//! matter.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use bytes::Bytes;
//! use cigi_protocol::{ByteOrder, CigiVersion};
//! use ig_plugins::{register_standard_plugins, DefinitionsPlugin, HostLinkPlugin, HostTransport};
//! use plugin_system::{PluginManager, PluginState};
//!
//! struct Offline;
//!
//! impl HostTransport for Offline {
//!     fn receive(&mut self) -> Option<Bytes> { None }
//!     fn send(&mut self, _message: Bytes) -> std::io::Result<()> { Ok(()) }
//! }
//!
//! let host_link = HostLinkPlugin::new(CigiVersion::V3_3, ByteOrder::Big, Box::new(Offline)).unwrap();
//! let mut manager = PluginManager::new();
//! register_standard_plugins(&mut manager, host_link, DefinitionsPlugin::empty()).unwrap();
//!
//! while manager.tick(1.0 / 60.0).unwrap() != PluginState::Operate {}
//! manager.request_quit();
//! while manager.tick(1.0 / 60.0).unwrap() != PluginState::Exit {}
//! ```

pub mod definitions;
pub mod entity_manager;
pub mod host_link;
pub mod keys;
pub mod scene_report;
pub mod symbology_manager;
pub mod view_manager;


pub use definitions::DefinitionsPlugin;
pub use entity_manager::{EntityManager, EntityManagerPlugin, EntityType};
pub use host_link::{HostLinkPlugin, HostTransport, LinkSnapshot, LinkStatus};
pub use scene_report::{SceneReportPlugin, SceneSummary, DEFAULT_REPORT_INTERVAL};
pub use symbology_manager::{SymbologyManager, SymbologyManagerPlugin, UNPLACED};
pub use view_manager::{ViewManager, ViewManagerPlugin};

use plugin_system::{PluginManager, Result};

/// Registers the host link, the definition tree and every scene plugin.
///
/// # Arguments
///
/// * `manager` - The plugin manager to register with
/// * `host_link` - The link to the Host
/// * `definitions` - Source of the definition tree
pub fn register_standard_plugins(
    manager: &mut PluginManager,
    host_link: HostLinkPlugin,
    definitions: DefinitionsPlugin,
) -> Result<()> {
    manager.register(Box::new(definitions))?;
    manager.register(Box::new(host_link))?;
    manager.register(Box::new(EntityManagerPlugin::new()))?;
    manager.register(Box::new(ViewManagerPlugin::new()))?;
    manager.register(Box::new(SymbologyManagerPlugin::new()))?;
    manager.register(Box::new(SceneReportPlugin::new()))?;
    Ok(())
}
