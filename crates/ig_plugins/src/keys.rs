//! Blackboard keys shared by the image generator plugins.
//!
//! | Key | Type | Posted by |
//! |---|---|---|
//! | [`PACKET_ROUTER`] | `PacketRouter` | host link |
//! | [`LINK_STATUS`] | `LinkStatus` | host link |
//! | [`ENTITIES`] | `EntityContainer` | entity manager |
//! | [`VIEWS`] | `ViewContainer` | view manager |
//! | [`SURFACES`] | `SymbolSurfaceContainer` | symbology manager |
//! | [`SYMBOLS`] | `SymbolContainer` | symbology manager |
//! | [`DEF_FILE_ROOT_KEY`] | `DefFileGroup` | definitions |

pub use plugin_system::DEF_FILE_ROOT_KEY;

pub const PACKET_ROUTER: &str = "cigi.router";
pub const LINK_STATUS: &str = "cigi.link_status";
/// Every live entity by id, children included
pub const ENTITIES: &str = "scene.entities";
pub const VIEWS: &str = "scene.views";
/// Every live symbol surface by id, whatever it is attached to
pub const SURFACES: &str = "scene.surfaces";
/// Every live symbol by id, including symbols not yet placed on a surface
pub const SYMBOLS: &str = "scene.symbols";
