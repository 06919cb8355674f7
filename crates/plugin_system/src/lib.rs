//! # Plugin System
//!
//! Frame-stepped lifecycle for the image generator's plugins.
//!
//! ## Core Features
//!
//! - **Lifecycle States**: every plugin acts once per [`PluginState`] per
//!   tick, from blackboard setup through `Operate` to `Exit`
//! - **Dependency Ordering**: plugins run after the plugins they name in
//!   [`Plugin::dependencies`]; missing or circular dependencies fail startup
//! - **Blackboard**: plugins publish shared objects by name and look up their
//!   collaborators' objects in a separate state
//! - **Definition Trees**: [`DefFileGroup`] exposes static TOML configuration
//!   through typed accessors
//!
//! Everything runs on the frame thread; plugins share state through `Rc`.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use plugin_system::{Plugin, PluginManager, PluginState, Result, StateContext};
//!
//! struct Clock;
//!
//! impl Plugin for Clock {
//!     fn name(&self) -> &str { "clock" }
//!     fn version(&self) -> &str { "1.0.0" }
//!
//!     fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
//!         if state == PluginState::Operate && context.simulation_time() > 1.0 {
//!             context.request_quit();
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut manager = PluginManager::new();
//! manager.register(Box::new(Clock)).unwrap();
//! while manager.tick(0.5).unwrap() != PluginState::Exit {}
//! ```

pub mod blackboard;
pub mod def_file;
pub mod error;
pub mod manager;
pub mod plugin;
pub mod state;

pub use blackboard::Blackboard;
pub use def_file::{DefAttribute, DefFileGroup, DEF_FILE_ROOT_KEY};
pub use error::{PluginError, Result};
pub use manager::PluginManager;
pub use plugin::{Plugin, PluginMetadata};
pub use state::{PluginState, StateContext};
