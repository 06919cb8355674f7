//! The contract every plugin implements.

use crate::error::Result;
use crate::state::{PluginState, StateContext};

/// A unit of image generator behavior driven by the
/// [`PluginManager`](crate::PluginManager).
///
/// `act` is called once per state per tick, after every plugin named in
/// [`Plugin::dependencies`] has acted in the same state. It must not block.
pub trait Plugin {
    /// Returns the plugin name.
    ///
    /// Must be unique among all registered plugins; dependencies refer to it.
    fn name(&self) -> &str;

    /// Returns the plugin version string.
    fn version(&self) -> &str;

    /// Names of plugins that must act before this one.
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    /// Performs this plugin's work for `state`.
    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()>;
}

/// Plugin metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<String>,
}

impl PluginMetadata {
    pub fn of(plugin: &dyn Plugin) -> Self {
        Self {
            name: plugin.name().to_string(),
            version: plugin.version().to_string(),
            dependencies: plugin
                .dependencies()
                .iter()
                .map(|dependency| dependency.to_string())
                .collect(),
        }
    }
}
