//! Publishes the definition tree for the other plugins.

use plugin_system::{DefFileGroup, Plugin, PluginState, Result, StateContext, DEF_FILE_ROOT_KEY};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

enum Source {
    File(PathBuf),
    Loaded(DefFileGroup),
}

/// Loads the definition tree and posts it under [`DEF_FILE_ROOT_KEY`].
///
/// A missing or malformed file fails `BlackboardPost`, which stops startup.
pub struct DefinitionsPlugin {
    source: Option<Source>,
}

impl DefinitionsPlugin {
    /// Reads the tree from a TOML file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(Source::File(path.into())),
        }
    }

    /// Uses an already built tree.
    pub fn from_group(root: DefFileGroup) -> Self {
        Self {
            source: Some(Source::Loaded(root)),
        }
    }

    /// An empty tree; every manager falls back to its defaults.
    pub fn empty() -> Self {
        Self::from_group(DefFileGroup::new("root"))
    }
}

impl Plugin for DefinitionsPlugin {
    fn name(&self) -> &str {
        "definitions"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
        if state != PluginState::BlackboardPost {
            return Ok(());
        }
        let root = match self.source.take() {
            Some(Source::File(path)) => {
                info!("📖 Loading definitions from {}", path.display());
                DefFileGroup::load(&path)?
            }
            Some(Source::Loaded(root)) => root,
            None => return Ok(()),
        };
        context.blackboard_mut().post(DEF_FILE_ROOT_KEY, Rc::new(root))
    }
}
