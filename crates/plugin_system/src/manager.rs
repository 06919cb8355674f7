//! Plugin manager: dependency ordering and the per-frame state machine.

use crate::error::{PluginError, Result};
use crate::plugin::{Plugin, PluginMetadata};
use crate::state::{PluginState, StateContext};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, info, warn};

/// Drives registered plugins through the lifecycle states.
///
/// The `PluginManager` handles:
/// - Registration and name uniqueness
/// - A dependency order computed once, before the first tick
/// - One state per tick for every plugin, in that order
/// - State transitions from the requests plugins leave in the
///   [`StateContext`]
///
/// Failures in startup states abort the run; failures while operating are
/// logged and the frame continues.
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    order: Option<Vec<usize>>,
    state: PluginState,
    context: StateContext,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            order: None,
            state: PluginState::BlackboardPost,
            context: StateContext::new(),
        }
    }

    /// Adds a plugin. Registration order breaks ties between plugins that do
    /// not depend on each other.
    ///
    /// # Returns
    ///
    /// `PluginError::PluginAlreadyExists` if a plugin with the same name is
    /// registered.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<()> {
        let name = plugin.name().to_string();
        if self.is_registered(&name) {
            return Err(PluginError::PluginAlreadyExists(name));
        }
        info!("🔌 Registered plugin: {} v{}", name, plugin.version());
        self.plugins.push(plugin);
        self.order = None;
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.plugins.iter().any(|plugin| plugin.name() == name)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Names in registration order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|plugin| plugin.name().to_string()).collect()
    }

    pub fn metadata(&self) -> Vec<PluginMetadata> {
        self.plugins
            .iter()
            .map(|plugin| PluginMetadata::of(plugin.as_ref()))
            .collect()
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn context(&self) -> &StateContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut StateContext {
        &mut self.context
    }

    /// Asks for an orderly shutdown at the end of the current frame.
    pub fn request_quit(&mut self) {
        self.context.request_quit();
    }

    /// Plugin names in execution order.
    ///
    /// # Returns
    ///
    /// `PluginError::MissingDependency` if a plugin depends on an unregistered
    /// name, `PluginError::DependencyCycle` if the dependencies are circular.
    pub fn execution_order(&mut self) -> Result<Vec<String>> {
        let order = self.resolve()?.to_vec();
        Ok(order
            .iter()
            .map(|&index| self.plugins[index].name().to_string())
            .collect())
    }

    /// Runs every plugin for the current state, then moves to the next state.
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Seconds since the previous tick
    ///
    /// # Returns
    ///
    /// The state the next tick will run. Once `Exit` is reached further ticks
    /// do nothing.
    pub fn tick(&mut self, delta_time: f64) -> Result<PluginState> {
        let state = self.state;
        if state == PluginState::Exit {
            return Ok(state);
        }
        let order = self.resolve()?.to_vec();

        self.context.begin_tick(delta_time);
        for index in order {
            let plugin = &mut self.plugins[index];
            let Err(e) = plugin.act(state, &mut self.context) else {
                continue;
            };
            if state.is_startup() {
                error!("❌ Plugin {} failed in {}: {}", plugin.name(), state, e);
                return Err(PluginError::Execution {
                    plugin: plugin.name().to_string(),
                    state,
                    message: e.to_string(),
                });
            }
            warn!("⚠️ Plugin {} failed in {}: {}", plugin.name(), state, e);
        }
        self.context.end_tick();

        let next = self.next_state(state);
        if next != state {
            info!("🔄 Plugin state {} -> {}", state, next);
        }
        self.state = next;
        Ok(next)
    }

    fn next_state(&mut self, state: PluginState) -> PluginState {
        match state {
            PluginState::BlackboardPost => PluginState::BlackboardRetrieve,
            PluginState::BlackboardRetrieve => PluginState::LoadConfiguration,
            PluginState::LoadConfiguration => PluginState::Initialize,
            PluginState::Initialize => PluginState::Operate,
            PluginState::Operate | PluginState::Debug => {
                let toggle = self.context.take_debug_toggle();
                if self.context.quit_requested() {
                    PluginState::Shutdown
                } else if toggle && state == PluginState::Operate {
                    PluginState::Debug
                } else if toggle {
                    PluginState::Operate
                } else {
                    state
                }
            }
            PluginState::Shutdown | PluginState::Exit => PluginState::Exit,
        }
    }

    /// Topological order of the plugins (Kahn), computed once per
    /// registration set.
    fn resolve(&mut self) -> Result<&[usize]> {
        if self.order.is_none() {
            let order = dependency_order(&self.plugins)?;
            debug!(
                "Plugin execution order: {:?}",
                order
                    .iter()
                    .map(|&index| self.plugins[index].name())
                    .collect::<Vec<_>>()
            );
            self.order = Some(order);
        }
        Ok(self.order.as_deref().unwrap_or_default())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

fn dependency_order(plugins: &[Box<dyn Plugin>]) -> Result<Vec<usize>> {
    let index_of: HashMap<&str, usize> = plugins
        .iter()
        .enumerate()
        .map(|(index, plugin)| (plugin.name(), index))
        .collect();

    let mut pending = vec![0usize; plugins.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); plugins.len()];
    for (index, plugin) in plugins.iter().enumerate() {
        for dependency in plugin.dependencies() {
            let Some(&required) = index_of.get(dependency) else {
                return Err(PluginError::MissingDependency {
                    plugin: plugin.name().to_string(),
                    dependency: dependency.to_string(),
                });
            };
            pending[index] += 1;
            dependents[required].push(index);
        }
    }

    let mut ready: BTreeSet<usize> = (0..plugins.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(plugins.len());
    while let Some(index) = ready.pop_first() {
        order.push(index);
        for &dependent in &dependents[index] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < plugins.len() {
        let stuck = (0..plugins.len())
            .filter(|&i| pending[i] > 0)
            .map(|i| plugins[i].name().to_string())
            .collect();
        return Err(PluginError::DependencyCycle(stuck));
    }
    Ok(order)
}
