//! Lifecycle states and the per-frame context handed to plugins.

use crate::blackboard::Blackboard;
use serde::{Deserialize, Serialize};
use std::fmt;

/// States every plugin is driven through, in this order.
///
/// `Operate` and `Debug` repeat once per frame until a quit is requested;
/// every other state lasts exactly one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PluginState {
    /// Publish shared objects on the blackboard
    BlackboardPost,
    /// Look up collaborators posted by other plugins
    BlackboardRetrieve,
    LoadConfiguration,
    Initialize,
    Operate,
    Debug,
    Shutdown,
    Exit,
}

impl PluginState {
    /// States whose failures abort startup.
    pub fn is_startup(self) -> bool {
        matches!(
            self,
            PluginState::BlackboardPost
                | PluginState::BlackboardRetrieve
                | PluginState::LoadConfiguration
                | PluginState::Initialize
        )
    }

    /// The per-frame states.
    pub fn is_running(self) -> bool {
        matches!(self, PluginState::Operate | PluginState::Debug)
    }

    pub fn name(self) -> &'static str {
        match self {
            PluginState::BlackboardPost => "BlackboardPost",
            PluginState::BlackboardRetrieve => "BlackboardRetrieve",
            PluginState::LoadConfiguration => "LoadConfiguration",
            PluginState::Initialize => "Initialize",
            PluginState::Operate => "Operate",
            PluginState::Debug => "Debug",
            PluginState::Shutdown => "Shutdown",
            PluginState::Exit => "Exit",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a plugin sees besides its own state during `act`.
///
/// Requests (quit, debug toggle) are only read by the manager after every
/// plugin has run for the frame.
#[derive(Debug, Default)]
pub struct StateContext {
    frame: u64,
    delta_time: f64,
    simulation_time: f64,
    quit_requested: bool,
    debug_toggle_requested: bool,
    blackboard: Blackboard,
}

impl StateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks completed before the current one.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds since the previous tick.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Seconds accumulated over all ticks.
    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Asks the manager to switch between `Operate` and `Debug` after this
    /// frame. Repeated requests within one frame collapse into one.
    pub fn request_debug_toggle(&mut self) {
        self.debug_toggle_requested = true;
    }

    pub fn debug_toggle_requested(&self) -> bool {
        self.debug_toggle_requested
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub(crate) fn begin_tick(&mut self, delta_time: f64) {
        let delta_time = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.delta_time = delta_time;
        self.simulation_time += delta_time;
    }

    pub(crate) fn end_tick(&mut self) {
        self.frame += 1;
    }

    pub(crate) fn take_debug_toggle(&mut self) -> bool {
        std::mem::take(&mut self.debug_toggle_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_classes() {
        assert!(PluginState::BlackboardPost.is_startup());
        assert!(PluginState::Initialize.is_startup());
        assert!(!PluginState::Operate.is_startup());
        assert!(PluginState::Debug.is_running());
        assert!(!PluginState::Shutdown.is_running());
        assert!(PluginState::BlackboardPost < PluginState::BlackboardRetrieve);
        assert_eq!(PluginState::LoadConfiguration.to_string(), "LoadConfiguration");
    }

    #[test]
    fn tick_bookkeeping() {
        let mut context = StateContext::new();
        context.begin_tick(0.5);
        context.end_tick();
        context.begin_tick(-1.0);
        context.end_tick();
        assert_eq!(context.frame(), 2);
        assert_eq!(context.delta_time(), 0.0);
        assert_eq!(context.simulation_time(), 0.5);

        context.request_debug_toggle();
        context.request_debug_toggle();
        assert!(context.take_debug_toggle());
        assert!(!context.debug_toggle_requested());
    }
}
