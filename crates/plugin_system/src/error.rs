//! Error types for the plugin system.

use crate::state::PluginState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("Plugin already exists: {0}")]
    PluginAlreadyExists(String),

    #[error("Plugin {plugin} depends on {dependency}, which is not registered")]
    MissingDependency { plugin: String, dependency: String },

    #[error("Plugin dependency cycle between: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Blackboard key {0} was already posted")]
    DuplicateBlackboardKey(String),

    #[error("Blackboard key not found: {0}")]
    MissingBlackboardKey(String),

    #[error("Blackboard key {key} does not hold a {expected}")]
    BlackboardTypeMismatch { key: String, expected: &'static str },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Definition file error: {0}")]
    Definition(String),

    #[error("Plugin {plugin} failed in {state}: {message}")]
    Execution {
        plugin: String,
        state: PluginState,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, PluginError>;
