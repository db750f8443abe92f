//! Host side of the One Workflow sidebar: project discovery, settings
//! persistence, and the launch/automation side effects requested by the UI.

pub mod automation;
pub mod commands;
pub mod config;
pub mod controller;
pub mod dialect;
pub mod error;
#[cfg(unix)]
pub mod ipc;
pub mod keys;
pub mod manifest;
pub mod protocol;
pub mod scanner;
pub mod settings;
pub mod terminal;
pub mod view_state;

pub use error::{Error, Result};
