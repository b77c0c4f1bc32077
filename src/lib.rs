//! TRACKCFG - hierarchical track configuration engine
//!
//! Re-exports all modules for use by binary targets.

// Core engine (registry, inheritance, submission, events)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod markup;

// Re-export commonly used types from core
pub use core::dispatcher::{DispatchOutcome, Dispatcher, PageEvent};
pub use core::page_state::PageConfigState;
pub use core::submit::SubmitPayload;

// Re-export entities
pub use entities::{ConfigError, Control, ControlKind, ControlValue, PageLayout, Visibility};
