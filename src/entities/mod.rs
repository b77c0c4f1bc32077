//! Entities module - the data the configuration engine works on
//!
//! - Controls (typed form fields with a changed flag and optional shadow)
//! - The name grammar that places a control at composite, view or subtrack tier
//! - Visibility levels
//! - Page layouts describing what a page renders up front

pub mod control;
pub mod error;
pub mod layout;
pub mod name;
pub mod visibility;

pub use control::{Control, ControlId, ControlKind, ControlValue, FieldRole, Shadow};
pub use error::ConfigError;
pub use layout::{ControlSpec, PageLayout, SubtrackSpec};
pub use name::{ControlName, NameScope, Setting, Tier};
pub use visibility::Visibility;
