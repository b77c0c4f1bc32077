use std::fmt;

/// Errors raised by the configuration engine.
///
/// None of these are fatal to a page: callers log them and carry on with the
/// control treated as unrelated or unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Name does not fit the composite/view/subtrack grammar
    Resolution {
        name: String,
        reason: String,
    },
    /// No materialized control carries this name
    UnknownControl(String),
    /// Subtrack id is not part of the page
    UnknownSubtrack(String),
    /// Value cannot be stored in a control of this kind
    KindMismatch {
        name: String,
        kind: &'static str,
    },
    /// Value text cannot be interpreted
    InvalidValue {
        name: String,
        value: String,
    },
    /// Page layout is inconsistent (duplicate view, missing composite, ...)
    Layout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Resolution { name, reason } => {
                write!(f, "Can't resolve control '{}': {}", name, reason)
            }
            ConfigError::UnknownControl(name) => write!(f, "Unknown control: {}", name),
            ConfigError::UnknownSubtrack(id) => write!(f, "Unknown subtrack: {}", id),
            ConfigError::KindMismatch { name, kind } => {
                write!(f, "Control '{}' is a {} and can't take that value", name, kind)
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "Invalid value for '{}': \"{}\"", name, value)
            }
            ConfigError::Layout(msg) => write!(f, "Page layout error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
