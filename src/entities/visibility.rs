//! Track visibility levels.
//!
//! Ordinal order matters: the limiter takes the minimum of composite and view
//! levels, so `Hide < Dense < Squish < Pack < Full`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Hide = 0,
    Dense = 1,
    Squish = 2,
    Pack = 3,
    Full = 4,
}

impl Visibility {
    pub const ALL: [Visibility; 5] = [
        Visibility::Hide,
        Visibility::Dense,
        Visibility::Squish,
        Visibility::Pack,
        Visibility::Full,
    ];

    /// Ordinal as used by the visibility select (option index).
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Level for an option index. Out-of-range indices clamp to `Full`.
    pub fn from_ordinal(ix: u8) -> Self {
        Self::ALL
            .get(ix as usize)
            .copied()
            .unwrap_or(Visibility::Full)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Hide => "hide",
            Visibility::Dense => "dense",
            Visibility::Squish => "squish",
            Visibility::Pack => "pack",
            Visibility::Full => "full",
        }
    }

    pub fn is_hidden(self) -> bool {
        self == Visibility::Hide
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ConfigError;

    /// Accepts level names (case-insensitive) or option indices ("0".."4").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(ix) = s.parse::<u8>() {
            if (ix as usize) < Self::ALL.len() {
                return Ok(Self::from_ordinal(ix));
            }
        }
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "visibility".to_string(),
                value: s.to_string(),
            })
    }
}
