//! Geography levels
//!
//! Each level is backed by its own storage table. The national level also
//! carries its own metric-id convention, handled by the router.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geography resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// United Kingdom as a whole
    #[serde(rename = "UK")]
    Uk,
    /// Nations and English regions
    #[serde(rename = "ITL1")]
    Itl1,
    /// ITL2 sub-regions
    #[serde(rename = "ITL2")]
    Itl2,
    /// ITL3 sub-regions
    #[serde(rename = "ITL3")]
    Itl3,
    /// Local authority districts
    #[serde(rename = "LAD")]
    Lad,
}

impl Level {
    /// All levels, coarsest first
    pub const ALL: [Level; 5] = [Level::Uk, Level::Itl1, Level::Itl2, Level::Itl3, Level::Lad];

    /// Canonical string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Uk => "UK",
            Level::Itl1 => "ITL1",
            Level::Itl2 => "ITL2",
            Level::Itl3 => "ITL3",
            Level::Lad => "LAD",
        }
    }

    /// Whether this is the national level
    #[inline]
    #[must_use]
    pub fn is_national(&self) -> bool {
        matches!(self, Level::Uk)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UK" => Ok(Level::Uk),
            "ITL1" => Ok(Level::Itl1),
            "ITL2" => Ok(Level::Itl2),
            "ITL3" => Ok(Level::Itl3),
            "LAD" => Ok(Level::Lad),
            _ => Err(CatalogError::UnknownLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parse_is_case_insensitive() {
        assert_eq!("itl2".parse::<Level>().unwrap(), Level::Itl2);
        assert_eq!(" LAD ".parse::<Level>().unwrap(), Level::Lad);
        assert!("ITL4".parse::<Level>().is_err());
    }

    #[test]
    fn level_serde_uses_public_names() {
        let json = serde_json::to_string(&Level::Itl3).unwrap();
        assert_eq!(json, "\"ITL3\"");
        let back: Level = serde_json::from_str("\"UK\"").unwrap();
        assert!(back.is_national());
    }

    #[test]
    fn level_display_roundtrip() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }
}
