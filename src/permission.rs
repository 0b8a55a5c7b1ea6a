//! Permission levels and their trust ranking.
//!
//! Levels are opaque tokens. The only thing visor knows about them is their
//! position in a [`Ranking`]: index 0 is the least trusted caller class.
//!
//! # Example
//!
//! ```
//! use visor::Ranking;
//!
//! let ranking = Ranking::new(["low", "medium", "high"]).unwrap();
//! assert_eq!(ranking.index_of("medium"), Some(1));
//! assert!(ranking.index_of("root").is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque permission level token.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(Arc<str>);

impl Level {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self(Arc::from(token.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token with its first character upper-cased, as used in accessor names.
    pub fn accessor_suffix(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Level {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Level {
    fn from(token: String) -> Self {
        Self(Arc::from(token))
    }
}

impl From<&Level> for Level {
    fn from(level: &Level) -> Self {
        level.clone()
    }
}

impl AsRef<str> for Level {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Level::from)
    }
}

/// Tokens of the canonical ranking (public < private).
pub mod level {
    /// Anyone, including unauthenticated callers.
    pub const PUBLIC: &str = "public";

    /// The owner of the record, or a caller acting with the owner's rights.
    pub const PRIVATE: &str = "private";

    /// The canonical ranking, lowest trust first.
    pub const CANONICAL: [&str; 2] = [PUBLIC, PRIVATE];
}

/// Ordered, duplicate-free sequence of permission levels, lowest trust first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranking {
    levels: Vec<Level>,
}

impl Ranking {
    /// Build a ranking from tokens ordered lowest trust first.
    ///
    /// Fails on an empty sequence or a repeated token.
    pub fn new<I, T>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Level>,
    {
        let mut levels: Vec<Level> = Vec::new();
        for token in tokens {
            let level = token.into();
            if levels.contains(&level) {
                return Err(Error::DuplicatePermissionLevel {
                    level: level.to_string(),
                });
            }
            levels.push(level);
        }
        if levels.is_empty() {
            return Err(Error::EmptyRanking);
        }
        Ok(Self { levels })
    }

    /// Position of `level`, if it belongs to this ranking.
    pub fn index_of(&self, level: impl AsRef<str>) -> Option<usize> {
        let level = level.as_ref();
        self.levels.iter().position(|l| l.as_str() == level)
    }

    /// Position of `level`, failing with `UnknownPermissionLevel` if absent.
    pub fn require_index(&self, level: impl AsRef<str>) -> Result<usize> {
        let level = level.as_ref();
        self.index_of(level).ok_or_else(|| Error::unknown_level(level))
    }

    pub fn contains(&self, level: impl AsRef<str>) -> bool {
        self.index_of(level).is_some()
    }

    /// Least trusted level. Rankings are never empty.
    pub fn first(&self) -> &Level {
        &self.levels[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Level> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_canonical(&self) -> bool {
        self.levels
            .iter()
            .map(Level::as_str)
            .eq(level::CANONICAL.iter().copied())
    }
}

impl Default for Ranking {
    fn default() -> Self {
        Self {
            levels: level::CANONICAL.iter().map(|t| Level::new(t)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a Level;
    type IntoIter = std::slice::Iter<'a, Level>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

impl Serialize for Ranking {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(&self.levels)
    }
}

impl<'de> Deserialize<'de> for Ranking {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tokens = Vec::<String>::deserialize(deserializer)?;
        Ranking::new(tokens).map_err(serde::de::Error::custom)
    }
}
