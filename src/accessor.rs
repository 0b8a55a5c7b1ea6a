//! Named selection shortcuts generated from a ranking.
//!
//! Every level in a ranking yields three accessors, named by prefixing the
//! capitalized token: `when<Level>`, `restrictTo<Level>` and `atOrAbove<Level>`.
//! A ranking of `["low", "high"]` produces `whenLow`, `restrictToLow`,
//! `atOrAboveLow`, `whenHigh`, `restrictToHigh` and `atOrAboveHigh`.
//!
//! The canonical ranking's table is built once and shared; delegates consult
//! it through [`FieldMapperDelegate::default_accessor`](crate::FieldMapperDelegate::default_accessor),
//! which refuses to dispatch on a delegate with a custom ranking.

use std::sync::OnceLock;

use crate::permission::{Level, Ranking};

/// Which selection an accessor performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessorKind {
    /// Target one level, leaving the others untouched.
    When,
    /// Grant one level and deny every other.
    RestrictTo,
    /// Grant a level and everything ranked above it.
    AtOrAbove,
}

impl AccessorKind {
    pub const ALL: [AccessorKind; 3] = [
        AccessorKind::When,
        AccessorKind::RestrictTo,
        AccessorKind::AtOrAbove,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            AccessorKind::When => "when",
            AccessorKind::RestrictTo => "restrictTo",
            AccessorKind::AtOrAbove => "atOrAbove",
        }
    }

    /// Accessor name for `level`, e.g. `restrictToPrivate`.
    pub fn name_for(self, level: &Level) -> String {
        format!("{}{}", self.prefix(), level.accessor_suffix())
    }
}

/// A resolved accessor: the selection to perform and its level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accessor {
    pub kind: AccessorKind,
    pub level: Level,
}

/// Accessor table for one ranking, in ranking order.
#[derive(Clone, Debug, Default)]
pub struct Accessors {
    entries: Vec<(String, Accessor)>,
}

impl Accessors {
    pub fn for_ranking(ranking: &Ranking) -> Self {
        let entries = ranking
            .iter()
            .flat_map(|level| {
                AccessorKind::ALL.into_iter().map(move |kind| {
                    let accessor = Accessor {
                        kind,
                        level: level.clone(),
                    };
                    (kind.name_for(level), accessor)
                })
            })
            .collect();
        Self { entries }
    }

    /// Look up an accessor by its generated name.
    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, accessor)| accessor)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accessors for the canonical ranking, built on first use.
pub fn defaults() -> &'static Accessors {
    static DEFAULTS: OnceLock<Accessors> = OnceLock::new();
    DEFAULTS.get_or_init(|| Accessors::for_ranking(&Ranking::default()))
}
