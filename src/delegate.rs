//! Per-field, permission-gated mapping rules.
//!
//! A [`FieldMapperDelegate`] owns one field's mapping table: for every level
//! of its ranking, either a mapper or an explicit denial. Rules are declared
//! with short builder chains (a selection followed by one assignment) and
//! resolved later with [`FieldMapperDelegate::transform`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use visor::FieldMapperDelegate;
//!
//! # tokio_test::block_on(async {
//! let mut email = FieldMapperDelegate::new("email");
//! email.restrict_to("private")?.passthrough();
//!
//! let user = json!({ "email": "ada@example.com" });
//! assert_eq!(email.transform("public", &user).await?, None);
//! assert_eq!(
//!     email.transform("private", &user).await?,
//!     Some(json!("ada@example.com"))
//! );
//! # Ok::<(), visor::Error>(())
//! # }).unwrap();
//! ```
//!
//! # Narrowing
//!
//! The selection decides which slots an assignment touches:
//!
//! - `always()` broadcasts the assigned mapper to every level.
//! - `when(level)` writes that level's slot and leaves the others alone.
//! - `at_or_above(level)` denies every lower level and grants the rest.
//! - `restrict_to(level)` grants that level alone and denies every other.
//!
//! Sub-transform assignments write every slot before narrowing runs, so a
//! cutoff or sole restriction can still deny levels they just populated.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::accessor::{self, Accessor, AccessorKind, Accessors};
use crate::error::{Error, Result};
use crate::mapper::{Custom, FieldMapper, Passthrough, SubTransform, TransformerRef};
use crate::permission::{Level, Ranking};

/// One entry of the mapping table.
#[derive(Clone, Debug)]
pub enum Slot {
    Granted(Arc<dyn FieldMapper>),
    /// Access is denied at this level. Transforms resolve to no value.
    Denied,
}

impl Slot {
    pub fn mapper(&self) -> Option<&Arc<dyn FieldMapper>> {
        match self {
            Slot::Granted(mapper) => Some(mapper),
            Slot::Denied => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Slot::Denied)
    }
}

/// The levels a pending assignment targets.
///
/// Produced by the selection calls and consumed by exactly one assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Every level. `anchor` is the ranking's first level.
    All { anchor: Level },
    /// One level's slot, other slots untouched.
    Level(Level),
    /// Levels ranked at or above `index`; lower levels denied.
    AtOrAbove { level: Level, index: usize },
    /// Only the level at `index`; every other level denied.
    Exactly { level: Level, index: usize },
}

impl Selection {
    /// The level the assignment writes to.
    pub fn level(&self) -> &Level {
        match self {
            Selection::All { anchor } => anchor,
            Selection::Level(level)
            | Selection::AtOrAbove { level, .. }
            | Selection::Exactly { level, .. } => level,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Selection::All { .. })
    }

    pub fn cutoff_index(&self) -> Option<usize> {
        match self {
            Selection::AtOrAbove { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn sole_index(&self) -> Option<usize> {
        match self {
            Selection::Exactly { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Mapper(s) produced by an assignment, before narrowing.
enum Assignment {
    /// Written to the selected level's slot.
    Selected(Arc<dyn FieldMapper>),
    /// One shared mapper written to every slot.
    Fixed(Arc<dyn FieldMapper>),
    /// A distinct mapper per ranking index, written to every slot.
    Cascade(Vec<Arc<dyn FieldMapper>>),
}

impl Assignment {
    fn mapper_for(&self, index: usize) -> Arc<dyn FieldMapper> {
        match self {
            Assignment::Selected(mapper) | Assignment::Fixed(mapper) => Arc::clone(mapper),
            Assignment::Cascade(mappers) => Arc::clone(&mappers[index]),
        }
    }

    fn spans_all(&self) -> bool {
        !matches!(self, Assignment::Selected(_))
    }
}

/// Mapping rules for a single field, keyed by permission level.
#[derive(Debug)]
pub struct FieldMapperDelegate {
    source_key: String,
    ranking: Ranking,
    is_default_ranking: bool,
    accessors: Accessors,
    /// Indexed like `ranking`.
    table: Vec<Slot>,
    is_list: bool,
}

impl FieldMapperDelegate {
    /// Create a delegate for `source_key` using the canonical ranking.
    pub fn new(source_key: impl Into<String>) -> Self {
        Self::from_parts(source_key.into(), Ranking::default(), true)
    }

    /// Create a delegate for `source_key` with a custom ranking.
    ///
    /// The canonical accessors (`when_private()` and friends) are unavailable
    /// on the result, even if `ranking` happens to equal the canonical one.
    pub fn with_ranking(source_key: impl Into<String>, ranking: Ranking) -> Self {
        Self::from_parts(source_key.into(), ranking, false)
    }

    fn from_parts(source_key: String, ranking: Ranking, is_default_ranking: bool) -> Self {
        let accessors = Accessors::for_ranking(&ranking);
        let table = vec![Slot::Denied; ranking.len()];
        Self {
            source_key,
            ranking,
            is_default_ranking,
            accessors,
            table,
            is_list: false,
        }
    }

    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn is_default_ranking(&self) -> bool {
        self.is_default_ranking
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    /// Mark the field as a collection. Every mapper invocation receives the flag.
    pub fn mark_as_list(&mut self) -> &mut Self {
        self.is_list = true;
        self
    }

    // Selection

    /// Select every level; the next assignment is broadcast.
    pub fn always(&mut self) -> Selector<'_> {
        let anchor = self.ranking.first().clone();
        self.select(Selection::All { anchor })
    }

    /// Select one level's slot.
    ///
    /// Levels outside the ranking are accepted, but the assignment that
    /// follows writes nothing.
    pub fn when(&mut self, level: impl Into<Level>) -> Selector<'_> {
        let level = level.into();
        if !self.ranking.contains(&level) {
            warn!(
                field = %self.source_key,
                permission = %level,
                "Selected level is not part of the ranking"
            );
        }
        self.select(Selection::Level(level))
    }

    /// Select `level` and every level ranked above it.
    pub fn at_or_above(&mut self, level: impl Into<Level>) -> Result<Selector<'_>> {
        let level = level.into();
        let index = self.ranking.require_index(&level)?;
        Ok(self.select(Selection::AtOrAbove { level, index }))
    }

    /// Select `level` alone.
    pub fn restrict_to(&mut self, level: impl Into<Level>) -> Result<Selector<'_>> {
        let level = level.into();
        let index = self.ranking.require_index(&level)?;
        Ok(self.select(Selection::Exactly { level, index }))
    }

    fn select(&mut self, selection: Selection) -> Selector<'_> {
        Selector {
            delegate: self,
            selection,
        }
    }

    fn dispatch(&mut self, accessor: Accessor) -> Result<Selector<'_>> {
        match accessor.kind {
            AccessorKind::When => Ok(self.when(accessor.level)),
            AccessorKind::RestrictTo => self.restrict_to(accessor.level),
            AccessorKind::AtOrAbove => self.at_or_above(accessor.level),
        }
    }

    // Accessors

    /// Names of the accessors generated from this delegate's ranking.
    pub fn accessor_names(&self) -> impl Iterator<Item = &str> {
        self.accessors.names()
    }

    /// Run a generated accessor such as `whenLow` or `atOrAboveHigh`.
    pub fn accessor(&mut self, name: &str) -> Result<Selector<'_>> {
        let accessor = self
            .accessors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownAccessor(name.to_string()))?;
        self.dispatch(accessor)
    }

    /// Run one of the canonical ranking's accessors.
    ///
    /// Fails with `UnsupportedDefaultAccessor` on a delegate built with a
    /// custom ranking.
    pub fn default_accessor(&mut self, name: &str) -> Result<Selector<'_>> {
        let accessor = accessor::defaults()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownAccessor(name.to_string()))?;
        if !self.is_default_ranking {
            return Err(Error::UnsupportedDefaultAccessor {
                accessor: name.to_string(),
            });
        }
        self.dispatch(accessor)
    }

    pub fn when_public(&mut self) -> Result<Selector<'_>> {
        self.default_accessor("whenPublic")
    }

    pub fn when_private(&mut self) -> Result<Selector<'_>> {
        self.default_accessor("whenPrivate")
    }

    pub fn restrict_to_public(&mut self) -> Result<Selector<'_>> {
        self.default_accessor("restrictToPublic")
    }

    pub fn restrict_to_private(&mut self) -> Result<Selector<'_>> {
        self.default_accessor("restrictToPrivate")
    }

    pub fn at_or_above_public(&mut self) -> Result<Selector<'_>> {
        self.default_accessor("atOrAbovePublic")
    }

    pub fn at_or_above_private(&mut self) -> Result<Selector<'_>> {
        self.default_accessor("atOrAbovePrivate")
    }

    // Table

    /// The slot for `level`, or `None` if the level is not ranked.
    pub fn slot(&self, level: impl AsRef<str>) -> Option<&Slot> {
        self.ranking
            .index_of(level)
            .map(|index| &self.table[index])
    }

    /// The mapper granted at `level`, if any.
    pub fn mapper(&self, level: impl AsRef<str>) -> Option<&Arc<dyn FieldMapper>> {
        self.slot(level).and_then(Slot::mapper)
    }

    /// Levels currently granted a mapper, in ranking order.
    pub fn granted_levels(&self) -> Vec<&Level> {
        self.ranking
            .iter()
            .zip(&self.table)
            .filter(|(_, slot)| !slot.is_denied())
            .map(|(level, _)| level)
            .collect()
    }

    fn apply(&mut self, selection: Selection, assignment: Assignment) {
        if assignment.spans_all() {
            for (index, slot) in self.table.iter_mut().enumerate() {
                *slot = Slot::Granted(assignment.mapper_for(index));
            }
        } else if let Some(index) = self.ranking.index_of(selection.level()) {
            self.table[index] = Slot::Granted(assignment.mapper_for(index));
        }

        // Broadcast, then cutoff, then sole restriction; later rules win.
        let broadcast = selection.is_broadcast();
        let cutoff = selection.cutoff_index();
        let sole = selection.sole_index();
        for (index, slot) in self.table.iter_mut().enumerate() {
            if broadcast {
                *slot = Slot::Granted(assignment.mapper_for(index));
            }
            if let Some(cutoff) = cutoff {
                *slot = if index < cutoff {
                    Slot::Denied
                } else {
                    Slot::Granted(assignment.mapper_for(index))
                };
            }
            if let Some(sole) = sole {
                *slot = if index == sole {
                    Slot::Granted(assignment.mapper_for(index))
                } else {
                    Slot::Denied
                };
            }
        }

        debug!(
            field = %self.source_key,
            selection = ?selection,
            granted = ?self.granted_levels(),
            "Assigned field mapper"
        );
    }

    // Resolution

    /// Map this field of `instance` for a caller at `level`.
    ///
    /// Resolves to `None` when the level is denied or not ranked. Mapper
    /// failures are returned unchanged.
    pub async fn transform(
        &self,
        level: impl AsRef<str>,
        instance: &Value,
    ) -> Result<Option<Value>> {
        let level = level.as_ref();
        let Some(mapper) = self.mapper(level) else {
            trace!(field = %self.source_key, permission = level, "Field denied");
            return Ok(None);
        };
        trace!(
            field = %self.source_key,
            permission = level,
            kind = ?mapper.kind(),
            "Mapping field"
        );
        let value = mapper.map(instance, &self.source_key, self.is_list).await?;
        Ok(Some(value))
    }
}

/// A pending selection on a delegate, waiting for its assignment.
///
/// Each assignment consumes the selector and returns the delegate, so a
/// selection never outlives its chain.
#[must_use = "a selection does nothing until a mapper is assigned"]
pub struct Selector<'d> {
    delegate: &'d mut FieldMapperDelegate,
    selection: Selection,
}

impl<'d> Selector<'d> {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Copy the raw field value.
    pub fn passthrough(self) -> &'d mut FieldMapperDelegate {
        self.assign(Arc::new(Passthrough))
    }

    /// Compute the value with `build(instance, source_key, is_list)`.
    pub fn build<F>(self, build: F) -> &'d mut FieldMapperDelegate
    where
        F: Fn(&Value, &str, bool) -> Result<Value> + Send + Sync + 'static,
    {
        self.assign(Arc::new(Custom::new(build)))
    }

    /// Assign a caller-defined mapper.
    pub fn assign(self, mapper: Arc<dyn FieldMapper>) -> &'d mut FieldMapperDelegate {
        self.delegate
            .apply(self.selection, Assignment::Selected(mapper));
        self.delegate
    }

    /// Transform the nested value at the caller's own level.
    ///
    /// Every level receives its own sub-transform bound to that level.
    pub fn sub_transform(self, target: impl Into<TransformerRef>) -> &'d mut FieldMapperDelegate {
        let target = target.into();
        let mappers = self
            .delegate
            .ranking
            .iter()
            .map(|level| {
                Arc::new(SubTransform::new(target.clone(), level.clone())) as Arc<dyn FieldMapper>
            })
            .collect();
        self.delegate.apply(self.selection, Assignment::Cascade(mappers));
        self.delegate
    }

    /// Transform the nested value at a fixed `level`, whatever the caller's level.
    ///
    /// Every level shares one sub-transform bound to `level`.
    pub fn sub_transform_at(
        self,
        target: impl Into<TransformerRef>,
        level: impl Into<Level>,
    ) -> Result<&'d mut FieldMapperDelegate> {
        let level = level.into();
        self.delegate.ranking.require_index(&level)?;
        let mapper: Arc<dyn FieldMapper> = Arc::new(SubTransform::new(target.into(), level));
        self.delegate.apply(self.selection, Assignment::Fixed(mapper));
        Ok(self.delegate)
    }
}
