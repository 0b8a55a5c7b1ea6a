//! Records: named transformers owning one delegate per output field.
//!
//! A [`Record`] is the usual owner of [`FieldMapperDelegate`]s. It declares
//! its fields up front and, when transformed at a level, emits an object
//! holding only the fields that level may see.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use visor::{Level, Record};
//!
//! let mut user = Record::new("user");
//! user.field("name").always().passthrough();
//! user.field("email").restrict_to("private").unwrap().passthrough();
//!
//! let source = json!({ "name": "Ada", "email": "ada@example.com" });
//! let public = tokio_test::block_on(user.serialize(&Level::from("public"), &source)).unwrap();
//! assert_eq!(public, json!({ "name": "Ada" }));
//! ```
//!
//! Records referencing each other (a user's friends are users) can resolve
//! through a shared [`Registry`] instead of holding each other directly.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::debug;

use crate::delegate::FieldMapperDelegate;
use crate::error::Result;
use crate::mapper::{BoxFuture, TransformerRef};
use crate::permission::{Level, Ranking};

/// Something that turns a whole source instance into its output at a level.
///
/// Sub-transform mappers delegate nested values to a `Transform`.
pub trait Transform: Send + Sync {
    /// Name for identification, registry lookup and logging.
    fn name(&self) -> &str;

    /// Produce the output for `instance` as seen at `level`.
    fn transform<'a>(
        &'a self,
        level: &'a Level,
        instance: &'a Value,
    ) -> BoxFuture<'a, Result<Value>>;
}

/// A named set of output fields, each governed by its own delegate.
#[derive(Debug)]
pub struct Record {
    name: String,
    ranking: Option<Ranking>,
    fields: Vec<(String, FieldMapperDelegate)>,
}

impl Record {
    /// Create a record whose fields use the canonical ranking.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ranking: None,
            fields: Vec::new(),
        }
    }

    /// Create a record whose fields use `ranking`.
    pub fn with_ranking(name: impl Into<String>, ranking: Ranking) -> Self {
        Self {
            name: name.into(),
            ranking: Some(ranking),
            fields: Vec::new(),
        }
    }

    /// Declare an output field read from the source key of the same name.
    pub fn field(&mut self, name: &str) -> &mut FieldMapperDelegate {
        self.renamed(name, name)
    }

    /// Declare an output field read from a differently named source key.
    ///
    /// Redeclaring an output name replaces its previous rules.
    pub fn renamed(&mut self, name: &str, source_key: &str) -> &mut FieldMapperDelegate {
        let delegate = match &self.ranking {
            Some(ranking) => FieldMapperDelegate::with_ranking(source_key, ranking.clone()),
            None => FieldMapperDelegate::new(source_key),
        };
        let index = match self.fields.iter().position(|(field, _)| field == name) {
            Some(index) => {
                self.fields[index].1 = delegate;
                index
            }
            None => {
                self.fields.push((name.to_string(), delegate));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }

    /// Declare a collection field. Sub-transforms map each element.
    pub fn list_field(&mut self, name: &str) -> &mut FieldMapperDelegate {
        self.field(name).mark_as_list()
    }

    pub fn get(&self, name: &str) -> Option<&FieldMapperDelegate> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, delegate)| delegate)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Transform `instance` at `level`, omitting denied fields.
    ///
    /// Fields are emitted in declaration order. The first mapper failure
    /// aborts the whole record.
    pub async fn serialize(&self, level: &Level, instance: &Value) -> Result<Value> {
        let mut out = Map::new();
        for (name, delegate) in &self.fields {
            if let Some(value) = delegate.transform(level, instance).await? {
                out.insert(name.clone(), value);
            }
        }
        Ok(Value::Object(out))
    }
}

impl Transform for Record {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform<'a>(
        &'a self,
        level: &'a Level,
        instance: &'a Value,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(self.serialize(level, instance))
    }
}

/// Transformers addressable by name.
#[derive(Default)]
pub struct Registry {
    transformers: RwLock<HashMap<String, Arc<dyn Transform>>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `transformer` under its name, returning any transformer it replaces.
    pub fn register(&self, transformer: Arc<dyn Transform>) -> Option<Arc<dyn Transform>> {
        let name = transformer.name().to_string();
        debug!(transformer = %name, "Registered transformer");
        self.transformers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name, transformer)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.transformers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    /// A reference resolved by name when the field is mapped.
    ///
    /// The reference holds the registry weakly, so records registered here
    /// can point at each other without leaking.
    pub fn keyed(self: &Arc<Self>, name: impl Into<String>) -> TransformerRef {
        TransformerRef::Keyed {
            key: name.into(),
            registry: Arc::downgrade(self),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transformers = self
            .transformers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<&str> = transformers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("names", &names).finish()
    }
}
