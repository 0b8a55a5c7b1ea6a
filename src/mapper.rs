//! Field mappers: the strategies a delegate assigns to permission levels.
//!
//! Every mapper exposes one asynchronous operation, [`FieldMapper::map`],
//! which reads a field from a source instance and produces its output value.
//! The delegate never looks inside a mapper beyond that call and
//! [`FieldMapper::kind`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::permission::Level;
use crate::record::{Registry, Transform};

/// Boxed future for async mapping.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Caller-supplied builder used by [`Custom`].
///
/// Receives the source instance, the field's source key, and the list flag.
pub type BuildFn = dyn Fn(&Value, &str, bool) -> Result<Value> + Send + Sync;

/// What a mapper does, for introspection and logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapperKind {
    Passthrough,
    Custom,
    /// Transforms the nested value at a fixed level.
    SubTransform { level: Level },
}

/// A strategy converting one field of a source instance into an output value.
pub trait FieldMapper: Send + Sync {
    /// Map `instance[source_key]` into its output value.
    fn map<'a>(
        &'a self,
        instance: &'a Value,
        source_key: &'a str,
        is_list: bool,
    ) -> BoxFuture<'a, Result<Value>>;

    fn kind(&self) -> MapperKind;
}

impl fmt::Debug for dyn FieldMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldMapper({:?})", self.kind())
    }
}

/// Copies the raw field value. Missing fields map to `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl FieldMapper for Passthrough {
    fn map<'a>(
        &'a self,
        instance: &'a Value,
        source_key: &'a str,
        _is_list: bool,
    ) -> BoxFuture<'a, Result<Value>> {
        let value = instance.get(source_key).cloned().unwrap_or(Value::Null);
        Box::pin(std::future::ready(Ok(value)))
    }

    fn kind(&self) -> MapperKind {
        MapperKind::Passthrough
    }
}

/// Applies a caller-supplied builder function.
#[derive(Clone)]
pub struct Custom {
    build: Arc<BuildFn>,
}

impl Custom {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Value, &str, bool) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
        }
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").finish_non_exhaustive()
    }
}

impl FieldMapper for Custom {
    fn map<'a>(
        &'a self,
        instance: &'a Value,
        source_key: &'a str,
        is_list: bool,
    ) -> BoxFuture<'a, Result<Value>> {
        let result = (self.build)(instance, source_key, is_list);
        Box::pin(std::future::ready(result))
    }

    fn kind(&self) -> MapperKind {
        MapperKind::Custom
    }
}

/// Lazily produces a transformer, allowing references to records declared later.
pub type Provider = dyn Fn() -> Arc<dyn Transform> + Send + Sync;

/// How a sub-transform finds its child transformer.
#[derive(Clone)]
pub enum TransformerRef {
    Direct(Arc<dyn Transform>),
    /// Looked up by name at map time.
    Keyed { key: String, registry: Weak<Registry> },
    Provider(Arc<Provider>),
}

impl TransformerRef {
    pub fn direct(transformer: Arc<dyn Transform>) -> Self {
        Self::Direct(transformer)
    }

    pub fn provider<F>(provide: F) -> Self
    where
        F: Fn() -> Arc<dyn Transform> + Send + Sync + 'static,
    {
        Self::Provider(Arc::new(provide))
    }

    /// Resolve the child transformer.
    pub fn resolve(&self) -> Result<Arc<dyn Transform>> {
        match self {
            Self::Direct(transformer) => Ok(Arc::clone(transformer)),
            Self::Keyed { key, registry } => registry
                .upgrade()
                .ok_or_else(|| Error::RegistryDropped(key.clone()))?
                .get(key)
                .ok_or_else(|| Error::UnknownTransformer(key.clone())),
            Self::Provider(provide) => Ok(provide()),
        }
    }
}

impl fmt::Debug for TransformerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(transformer) => write!(f, "Direct({})", transformer.name()),
            Self::Keyed { key, .. } => write!(f, "Keyed({key})"),
            Self::Provider(_) => f.write_str("Provider"),
        }
    }
}

impl From<Arc<dyn Transform>> for TransformerRef {
    fn from(transformer: Arc<dyn Transform>) -> Self {
        Self::Direct(transformer)
    }
}

/// Transforms a nested instance (or each element of a nested list) with a
/// child transformer at a bound permission level.
#[derive(Debug, Clone)]
pub struct SubTransform {
    target: TransformerRef,
    level: Level,
}

impl SubTransform {
    pub fn new(target: TransformerRef, level: Level) -> Self {
        Self { target, level }
    }
}

impl FieldMapper for SubTransform {
    fn map<'a>(
        &'a self,
        instance: &'a Value,
        source_key: &'a str,
        is_list: bool,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let nested = match instance.get(source_key) {
                None | Some(Value::Null) => return Ok(Value::Null),
                Some(nested) => nested,
            };
            let transformer = self.target.resolve()?;

            if !is_list {
                return transformer.transform(&self.level, nested).await;
            }

            let items = nested.as_array().ok_or_else(|| Error::ExpectedList {
                field: source_key.to_string(),
                found: type_name(nested).to_string(),
            })?;
            let mut mapped = Vec::with_capacity(items.len());
            for item in items {
                mapped.push(transformer.transform(&self.level, item).await?);
            }
            Ok(Value::Array(mapped))
        })
    }

    fn kind(&self) -> MapperKind {
        MapperKind::SubTransform {
            level: self.level.clone(),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
