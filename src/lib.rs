//! Visor - Permission-gated, per-field serialization rules.
//!
//! Visor decides, field by field, what each caller class gets to see when a
//! source object is turned into its output representation:
//!
//! - **Permission**: Opaque levels ordered by trust (`public < private` by default)
//! - **Delegate**: One field's mapping table, declared with fluent builder chains
//! - **Accessor**: Named shortcuts (`whenPrivate`, `atOrAboveHigh`) generated per ranking
//! - **Mapper**: Pass-through, custom builder, and nested sub-transform strategies
//! - **Record**: Named transformers owning a delegate per field, plus a registry
//! - **Config**: Layered ranking configuration (file → env → CLI)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use visor::{Level, Record};
//!
//! # tokio_test::block_on(async {
//! let mut user = Record::new("user");
//! user.field("name").always().passthrough();
//! user.field("email").restrict_to_private()?.passthrough();
//! let user = Arc::new(user);
//!
//! let mut post = Record::new("post");
//! post.field("title").always().passthrough();
//! // Whoever reads the post sees the author at their own level.
//! post.field("author").always().sub_transform(user.clone() as Arc<dyn visor::Transform>);
//!
//! let source = json!({
//!     "title": "Hello",
//!     "author": { "name": "Ada", "email": "ada@example.com" }
//! });
//! let out = post.serialize(&Level::from("public"), &source).await?;
//! assert_eq!(out, json!({ "title": "Hello", "author": { "name": "Ada" } }));
//! # Ok::<(), visor::Error>(())
//! # }).unwrap();
//! ```

pub mod accessor;
pub mod config;
pub mod delegate;
pub mod error;
pub mod mapper;
pub mod permission;
pub mod record;

// Re-export main types at crate root
pub use accessor::{Accessor, AccessorKind, Accessors};
pub use config::{Config, Loader};
pub use delegate::{FieldMapperDelegate, Selection, Selector, Slot};
pub use error::{Error, Result};
pub use mapper::{
    BoxFuture, Custom, FieldMapper, MapperKind, Passthrough, SubTransform, TransformerRef,
};
pub use permission::{Level, Ranking, level};
pub use record::{Record, Registry, Transform};

// Re-export commonly used dependencies for convenience
pub use serde_json::{Value, json};
