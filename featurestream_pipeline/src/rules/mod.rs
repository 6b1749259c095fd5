//! Configured transformation rules.
//!
//! A [`RuleTable`] maps property paths (exact, glob, or the `*` wildcard) to ordered rule
//! lists. Schema-level rules (rename, remove) are applied once per response by the
//! [`SchemaTransformer`]; value-level rules are applied per emitted value by the
//! [`ValueTransformer`].

mod codelist;
mod rule;
mod schema_transformer;
mod table;
mod value_transformer;

pub use codelist::*;
pub use rule::*;
pub use schema_transformer::*;
pub use table::*;
pub use value_transformer::*;
