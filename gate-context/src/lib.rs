//! Launch payloads and the field-path resolver that reads them.
//!
//! A [`LaunchContext`] is the immutable JSON document describing one job launch.
//! Rules address it through a [`FieldPath`]; [`resolve`] turns the pair into
//! every matching value, treating absent fields and type mismatches as "no match"
//! rather than errors.

#![warn(missing_docs, clippy::pedantic)]

mod context;
mod error;
mod path;
mod resolver;

pub use context::{LaunchContext, LaunchContextBuilder};
pub use error::{ContextError, ContextResult};
pub use path::{FieldPath, Location, PathSegment, Step};
pub use resolver::{ResolvedValue, resolve, resolve_value};
