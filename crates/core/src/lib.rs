//! `console-core`: shared building blocks for the admin console.
//!
//! This crate contains **pure** primitives (no I/O, no runtime): identifiers,
//! the resource kind schema and the error taxonomy.

pub mod entity;
pub mod error;
pub mod id;
pub mod resource;

pub use entity::Entity;
pub use error::{ConsoleError, ConsoleResult};
pub use id::{ItemId, PickerId, ViewId};
pub use resource::ResourceKind;
