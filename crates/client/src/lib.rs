//! HTTP access to the console REST API.

pub mod record;
pub mod rest;

pub use record::Record;
pub use rest::{RestSource, describe_path};
