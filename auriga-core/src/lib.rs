//! Auriga Core
//!
//! Core library for a declarative infrastructure tool: the resource model,
//! the provider trait that cloud backends implement, attribute schemas for
//! type validation, and the waiter for asynchronous remote operations.

pub mod provider;
pub mod resource;
pub mod schema;
pub mod wait;
