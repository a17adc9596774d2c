//! Collaborator implementations

pub mod memory;

pub use memory::{ConnectorRegistry, InMemoryProfileStorage};
