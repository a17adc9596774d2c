pub mod storage;

pub use storage::{ConnectorRegistry, InMemoryProfileStorage};
