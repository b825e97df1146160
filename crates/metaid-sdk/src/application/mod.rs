//! # Application Module
//!
//! Session management and orchestration: the connector, the root
//! bootstrap engine, and the per-schema entity facade.

pub mod bootstrap;
pub mod connector;
pub mod entity;

pub use bootstrap::RootBootstrap;
pub use connector::Connector;
pub use entity::{CreateOptions, CreateResult, Entity, NodeParent};
