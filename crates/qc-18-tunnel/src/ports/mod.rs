//! # Ports
//!
//! Hexagonal architecture port definitions.

pub mod inbound;
pub mod outbound;
pub mod store;

pub use inbound::*;
pub use outbound::*;
pub use store::KvStore;
