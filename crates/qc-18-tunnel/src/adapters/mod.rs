//! # Adapters
//!
//! In-memory implementations of the outbound ports and the store.

pub mod bank;
pub mod feeds;
pub mod memory_store;
pub mod transport;
pub mod tss;

pub use bank::{InMemoryAccounts, InMemoryBank};
pub use feeds::InMemoryFeeds;
pub use memory_store::{CacheStore, MemoryStore};
pub use transport::{InMemoryTransport, OutboundPacket};
pub use tss::{InMemoryTss, SigningRecord};
