//! # Application Layer
//!
//! The tunnel keeper and the services built on it.

pub mod context;
pub mod dispatcher;
pub mod keeper;
pub mod ledger;
pub mod packet;
pub mod registry;
pub mod service;

pub use context::{apply_if_no_error, BlockInfo, Context};
pub use dispatcher::timeout_timestamp;
pub use keeper::{Collaborators, TunnelFilter, TunnelKeeper};
pub use packet::BatchSummary;
