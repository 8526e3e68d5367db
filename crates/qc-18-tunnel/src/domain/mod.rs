//! # Domain Module
//!
//! Core domain types for the Tunnel subsystem.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod keys;
pub mod route;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use route::*;
pub use value_objects::*;
