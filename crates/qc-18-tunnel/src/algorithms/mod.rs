//! # Algorithms
//!
//! Pure functions: trigger evaluation, address derivation and wire encodings.

pub mod abi;
pub mod account;
pub mod deviation;
pub mod memo;

pub use abi::{encode_packet, signal_id_to_bytes32, RelayPrice, TunnelPacket};
pub use account::derive_fee_payer;
pub use deviation::{deviation_bps, generate_new_prices};
