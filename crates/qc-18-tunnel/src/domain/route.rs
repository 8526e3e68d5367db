//! # Routes and Receipts
//!
//! A route is the destination-delivery variant of a tunnel. The set is
//! closed: adding a route means extending [`Route`], [`PacketReceipt`] and
//! the dispatcher match together.

use super::errors::{Result, TunnelError};
use super::value_objects::{Coin, Coins};
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::is_nfkc;

/// Maximum length of an Axelar chain name.
pub const AXELAR_CHAIN_NAME_MAX_LEN: usize = 20;

/// Delimiter Axelar forbids inside chain names.
const AXELAR_DELIMITER: char = '_';

/// Port of the token transfer application.
pub const TRANSFER_PORT: &str = "transfer";

/// Port owned by a tunnel for native packet delivery.
pub fn port_id_for_tunnel(tunnel_id: u64) -> String {
    format!("tunnel.{tunnel_id}")
}

/// Synthetic denom minted for hook-route transfers of a tunnel.
pub fn hook_denom(tunnel_id: u64) -> String {
    format!("hook/tunnel-{tunnel_id}")
}

/// Threshold-signature broadcast to a destination contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssRoute {
    /// Destination chain ID.
    pub destination_chain_id: String,
    /// Destination contract address.
    pub destination_contract_address: String,
}

/// Native transport packet over a tunnel-owned channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcRoute {
    /// Channel identifier (`channel-N`).
    pub channel_id: String,
}

/// Transfer carrying a hook coin and a contract-call memo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcHookRoute {
    /// Channel identifier (`channel-N`).
    pub channel_id: String,
    /// Contract invoked by the memo.
    pub destination_contract_address: String,
}

/// Axelar General Message Passing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxelarRoute {
    /// Axelar chain name of the destination.
    pub destination_chain_id: String,
    /// Destination contract address.
    pub destination_contract_address: String,
    /// Relayer fee sent with the transfer.
    pub fee: Coin,
}

/// Router bridge delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterRoute {
    /// Bridge contract receiving the transfer.
    pub bridge_contract_address: String,
    /// Destination chain ID.
    pub destination_chain_id: String,
    /// Destination contract address.
    pub destination_contract_address: String,
    /// Gas limit on the destination chain.
    pub destination_gas_limit: u64,
    /// Gas price on the destination chain.
    pub destination_gas_price: u64,
    /// Relayer fee sent with the transfer.
    pub fee: Coin,
}

/// Hyperlane dispatch through Stride.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperlaneStrideRoute {
    /// Hyperlane destination domain.
    pub dispatch_dest_domain: u64,
    /// Recipient on the destination domain.
    pub dispatch_recipient_addr: String,
    /// Relayer fee sent with the transfer.
    pub fee: Coin,
}

/// Route variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Threshold-signature broadcast.
    Tss(TssRoute),
    /// Native transport packet.
    Ibc(IbcRoute),
    /// Transfer with hook memo.
    IbcHook(IbcHookRoute),
    /// Axelar GMP.
    Axelar(AxelarRoute),
    /// Router bridge.
    Router(RouterRoute),
    /// Hyperlane via Stride.
    HyperlaneStride(HyperlaneStrideRoute),
}

impl Route {
    /// Validate destination data.
    pub fn validate(&self) -> Result<()> {
        match self {
            Route::Tss(r) => {
                require_non_empty("destination chain ID", &r.destination_chain_id)?;
                require_non_empty("destination contract address", &r.destination_contract_address)
            }
            Route::Ibc(r) => validate_channel_id(&r.channel_id),
            Route::IbcHook(r) => {
                validate_channel_id(&r.channel_id)?;
                require_non_empty("destination contract address", &r.destination_contract_address)
            }
            Route::Axelar(r) => {
                validate_axelar_chain_name(&r.destination_chain_id)?;
                require_non_empty("destination contract address", &r.destination_contract_address)?;
                validate_fee(&r.fee)
            }
            Route::Router(r) => {
                require_non_empty("bridge contract address", &r.bridge_contract_address)?;
                require_non_empty("destination chain ID", &r.destination_chain_id)?;
                require_non_empty("destination contract address", &r.destination_contract_address)?;
                if r.destination_gas_limit == 0 {
                    return Err(TunnelError::InvalidRoute("destination gas limit is zero".into()));
                }
                if r.destination_gas_price == 0 {
                    return Err(TunnelError::InvalidRoute("destination gas price is zero".into()));
                }
                validate_fee(&r.fee)
            }
            Route::HyperlaneStride(r) => {
                if r.dispatch_dest_domain == 0 {
                    return Err(TunnelError::InvalidRoute("dispatch destination domain is zero".into()));
                }
                require_non_empty("dispatch recipient address", &r.dispatch_recipient_addr)?;
                validate_fee(&r.fee)
            }
        }
    }

    /// Transport fee carried by the route itself.
    ///
    /// TSS fees come from the signing coordinator's schedule and are
    /// resolved by the dispatcher, so TSS reports none here.
    pub fn fee(&self) -> Coins {
        match self {
            Route::Tss(_) | Route::Ibc(_) | Route::IbcHook(_) => Coins::new(),
            Route::Axelar(r) => Coins::from(r.fee.clone()),
            Route::Router(r) => Coins::from(r.fee.clone()),
            Route::HyperlaneStride(r) => Coins::from(r.fee.clone()),
        }
    }

    /// Short route name for events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Route::Tss(_) => "tss",
            Route::Ibc(_) => "ibc",
            Route::IbcHook(_) => "ibc-hook",
            Route::Axelar(_) => "axelar",
            Route::Router(_) => "router",
            Route::HyperlaneStride(_) => "hyperlane-stride",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Tss(r) => write!(
                f,
                "tss(chain={}, contract={})",
                r.destination_chain_id, r.destination_contract_address
            ),
            Route::Ibc(r) => write!(f, "ibc(channel={})", r.channel_id),
            Route::IbcHook(r) => write!(
                f,
                "ibc-hook(channel={}, contract={})",
                r.channel_id, r.destination_contract_address
            ),
            Route::Axelar(r) => write!(
                f,
                "axelar(chain={}, contract={}, fee={})",
                r.destination_chain_id, r.destination_contract_address, r.fee
            ),
            Route::Router(r) => write!(
                f,
                "router(bridge={}, chain={}, contract={}, fee={})",
                r.bridge_contract_address, r.destination_chain_id, r.destination_contract_address, r.fee
            ),
            Route::HyperlaneStride(r) => write!(
                f,
                "hyperlane-stride(domain={}, recipient={}, fee={})",
                r.dispatch_dest_domain, r.dispatch_recipient_addr, r.fee
            ),
        }
    }
}

/// Delivery confirmation recorded on a packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketReceipt {
    /// Signing correlation ID.
    Tss {
        /// Signing request ID
        signing_id: u64,
    },
    /// Transport packet sequence.
    Ibc {
        /// Channel sequence
        sequence: u64,
    },
    /// Transfer sequence.
    IbcHook {
        /// Transfer sequence
        sequence: u64,
    },
    /// Transfer sequence.
    Axelar {
        /// Transfer sequence
        sequence: u64,
    },
    /// Transfer sequence.
    Router {
        /// Transfer sequence
        sequence: u64,
    },
    /// Transfer sequence.
    HyperlaneStride {
        /// Transfer sequence
        sequence: u64,
    },
}

/// Check a channel identifier has the form `channel-<u64>`.
pub fn validate_channel_id(channel_id: &str) -> Result<()> {
    let valid = (8..=64).contains(&channel_id.len())
        && channel_id
            .strip_prefix("channel-")
            .is_some_and(|seq| !seq.is_empty() && seq.parse::<u64>().is_ok());

    if valid {
        Ok(())
    } else {
        Err(TunnelError::InvalidChannelId(channel_id.to_string()))
    }
}

fn validate_axelar_chain_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TunnelError::InvalidRoute("chain name is empty".into()));
    }
    if name.len() > AXELAR_CHAIN_NAME_MAX_LEN {
        return Err(TunnelError::InvalidRoute(format!(
            "chain name length {} is greater than {}",
            name.len(),
            AXELAR_CHAIN_NAME_MAX_LEN
        )));
    }
    if !is_nfkc(name) {
        return Err(TunnelError::InvalidRoute(format!(
            "chain name '{name}' is not NFKC-normalized"
        )));
    }
    if name.contains(AXELAR_DELIMITER) || name.chars().any(char::is_control) {
        return Err(TunnelError::InvalidRoute(format!(
            "chain name '{name}' contains forbidden characters"
        )));
    }
    Ok(())
}

fn validate_fee(fee: &Coin) -> Result<()> {
    if !Coin::is_valid_denom(&fee.denom) {
        return Err(TunnelError::InvalidRoute(format!("invalid fee denom: {}", fee.denom)));
    }
    if fee.amount == 0 {
        return Err(TunnelError::InvalidRoute("fee amount is zero".into()));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TunnelError::InvalidRoute(format!("{field} is empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_validation() {
        assert!(validate_channel_id("channel-0").is_ok());
        assert!(validate_channel_id("channel-42").is_ok());
        assert!(validate_channel_id("channel-").is_err());
        assert!(validate_channel_id("chan-1").is_err());
        assert!(validate_channel_id("channel-x").is_err());
    }

    #[test]
    fn test_tss_route_requires_destination() {
        let route = Route::Tss(TssRoute {
            destination_chain_id: "".into(),
            destination_contract_address: "0xabc".into(),
        });
        assert!(matches!(route.validate(), Err(TunnelError::InvalidRoute(_))));
    }

    #[test]
    fn test_axelar_chain_name_rules() {
        let mut route = AxelarRoute {
            destination_chain_id: "ethereum-sepolia".into(),
            destination_contract_address: "0xabc".into(),
            fee: Coin::new("uband", 10),
        };
        assert!(Route::Axelar(route.clone()).validate().is_ok());

        route.destination_chain_id = "ethereum_sepolia".into();
        assert!(Route::Axelar(route.clone()).validate().is_err());

        route.destination_chain_id = "a-very-long-chain-name-indeed".into();
        assert!(Route::Axelar(route.clone()).validate().is_err());

        // Fullwidth letters and ligatures fold under NFKC.
        route.destination_chain_id = "\u{FF45}thereum".into();
        assert!(Route::Axelar(route.clone()).validate().is_err());
        route.destination_chain_id = "\u{FB01}lecoin".into();
        assert!(Route::Axelar(route).validate().is_err());
    }

    #[test]
    fn test_router_route_rejects_zero_gas() {
        let route = Route::Router(RouterRoute {
            bridge_contract_address: "router1bridge".into(),
            destination_chain_id: "17000".into(),
            destination_contract_address: "0xabc".into(),
            destination_gas_limit: 0,
            destination_gas_price: 1,
            fee: Coin::new("uband", 10),
        });
        assert!(route.validate().is_err());
    }

    #[test]
    fn test_route_fee() {
        let tss = Route::Tss(TssRoute {
            destination_chain_id: "eth".into(),
            destination_contract_address: "0xabc".into(),
        });
        assert!(tss.fee().is_zero());

        let hyperlane = Route::HyperlaneStride(HyperlaneStrideRoute {
            dispatch_dest_domain: 1,
            dispatch_recipient_addr: "0xabc".into(),
            fee: Coin::new("uband", 7),
        });
        assert_eq!(hyperlane.fee(), Coins::single("uband", 7));
    }
}
