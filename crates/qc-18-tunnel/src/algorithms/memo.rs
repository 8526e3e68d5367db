//! # Transfer Memos
//!
//! JSON memos attached to the transfers of the hook and GMP routes.
//!
//! Memos are built as [`serde_json::Value`] whose object map keeps keys
//! sorted, so the rendered bytes are identical on every validator.

use crate::domain::{
    AxelarRoute, Coin, HyperlaneStrideRoute, IbcHookRoute, Packet, Price, RouterRoute,
};
use serde_json::{json, Value};

/// Axelar message type of a pure general message.
pub const AXELAR_GENERAL_MESSAGE: u8 = 1;

fn price_json(price: &Price) -> Value {
    json!({
        "price": price.price,
        "signal_id": price.signal_id,
        "status": price.status.as_str(),
        "timestamp": price.timestamp,
    })
}

fn packet_json(packet: &Packet) -> Value {
    json!({
        "created_at": packet.created_at,
        "prices": packet.prices.iter().map(price_json).collect::<Vec<_>>(),
        "sequence": packet.sequence,
        "tunnel_id": packet.tunnel_id,
    })
}

fn wasm_call(contract: &str, msg: Value) -> Value {
    json!({ "wasm": { "contract": contract, "msg": msg } })
}

/// Memo invoking `receive_packet` on the hook route's contract.
pub fn ibc_hook_memo(route: &IbcHookRoute, packet: &Packet) -> String {
    wasm_call(
        &route.destination_contract_address,
        json!({ "receive_packet": { "packet": packet_json(packet) } }),
    )
    .to_string()
}

/// Memo invoking `receive_band_data` on the Router bridge contract.
pub fn router_memo(route: &RouterRoute, payload: &[u8]) -> String {
    wasm_call(
        &route.bridge_contract_address,
        json!({
            "receive_band_data": {
                "dest_chain_id": route.destination_chain_id,
                "dest_contract_address": route.destination_contract_address,
                "gas_limit": route.destination_gas_limit,
                "gas_price": route.destination_gas_price,
                "payload": hex::encode(payload),
            }
        }),
    )
    .to_string()
}

/// Memo invoking `dispatch` on the Hyperlane integration contract.
pub fn hyperlane_stride_memo(
    route: &HyperlaneStrideRoute,
    integration_contract: &str,
    payload: &[u8],
) -> String {
    wasm_call(
        integration_contract,
        json!({
            "dispatch": {
                "dest_domain": route.dispatch_dest_domain,
                "recipient_addr": route.dispatch_recipient_addr,
                "msg_body": hex::encode(payload),
            }
        }),
    )
    .to_string()
}

/// Axelar GMP envelope.
///
/// The payload renders as an array of byte values.
pub fn axelar_memo(
    route: &AxelarRoute,
    fee: &Coin,
    fee_recipient: &str,
    refund_recipient: &str,
    payload: &[u8],
) -> String {
    json!({
        "destination_address": route.destination_contract_address,
        "destination_chain": route.destination_chain_id,
        "fee": {
            "amount": fee.amount.to_string(),
            "recipient": fee_recipient,
            "refund_recipient": refund_recipient,
        },
        "payload": payload,
        "type": AXELAR_GENERAL_MESSAGE,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coins, PriceStatus};

    fn packet() -> Packet {
        Packet {
            tunnel_id: 3,
            sequence: 7,
            prices: vec![Price::new(PriceStatus::Available, "CS:BTC-USD", 50_000, 1_700)],
            base_fee: Coins::new(),
            route_fee: Coins::new(),
            created_at: 1_800,
            receipt: None,
        }
    }

    #[test]
    fn test_ibc_hook_memo() {
        let route = IbcHookRoute {
            channel_id: "channel-0".into(),
            destination_contract_address: "wasm1contract".into(),
        };
        assert_eq!(
            ibc_hook_memo(&route, &packet()),
            r#"{"wasm":{"contract":"wasm1contract","msg":{"receive_packet":{"packet":{"created_at":1800,"prices":[{"price":50000,"signal_id":"CS:BTC-USD","status":"available","timestamp":1700}],"sequence":7,"tunnel_id":3}}}}}"#
        );
    }

    #[test]
    fn test_router_memo() {
        let route = RouterRoute {
            bridge_contract_address: "router1bridge".into(),
            destination_chain_id: "17000".into(),
            destination_contract_address: "0xabc".into(),
            destination_gas_limit: 300_000,
            destination_gas_price: 10,
            fee: Coin::new("uband", 10),
        };
        assert_eq!(
            router_memo(&route, &[0xde, 0xad]),
            r#"{"wasm":{"contract":"router1bridge","msg":{"receive_band_data":{"dest_chain_id":"17000","dest_contract_address":"0xabc","gas_limit":300000,"gas_price":10,"payload":"dead"}}}}"#
        );
    }

    #[test]
    fn test_hyperlane_stride_memo() {
        let route = HyperlaneStrideRoute {
            dispatch_dest_domain: 1,
            dispatch_recipient_addr: "0xrecipient".into(),
            fee: Coin::new("uband", 10),
        };
        assert_eq!(
            hyperlane_stride_memo(&route, "stride1integration", &[0x01]),
            r#"{"wasm":{"contract":"stride1integration","msg":{"dispatch":{"dest_domain":1,"msg_body":"01","recipient_addr":"0xrecipient"}}}}"#
        );
    }

    #[test]
    fn test_axelar_memo() {
        let route = AxelarRoute {
            destination_chain_id: "ethereum".into(),
            destination_contract_address: "0xabc".into(),
            fee: Coin::new("uband", 10),
        };
        assert_eq!(
            axelar_memo(&route, &route.fee, "axelar1fee", "band1payer", &[1, 255]),
            r#"{"destination_address":"0xabc","destination_chain":"ethereum","fee":{"amount":"10","recipient":"axelar1fee","refund_recipient":"band1payer"},"payload":[1,255],"type":1}"#
        );
    }
}
