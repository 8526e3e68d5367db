//! # Domain Errors
//!
//! Error types for the Tunnel subsystem.
//!
//! Errors fall into four classes:
//! - configuration: rejected at registration/edit, nothing applied
//! - resource: the requested operation is refused, no state change
//! - operational: raised while producing a packet, absorbed by the batch
//! - fatal: broken invariants the embedding node must halt on

use thiserror::Error;

/// Result type alias for tunnel operations.
pub type Result<T> = std::result::Result<T, TunnelError>;

/// Tunnel error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TunnelError {
    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------
    /// Too many signals for one tunnel.
    #[error("Max signals exceeded: {got} > {max}")]
    MaxSignalsExceeded {
        /// Signals requested
        got: usize,
        /// Params limit
        max: u64,
    },

    /// A soft or hard band lies outside the allowed range.
    #[error("Deviation out of range for {signal_id}: soft={soft_bps}, hard={hard_bps}, allowed=[{min_bps}, {max_bps}]")]
    DeviationOutOfRange {
        /// Offending signal
        signal_id: String,
        /// Soft deviation (bps)
        soft_bps: u64,
        /// Hard deviation (bps)
        hard_bps: u64,
        /// Params minimum
        min_bps: u64,
        /// Params maximum
        max_bps: u64,
    },

    /// Interval outside `[min_interval, max_interval]`.
    #[error("Interval out of range: {interval}, allowed=[{min}, {max}]")]
    IntervalOutOfRange {
        /// Requested interval (seconds)
        interval: u64,
        /// Params minimum
        min: u64,
        /// Params maximum
        max: u64,
    },

    /// Deposit uses a denomination the module does not accept.
    #[error("Invalid deposit denom: {denom}, accepted: {accepted:?}")]
    InvalidDepositDenom {
        /// Rejected denom
        denom: String,
        /// Accepted denoms
        accepted: Vec<String>,
    },

    /// Signal listed twice.
    #[error("Duplicate signal ID: {0}")]
    DuplicateSignal(String),

    /// Tunnel configured without signals.
    #[error("Signal deviations cannot be empty")]
    EmptySignals,

    /// Route failed validation.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// Channel identifier is not a valid transport channel.
    #[error("Invalid channel ID: {0}")]
    InvalidChannelId(String),

    /// Amount is empty or malformed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Params failed validation.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    // ---------------------------------------------------------------------
    // Resource
    // ---------------------------------------------------------------------
    /// Tunnel does not exist.
    #[error("Tunnel not found: {0}")]
    TunnelNotFound(u64),

    /// Packet does not exist.
    #[error("Packet not found: tunnel {tunnel_id}, sequence {sequence}")]
    PacketNotFound {
        /// Tunnel ID
        tunnel_id: u64,
        /// Packet sequence
        sequence: u64,
    },

    /// Depositor has no deposit on this tunnel.
    #[error("Deposit not found: tunnel {tunnel_id}, depositor {depositor}")]
    DepositNotFound {
        /// Tunnel ID
        tunnel_id: u64,
        /// Depositor address
        depositor: String,
    },

    /// Deposit does not cover the request.
    #[error("Insufficient deposit: required {required}, available {available}")]
    InsufficientDeposit {
        /// Amount required
        required: String,
        /// Amount available
        available: String,
    },

    /// Account balance does not cover a transfer or fee.
    #[error("Insufficient funds: {address} requires {required}, has {available}")]
    InsufficientFunds {
        /// Paying account
        address: String,
        /// Amount required
        required: String,
        /// Spendable amount
        available: String,
    },

    /// Route cannot accept packets yet.
    #[error("Route not ready for tunnel {0}")]
    RouteNotReady(u64),

    /// Tunnel is already active.
    #[error("Tunnel {0} is already active")]
    AlreadyActive(u64),

    /// Tunnel is already inactive.
    #[error("Tunnel {0} is already inactive")]
    AlreadyInactive(u64),

    /// Tunnel must be active for this operation.
    #[error("Tunnel {0} is inactive")]
    InactiveTunnel(u64),

    /// Caller is not the tunnel creator.
    #[error("Invalid tunnel creator: {caller} is not the creator of tunnel {tunnel_id}")]
    InvalidTunnelCreator {
        /// Tunnel ID
        tunnel_id: u64,
        /// Caller address
        caller: String,
    },

    /// Caller is not the params authority.
    #[error("Invalid authority: expected {expected}, got {got}")]
    InvalidAuthority {
        /// Configured authority
        expected: String,
        /// Caller
        got: String,
    },

    // ---------------------------------------------------------------------
    // Operational
    // ---------------------------------------------------------------------
    /// A route send faulted and the fault was caught at the dispatch boundary.
    #[error("Send packet panic: {0}")]
    SendPacketPanic(String),

    /// Transport rejected a packet or transfer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Threshold-signing coordinator rejected the request.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Payload or record could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    // ---------------------------------------------------------------------
    // Fatal
    // ---------------------------------------------------------------------
    /// Derived fee payer collides with an existing account.
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    /// Stored state violates a module invariant.
    #[error("Corrupted state: {0}")]
    CorruptedState(String),
}

impl TunnelError {
    /// Whether the node must treat this error as an invariant violation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TunnelError::AccountAlreadyExists(_) | TunnelError::CorruptedState(_)
        )
    }
}

impl From<bincode::Error> for TunnelError {
    fn from(err: bincode::Error) -> Self {
        TunnelError::CorruptedState(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_signals_error() {
        let err = TunnelError::MaxSignalsExceeded { got: 11, max: 10 };
        assert!(err.to_string().contains("11 > 10"));
    }

    #[test]
    fn test_interval_error() {
        let err = TunnelError::IntervalOutOfRange {
            interval: 5,
            min: 60,
            max: 3600,
        };
        assert!(err.to_string().contains("[60, 3600]"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(TunnelError::AccountAlreadyExists("ab".into()).is_fatal());
        assert!(TunnelError::CorruptedState("x".into()).is_fatal());
        assert!(!TunnelError::RouteNotReady(1).is_fatal());
        assert!(!TunnelError::SendPacketPanic("boom".into()).is_fatal());
    }
}
