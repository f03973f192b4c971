use cosmwasm_std::{StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Invalid token contract: {0}")]
    InvalidTokenReference(String),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Ledger is only authorized to pull {allowance}, {required} requested")]
    InsufficientAuthorization {
        allowance: Uint128,
        required: Uint128,
    },

    #[error("Insufficient stake: {balance} staked, {required} requested")]
    InsufficientBalance {
        balance: Uint128,
        required: Uint128,
    },

    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    #[error("Unauthorized")]
    NotAuthorized,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Ledger is paused")]
    Paused,

    #[error("Ledger is not paused")]
    NotPaused,

    #[error("A token transfer is already in flight")]
    TransferInFlight,

    #[error("No token transfer is in flight")]
    NoPendingTransfer,
}
