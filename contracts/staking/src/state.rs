use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};
use stake_apis::TokenApiHelper;

#[cw_serde]
pub struct Config {
    /// The token we accept for staking, fixed at instantiation
    pub token: TokenApiHelper,
}

#[cw_serde]
#[derive(Copy, Default)]
pub enum Status {
    #[default]
    Active,
    Paused,
}

#[cw_serde]
#[derive(Copy)]
pub enum TransferKind {
    Deposit,
    Withdraw,
}

/// Token transfer dispatched by the ledger and not confirmed yet.
///
/// It only lives between a `deposit`/`withdraw` call and the reply to its token message,
/// so any call observing it was issued from inside that token message.
#[cw_serde]
pub struct PendingTransfer {
    pub kind: TransferKind,
    pub account: Addr,
    pub amount: Uint128,
}
