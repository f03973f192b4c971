use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

use crate::state::Status;

#[cw_serde]
pub struct ConfigResponse {
    pub token: String,
    /// `None` once ownership was renounced
    pub owner: Option<String>,
    pub status: Status,
}

#[cw_serde]
pub struct OwnerResponse {
    pub owner: Option<String>,
}

#[cw_serde]
pub struct BalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub struct TotalSupplyResponse {
    pub total_supply: Uint128,
}

/// Amount of the staked token held by the ledger, as reported by the token itself
#[cw_serde]
pub struct CustodyResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct AccountResponse {
    pub account: String,
    pub balance: Uint128,
}

#[cw_serde]
pub struct AllAccountsResponse {
    pub accounts: Vec<AccountResponse>,
}
