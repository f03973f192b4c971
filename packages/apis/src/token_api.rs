use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_binary, Addr, BlockInfo, Deps, Response, StdError, Uint128, WasmMsg};
use cw_utils::Expiration;
use sylvia::ctx::{ExecCtx, QueryCtx};
use sylvia::interface;

#[cw_serde]
pub struct BalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub struct AllowanceResponse {
    pub allowance: Uint128,
    pub expires: Expiration,
}

/// This is the interface to the external token whose units are staked in the ledger.
/// Message and field names follow cw20, so any cw20 token can be plugged in.
#[interface]
pub trait TokenApi {
    type Error: From<StdError>;

    /// Moves `amount` from the sender to `recipient`
    #[sv::msg(exec)]
    fn transfer(
        &self,
        ctx: ExecCtx,
        recipient: String,
        amount: Uint128,
    ) -> Result<Response, Self::Error>;

    /// Moves `amount` from `owner` to `recipient`, spending the allowance `owner`
    /// granted to the sender
    #[sv::msg(exec)]
    fn transfer_from(
        &self,
        ctx: ExecCtx,
        owner: String,
        recipient: String,
        amount: Uint128,
    ) -> Result<Response, Self::Error>;

    #[sv::msg(query)]
    fn balance(&self, ctx: QueryCtx, address: String) -> Result<BalanceResponse, Self::Error>;

    /// How much `spender` may still pull from `owner`
    #[sv::msg(query)]
    fn allowance(
        &self,
        ctx: QueryCtx,
        owner: String,
        spender: String,
    ) -> Result<AllowanceResponse, Self::Error>;
}

#[cw_serde]
pub struct TokenApiHelper(pub Addr);

impl TokenApiHelper {
    pub fn addr(&self) -> &Addr {
        &self.0
    }

    pub fn transfer(&self, recipient: String, amount: Uint128) -> Result<WasmMsg, StdError> {
        let msg = sv::TokenApiExecMsg::Transfer { recipient, amount };
        let wasm = WasmMsg::Execute {
            contract_addr: self.0.to_string(),
            msg: to_json_binary(&msg)?,
            funds: vec![],
        };
        Ok(wasm)
    }

    pub fn transfer_from(
        &self,
        // account the tokens are pulled from
        owner: String,
        recipient: String,
        amount: Uint128,
    ) -> Result<WasmMsg, StdError> {
        let msg = sv::TokenApiExecMsg::TransferFrom {
            owner,
            recipient,
            amount,
        };
        let wasm = WasmMsg::Execute {
            contract_addr: self.0.to_string(),
            msg: to_json_binary(&msg)?,
            funds: vec![],
        };
        Ok(wasm)
    }

    pub fn balance(&self, deps: Deps, address: impl Into<String>) -> Result<Uint128, StdError> {
        let query = sv::TokenApiQueryMsg::Balance {
            address: address.into(),
        };
        let BalanceResponse { balance } = deps.querier.query_wasm_smart(&self.0, &query)?;
        Ok(balance)
    }

    /// Returns the allowance still usable at `block`. An expired allowance is reported as zero.
    pub fn allowance(
        &self,
        deps: Deps,
        block: &BlockInfo,
        owner: impl Into<String>,
        spender: impl Into<String>,
    ) -> Result<Uint128, StdError> {
        let query = sv::TokenApiQueryMsg::Allowance {
            owner: owner.into(),
            spender: spender.into(),
        };
        let AllowanceResponse { allowance, expires } =
            deps.querier.query_wasm_smart(&self.0, &query)?;
        if expires.is_expired(block) {
            return Ok(Uint128::zero());
        }
        Ok(allowance)
    }
}
