use cosmwasm_schema::cw_serde;
use cosmwasm_std::{ensure, ensure_eq, Addr, Response, StdError, Storage, Uint128, WasmMsg};
use cw_storage_plus::{Item, Map};
use cw_utils::{nonpayable, Expiration, PaymentError};
use sylvia::ctx::{ExecCtx, InstantiateCtx, QueryCtx};
use sylvia::contract;
use thiserror::Error;

use stake_apis::token_api::{self, AllowanceResponse, BalanceResponse, TokenApi};

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Cannot move {required}, only {available} available")]
    InsufficientFunds {
        available: Uint128,
        required: Uint128,
    },

    #[error("No allowance for this account")]
    NoAllowance {},

    #[error("Allowance is expired")]
    Expired {},

    #[error("Token transfers are frozen")]
    Frozen {},
}

#[cw_serde]
pub struct InitialBalance {
    pub address: String,
    pub amount: Uint128,
}

#[cw_serde]
struct Allowance {
    amount: Uint128,
    expires: Expiration,
}

/// Minimal cw20-like token. Besides the plain bookkeeping the minter can freeze all
/// transfers or register a message that is dispatched after every transfer, which is
/// how token callbacks are emulated.
pub struct MockToken {
    minter: Item<Addr>,
    frozen: Item<bool>,
    hook: Item<WasmMsg>,
    balances: Map<Addr, Uint128>,
    /// Allowances are indexed with (owner, spender)
    allowances: Map<(Addr, Addr), Allowance>,
}

#[contract]
#[sv::error(TokenError)]
#[sv::messages(token_api as TokenApi)]
impl MockToken {
    pub const fn new() -> Self {
        Self {
            minter: Item::new("minter"),
            frozen: Item::new("frozen"),
            hook: Item::new("hook"),
            balances: Map::new("balances"),
            allowances: Map::new("allowances"),
        }
    }

    /// The caller of the instantiation becomes the minter
    #[sv::msg(instantiate)]
    pub fn instantiate(
        &self,
        ctx: InstantiateCtx,
        initial_balances: Vec<InitialBalance>,
    ) -> Result<Response, TokenError> {
        self.minter.save(ctx.deps.storage, &ctx.info.sender)?;
        for InitialBalance { address, amount } in initial_balances {
            let address = ctx.deps.api.addr_validate(&address)?;
            self.credit(ctx.deps.storage, &address, amount)?;
        }
        Ok(Response::new())
    }

    #[sv::msg(exec)]
    fn mint(
        &self,
        ctx: ExecCtx,
        recipient: String,
        amount: Uint128,
    ) -> Result<Response, TokenError> {
        nonpayable(&ctx.info)?;
        self.ensure_minter(ctx.deps.storage, &ctx.info.sender)?;

        let recipient = ctx.deps.api.addr_validate(&recipient)?;
        self.credit(ctx.deps.storage, &recipient, amount)?;

        Ok(Response::new()
            .add_attribute("action", "mint")
            .add_attribute("recipient", recipient)
            .add_attribute("amount", amount.to_string()))
    }

    /// Grants `spender` the right to pull `amount` more tokens from the sender.
    /// An expired allowance is replaced rather than topped up.
    #[sv::msg(exec)]
    fn increase_allowance(
        &self,
        ctx: ExecCtx,
        spender: String,
        amount: Uint128,
        expires: Option<Expiration>,
    ) -> Result<Response, TokenError> {
        nonpayable(&ctx.info)?;

        let spender = ctx.deps.api.addr_validate(&spender)?;
        let key = (ctx.info.sender.clone(), spender.clone());
        let mut allowance = self
            .allowances
            .may_load(ctx.deps.storage, key.clone())?
            .filter(|allowance| !allowance.expires.is_expired(&ctx.env.block))
            .unwrap_or(Allowance {
                amount: Uint128::zero(),
                expires: Expiration::Never {},
            });
        allowance.amount = allowance.amount.checked_add(amount).map_err(StdError::from)?;
        if let Some(expires) = expires {
            allowance.expires = expires;
        }
        self.allowances.save(ctx.deps.storage, key, &allowance)?;

        Ok(Response::new()
            .add_attribute("action", "increase_allowance")
            .add_attribute("owner", ctx.info.sender)
            .add_attribute("spender", spender)
            .add_attribute("amount", amount.to_string()))
    }

    /// Frozen tokens reject every transfer
    #[sv::msg(exec)]
    fn set_frozen(&self, ctx: ExecCtx, frozen: bool) -> Result<Response, TokenError> {
        self.ensure_minter(ctx.deps.storage, &ctx.info.sender)?;
        self.frozen.save(ctx.deps.storage, &frozen)?;
        Ok(Response::new().add_attribute("action", "set_frozen"))
    }

    /// Registers (or clears) a message sent along every successful transfer
    #[sv::msg(exec)]
    fn set_hook(&self, ctx: ExecCtx, hook: Option<WasmMsg>) -> Result<Response, TokenError> {
        self.ensure_minter(ctx.deps.storage, &ctx.info.sender)?;
        match hook {
            Some(hook) => self.hook.save(ctx.deps.storage, &hook)?,
            None => self.hook.remove(ctx.deps.storage),
        }
        Ok(Response::new().add_attribute("action", "set_hook"))
    }

    fn ensure_minter(&self, storage: &dyn Storage, sender: &Addr) -> Result<(), TokenError> {
        let minter = self.minter.load(storage)?;
        ensure_eq!(&minter, sender, TokenError::Unauthorized {});
        Ok(())
    }

    fn credit(
        &self,
        storage: &mut dyn Storage,
        account: &Addr,
        amount: Uint128,
    ) -> Result<(), TokenError> {
        self.balances
            .update(storage, account.clone(), |balance| -> Result<_, StdError> {
                Ok(balance.unwrap_or_default().checked_add(amount)?)
            })?;
        Ok(())
    }

    /// Moves tokens between accounts and attaches the hook, if any, to the response
    fn move_tokens(
        &self,
        storage: &mut dyn Storage,
        from: &Addr,
        to: &Addr,
        amount: Uint128,
        resp: Response,
    ) -> Result<Response, TokenError> {
        let frozen = self.frozen.may_load(storage)?.unwrap_or_default();
        ensure!(!frozen, TokenError::Frozen {});

        let available = self
            .balances
            .may_load(storage, from.clone())?
            .unwrap_or_default();
        ensure!(
            available >= amount,
            TokenError::InsufficientFunds {
                available,
                required: amount,
            }
        );
        self.balances
            .save(storage, from.clone(), &(available - amount))?;
        self.credit(storage, to, amount)?;

        let resp = match self.hook.may_load(storage)? {
            Some(hook) => resp.add_message(hook),
            None => resp,
        };
        Ok(resp)
    }
}

impl Default for MockToken {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenApi for MockToken {
    type Error = TokenError;

    fn transfer(
        &self,
        ctx: ExecCtx,
        recipient: String,
        amount: Uint128,
    ) -> Result<Response, Self::Error> {
        nonpayable(&ctx.info)?;

        let recipient = ctx.deps.api.addr_validate(&recipient)?;
        let resp = Response::new()
            .add_attribute("action", "transfer")
            .add_attribute("from", &ctx.info.sender)
            .add_attribute("to", &recipient)
            .add_attribute("amount", amount.to_string());

        self.move_tokens(ctx.deps.storage, &ctx.info.sender, &recipient, amount, resp)
    }

    fn transfer_from(
        &self,
        ctx: ExecCtx,
        owner: String,
        recipient: String,
        amount: Uint128,
    ) -> Result<Response, Self::Error> {
        nonpayable(&ctx.info)?;

        let owner = ctx.deps.api.addr_validate(&owner)?;
        let recipient = ctx.deps.api.addr_validate(&recipient)?;

        // spend the allowance first
        let key = (owner.clone(), ctx.info.sender.clone());
        let mut allowance = self
            .allowances
            .may_load(ctx.deps.storage, key.clone())?
            .ok_or(TokenError::NoAllowance {})?;
        ensure!(
            !allowance.expires.is_expired(&ctx.env.block),
            TokenError::Expired {}
        );
        ensure!(
            allowance.amount >= amount,
            TokenError::InsufficientFunds {
                available: allowance.amount,
                required: amount,
            }
        );
        allowance.amount -= amount;
        self.allowances.save(ctx.deps.storage, key, &allowance)?;

        let resp = Response::new()
            .add_attribute("action", "transfer_from")
            .add_attribute("from", &owner)
            .add_attribute("to", &recipient)
            .add_attribute("by", &ctx.info.sender)
            .add_attribute("amount", amount.to_string());

        self.move_tokens(ctx.deps.storage, &owner, &recipient, amount, resp)
    }

    fn balance(&self, ctx: QueryCtx, address: String) -> Result<BalanceResponse, Self::Error> {
        let address = ctx.deps.api.addr_validate(&address)?;
        let balance = self
            .balances
            .may_load(ctx.deps.storage, address)?
            .unwrap_or_default();
        Ok(BalanceResponse { balance })
    }

    fn allowance(
        &self,
        ctx: QueryCtx,
        owner: String,
        spender: String,
    ) -> Result<AllowanceResponse, Self::Error> {
        let owner = ctx.deps.api.addr_validate(&owner)?;
        let spender = ctx.deps.api.addr_validate(&spender)?;
        let resp = match self.allowances.may_load(ctx.deps.storage, (owner, spender))? {
            Some(Allowance { amount, expires }) => AllowanceResponse {
                allowance: amount,
                expires,
            },
            None => AllowanceResponse {
                allowance: Uint128::zero(),
                expires: Expiration::Never {},
            },
        };
        Ok(resp)
    }
}
