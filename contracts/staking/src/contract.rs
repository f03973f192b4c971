use cosmwasm_std::{
    ensure, Addr, Binary, Deps, Event, Order, Response, StdError, StdResult, Storage, SubMsg,
    SubMsgResult, Uint128,
};
use cw2::set_contract_version;
use cw_storage_plus::{Bound, Item, Map};
use cw_utils::nonpayable;
use sylvia::contract;
use sv::{DEPOSIT_REPLY_ID, WITHDRAW_REPLY_ID};
use sylvia::ctx::{ExecCtx, InstantiateCtx, QueryCtx, ReplyCtx};

use stake_apis::TokenApiHelper;

use crate::error::ContractError;
use crate::msg::{
    AccountResponse, AllAccountsResponse, BalanceResponse, ConfigResponse, CustodyResponse,
    OwnerResponse, TotalSupplyResponse,
};
use crate::state::{Config, PendingTransfer, Status, TransferKind};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 30;

/// Aligns pagination limit
fn clamp_page_limit(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT) as usize
}

pub struct StakingContract {
    /// General contract configuration
    pub config: Item<Config>,
    /// Admin of the ledger. Missing once ownership is renounced
    pub owner: Item<Addr>,
    pub status: Item<Status>,
    /// Sum of all `balances`
    pub total_supply: Item<Uint128>,
    /// Staked amount per account. Accounts are removed when their stake drops to zero
    pub balances: Map<Addr, Uint128>,
    /// Token transfer waiting for its reply
    pub pending: Item<PendingTransfer>,
}

#[cfg_attr(not(feature = "library"), sylvia::entry_points)]
#[contract]
#[sv::error(ContractError)]
#[sv::features(replies)]
impl StakingContract {
    pub const fn new() -> Self {
        Self {
            config: Item::new("config"),
            owner: Item::new("owner"),
            status: Item::new("status"),
            total_supply: Item::new("total_supply"),
            balances: Map::new("balances"),
            pending: Item::new("pending"),
        }
    }

    /// The caller of the instantiation becomes the owner of the ledger.
    /// `token` has to be the address of an existing token contract.
    #[sv::msg(instantiate)]
    pub fn instantiate(
        &self,
        ctx: InstantiateCtx,
        token: String,
    ) -> Result<Response, ContractError> {
        nonpayable(&ctx.info)?;

        let token = validate_token(ctx.deps.as_ref(), &token)?;

        let config = Config {
            token: TokenApiHelper(token.clone()),
        };
        self.config.save(ctx.deps.storage, &config)?;
        self.owner.save(ctx.deps.storage, &ctx.info.sender)?;
        self.status.save(ctx.deps.storage, &Status::Active)?;
        self.total_supply.save(ctx.deps.storage, &Uint128::zero())?;
        set_contract_version(ctx.deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

        let resp = Response::new()
            .add_attribute("action", "instantiate")
            .add_attribute("owner", ctx.info.sender)
            .add_attribute("token", token);

        Ok(resp)
    }

    /// Stakes `amount` of the token. The sender has to grant the ledger an allowance
    /// of at least `amount` beforehand.
    ///
    /// The stake is credited in the reply, once the token confirmed the transfer.
    #[sv::msg(exec)]
    fn deposit(&self, ctx: ExecCtx, amount: Uint128) -> Result<Response, ContractError> {
        nonpayable(&ctx.info)?;
        ensure!(!amount.is_zero(), ContractError::ZeroAmount);
        self.ensure_active(ctx.deps.storage)?;
        self.ensure_idle(ctx.deps.storage)?;

        let config = self.config.load(ctx.deps.storage)?;
        let allowance = config.token.allowance(
            ctx.deps.as_ref(),
            &ctx.env.block,
            &ctx.info.sender,
            &ctx.env.contract.address,
        )?;
        ensure!(
            allowance >= amount,
            ContractError::InsufficientAuthorization {
                allowance,
                required: amount,
            }
        );

        let pending = PendingTransfer {
            kind: TransferKind::Deposit,
            account: ctx.info.sender.clone(),
            amount,
        };
        self.pending.save(ctx.deps.storage, &pending)?;

        let msg = config.token.transfer_from(
            ctx.info.sender.to_string(),
            ctx.env.contract.address.to_string(),
            amount,
        )?;

        let resp = Response::new()
            .add_submessage(SubMsg::reply_always(msg, DEPOSIT_REPLY_ID))
            .add_attribute("action", "deposit")
            .add_attribute("sender", ctx.info.sender)
            .add_attribute("amount", amount.to_string());

        Ok(resp)
    }

    /// Unstakes `amount` and sends it back to the sender
    #[sv::msg(exec)]
    fn withdraw(&self, ctx: ExecCtx, amount: Uint128) -> Result<Response, ContractError> {
        nonpayable(&ctx.info)?;
        ensure!(!amount.is_zero(), ContractError::ZeroAmount);
        self.ensure_active(ctx.deps.storage)?;
        self.ensure_idle(ctx.deps.storage)?;

        let balance = self.stake_of(ctx.deps.storage, &ctx.info.sender)?;
        ensure!(
            balance >= amount,
            ContractError::InsufficientBalance {
                balance,
                required: amount,
            }
        );

        // Stake is reduced before the token leaves custody
        self.debit(ctx.deps.storage, &ctx.info.sender, amount)?;

        let pending = PendingTransfer {
            kind: TransferKind::Withdraw,
            account: ctx.info.sender.clone(),
            amount,
        };
        self.pending.save(ctx.deps.storage, &pending)?;

        let config = self.config.load(ctx.deps.storage)?;
        let msg = config.token.transfer(ctx.info.sender.to_string(), amount)?;

        let resp = Response::new()
            .add_submessage(SubMsg::reply_always(msg, WITHDRAW_REPLY_ID))
            .add_attribute("action", "withdraw")
            .add_attribute("sender", ctx.info.sender)
            .add_attribute("amount", amount.to_string());

        Ok(resp)
    }

    #[sv::msg(exec)]
    fn transfer_ownership(
        &self,
        ctx: ExecCtx,
        new_owner: String,
    ) -> Result<Response, ContractError> {
        self.ensure_owner(ctx.deps.storage, &ctx.info.sender)?;
        nonpayable(&ctx.info)?;

        let new_owner = ctx
            .deps
            .api
            .addr_validate(&new_owner)
            .map_err(|_| ContractError::InvalidAddress(new_owner))?;
        self.owner.save(ctx.deps.storage, &new_owner)?;

        let evt = Event::new("ownership")
            .add_attribute("previous_owner", &ctx.info.sender)
            .add_attribute("new_owner", &new_owner);
        let resp = Response::new()
            .add_event(evt)
            .add_attribute("action", "transfer_ownership")
            .add_attribute("sender", ctx.info.sender);

        Ok(resp)
    }

    /// Leaves the ledger without an owner. There is no way back, all admin operations
    /// are rejected afterwards.
    #[sv::msg(exec)]
    fn renounce_ownership(&self, ctx: ExecCtx) -> Result<Response, ContractError> {
        self.ensure_owner(ctx.deps.storage, &ctx.info.sender)?;
        nonpayable(&ctx.info)?;

        self.owner.remove(ctx.deps.storage);

        let evt = Event::new("ownership").add_attribute("previous_owner", &ctx.info.sender);
        let resp = Response::new()
            .add_event(evt)
            .add_attribute("action", "renounce_ownership")
            .add_attribute("sender", ctx.info.sender);

        Ok(resp)
    }

    /// Stops deposits and withdrawals until `unpause` is called
    #[sv::msg(exec)]
    fn pause(&self, ctx: ExecCtx) -> Result<Response, ContractError> {
        self.ensure_owner(ctx.deps.storage, &ctx.info.sender)?;
        nonpayable(&ctx.info)?;

        self.ensure_active(ctx.deps.storage)?;
        self.status.save(ctx.deps.storage, &Status::Paused)?;

        let resp = Response::new()
            .add_attribute("action", "pause")
            .add_attribute("sender", ctx.info.sender);

        Ok(resp)
    }

    #[sv::msg(exec)]
    fn unpause(&self, ctx: ExecCtx) -> Result<Response, ContractError> {
        self.ensure_owner(ctx.deps.storage, &ctx.info.sender)?;
        nonpayable(&ctx.info)?;

        let status = self.status.load(ctx.deps.storage)?;
        ensure!(status == Status::Paused, ContractError::NotPaused);
        self.status.save(ctx.deps.storage, &Status::Active)?;

        let resp = Response::new()
            .add_attribute("action", "unpause")
            .add_attribute("sender", ctx.info.sender);

        Ok(resp)
    }

    /// Staked amount of `account`. Zero for accounts that never deposited, malformed
    /// addresses included since they can't hold stake.
    #[sv::msg(query)]
    fn balance_of(
        &self,
        ctx: QueryCtx,
        account: String,
    ) -> Result<BalanceResponse, ContractError> {
        let balance = match ctx.deps.api.addr_validate(&account) {
            Ok(account) => self.stake_of(ctx.deps.storage, &account)?,
            Err(_) => Uint128::zero(),
        };
        Ok(BalanceResponse { balance })
    }

    #[sv::msg(query)]
    fn total_supply(&self, ctx: QueryCtx) -> Result<TotalSupplyResponse, ContractError> {
        let total_supply = self.total_supply.load(ctx.deps.storage)?;
        Ok(TotalSupplyResponse { total_supply })
    }

    #[sv::msg(query)]
    fn owner(&self, ctx: QueryCtx) -> Result<OwnerResponse, ContractError> {
        let owner = self.owner.may_load(ctx.deps.storage)?;
        Ok(OwnerResponse {
            owner: owner.map(Addr::into_string),
        })
    }

    #[sv::msg(query)]
    fn config(&self, ctx: QueryCtx) -> Result<ConfigResponse, ContractError> {
        let config = self.config.load(ctx.deps.storage)?;
        let owner = self.owner.may_load(ctx.deps.storage)?;
        let status = self.status.load(ctx.deps.storage)?;

        let resp = ConfigResponse {
            token: config.token.addr().to_string(),
            owner: owner.map(Addr::into_string),
            status,
        };

        Ok(resp)
    }

    /// Token balance of the ledger, queried from the token contract
    #[sv::msg(query)]
    fn custody(&self, ctx: QueryCtx) -> Result<CustodyResponse, ContractError> {
        let config = self.config.load(ctx.deps.storage)?;
        let amount = config
            .token
            .balance(ctx.deps, &ctx.env.contract.address)?;
        Ok(CustodyResponse { amount })
    }

    /// Queries for all accounts holding stake, paginating over them.
    ///
    /// `start_after` is the last account included in previous page
    #[sv::msg(query)]
    fn all_accounts(
        &self,
        ctx: QueryCtx,
        start_after: Option<String>,
        limit: Option<u32>,
    ) -> Result<AllAccountsResponse, ContractError> {
        let limit = clamp_page_limit(limit);
        let start_after = start_after
            .map(|addr| ctx.deps.api.addr_validate(&addr))
            .transpose()?;
        let bound = start_after.map(Bound::exclusive);

        let accounts = self
            .balances
            .range(ctx.deps.storage, bound, None, Order::Ascending)
            .map(|item| {
                let (account, balance) = item?;
                Ok::<AccountResponse, StdError>(AccountResponse {
                    account: account.into(),
                    balance,
                })
            })
            .take(limit)
            .collect::<Result<_, _>>()?;

        let resp = AllAccountsResponse { accounts };

        Ok(resp)
    }

    /// Credits the stake once the token confirmed the pull
    #[sv::msg(reply, handlers=[deposit], reply_on=always)]
    fn reply_deposit(
        &self,
        ctx: ReplyCtx,
        result: SubMsgResult,
        #[sv::payload(raw)] _payload: Binary,
    ) -> Result<Response, ContractError> {
        let deps = ctx.deps;
        let pending = self.take_pending(deps.storage, TransferKind::Deposit)?;
        if let SubMsgResult::Err(err) = result {
            return Err(ContractError::TransferFailed(err));
        }

        self.credit(deps.storage, &pending.account, pending.amount)?;

        let resp = Response::new()
            .add_attribute("action", "deposit_confirmed")
            .add_attribute("account", pending.account)
            .add_attribute("amount", pending.amount.to_string());

        Ok(resp)
    }

    /// The stake was already reduced in `withdraw`. Failing here reverts that reduction
    /// together with the rest of the transaction.
    #[sv::msg(reply, handlers=[withdraw], reply_on=always)]
    fn reply_withdraw(
        &self,
        ctx: ReplyCtx,
        result: SubMsgResult,
        #[sv::payload(raw)] _payload: Binary,
    ) -> Result<Response, ContractError> {
        let deps = ctx.deps;
        let pending = self.take_pending(deps.storage, TransferKind::Withdraw)?;
        if let SubMsgResult::Err(err) = result {
            return Err(ContractError::TransferFailed(err));
        }

        let resp = Response::new()
            .add_attribute("action", "withdraw_confirmed")
            .add_attribute("account", pending.account)
            .add_attribute("amount", pending.amount.to_string());

        Ok(resp)
    }

    fn take_pending(
        &self,
        storage: &mut dyn Storage,
        kind: TransferKind,
    ) -> Result<PendingTransfer, ContractError> {
        let pending = self
            .pending
            .may_load(storage)?
            .ok_or(ContractError::NoPendingTransfer)?;
        ensure!(pending.kind == kind, ContractError::NoPendingTransfer);
        self.pending.remove(storage);
        Ok(pending)
    }

    /// Authorization gate of every admin operation
    fn ensure_owner(&self, storage: &dyn Storage, sender: &Addr) -> Result<(), ContractError> {
        let owner = self.owner.may_load(storage)?;
        ensure!(owner.as_ref() == Some(sender), ContractError::NotAuthorized);
        Ok(())
    }

    fn ensure_active(&self, storage: &dyn Storage) -> Result<(), ContractError> {
        let status = self.status.load(storage)?;
        ensure!(status == Status::Active, ContractError::Paused);
        Ok(())
    }

    /// Rejects calls made while a token transfer of the ledger is still running
    fn ensure_idle(&self, storage: &dyn Storage) -> Result<(), ContractError> {
        ensure!(
            !self.pending.exists(storage),
            ContractError::TransferInFlight
        );
        Ok(())
    }

    fn stake_of(&self, storage: &dyn Storage, account: &Addr) -> StdResult<Uint128> {
        let stake = self
            .balances
            .may_load(storage, account.clone())?
            .unwrap_or_default();
        Ok(stake)
    }

    /// Balance and supply are always written together
    fn credit(
        &self,
        storage: &mut dyn Storage,
        account: &Addr,
        amount: Uint128,
    ) -> StdResult<()> {
        let stake = self.stake_of(storage, account)?.checked_add(amount)?;
        let total_supply = self.total_supply.load(storage)?.checked_add(amount)?;
        self.balances.save(storage, account.clone(), &stake)?;
        self.total_supply.save(storage, &total_supply)
    }

    fn debit(
        &self,
        storage: &mut dyn Storage,
        account: &Addr,
        amount: Uint128,
    ) -> StdResult<()> {
        let stake = self.stake_of(storage, account)?.checked_sub(amount)?;
        let total_supply = self.total_supply.load(storage)?.checked_sub(amount)?;
        if stake.is_zero() {
            self.balances.remove(storage, account.clone());
        } else {
            self.balances.save(storage, account.clone(), &stake)?;
        }
        self.total_supply.save(storage, &total_supply)
    }
}

impl Default for StakingContract {
    fn default() -> Self {
        Self::new()
    }
}

/// Token reference has to be a valid address of an instantiated contract
fn validate_token(deps: Deps, token: &str) -> Result<Addr, ContractError> {
    let invalid = || ContractError::InvalidTokenReference(token.to_owned());
    let token = deps.api.addr_validate(token).map_err(|_| invalid())?;
    deps.querier
        .query_wasm_contract_info(&token)
        .map_err(|_| invalid())?;
    Ok(token)
}
