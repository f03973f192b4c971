pub mod token_api;

pub use token_api::{AllowanceResponse, BalanceResponse, TokenApi, TokenApiHelper};
