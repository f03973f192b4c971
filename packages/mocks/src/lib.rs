pub mod token;

pub use token::{InitialBalance, MockToken, TokenError};
