//! Ledger module containing account management, voucher posting, and statements

pub mod account;
pub mod core;
pub mod statement;
pub mod voucher;

pub use account::*;
pub use self::core::*;
pub use statement::*;
pub use voucher::*;
