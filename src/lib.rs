//! # GST Ledger Core
//!
//! Tax computation, recurring billing schedules, and a double-entry ledger
//! for Indian GST bookkeeping.
//!
//! ## Features
//!
//! - **Tax engine**: CGST/SGST or IGST, cess, TDS and TCS with line and header discounts
//! - **Billing schedules**: expand a purchase-order commitment into dated installments
//! - **Double-entry ledger**: balanced, append-only vouchers with reversal
//! - **Statements**: running-balance statements, trial balance, profit & loss, balance sheet
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use gst_ledger_core::{compute_totals, LineItem, TaxableDocument};
//! use bigdecimal::BigDecimal;
//!
//! let doc = TaxableDocument::new(vec![LineItem::new(
//!     "Consulting",
//!     BigDecimal::from(10),
//!     BigDecimal::from(100),
//!     BigDecimal::from(18),
//! )]);
//! let totals = compute_totals(&doc).unwrap();
//! assert_eq!(totals.total_amount.to_string(), "1180.00");
//! ```

pub mod billing;
pub mod config;
pub mod ledger;
pub mod money;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use billing::*;
pub use config::{ConfigError, PostingAccounts, PostingConfig};
pub use ledger::*;
pub use money::Money;
pub use tax::gst::*;
pub use tax::summary::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;

// Re-export posting patterns for convenience
pub use ledger::voucher::patterns;
