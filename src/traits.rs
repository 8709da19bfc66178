//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::statement::{BalanceSheet, LedgerStatement, ProfitAndLoss, TrialBalance};
use crate::money::Money;
use crate::types::*;
use crate::utils::validation::{validate_account_code, validate_account_name};

/// Filter over posted entries. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryQuery {
    pub account_code: Option<String>,
    /// Inclusive lower bound on entry date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on entry date
    pub to: Option<NaiveDate>,
    pub reference: Option<Reference>,
    pub voucher_number: Option<String>,
}

impl EntryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_code: impl Into<String>) -> Self {
        self.account_code = Some(account_code.into());
        self
    }

    pub fn from(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn to(mut self, date: NaiveDate) -> Self {
        self.to = Some(date);
        self
    }

    pub fn between(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from(from).to(to)
    }

    pub fn reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn voucher(mut self, voucher_number: impl Into<String>) -> Self {
        self.voucher_number = Some(voucher_number.into());
        self
    }

    pub fn matches(&self, posted: &PostedEntry) -> bool {
        self.account_code
            .as_deref()
            .is_none_or(|code| posted.account_code() == code)
            && self.from.is_none_or(|from| posted.entry_date >= from)
            && self.to.is_none_or(|to| posted.entry_date <= to)
            && self
                .reference
                .as_ref()
                .is_none_or(|reference| &posted.reference == reference)
            && self
                .voucher_number
                .as_deref()
                .is_none_or(|number| posted.voucher_number == number)
    }
}

/// Unsigned debit and credit sums for one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub debit: Money,
    pub credit: Money,
}

/// One account's position before a window and its entries inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub account: Account,
    /// Sums over entries dated before the window
    pub opening: AccountTotals,
    /// Entries inside the window ordered by (entry_date, sequence)
    pub entries: Vec<PostedEntry>,
}

/// Storage abstraction for the ledger system
///
/// Implementations back the accounting core with any store (PostgreSQL,
/// SQLite, in-memory). Methods take `&self`; a storage value is a shared
/// handle and must serialize `append_voucher` internally.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Insert a new account; fails if the code is taken
    async fn save_account(&self, account: &Account) -> LedgerResult<()>;

    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>>;

    /// List accounts ordered by code, optionally filtered by type
    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>>;

    /// Replace a stored account. Must refuse a type or group change once a
    /// posted entry references the account, checked under the same critical
    /// section as the write.
    async fn update_account(&self, account: &Account) -> LedgerResult<()>;

    /// Remove an account that no posted entry references
    async fn delete_account(&self, code: &str) -> LedgerResult<()>;

    /// Append every entry of a voucher as one unit.
    ///
    /// Must reject a voucher number that was already posted, a second
    /// reversal of the same voucher, and entries against unknown or inactive
    /// accounts, all checked under the same critical section as the write.
    /// Returns the stored entries with their assigned sequence numbers.
    async fn append_voucher(
        &self,
        voucher: &Voucher,
        financial_year: &str,
    ) -> LedgerResult<Vec<PostedEntry>>;

    /// Matching entries ordered by (entry_date, sequence)
    async fn query_entries(&self, query: &EntryQuery) -> LedgerResult<Vec<PostedEntry>>;

    /// Sums over entries dated on or before `as_of` (all entries when `None`)
    async fn account_totals(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<AccountTotals>;

    /// Every account, ordered by code, with sums over entries dated within
    /// `from..=to` (unbounded on a `None` side).
    ///
    /// All figures come from a single consistent view of the books, so a
    /// voucher posted concurrently is either fully counted or not at all.
    async fn totals_snapshot(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<(Account, AccountTotals)>>;

    /// Opening totals and windowed entries of one account from a single
    /// consistent view of the books
    async fn account_activity(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<AccountActivity>;

    async fn has_entries(&self, code: &str) -> LedgerResult<bool>;

    /// Entries of one voucher in posting order; empty if never posted
    async fn voucher_entries(&self, voucher_number: &str) -> LedgerResult<Vec<PostedEntry>>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;

    /// Extra checks before deletion; posted references are checked by the manager
    fn validate_account_deletion(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom voucher validation rules
pub trait VoucherValidator: Send + Sync {
    /// Validate a voucher before posting
    fn validate_voucher(&self, voucher: &Voucher) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        validate_account_code(&account.code)?;
        validate_account_name(&account.name)?;

        if account.group.account_type() != account.account_type {
            return Err(LedgerError::Validation(format!(
                "Account '{}' is {:?} but group {:?} holds {:?} accounts",
                account.code,
                account.account_type,
                account.group,
                account.group.account_type()
            )));
        }

        if account.parent_code.as_deref() == Some(account.code.as_str()) {
            return Err(LedgerError::Validation(format!(
                "Account '{}' cannot be its own parent",
                account.code
            )));
        }

        Ok(())
    }

    fn validate_account_deletion(&self, account: &Account) -> LedgerResult<()> {
        if account.is_system {
            return Err(LedgerError::Validation(format!(
                "System account '{}' cannot be deleted",
                account.code
            )));
        }
        Ok(())
    }
}

/// Default voucher validator: structural double-entry rules
pub struct DefaultVoucherValidator;

impl VoucherValidator for DefaultVoucherValidator {
    fn validate_voucher(&self, voucher: &Voucher) -> LedgerResult<()> {
        voucher.validate()
    }
}

/// Trait for report generation
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Running-balance statement of one account over a date window
    async fn ledger_statement(
        &self,
        account_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<LedgerStatement>;

    async fn trial_balance(&self, as_of: NaiveDate) -> LedgerResult<TrialBalance>;

    async fn profit_and_loss(&self, from: NaiveDate, to: NaiveDate)
        -> LedgerResult<ProfitAndLoss>;

    async fn balance_sheet(&self, as_of: NaiveDate) -> LedgerResult<BalanceSheet>;
}
