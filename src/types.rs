//! Core types and data structures for the ledger

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// What the business owns (cash, receivables, input tax credit)
    Asset,
    /// What the business owes (payables, output tax, withheld tax)
    Liability,
    /// Owner's interest in the business
    Equity,
    /// Money earned by the business
    Revenue,
    /// Costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance type for this account type.
    /// Assets and Expenses normally have debit balances;
    /// Liabilities, Equity, and Revenue normally have credit balances.
    pub fn normal_balance(&self) -> EntryType {
        match self {
            AccountType::Asset | AccountType::Expense => EntryType::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                EntryType::Credit
            }
        }
    }

    /// Sign a pair of debit/credit totals per the normal balance rule
    pub fn signed_balance(&self, debit: &Money, credit: &Money) -> Money {
        match self.normal_balance() {
            EntryType::Debit => debit - credit,
            EntryType::Credit => credit - debit,
        }
    }
}

/// Reporting group of an account. Each group belongs to exactly one
/// [`AccountType`] and decides where the account lands on statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountGroup {
    CashBank,
    AccountsReceivable,
    Inventory,
    FixedAssets,
    OtherAssets,
    AccountsPayable,
    DutiesTaxes,
    Loans,
    OtherLiabilities,
    Capital,
    Reserves,
    Sales,
    OtherIncome,
    Purchase,
    DirectExpenses,
    IndirectExpenses,
}

impl AccountGroup {
    /// The account type every member of this group must have
    pub fn account_type(&self) -> AccountType {
        use AccountGroup::*;
        match self {
            CashBank | AccountsReceivable | Inventory | FixedAssets | OtherAssets => {
                AccountType::Asset
            }
            AccountsPayable | DutiesTaxes | Loans | OtherLiabilities => AccountType::Liability,
            Capital | Reserves => AccountType::Equity,
            Sales | OtherIncome => AccountType::Revenue,
            Purchase | DirectExpenses | IndirectExpenses => AccountType::Expense,
        }
    }
}

/// Types of entries in double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Increases Assets and Expenses, decreases Liabilities, Equity, and Revenue
    Debit,
    /// Increases Liabilities, Equity, and Revenue, decreases Assets and Expenses
    Credit,
}

/// Chart-of-accounts entry, keyed by its unique code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account code, e.g. "1000"
    pub code: String,
    /// Human-readable account name
    pub name: String,
    pub account_type: AccountType,
    pub group: AccountGroup,
    /// Optional parent account for a hierarchical chart
    pub parent_code: Option<String>,
    pub description: Option<String>,
    /// Inactive accounts cannot receive new postings
    pub is_active: bool,
    /// Seeded accounts that posting patterns depend on
    pub is_system: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new active account
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        group: AccountGroup,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            group,
            parent_code: None,
            description: None,
            is_active: true,
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn normal_balance(&self) -> EntryType {
        self.account_type.normal_balance()
    }
}

/// What kind of business event a voucher records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Invoice,
    Payment,
    Journal,
    Opening,
    Reversal,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Invoice => "INVOICE",
            ReferenceType::Payment => "PAYMENT",
            ReferenceType::Journal => "JOURNAL",
            ReferenceType::Opening => "OPENING",
            ReferenceType::Reversal => "REVERSAL",
        }
    }
}

/// Link from a voucher back to the document that produced it, e.g. `INVOICE#123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceType,
    pub id: String,
}

impl Reference {
    pub fn new(kind: ReferenceType, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.as_str(), self.id)
    }
}

/// One line of a voucher. Exactly one of `debit`/`credit` is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    pub narration: Option<String>,
}

impl JournalEntry {
    /// Create a debit line
    pub fn debit(
        account_code: impl Into<String>,
        amount: Money,
        narration: Option<String>,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Money::zero(),
            narration,
        }
    }

    /// Create a credit line
    pub fn credit(
        account_code: impl Into<String>,
        amount: Money,
        narration: Option<String>,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Money::zero(),
            credit: amount,
            narration,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        if self.debit.is_zero() {
            EntryType::Credit
        } else {
            EntryType::Debit
        }
    }

    /// The same line on the opposite side
    pub fn mirrored(&self) -> Self {
        Self {
            account_code: self.account_code.clone(),
            debit: self.credit.clone(),
            credit: self.debit.clone(),
            narration: self
                .narration
                .as_ref()
                .map(|n| format!("Reversal: {}", n)),
        }
    }

    fn validate(&self, voucher_number: &str) -> LedgerResult<()> {
        let invalid = |reason: &str| LedgerError::InvalidEntry {
            voucher_number: voucher_number.to_string(),
            account_code: self.account_code.clone(),
            reason: reason.to_string(),
        };

        if self.account_code.trim().is_empty() {
            return Err(invalid("account code cannot be empty"));
        }
        if self.debit.is_negative() || self.credit.is_negative() {
            return Err(invalid("debit and credit must not be negative"));
        }
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (true, true) => Err(invalid("entry carries neither a debit nor a credit")),
            (false, false) => Err(invalid("entry carries both a debit and a credit")),
            _ => Ok(()),
        }
    }
}

/// A balanced set of journal entries recording one business transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique across the ledger; a second posting with the same number is rejected
    pub voucher_number: String,
    pub entry_date: NaiveDate,
    pub reference: Reference,
    pub narration: String,
    pub entries: Vec<JournalEntry>,
}

impl Voucher {
    /// Create an empty voucher
    pub fn new(
        voucher_number: impl Into<String>,
        entry_date: NaiveDate,
        reference: Reference,
        narration: impl Into<String>,
    ) -> Self {
        Self {
            voucher_number: voucher_number.into(),
            entry_date,
            reference,
            narration: narration.into(),
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    pub fn total_debits(&self) -> Money {
        self.entries.iter().map(|e| &e.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.entries.iter().map(|e| &e.credit).sum()
    }

    /// Debits equal credits, to the paisa
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Structural validation; account existence is checked by the ledger
    pub fn validate(&self) -> LedgerResult<()> {
        if self.voucher_number.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Voucher number cannot be empty".to_string(),
            ));
        }

        if self.entries.len() < 2 {
            return Err(LedgerError::Validation(format!(
                "Voucher {} must have at least two entries for double-entry bookkeeping",
                self.voucher_number
            )));
        }

        for entry in &self.entries {
            entry.validate(&self.voucher_number)?;
        }

        let total_debit = self.total_debits();
        let total_credit = self.total_credits();
        if total_debit != total_credit {
            return Err(LedgerError::UnbalancedVoucher {
                voucher_number: self.voucher_number.clone(),
                total_debit,
                total_credit,
            });
        }

        Ok(())
    }

    /// Mirror voucher that cancels this one when posted
    pub fn reversal(&self, voucher_number: impl Into<String>, entry_date: NaiveDate) -> Voucher {
        Voucher {
            voucher_number: voucher_number.into(),
            entry_date,
            reference: Reference::new(ReferenceType::Reversal, self.voucher_number.clone()),
            narration: format!("Reversal: {}", self.narration),
            entries: self.entries.iter().map(JournalEntry::mirrored).collect(),
        }
    }
}

/// A journal entry as stored by the ledger. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedEntry {
    /// Ledger-wide posting order; breaks ties between same-day entries
    pub sequence: u64,
    pub voucher_number: String,
    pub entry_date: NaiveDate,
    pub reference: Reference,
    /// Narration of the whole voucher
    pub voucher_narration: String,
    pub financial_year: String,
    pub entry: JournalEntry,
}

impl PostedEntry {
    pub fn account_code(&self) -> &str {
        &self.entry.account_code
    }
}

/// Indian financial-year label for a date, e.g. "2024-25" for an April start
pub fn financial_year(date: NaiveDate, start_month: u32) -> String {
    let start_year = if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{:02}", start_year, (start_year + 1).rem_euclid(100))
}

/// Errors that can occur in the ledger system
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(
        "Voucher {voucher_number} is not balanced: debits = {total_debit}, credits = {total_credit}"
    )]
    UnbalancedVoucher {
        voucher_number: String,
        total_debit: Money,
        total_credit: Money,
    },
    #[error("Unknown or inactive account {account_code} (inactive: {inactive})")]
    UnknownAccount { account_code: String, inactive: bool },
    #[error("Voucher {voucher_number} has already been posted")]
    DuplicateVoucher { voucher_number: String },
    #[error("Voucher {voucher_number} not found")]
    VoucherNotFound { voucher_number: String },
    #[error("Voucher {voucher_number} has already been reversed")]
    AlreadyReversed { voucher_number: String },
    #[error("Invalid entry for account {account_code} in voucher {voucher_number}: {reason}")]
    InvalidEntry {
        voucher_number: String,
        account_code: String,
        reason: String,
    },
    #[error("Account {account_code} is referenced by posted entries: {reason}")]
    AccountInUse { account_code: String, reason: String },
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn voucher(debit: i64, credit: i64) -> Voucher {
        let mut v = Voucher::new(
            "JV/1",
            date(2024, 4, 1),
            Reference::new(ReferenceType::Journal, "1"),
            "Test",
        );
        v.add_entry(JournalEntry::debit("1000", Money::from_rupees(debit), None));
        v.add_entry(JournalEntry::credit("4000", Money::from_rupees(credit), None));
        v
    }

    #[test]
    fn test_normal_balance_by_type() {
        assert_eq!(AccountType::Asset.normal_balance(), EntryType::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), EntryType::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), EntryType::Credit);
        assert_eq!(AccountType::Equity.normal_balance(), EntryType::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), EntryType::Credit);
    }

    #[test]
    fn test_groups_agree_with_types() {
        assert_eq!(AccountGroup::DutiesTaxes.account_type(), AccountType::Liability);
        assert_eq!(AccountGroup::Purchase.account_type(), AccountType::Expense);
        assert_eq!(AccountGroup::Reserves.account_type(), AccountType::Equity);
    }

    #[test]
    fn test_balanced_voucher_validates() {
        assert!(voucher(1000, 1000).validate().is_ok());
    }

    #[test]
    fn test_unbalanced_voucher_is_rejected_with_totals() {
        let err = voucher(1000, 900).validate().unwrap_err();
        assert_eq!(
            err,
            LedgerError::UnbalancedVoucher {
                voucher_number: "JV/1".to_string(),
                total_debit: Money::from_rupees(1000),
                total_credit: Money::from_rupees(900),
            }
        );
    }

    #[test]
    fn test_entry_with_both_sides_is_rejected() {
        let mut v = voucher(100, 100);
        v.entries[0].credit = Money::from_rupees(5);
        assert!(matches!(
            v.validate(),
            Err(LedgerError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_single_entry_voucher_is_rejected() {
        let mut v = voucher(100, 100);
        v.entries.pop();
        assert!(matches!(v.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let original = voucher(500, 500);
        let reversal = original.reversal("JV/2", date(2024, 5, 1));
        assert_eq!(reversal.reference.kind, ReferenceType::Reversal);
        assert_eq!(reversal.reference.id, "JV/1");
        assert_eq!(reversal.entries[0].credit, Money::from_rupees(500));
        assert_eq!(reversal.entries[1].debit, Money::from_rupees(500));
        assert!(reversal.validate().is_ok());
    }

    #[test]
    fn test_financial_year_label() {
        assert_eq!(financial_year(date(2024, 4, 1), 4), "2024-25");
        assert_eq!(financial_year(date(2025, 3, 31), 4), "2024-25");
        assert_eq!(financial_year(date(2099, 12, 1), 4), "2099-00");
        assert_eq!(financial_year(date(2024, 2, 1), 1), "2024-25");
    }
}
