//! Main ledger orchestrator that coordinates accounts and voucher posting

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::PostingConfig;
use crate::ledger::AccountManager;
use crate::money::Money;
use crate::traits::*;
use crate::types::*;

/// Main ledger system that orchestrates all accounting operations
pub struct Ledger<S: LedgerStorage> {
    account_manager: AccountManager<S>,
    storage: S,
    voucher_validator: Box<dyn VoucherValidator>,
    config: PostingConfig,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, PostingConfig::default())
    }

    pub fn with_config(storage: S, config: PostingConfig) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            storage,
            voucher_validator: Box::new(DefaultVoucherValidator),
            config,
        }
    }

    /// Create a new ledger with custom validators
    pub fn with_validators(
        storage: S,
        account_validator: Box<dyn AccountValidator>,
        voucher_validator: Box<dyn VoucherValidator>,
    ) -> Self {
        Self {
            account_manager: AccountManager::with_validator(storage.clone(), account_validator),
            storage,
            voucher_validator,
            config: PostingConfig::default(),
        }
    }

    pub fn config(&self) -> &PostingConfig {
        &self.config
    }

    pub fn accounts(&self) -> &AccountManager<S> {
        &self.account_manager
    }

    // Account operations
    /// Create a new account
    pub async fn create_account(
        &self,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        group: AccountGroup,
    ) -> LedgerResult<Account> {
        self.account_manager
            .create_account(Account::new(code, name, account_type, group))
            .await
    }

    /// Get an account by code
    pub async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.account_manager.get_account(code).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_accounts().await
    }

    /// Setup the standard Indian GST chart of accounts
    pub async fn setup_standard_chart_of_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.account_manager.setup_standard_chart().await
    }

    // Posting
    /// Validate and append a voucher. All of its entries become visible together.
    pub async fn post(&self, voucher: &Voucher) -> LedgerResult<Vec<PostedEntry>> {
        if let Err(err) = self.voucher_validator.validate_voucher(voucher) {
            tracing::warn!(voucher = %voucher.voucher_number, error = %err, "rejected voucher");
            return Err(err);
        }

        let fy = financial_year(voucher.entry_date, self.config.financial_year_start_month);
        match self.storage.append_voucher(voucher, &fy).await {
            Ok(posted) => {
                tracing::info!(
                    voucher = %voucher.voucher_number,
                    reference = %voucher.reference,
                    entries = posted.len(),
                    amount = %voucher.total_debits(),
                    financial_year = %fy,
                    "posted voucher"
                );
                Ok(posted)
            }
            Err(err) => {
                tracing::warn!(voucher = %voucher.voucher_number, error = %err, "rejected voucher");
                Err(err)
            }
        }
    }

    /// Post the mirror image of an already posted voucher
    pub async fn reverse_voucher(
        &self,
        original_number: &str,
        reversal_number: impl Into<String>,
        entry_date: NaiveDate,
    ) -> LedgerResult<Vec<PostedEntry>> {
        let original = self.voucher(original_number).await?;
        if entry_date < original.entry_date {
            return Err(LedgerError::Validation(format!(
                "Reversal of {} cannot be dated before {}",
                original_number, original.entry_date
            )));
        }
        self.post(&original.reversal(reversal_number, entry_date))
            .await
    }

    /// Rebuild a posted voucher from its stored entries
    pub async fn voucher(&self, voucher_number: &str) -> LedgerResult<Voucher> {
        let entries = self.storage.voucher_entries(voucher_number).await?;
        let first = entries
            .first()
            .ok_or_else(|| LedgerError::VoucherNotFound {
                voucher_number: voucher_number.to_string(),
            })?;

        let mut voucher = Voucher::new(
            first.voucher_number.clone(),
            first.entry_date,
            first.reference.clone(),
            first.voucher_narration.clone(),
        );
        for posted in &entries {
            voucher.add_entry(posted.entry.clone());
        }
        Ok(voucher)
    }

    // Queries
    /// Posted entries matching `query`, ordered by (entry_date, sequence)
    pub async fn entries(&self, query: &EntryQuery) -> LedgerResult<Vec<PostedEntry>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(LedgerError::InvalidDateRange { from, to });
            }
        }
        self.storage.query_entries(query).await
    }

    /// Signed balance of an account over entries dated on or before `as_of`
    pub async fn balance(&self, code: &str, as_of: NaiveDate) -> LedgerResult<Money> {
        self.account_manager.balance(code, Some(as_of)).await
    }

    /// Signed balance of an account over every posted entry
    pub async fn current_balance(&self, code: &str) -> LedgerResult<Money> {
        self.account_manager.balance(code, None).await
    }

    /// Every account with its signed movement over entries dated within
    /// `from..=to`, ordered by code and read from one snapshot of the books
    pub(crate) async fn signed_totals(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<(Account, Money)>> {
        let snapshot = self.storage.totals_snapshot(from, to).await?;
        Ok(snapshot
            .into_iter()
            .map(|(account, totals)| {
                let balance = account
                    .account_type
                    .signed_balance(&totals.debit, &totals.credit);
                (account, balance)
            })
            .collect())
    }

    /// Every account with its signed balance as of a date, ordered by code
    pub(crate) async fn balances_as_of(
        &self,
        as_of: NaiveDate,
    ) -> LedgerResult<Vec<(Account, Money)>> {
        self.signed_totals(None, Some(as_of)).await
    }

    /// Opening totals and windowed entries of one account, read together
    pub(crate) async fn account_activity(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<AccountActivity> {
        self.storage.account_activity(code, from, to).await
    }

    /// Validate the integrity of the ledger
    pub async fn validate_integrity(
        &self,
        as_of: NaiveDate,
    ) -> LedgerResult<LedgerIntegrityReport> {
        let trial_balance = self.trial_balance(as_of).await?;
        let balance_sheet = self.balance_sheet(as_of).await?;

        let mut issues = Vec::new();

        if !trial_balance.is_balanced {
            issues.push(format!(
                "Trial balance is not balanced: debits = {}, credits = {}",
                trial_balance.total_debit, trial_balance.total_credit
            ));
        }

        if !balance_sheet.balanced {
            issues.push(format!(
                "Balance sheet is not balanced: assets = {}, liabilities + equity = {}",
                balance_sheet.total_assets, balance_sheet.total_liabilities_and_equity
            ));
        }

        let entries = self.storage.query_entries(&EntryQuery::new().to(as_of)).await?;
        let mut per_voucher: BTreeMap<&str, AccountTotals> = BTreeMap::new();
        for posted in &entries {
            let totals = per_voucher.entry(posted.voucher_number.as_str()).or_default();
            totals.debit += &posted.entry.debit;
            totals.credit += &posted.entry.credit;
        }
        for (number, totals) in per_voucher {
            if totals.debit != totals.credit {
                issues.push(format!(
                    "Voucher {} is not balanced: debits = {}, credits = {}",
                    number, totals.debit, totals.credit
                ));
            }
        }

        Ok(LedgerIntegrityReport {
            as_of,
            is_valid: issues.is_empty(),
            issues,
            trial_balance_total_debit: trial_balance.total_debit,
            trial_balance_total_credit: trial_balance.total_credit,
            balance_sheet_total_assets: balance_sheet.total_assets,
            balance_sheet_total_liabilities_equity: balance_sheet.total_liabilities_and_equity,
        })
    }
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub as_of: NaiveDate,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub trial_balance_total_debit: Money,
    pub trial_balance_total_credit: Money,
    pub balance_sheet_total_assets: Money,
    pub balance_sheet_total_liabilities_equity: Money,
}
