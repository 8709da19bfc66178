//! Account management functionality

use chrono::NaiveDate;

use crate::money::Money;
use crate::traits::*;
use crate::types::*;

/// Account manager for handling chart of accounts operations
pub struct AccountManager<S: LedgerStorage> {
    storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account
    pub async fn create_account(&self, account: Account) -> LedgerResult<Account> {
        self.validator.validate_account(&account)?;

        if let Some(ref parent_code) = account.parent_code {
            if self.storage.get_account(parent_code).await?.is_none() {
                return Err(LedgerError::Validation(format!(
                    "Parent account '{}' does not exist",
                    parent_code
                )));
            }
        }

        self.storage.save_account(&account).await?;
        tracing::debug!(code = %account.code, group = ?account.group, "created account");

        Ok(account)
    }

    /// Get an account by code
    pub async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(code).await
    }

    /// Get an account by code, returning an error if not found
    pub async fn get_account_required(&self, code: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(code)
            .await?
            .ok_or_else(|| LedgerError::UnknownAccount {
                account_code: code.to_string(),
                inactive: false,
            })
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(None).await
    }

    /// List accounts by type
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(Some(account_type)).await
    }

    /// Update names, descriptions and hierarchy.
    ///
    /// Type and group are frozen once a posted entry references the account.
    pub async fn update_account(&self, account: &Account) -> LedgerResult<Account> {
        self.validator.validate_account(account)?;
        let existing = self.get_account_required(&account.code).await?;

        // The storage refuses reclassification of a referenced account under its own lock.
        let mut updated = account.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&updated).await?;
        Ok(updated)
    }

    /// Stop an account from receiving postings. Refused while it carries a balance.
    pub async fn deactivate_account(&self, code: &str) -> LedgerResult<Account> {
        let mut account = self.get_account_required(code).await?;
        let balance = self.balance(code, None).await?;
        if !balance.is_zero() {
            return Err(LedgerError::AccountInUse {
                account_code: code.to_string(),
                reason: format!("balance of {} must be cleared before deactivation", balance),
            });
        }

        account.is_active = false;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    pub async fn activate_account(&self, code: &str) -> LedgerResult<Account> {
        let mut account = self.get_account_required(code).await?;
        account.is_active = true;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Delete an account that no posted entry references
    pub async fn delete_account(&self, code: &str) -> LedgerResult<()> {
        let account = self.get_account_required(code).await?;
        self.validator.validate_account_deletion(&account)?;

        if self.storage.has_entries(code).await? {
            return Err(LedgerError::AccountInUse {
                account_code: code.to_string(),
                reason: "cannot delete an account with posted entries".to_string(),
            });
        }

        self.storage.delete_account(code).await
    }

    /// Signed balance per the account's normal side, over entries dated on or
    /// before `as_of` (all entries when `None`)
    pub async fn balance(&self, code: &str, as_of: Option<NaiveDate>) -> LedgerResult<Money> {
        let account = self.get_account_required(code).await?;
        let totals = self.storage.account_totals(code, as_of).await?;
        Ok(account
            .account_type
            .signed_balance(&totals.debit, &totals.credit))
    }

    /// Seed the standard Indian GST chart. Codes that already exist are left alone.
    pub async fn setup_standard_chart(&self) -> LedgerResult<Vec<Account>> {
        let mut created = Vec::new();
        for account in standard_chart() {
            if self.storage.get_account(&account.code).await?.is_some() {
                continue;
            }
            created.push(self.create_account(account).await?);
        }
        tracing::info!(created = created.len(), "seeded standard chart of accounts");
        Ok(created)
    }
}

/// The default chart used by the posting patterns
pub fn standard_chart() -> Vec<Account> {
    use AccountGroup::*;

    let rows: [(&str, &str, AccountGroup); 25] = [
        ("1000", "Cash", CashBank),
        ("1010", "Bank", CashBank),
        ("1100", "Accounts Receivable", AccountsReceivable),
        ("1200", "CGST Input", OtherAssets),
        ("1210", "SGST Input", OtherAssets),
        ("1220", "IGST Input", OtherAssets),
        ("1230", "Cess Input", OtherAssets),
        ("1300", "TDS Receivable", OtherAssets),
        ("1310", "TCS Receivable", OtherAssets),
        ("2100", "Accounts Payable", AccountsPayable),
        ("2200", "CGST Output", DutiesTaxes),
        ("2210", "SGST Output", DutiesTaxes),
        ("2220", "IGST Output", DutiesTaxes),
        ("2230", "Cess Output", DutiesTaxes),
        ("2300", "TDS Payable", DutiesTaxes),
        ("2310", "TCS Payable", DutiesTaxes),
        ("3000", "Capital", Capital),
        ("3100", "Retained Earnings", Reserves),
        ("4000", "Sales", Sales),
        ("4100", "Other Income", OtherIncome),
        ("5000", "Purchase", Purchase),
        ("5100", "Direct Expenses", DirectExpenses),
        ("5200", "Indirect Expenses", IndirectExpenses),
        ("5900", "Round Off", IndirectExpenses),
        ("2900", "Other Liabilities", OtherLiabilities),
    ];

    let mut accounts: Vec<Account> = rows
        .into_iter()
        .map(|(code, name, group)| {
            let mut account = Account::new(code, name, group.account_type(), group);
            account.is_system = true;
            account
        })
        .collect();
    accounts.sort_by(|a, b| a.code.cmp(&b.code));
    accounts
}
