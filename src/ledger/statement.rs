//! Ledger statements, trial balance, profit & loss, and balance sheet

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::money::Money;
use crate::traits::*;
use crate::types::*;

/// One entry on an account statement with the balance after applying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub entry: PostedEntry,
    pub debit: Money,
    pub credit: Money,
    pub running_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStatement {
    pub account: Account,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: Money,
    pub lines: Vec<StatementLine>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub debit: Money,
    pub credit: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    /// Sorted by account code
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub is_balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRow {
    pub account_code: String,
    pub account_name: String,
    pub amount: Money,
}

/// A titled group of statement rows and their sum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSection {
    pub title: String,
    pub rows: Vec<SectionRow>,
    pub total: Money,
}

impl StatementSection {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
            total: Money::zero(),
        }
    }

    fn push(&mut self, account: &Account, amount: Money) {
        if amount.is_zero() {
            return;
        }
        self.total += &amount;
        self.rows.push(SectionRow {
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            amount,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: StatementSection,
    pub cost_of_goods_sold: StatementSection,
    pub gross_profit: Money,
    pub other_income: StatementSection,
    pub operating_expenses: StatementSection,
    pub net_profit: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub current_assets: StatementSection,
    pub fixed_assets: StatementSection,
    pub other_assets: StatementSection,
    pub current_liabilities: StatementSection,
    pub long_term_liabilities: StatementSection,
    pub other_liabilities: StatementSection,
    pub equity: StatementSection,
    /// Cumulative profit not yet closed into an equity account
    pub retained_earnings: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
    pub total_liabilities_and_equity: Money,
    pub balanced: bool,
}

/// Debit and credit columns for a signed balance under the account's normal side
fn trial_balance_columns(account_type: AccountType, balance: &Money) -> (Money, Money) {
    let magnitude = balance.abs();
    let on_normal_side = !balance.is_negative();
    match (account_type.normal_balance(), on_normal_side) {
        (EntryType::Debit, true) | (EntryType::Credit, false) => (magnitude, Money::zero()),
        (EntryType::Debit, false) | (EntryType::Credit, true) => (Money::zero(), magnitude),
    }
}

fn check_range(from: NaiveDate, to: NaiveDate) -> LedgerResult<()> {
    if from > to {
        Err(LedgerError::InvalidDateRange { from, to })
    } else {
        Ok(())
    }
}

#[async_trait]
impl<S: LedgerStorage + Clone> ReportGenerator for Ledger<S> {
    async fn ledger_statement(
        &self,
        account_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<LedgerStatement> {
        check_range(from, to)?;
        let AccountActivity {
            account,
            opening,
            entries,
        } = self.account_activity(account_code, from, to).await?;
        let opening_balance = account
            .account_type
            .signed_balance(&opening.debit, &opening.credit);

        let mut running_balance = opening_balance.clone();
        let mut total_debit = Money::zero();
        let mut total_credit = Money::zero();
        let lines: Vec<StatementLine> = entries
            .into_iter()
            .map(|posted| {
                let debit = posted.entry.debit.clone();
                let credit = posted.entry.credit.clone();
                running_balance += account.account_type.signed_balance(&debit, &credit);
                total_debit += &debit;
                total_credit += &credit;
                StatementLine {
                    entry: posted,
                    debit,
                    credit,
                    running_balance: running_balance.clone(),
                }
            })
            .collect();

        Ok(LedgerStatement {
            account,
            from,
            to,
            opening_balance,
            lines,
            total_debit,
            total_credit,
            closing_balance: running_balance,
        })
    }

    async fn trial_balance(&self, as_of: NaiveDate) -> LedgerResult<TrialBalance> {
        let mut rows = Vec::new();
        let mut total_debit = Money::zero();
        let mut total_credit = Money::zero();

        for (account, balance) in self.balances_as_of(as_of).await? {
            // An inactive account still shows if it carried a balance on that date.
            if !account.is_active && balance.is_zero() {
                continue;
            }
            let (debit, credit) = trial_balance_columns(account.account_type, &balance);
            total_debit += &debit;
            total_credit += &credit;
            rows.push(TrialBalanceRow {
                account_code: account.code,
                account_name: account.name,
                account_type: account.account_type,
                debit,
                credit,
            });
        }
        rows.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        let is_balanced = total_debit == total_credit;
        if !is_balanced {
            tracing::error!(%as_of, %total_debit, %total_credit, "trial balance does not balance");
        }

        Ok(TrialBalance {
            as_of,
            rows,
            total_debit,
            total_credit,
            is_balanced,
        })
    }

    async fn profit_and_loss(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<ProfitAndLoss> {
        check_range(from, to)?;

        let mut revenue = StatementSection::new("Revenue");
        let mut cost_of_goods_sold = StatementSection::new("Cost of Goods Sold");
        let mut other_income = StatementSection::new("Other Income");
        let mut operating_expenses = StatementSection::new("Operating Expenses");

        for (account, activity) in self.signed_totals(Some(from), Some(to)).await? {
            match account.group {
                AccountGroup::Sales => revenue.push(&account, activity),
                AccountGroup::OtherIncome => other_income.push(&account, activity),
                AccountGroup::Purchase | AccountGroup::DirectExpenses => {
                    cost_of_goods_sold.push(&account, activity)
                }
                AccountGroup::IndirectExpenses => operating_expenses.push(&account, activity),
                _ => {}
            }
        }

        let gross_profit = &revenue.total - &cost_of_goods_sold.total;
        let net_profit = &(&gross_profit + &other_income.total) - &operating_expenses.total;

        Ok(ProfitAndLoss {
            from,
            to,
            revenue,
            cost_of_goods_sold,
            gross_profit,
            other_income,
            operating_expenses,
            net_profit,
        })
    }

    async fn balance_sheet(&self, as_of: NaiveDate) -> LedgerResult<BalanceSheet> {
        use AccountGroup::*;

        let mut current_assets = StatementSection::new("Current Assets");
        let mut fixed_assets = StatementSection::new("Fixed Assets");
        let mut other_assets = StatementSection::new("Other Assets");
        let mut current_liabilities = StatementSection::new("Current Liabilities");
        let mut long_term_liabilities = StatementSection::new("Long-term Liabilities");
        let mut other_liabilities = StatementSection::new("Other Liabilities");
        let mut equity = StatementSection::new("Equity");
        let mut retained_earnings = Money::zero();

        for (account, balance) in self.balances_as_of(as_of).await? {
            match account.group {
                CashBank | AccountsReceivable | Inventory => current_assets.push(&account, balance),
                FixedAssets => fixed_assets.push(&account, balance),
                OtherAssets => other_assets.push(&account, balance),
                AccountsPayable | DutiesTaxes => current_liabilities.push(&account, balance),
                Loans => long_term_liabilities.push(&account, balance),
                OtherLiabilities => other_liabilities.push(&account, balance),
                Capital | Reserves => equity.push(&account, balance),
                Sales | OtherIncome => retained_earnings += balance,
                Purchase | DirectExpenses | IndirectExpenses => retained_earnings -= balance,
            }
        }

        let total_assets: Money = [&current_assets.total, &fixed_assets.total, &other_assets.total]
            .into_iter()
            .sum();
        let total_liabilities: Money = [
            &current_liabilities.total,
            &long_term_liabilities.total,
            &other_liabilities.total,
        ]
        .into_iter()
        .sum();
        let total_equity = &equity.total + &retained_earnings;
        let total_liabilities_and_equity = &total_liabilities + &total_equity;
        let balanced = total_assets == total_liabilities_and_equity;

        if !balanced {
            tracing::error!(
                %as_of,
                %total_assets,
                %total_liabilities_and_equity,
                "balance sheet does not balance"
            );
        }

        Ok(BalanceSheet {
            as_of,
            current_assets,
            fixed_assets,
            other_assets,
            current_liabilities,
            long_term_liabilities,
            other_liabilities,
            equity,
            retained_earnings,
            total_assets,
            total_liabilities,
            total_equity,
            total_liabilities_and_equity,
            balanced,
        })
    }
}
