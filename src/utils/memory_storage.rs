//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Books {
    accounts: BTreeMap<String, Account>,
    /// Append-only, in sequence order
    entries: Vec<PostedEntry>,
    /// Voucher number → indices into `entries`
    vouchers: HashMap<String, Vec<usize>>,
    /// Voucher numbers that already have a posted reversal
    reversed: HashSet<String>,
    next_sequence: u64,
}

impl Books {
    fn references(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.account_code() == code)
    }
}

/// In-memory storage implementation for testing and development.
///
/// Clones share the same books, so a clone can be handed to another task.
/// Each append holds the write lock for the whole voucher.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    books: Arc<RwLock<Books>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Books>> {
        self.books
            .read()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Books>> {
        self.books
            .write()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }

    /// Number of posted entries across all vouchers
    pub fn entry_count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.entries.len())
    }
}

fn unknown(code: &str) -> LedgerError {
    LedgerError::UnknownAccount {
        account_code: code.to_string(),
        inactive: false,
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_account(&self, account: &Account) -> LedgerResult<()> {
        let mut books = self.write()?;
        if books.accounts.contains_key(&account.code) {
            return Err(LedgerError::Validation(format!(
                "Account with code '{}' already exists",
                account.code
            )));
        }
        books.accounts.insert(account.code.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(code).cloned())
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let books = self.read()?;
        Ok(books
            .accounts
            .values()
            .filter(|account| account_type.is_none_or(|t| account.account_type == t))
            .cloned()
            .collect())
    }

    async fn update_account(&self, account: &Account) -> LedgerResult<()> {
        let mut books = self.write()?;
        let referenced = books.references(&account.code);
        match books.accounts.get_mut(&account.code) {
            Some(existing) => {
                let reclassified = existing.account_type != account.account_type
                    || existing.group != account.group;
                if reclassified && referenced {
                    return Err(LedgerError::AccountInUse {
                        account_code: account.code.clone(),
                        reason: "type and group cannot change once entries are posted"
                            .to_string(),
                    });
                }
                *existing = account.clone();
                Ok(())
            }
            None => Err(unknown(&account.code)),
        }
    }

    async fn delete_account(&self, code: &str) -> LedgerResult<()> {
        let mut books = self.write()?;
        if books.references(code) {
            return Err(LedgerError::AccountInUse {
                account_code: code.to_string(),
                reason: "cannot delete an account with posted entries".to_string(),
            });
        }
        books
            .accounts
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| unknown(code))
    }

    async fn append_voucher(
        &self,
        voucher: &Voucher,
        financial_year: &str,
    ) -> LedgerResult<Vec<PostedEntry>> {
        let mut books = self.write()?;

        if books.vouchers.contains_key(&voucher.voucher_number) {
            return Err(LedgerError::DuplicateVoucher {
                voucher_number: voucher.voucher_number.clone(),
            });
        }

        if voucher.reference.kind == ReferenceType::Reversal
            && books.reversed.contains(&voucher.reference.id)
        {
            return Err(LedgerError::AlreadyReversed {
                voucher_number: voucher.reference.id.clone(),
            });
        }

        for entry in &voucher.entries {
            match books.accounts.get(&entry.account_code) {
                Some(account) if account.is_active => {}
                Some(_) => {
                    return Err(LedgerError::UnknownAccount {
                        account_code: entry.account_code.clone(),
                        inactive: true,
                    })
                }
                None => return Err(unknown(&entry.account_code)),
            }
        }

        // Nothing below can fail, so the voucher lands whole or not at all.
        let mut posted = Vec::with_capacity(voucher.entries.len());
        let mut indices = Vec::with_capacity(voucher.entries.len());
        for entry in &voucher.entries {
            books.next_sequence += 1;
            let record = PostedEntry {
                sequence: books.next_sequence,
                voucher_number: voucher.voucher_number.clone(),
                entry_date: voucher.entry_date,
                reference: voucher.reference.clone(),
                voucher_narration: voucher.narration.clone(),
                financial_year: financial_year.to_string(),
                entry: entry.clone(),
            };
            indices.push(books.entries.len());
            books.entries.push(record.clone());
            posted.push(record);
        }
        books
            .vouchers
            .insert(voucher.voucher_number.clone(), indices);
        if voucher.reference.kind == ReferenceType::Reversal {
            books.reversed.insert(voucher.reference.id.clone());
        }

        Ok(posted)
    }

    async fn query_entries(&self, query: &EntryQuery) -> LedgerResult<Vec<PostedEntry>> {
        let books = self.read()?;
        let mut entries: Vec<PostedEntry> = books
            .entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.entry_date, e.sequence));
        Ok(entries)
    }

    async fn account_totals(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<AccountTotals> {
        let books = self.read()?;
        let mut totals = AccountTotals::default();
        for posted in books.entries.iter().filter(|e| {
            e.account_code() == code && as_of.is_none_or(|date| e.entry_date <= date)
        }) {
            totals.debit += &posted.entry.debit;
            totals.credit += &posted.entry.credit;
        }
        Ok(totals)
    }

    async fn totals_snapshot(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<(Account, AccountTotals)>> {
        let books = self.read()?;
        let mut totals: HashMap<&str, AccountTotals> = HashMap::new();
        for posted in books.entries.iter().filter(|e| {
            from.is_none_or(|from| e.entry_date >= from) && to.is_none_or(|to| e.entry_date <= to)
        }) {
            let account = totals.entry(posted.account_code()).or_default();
            account.debit += &posted.entry.debit;
            account.credit += &posted.entry.credit;
        }

        Ok(books
            .accounts
            .values()
            .map(|account| {
                let sums = totals.remove(account.code.as_str()).unwrap_or_default();
                (account.clone(), sums)
            })
            .collect())
    }

    async fn account_activity(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<AccountActivity> {
        let books = self.read()?;
        let account = books.accounts.get(code).cloned().ok_or_else(|| unknown(code))?;

        let mut opening = AccountTotals::default();
        let mut entries = Vec::new();
        for posted in books.entries.iter().filter(|e| e.account_code() == code) {
            if posted.entry_date < from {
                opening.debit += &posted.entry.debit;
                opening.credit += &posted.entry.credit;
            } else if posted.entry_date <= to {
                entries.push(posted.clone());
            }
        }
        entries.sort_by_key(|e| (e.entry_date, e.sequence));

        Ok(AccountActivity {
            account,
            opening,
            entries,
        })
    }

    async fn has_entries(&self, code: &str) -> LedgerResult<bool> {
        Ok(self.read()?.references(code))
    }

    async fn voucher_entries(&self, voucher_number: &str) -> LedgerResult<Vec<PostedEntry>> {
        let books = self.read()?;
        Ok(books
            .vouchers
            .get(voucher_number)
            .map(|indices| indices.iter().map(|&i| books.entries[i].clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    async fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .save_account(&Account::new("1000", "Cash", AccountType::Asset, AccountGroup::CashBank))
            .await
            .unwrap();
        storage
            .save_account(&Account::new("4000", "Sales", AccountType::Revenue, AccountGroup::Sales))
            .await
            .unwrap();
        storage
    }

    fn voucher(number: &str, day: u32, amount: i64) -> Voucher {
        let mut v = Voucher::new(
            number,
            date(day),
            Reference::new(ReferenceType::Invoice, number),
            "Cash sale",
        );
        v.add_entry(JournalEntry::debit("1000", Money::from_rupees(amount), None));
        v.add_entry(JournalEntry::credit("4000", Money::from_rupees(amount), None));
        v
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequences() {
        let storage = storage().await;
        let first = storage.append_voucher(&voucher("V1", 5, 100), "2024-25").await.unwrap();
        let second = storage.append_voucher(&voucher("V2", 5, 50), "2024-25").await.unwrap();

        assert_eq!(first[0].sequence, 1);
        assert_eq!(first[1].sequence, 2);
        assert_eq!(second[0].sequence, 3);
        assert_eq!(storage.voucher_entries("V2").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_voucher_leaves_books_untouched() {
        let storage = storage().await;
        storage.append_voucher(&voucher("V1", 5, 100), "2024-25").await.unwrap();

        let err = storage
            .append_voucher(&voucher("V1", 6, 999), "2024-25")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateVoucher {
                voucher_number: "V1".to_string()
            }
        );
        assert_eq!(storage.entry_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_account_rejects_whole_voucher() {
        let storage = storage().await;
        let mut v = voucher("V1", 5, 100);
        v.entries[1].account_code = "9999".to_string();

        assert!(matches!(
            storage.append_voucher(&v, "2024-25").await,
            Err(LedgerError::UnknownAccount { inactive: false, .. })
        ));
        assert_eq!(storage.entry_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_orders_by_date_then_sequence() {
        let storage = storage().await;
        storage.append_voucher(&voucher("LATE", 9, 1), "2024-25").await.unwrap();
        storage.append_voucher(&voucher("EARLY-A", 2, 2), "2024-25").await.unwrap();
        storage.append_voucher(&voucher("EARLY-B", 2, 3), "2024-25").await.unwrap();

        let entries = storage
            .query_entries(&EntryQuery::new().account("1000"))
            .await
            .unwrap();
        let numbers: Vec<_> = entries.iter().map(|e| e.voucher_number.as_str()).collect();
        assert_eq!(numbers, vec!["EARLY-A", "EARLY-B", "LATE"]);
    }

    #[tokio::test]
    async fn test_account_totals_respect_as_of() {
        let storage = storage().await;
        storage.append_voucher(&voucher("V1", 1, 100), "2024-25").await.unwrap();
        storage.append_voucher(&voucher("V2", 10, 40), "2024-25").await.unwrap();

        let totals = storage.account_totals("1000", Some(date(5))).await.unwrap();
        assert_eq!(totals.debit, Money::from_rupees(100));
        assert_eq!(totals.credit, Money::zero());

        let totals = storage.account_totals("4000", None).await.unwrap();
        assert_eq!(totals.credit, Money::from_rupees(140));
    }

    #[tokio::test]
    async fn test_snapshot_covers_every_account_in_code_order() {
        let storage = storage().await;
        storage.append_voucher(&voucher("V1", 1, 100), "2024-25").await.unwrap();
        storage.append_voucher(&voucher("V2", 10, 40), "2024-25").await.unwrap();

        let snapshot = storage.totals_snapshot(None, Some(date(5))).await.unwrap();
        let codes: Vec<_> = snapshot.iter().map(|(a, _)| a.code.as_str()).collect();
        assert_eq!(codes, vec!["1000", "4000"]);
        assert_eq!(snapshot[0].1.debit, Money::from_rupees(100));
        assert_eq!(snapshot[1].1.credit, Money::from_rupees(100));

        let window = storage
            .totals_snapshot(Some(date(2)), Some(date(30)))
            .await
            .unwrap();
        assert_eq!(window[0].1.debit, Money::from_rupees(40));
    }

    #[tokio::test]
    async fn test_account_activity_splits_opening_from_window() {
        let storage = storage().await;
        storage.append_voucher(&voucher("V1", 1, 100), "2024-25").await.unwrap();
        storage.append_voucher(&voucher("V2", 10, 40), "2024-25").await.unwrap();
        storage.append_voucher(&voucher("V3", 20, 5), "2024-25").await.unwrap();

        let activity = storage
            .account_activity("1000", date(10), date(15))
            .await
            .unwrap();
        assert_eq!(activity.opening.debit, Money::from_rupees(100));
        assert_eq!(activity.entries.len(), 1);
        assert_eq!(activity.entries[0].voucher_number, "V2");

        assert!(matches!(
            storage.account_activity("9999", date(1), date(2)).await,
            Err(LedgerError::UnknownAccount { .. })
        ));
    }

    #[tokio::test]
    async fn test_referenced_account_cannot_be_reclassified() {
        let storage = storage().await;
        storage.append_voucher(&voucher("V1", 1, 100), "2024-25").await.unwrap();

        let mut renamed = storage.get_account("4000").await.unwrap().unwrap();
        renamed.name = "Service Revenue".to_string();
        storage.update_account(&renamed).await.unwrap();

        let mut regrouped = renamed.clone();
        regrouped.group = AccountGroup::OtherIncome;
        assert!(matches!(
            storage.update_account(&regrouped).await,
            Err(LedgerError::AccountInUse { .. })
        ));
        let stored = storage.get_account("4000").await.unwrap().unwrap();
        assert_eq!(stored.group, AccountGroup::Sales);
        assert_eq!(stored.name, "Service Revenue");
    }

    #[tokio::test]
    async fn test_referenced_account_cannot_be_deleted() {
        let storage = storage().await;
        storage.append_voucher(&voucher("V1", 1, 100), "2024-25").await.unwrap();

        assert!(matches!(
            storage.delete_account("1000").await,
            Err(LedgerError::AccountInUse { .. })
        ));
        assert!(storage.has_entries("1000").await.unwrap());
    }
}
