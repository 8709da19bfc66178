//! Voucher construction and the standard GST posting patterns

use chrono::NaiveDate;

use crate::money::Money;
use crate::types::*;

/// Voucher builder for creating multi-leg vouchers
#[derive(Debug)]
pub struct VoucherBuilder {
    voucher: Voucher,
}

impl VoucherBuilder {
    pub fn new(
        voucher_number: impl Into<String>,
        entry_date: NaiveDate,
        reference: Reference,
        narration: impl Into<String>,
    ) -> Self {
        Self {
            voucher: Voucher::new(voucher_number, entry_date, reference, narration),
        }
    }

    /// Add a debit entry
    pub fn debit(
        mut self,
        account_code: impl Into<String>,
        amount: Money,
        narration: Option<String>,
    ) -> Self {
        self.voucher
            .add_entry(JournalEntry::debit(account_code, amount, narration));
        self
    }

    /// Add a credit entry
    pub fn credit(
        mut self,
        account_code: impl Into<String>,
        amount: Money,
        narration: Option<String>,
    ) -> Self {
        self.voucher
            .add_entry(JournalEntry::credit(account_code, amount, narration));
        self
    }

    /// Add a custom entry
    pub fn entry(mut self, entry: JournalEntry) -> Self {
        self.voucher.add_entry(entry);
        self
    }

    /// Add a leg on `side` unless `amount` is zero
    pub fn leg(self, side: EntryType, account_code: &str, amount: &Money, narration: &str) -> Self {
        if amount.is_zero() {
            return self;
        }
        let narration = Some(narration.to_string());
        match side {
            EntryType::Debit => self.debit(account_code, amount.clone(), narration),
            EntryType::Credit => self.credit(account_code, amount.clone(), narration),
        }
    }

    /// Build the voucher, checking double-entry rules
    pub fn build(self) -> LedgerResult<Voucher> {
        self.voucher.validate()?;
        Ok(self.voucher)
    }
}

/// Common posting patterns for GST documents and settlements
pub mod patterns {
    use super::*;
    use crate::config::PostingAccounts;
    use crate::tax::gst::DocumentTotals;

    /// Parameters for posting a tax document (invoice or note)
    #[derive(Debug, Clone)]
    pub struct DocumentPostingParams<'a> {
        pub voucher_number: String,
        pub entry_date: NaiveDate,
        /// Id of the invoice, bill, or note being posted
        pub document_id: String,
        pub narration: String,
        pub totals: &'a DocumentTotals,
    }

    /// Parameters for posting a receipt or payment against a party
    #[derive(Debug, Clone)]
    pub struct SettlementParams {
        pub voucher_number: String,
        pub entry_date: NaiveDate,
        pub payment_id: String,
        pub narration: String,
        /// Amount the party's balance is cleared by
        pub gross_amount: Money,
        /// Portion withheld as TDS instead of changing hands
        pub tds_amount: Money,
        /// Settled through the bank account rather than cash
        pub via_bank: bool,
    }

    struct Leg<'a> {
        side: EntryType,
        account_code: &'a str,
        amount: Money,
        narration: &'static str,
    }

    fn leg<'a>(
        side: EntryType,
        account_code: &'a str,
        amount: &Money,
        narration: &'static str,
    ) -> Leg<'a> {
        Leg {
            side,
            account_code,
            amount: amount.clone(),
            narration,
        }
    }

    fn opposite(side: EntryType) -> EntryType {
        match side {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }

    fn assemble(
        voucher_number: String,
        entry_date: NaiveDate,
        reference: Reference,
        narration: String,
        legs: Vec<Leg<'_>>,
        flip: bool,
    ) -> LedgerResult<Voucher> {
        legs.into_iter()
            .fold(
                VoucherBuilder::new(voucher_number, entry_date, reference, narration),
                |builder, l| {
                    let side = if flip { opposite(l.side) } else { l.side };
                    builder.leg(side, l.account_code, &l.amount, l.narration)
                },
            )
            .build()
    }

    /// Split the GST of a document into CGST/SGST or IGST legs on `side`
    fn gst_legs<'a>(
        side: EntryType,
        totals: &DocumentTotals,
        cgst: &'a str,
        sgst: &'a str,
        igst: &'a str,
    ) -> Vec<Leg<'a>> {
        if totals.is_igst {
            vec![leg(side, igst, &totals.igst_amount, "IGST")]
        } else {
            vec![
                leg(side, cgst, &totals.cgst_amount, "CGST"),
                leg(side, sgst, &totals.sgst_amount, "SGST"),
            ]
        }
    }

    fn sales_legs<'a>(accounts: &'a PostingAccounts, totals: &DocumentTotals) -> Vec<Leg<'a>> {
        use EntryType::*;
        let mut legs = vec![
            leg(Debit, &accounts.accounts_receivable, &totals.net_payable, "Receivable"),
            leg(Debit, &accounts.tds_receivable, &totals.tds_amount, "TDS deducted by customer"),
            leg(Credit, &accounts.sales, &totals.taxable_amount, "Sales"),
        ];
        legs.extend(gst_legs(
            Credit,
            totals,
            &accounts.cgst_output,
            &accounts.sgst_output,
            &accounts.igst_output,
        ));
        legs.push(leg(Credit, &accounts.cess_output, &totals.cess_amount, "Cess"));
        legs.push(leg(Credit, &accounts.tcs_payable, &totals.tcs_amount, "TCS collected"));
        legs
    }

    fn purchase_legs<'a>(accounts: &'a PostingAccounts, totals: &DocumentTotals) -> Vec<Leg<'a>> {
        use EntryType::*;
        let mut legs = vec![leg(Debit, &accounts.purchases, &totals.taxable_amount, "Purchase")];
        legs.extend(gst_legs(
            Debit,
            totals,
            &accounts.cgst_input,
            &accounts.sgst_input,
            &accounts.igst_input,
        ));
        legs.push(leg(Debit, &accounts.cess_input, &totals.cess_amount, "Cess"));
        legs.push(leg(Debit, &accounts.tcs_receivable, &totals.tcs_amount, "TCS paid to vendor"));
        legs.push(leg(Credit, &accounts.accounts_payable, &totals.net_payable, "Payable"));
        legs.push(leg(Credit, &accounts.tds_payable, &totals.tds_amount, "TDS deducted"));
        legs
    }

    /// Sales invoice: Dr receivables and TDS receivable; Cr sales, output
    /// tax, and TCS payable
    pub fn sales_invoice(
        accounts: &PostingAccounts,
        params: DocumentPostingParams<'_>,
    ) -> LedgerResult<Voucher> {
        assemble(
            params.voucher_number,
            params.entry_date,
            Reference::new(ReferenceType::Invoice, params.document_id),
            params.narration,
            sales_legs(accounts, params.totals),
            false,
        )
    }

    /// Purchase bill: Dr purchases, input tax, and TCS receivable; Cr
    /// payables and TDS payable
    pub fn purchase_invoice(
        accounts: &PostingAccounts,
        params: DocumentPostingParams<'_>,
    ) -> LedgerResult<Voucher> {
        assemble(
            params.voucher_number,
            params.entry_date,
            Reference::new(ReferenceType::Invoice, params.document_id),
            params.narration,
            purchase_legs(accounts, params.totals),
            false,
        )
    }

    /// Credit note issued to a customer; the sales invoice legs with sides swapped
    pub fn credit_note(
        accounts: &PostingAccounts,
        params: DocumentPostingParams<'_>,
    ) -> LedgerResult<Voucher> {
        assemble(
            params.voucher_number,
            params.entry_date,
            Reference::new(ReferenceType::Invoice, params.document_id),
            params.narration,
            sales_legs(accounts, params.totals),
            true,
        )
    }

    /// Debit note raised on a vendor; the purchase legs with sides swapped
    pub fn debit_note(
        accounts: &PostingAccounts,
        params: DocumentPostingParams<'_>,
    ) -> LedgerResult<Voucher> {
        assemble(
            params.voucher_number,
            params.entry_date,
            Reference::new(ReferenceType::Invoice, params.document_id),
            params.narration,
            purchase_legs(accounts, params.totals),
            true,
        )
    }

    fn settlement_account(accounts: &PostingAccounts, via_bank: bool) -> &str {
        if via_bank {
            &accounts.bank
        } else {
            &accounts.cash
        }
    }

    /// Customer receipt: Dr bank/cash (net) and TDS receivable; Cr receivables (gross)
    pub fn customer_receipt(
        accounts: &PostingAccounts,
        params: SettlementParams,
    ) -> LedgerResult<Voucher> {
        use EntryType::*;
        let received = &params.gross_amount - &params.tds_amount;
        let legs = vec![
            leg(Debit, settlement_account(accounts, params.via_bank), &received, "Amount received"),
            leg(Debit, &accounts.tds_receivable, &params.tds_amount, "TDS deducted by customer"),
            leg(Credit, &accounts.accounts_receivable, &params.gross_amount, "Receivable cleared"),
        ];
        assemble(
            params.voucher_number,
            params.entry_date,
            Reference::new(ReferenceType::Payment, params.payment_id),
            params.narration,
            legs,
            false,
        )
    }

    /// Vendor payment: Dr payables (gross); Cr bank/cash (net) and TDS payable
    pub fn vendor_payment(
        accounts: &PostingAccounts,
        params: SettlementParams,
    ) -> LedgerResult<Voucher> {
        use EntryType::*;
        let paid = &params.gross_amount - &params.tds_amount;
        let legs = vec![
            leg(Debit, &accounts.accounts_payable, &params.gross_amount, "Payable cleared"),
            leg(Credit, settlement_account(accounts, params.via_bank), &paid, "Amount paid"),
            leg(Credit, &accounts.tds_payable, &params.tds_amount, "TDS deducted"),
        ];
        assemble(
            params.voucher_number,
            params.entry_date,
            Reference::new(ReferenceType::Payment, params.payment_id),
            params.narration,
            legs,
            false,
        )
    }
}
