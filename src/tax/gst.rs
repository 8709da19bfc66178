//! GST (Goods and Services Tax) computation engine for Indian tax compliance
//!
//! [`compute_totals`] turns a [`TaxableDocument`] into [`DocumentTotals`]:
//! line discounts first, then the header discount spread proportionally over
//! every line, then GST and CESS per line on the discounted base, then the
//! CGST/SGST or IGST split, then TDS (on the taxable base) and TCS (on the
//! tax-inclusive total). Intermediates stay exact; each emitted field is
//! rounded once, half-up, to two decimals.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::money::{percent_of, Money};

/// GST slabs permitted on a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GstSlab {
    /// Nil-rated and exempt supplies - 0%
    Nil,
    /// 5%
    Five,
    /// 12%
    Twelve,
    /// 18%, most services
    Eighteen,
    /// 28%, luxury and sin goods
    TwentyEight,
}

impl GstSlab {
    pub const ALL: [GstSlab; 5] = [
        GstSlab::Nil,
        GstSlab::Five,
        GstSlab::Twelve,
        GstSlab::Eighteen,
        GstSlab::TwentyEight,
    ];

    /// Rate percentage for this slab
    pub fn rate(&self) -> BigDecimal {
        match self {
            GstSlab::Nil => BigDecimal::from(0),
            GstSlab::Five => BigDecimal::from(5),
            GstSlab::Twelve => BigDecimal::from(12),
            GstSlab::Eighteen => BigDecimal::from(18),
            GstSlab::TwentyEight => BigDecimal::from(28),
        }
    }

    /// Resolve a raw percentage to a slab
    pub fn from_rate(rate: &BigDecimal) -> Option<GstSlab> {
        Self::ALL.into_iter().find(|slab| &slab.rate() == rate)
    }
}

/// A single priced line on a PO, proforma invoice, or invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    /// Must be greater than zero
    pub quantity: BigDecimal,
    /// Must be greater than zero
    pub unit_rate: BigDecimal,
    /// Line discount percentage, 0 to 100
    pub discount_percent: BigDecimal,
    /// One of the [`GstSlab`] rates
    pub gst_rate: BigDecimal,
    /// Compensation cess percentage, zero or more
    pub cess_rate: BigDecimal,
}

impl LineItem {
    /// Line with no discount and no cess
    pub fn new(
        description: impl Into<String>,
        quantity: BigDecimal,
        unit_rate: BigDecimal,
        gst_rate: BigDecimal,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_rate,
            discount_percent: BigDecimal::from(0),
            gst_rate,
            cess_rate: BigDecimal::from(0),
        }
    }

    pub fn with_discount(mut self, discount_percent: BigDecimal) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn with_cess(mut self, cess_rate: BigDecimal) -> Self {
        self.cess_rate = cess_rate;
        self
    }

    /// quantity × unit_rate, exact
    pub fn gross_amount(&self) -> BigDecimal {
        &self.quantity * &self.unit_rate
    }

    /// Gross amount after the line discount, exact
    pub fn taxable_amount(&self) -> BigDecimal {
        let gross = self.gross_amount();
        &gross - percent_of(&gross, &self.discount_percent)
    }

    fn validate(&self, index: usize) -> TaxResult<()> {
        let zero = BigDecimal::from(0);
        let invalid = |reason: &str| TaxError::InvalidLineItem {
            index,
            reason: reason.to_string(),
        };

        if self.quantity <= zero {
            return Err(invalid("quantity must be greater than zero"));
        }
        if self.unit_rate <= zero {
            return Err(invalid("unit rate must be greater than zero"));
        }
        if !is_percentage(&self.discount_percent) {
            return Err(invalid("discount must be between 0 and 100 percent"));
        }
        if self.cess_rate < zero {
            return Err(invalid("cess rate cannot be negative"));
        }
        if GstSlab::from_rate(&self.gst_rate).is_none() {
            return Err(TaxError::InvalidTaxRate {
                index,
                rate: self.gst_rate.clone(),
            });
        }
        Ok(())
    }
}

/// Withholding applied to a document (TDS or TCS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withholding {
    pub rate: BigDecimal,
    /// Income-tax section, e.g. "194J"; informational
    pub section: Option<String>,
}

impl Withholding {
    pub fn new(rate: BigDecimal) -> Self {
        Self {
            rate,
            section: None,
        }
    }

    pub fn under_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

/// Everything the tax engine needs to total a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxableDocument {
    pub line_items: Vec<LineItem>,
    /// Applied after line discounts, spread proportionally over the lines
    pub discount_percent: BigDecimal,
    /// Inter-state supply: IGST only. Otherwise CGST + SGST in equal halves.
    pub is_igst: bool,
    /// Present when TDS applies
    pub tds: Option<Withholding>,
    /// Present when TCS applies
    pub tcs: Option<Withholding>,
}

impl TaxableDocument {
    /// Intra-state document without header discount or withholding
    pub fn new(line_items: Vec<LineItem>) -> Self {
        Self {
            line_items,
            discount_percent: BigDecimal::from(0),
            is_igst: false,
            tds: None,
            tcs: None,
        }
    }

    pub fn inter_state(mut self) -> Self {
        self.is_igst = true;
        self
    }

    pub fn with_discount(mut self, discount_percent: BigDecimal) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn with_tds(mut self, tds: Withholding) -> Self {
        self.tds = Some(tds);
        self
    }

    pub fn with_tcs(mut self, tcs: Withholding) -> Self {
        self.tcs = Some(tcs);
        self
    }

    /// Validate eagerly so no partial totals are ever produced
    pub fn validate(&self) -> TaxResult<()> {
        if self.line_items.is_empty() {
            return Err(TaxError::EmptyDocument);
        }
        for (index, item) in self.line_items.iter().enumerate() {
            item.validate(index)?;
        }
        if !is_percentage(&self.discount_percent) {
            return Err(TaxError::InvalidDiscount {
                discount_percent: self.discount_percent.clone(),
            });
        }
        for (kind, withholding) in [("TDS", &self.tds), ("TCS", &self.tcs)] {
            if let Some(w) = withholding {
                if !is_percentage(&w.rate) {
                    return Err(TaxError::InvalidWithholdingRate {
                        kind,
                        rate: w.rate.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Per-line breakdown, rounded for display. Aggregates in [`DocumentTotals`]
/// are computed from the exact values, not by summing these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTotals {
    pub gross_amount: Money,
    /// After the line discount and this line's share of the header discount
    pub taxable_amount: Money,
    pub gst_amount: Money,
    pub cess_amount: Money,
    pub line_total: Money,
}

/// Tax-correct totals for a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Σ gross amounts, before any discount
    pub subtotal: Money,
    /// Σ line-level discounts
    pub line_discount_amount: Money,
    /// Header discount taken off the post-line-discount base
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub cgst_amount: Money,
    pub sgst_amount: Money,
    pub igst_amount: Money,
    pub cess_amount: Money,
    /// CGST + SGST + IGST + CESS
    pub total_tax: Money,
    /// taxable + all taxes
    pub total_amount: Money,
    pub tds_amount: Money,
    pub tcs_amount: Money,
    /// total − TDS + TCS
    pub net_payable: Money,
    pub is_igst: bool,
    pub lines: Vec<LineTotals>,
}

impl DocumentTotals {
    /// GST alone (CGST + SGST + IGST), without CESS
    pub fn gst_amount(&self) -> Money {
        &(&self.cgst_amount + &self.sgst_amount) + &self.igst_amount
    }
}

/// Compute the totals of a document. Pure; the caller decides when to recompute.
pub fn compute_totals(doc: &TaxableDocument) -> TaxResult<DocumentTotals> {
    doc.validate()?;

    let zero = BigDecimal::from(0);
    let header_factor =
        BigDecimal::from(1) - percent_of(&BigDecimal::from(1), &doc.discount_percent);

    let mut gross_sum = zero.clone();
    let mut line_taxable_sum = zero.clone();
    let mut gst_sum = zero.clone();
    let mut cess_sum = zero.clone();
    let mut lines = Vec::with_capacity(doc.line_items.len());

    for item in &doc.line_items {
        let gross = item.gross_amount();
        let line_taxable = item.taxable_amount();
        let adjusted_taxable = &line_taxable * &header_factor;
        let gst = percent_of(&adjusted_taxable, &item.gst_rate);
        let cess = percent_of(&adjusted_taxable, &item.cess_rate);

        lines.push(LineTotals {
            gross_amount: Money::from_decimal(&gross),
            taxable_amount: Money::from_decimal(&adjusted_taxable),
            gst_amount: Money::from_decimal(&gst),
            cess_amount: Money::from_decimal(&cess),
            line_total: Money::from_decimal(&(&adjusted_taxable + &gst + &cess)),
        });

        gross_sum += gross;
        line_taxable_sum += line_taxable;
        gst_sum += gst;
        cess_sum += cess;
    }

    let subtotal = Money::from_decimal(&gross_sum);
    let line_taxable = Money::from_decimal(&line_taxable_sum);
    let line_discount_amount = &subtotal - &line_taxable;
    let discount_amount =
        Money::from_decimal(&percent_of(&line_taxable_sum, &doc.discount_percent));
    let taxable_amount = &line_taxable - &discount_amount;

    let (cgst_amount, sgst_amount, igst_amount) = if doc.is_igst {
        (Money::zero(), Money::zero(), Money::from_decimal(&gst_sum))
    } else {
        let half = Money::from_decimal(&(&gst_sum / BigDecimal::from(2)));
        (half.clone(), half, Money::zero())
    };
    let cess_amount = Money::from_decimal(&cess_sum);

    let total_tax = &(&(&cgst_amount + &sgst_amount) + &igst_amount) + &cess_amount;
    let total_amount = &taxable_amount + &total_tax;

    let tds_amount = match &doc.tds {
        Some(tds) => Money::from_decimal(&percent_of(taxable_amount.as_decimal(), &tds.rate)),
        None => Money::zero(),
    };
    let tcs_amount = match &doc.tcs {
        Some(tcs) => Money::from_decimal(&percent_of(total_amount.as_decimal(), &tcs.rate)),
        None => Money::zero(),
    };
    let net_payable = &(&total_amount - &tds_amount) + &tcs_amount;

    tracing::debug!(
        lines = lines.len(),
        taxable = %taxable_amount,
        total = %total_amount,
        is_igst = doc.is_igst,
        "computed document totals"
    );

    Ok(DocumentTotals {
        subtotal,
        line_discount_amount,
        discount_amount,
        taxable_amount,
        cgst_amount,
        sgst_amount,
        igst_amount,
        cess_amount,
        total_tax,
        total_amount,
        tds_amount,
        tcs_amount,
        net_payable,
        is_igst: doc.is_igst,
        lines,
    })
}

fn is_percentage(value: &BigDecimal) -> bool {
    *value >= BigDecimal::from(0) && *value <= BigDecimal::from(100)
}

/// Tax engine errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaxError {
    #[error("Invalid line item {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },
    #[error("Invalid GST rate {rate}% on line item {index}")]
    InvalidTaxRate { index: usize, rate: BigDecimal },
    #[error("Document has no line items")]
    EmptyDocument,
    #[error("Header discount {discount_percent}% is outside 0-100")]
    InvalidDiscount { discount_percent: BigDecimal },
    #[error("{kind} rate {rate}% is outside 0-100")]
    InvalidWithholdingRate { kind: &'static str, rate: BigDecimal },
}

/// Result type for tax computations
pub type TaxResult<T> = Result<T, TaxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn consulting_line() -> LineItem {
        LineItem::new("Consulting", dec("10"), dec("100"), dec("18"))
    }

    #[test]
    fn test_intra_state_split() {
        let totals = compute_totals(&TaxableDocument::new(vec![consulting_line()])).unwrap();

        assert_eq!(totals.taxable_amount, money("1000.00"));
        assert_eq!(totals.cgst_amount, money("90.00"));
        assert_eq!(totals.sgst_amount, money("90.00"));
        assert_eq!(totals.igst_amount, Money::zero());
        assert_eq!(totals.total_amount, money("1180.00"));
    }

    #[test]
    fn test_inter_state_is_igst_only() {
        let doc = TaxableDocument::new(vec![consulting_line()]).inter_state();
        let totals = compute_totals(&doc).unwrap();

        assert_eq!(totals.igst_amount, money("180.00"));
        assert_eq!(totals.cgst_amount, Money::zero());
        assert_eq!(totals.sgst_amount, Money::zero());
        assert_eq!(totals.total_amount, money("1180.00"));
    }

    #[test]
    fn test_header_discount_applies_before_tax() {
        let doc = TaxableDocument::new(vec![consulting_line()]).with_discount(dec("10"));
        let totals = compute_totals(&doc).unwrap();

        assert_eq!(totals.discount_amount, money("100.00"));
        assert_eq!(totals.taxable_amount, money("900.00"));
        assert_eq!(totals.cgst_amount, money("81.00"));
        assert_eq!(totals.sgst_amount, money("81.00"));
        assert_eq!(totals.total_amount, money("1062.00"));
        // GST taken on the undiscounted base would be 90.00 per head
        assert_ne!(totals.cgst_amount, money("90.00"));
    }

    #[test]
    fn test_header_discount_is_spread_across_mixed_rates() {
        let doc = TaxableDocument::new(vec![
            LineItem::new("A", dec("1"), dec("1000"), dec("18")),
            LineItem::new("B", dec("1"), dec("1000"), dec("5")),
        ])
        .with_discount(dec("10"));
        let totals = compute_totals(&doc).unwrap();

        // 900 × 18% + 900 × 5% = 162 + 45
        assert_eq!(totals.taxable_amount, money("1800.00"));
        assert_eq!(totals.total_tax, money("207.00"));
        assert_eq!(totals.total_amount, money("2007.00"));

        assert_eq!(totals.lines[0].gst_amount, money("162.00"));
        assert_eq!(totals.lines[1].gst_amount, money("45.00"));

        // taxing first and discounting only the base afterwards: 1800 + 230
        assert_ne!(totals.total_amount, money("2030.00"));
    }

    #[test]
    fn test_line_discount_then_header_discount() {
        let line = LineItem::new("Widget", dec("3"), dec("333.33"), dec("12"))
            .with_discount(dec("5"));
        let doc = TaxableDocument::new(vec![line]).with_discount(dec("2.5"));
        let totals = compute_totals(&doc).unwrap();

        // gross 999.99; after 5% = 949.9905; header 2.5% of that = 23.7497625
        assert_eq!(totals.subtotal, money("999.99"));
        assert_eq!(totals.line_discount_amount, money("50.00"));
        assert_eq!(totals.discount_amount, money("23.75"));
        assert_eq!(totals.taxable_amount, money("926.24"));
        // 926.2407375 × 12% = 111.1488885 → 55.57444425 each
        assert_eq!(totals.cgst_amount, money("55.57"));
        assert_eq!(totals.sgst_amount, money("55.57"));
        assert_eq!(totals.total_amount, money("1037.38"));
    }

    #[test]
    fn test_cess_is_added_to_total() {
        let line = LineItem::new("Aerated drink", dec("100"), dec("40"), dec("28"))
            .with_cess(dec("12"));
        let totals = compute_totals(&TaxableDocument::new(vec![line])).unwrap();

        assert_eq!(totals.cess_amount, money("480.00"));
        assert_eq!(totals.total_tax, money("1600.00"));
        assert_eq!(totals.total_amount, money("5600.00"));
    }

    #[test]
    fn test_tds_on_taxable_and_tcs_on_total() {
        let doc = TaxableDocument::new(vec![consulting_line()])
            .with_tds(Withholding::new(dec("10")).under_section("194J"))
            .with_tcs(Withholding::new(dec("1")));
        let totals = compute_totals(&doc).unwrap();

        assert_eq!(totals.tds_amount, money("100.00"));
        assert_eq!(totals.tcs_amount, money("11.80"));
        assert_eq!(totals.net_payable, money("1091.80"));
    }

    #[test]
    fn test_total_identity_holds_with_awkward_rates() {
        let doc = TaxableDocument::new(vec![
            LineItem::new("A", dec("7"), dec("13.37"), dec("18")).with_discount(dec("3.3")),
            LineItem::new("B", dec("0.5"), dec("99.99"), dec("28")).with_cess(dec("1")),
            LineItem::new("C", dec("11"), dec("0.07"), dec("5")),
        ])
        .with_discount(dec("7.77"));

        for doc in [doc.clone(), doc.inter_state()] {
            let t = compute_totals(&doc).unwrap();
            let sum = &(&(&(&t.taxable_amount + &t.cgst_amount) + &t.sgst_amount)
                + &t.igst_amount)
                + &t.cess_amount;
            assert_eq!(t.total_amount, sum);
            assert_eq!(t.cgst_amount, t.sgst_amount);
            if doc.is_igst {
                assert!(t.cgst_amount.is_zero());
            } else {
                assert!(t.igst_amount.is_zero());
            }
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        let doc = TaxableDocument::new(vec![consulting_line()]).with_discount(dec("3.33"));
        assert_eq!(compute_totals(&doc).unwrap(), compute_totals(&doc).unwrap());
    }

    #[test]
    fn test_rejects_empty_document() {
        assert_eq!(
            compute_totals(&TaxableDocument::new(vec![])),
            Err(TaxError::EmptyDocument)
        );
    }

    #[test]
    fn test_rejects_non_positive_quantity_and_rate() {
        let zero_qty = LineItem::new("X", dec("0"), dec("10"), dec("18"));
        let negative_rate = LineItem::new("Y", dec("1"), dec("-1"), dec("18"));

        assert!(matches!(
            compute_totals(&TaxableDocument::new(vec![zero_qty])),
            Err(TaxError::InvalidLineItem { index: 0, .. })
        ));
        assert!(matches!(
            compute_totals(&TaxableDocument::new(vec![consulting_line(), negative_rate])),
            Err(TaxError::InvalidLineItem { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_rate_outside_slabs() {
        let line = LineItem::new("X", dec("1"), dec("10"), dec("15"));
        assert_eq!(
            compute_totals(&TaxableDocument::new(vec![line])),
            Err(TaxError::InvalidTaxRate {
                index: 0,
                rate: dec("15")
            })
        );
    }

    #[test]
    fn test_rejects_bad_discounts() {
        let line = consulting_line().with_discount(dec("101"));
        assert!(matches!(
            compute_totals(&TaxableDocument::new(vec![line])),
            Err(TaxError::InvalidLineItem { .. })
        ));

        let doc = TaxableDocument::new(vec![consulting_line()]).with_discount(dec("-1"));
        assert!(matches!(
            compute_totals(&doc),
            Err(TaxError::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn test_slab_lookup() {
        assert_eq!(GstSlab::from_rate(&dec("18.00")), Some(GstSlab::Eighteen));
        assert_eq!(GstSlab::from_rate(&dec("0")), Some(GstSlab::Nil));
        assert_eq!(GstSlab::from_rate(&dec("3")), None);
    }
}
