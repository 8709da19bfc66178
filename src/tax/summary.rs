//! Period summaries: GST output tax against input credit, and TDS by section

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;
use crate::tax::gst::{DocumentTotals, TaxableDocument};

/// Section label for withholding recorded without one
pub const UNSPECIFIED_SECTION: &str = "N/A";

/// Tax heads accumulated over a set of documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxHeads {
    pub taxable_amount: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
}

impl TaxHeads {
    fn accumulate<'a>(documents: impl IntoIterator<Item = &'a DocumentTotals>) -> Self {
        documents
            .into_iter()
            .fold(TaxHeads::default(), |mut heads, doc| {
                heads.taxable_amount += &doc.taxable_amount;
                heads.cgst += &doc.cgst_amount;
                heads.sgst += &doc.sgst_amount;
                heads.igst += &doc.igst_amount;
                heads.cess += &doc.cess_amount;
                heads
            })
    }

    /// CGST + SGST + IGST + CESS
    pub fn total_tax(&self) -> Money {
        [&self.cgst, &self.sgst, &self.igst, &self.cess]
            .into_iter()
            .sum()
    }
}

/// Net GST position for a period. A negative head means carried-forward credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstSummary {
    pub output_tax: TaxHeads,
    pub input_tax: TaxHeads,
    pub net_cgst: Money,
    pub net_sgst: Money,
    pub net_igst: Money,
    pub net_cess: Money,
}

impl GstSummary {
    /// Summarise sales (`output`) against purchases (`input`)
    pub fn from_documents<'a>(
        output: impl IntoIterator<Item = &'a DocumentTotals>,
        input: impl IntoIterator<Item = &'a DocumentTotals>,
    ) -> Self {
        let output_tax = TaxHeads::accumulate(output);
        let input_tax = TaxHeads::accumulate(input);

        Self {
            net_cgst: &output_tax.cgst - &input_tax.cgst,
            net_sgst: &output_tax.sgst - &input_tax.sgst,
            net_igst: &output_tax.igst - &input_tax.igst,
            net_cess: &output_tax.cess - &input_tax.cess,
            output_tax,
            input_tax,
        }
    }

    pub fn net_liability(&self) -> Money {
        &self.output_tax.total_tax() - &self.input_tax.total_tax()
    }
}

/// TDS deducted under one income-tax section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdsSectionTotals {
    pub section: String,
    /// Documents carrying TDS under this section
    pub deductee_count: usize,
    /// Σ taxable amount the TDS was computed on
    pub total_payment: Money,
    pub total_tds: Money,
}

/// TDS for a period, grouped by section in section order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TdsSummary {
    pub sections: Vec<TdsSectionTotals>,
    pub total_tds: Money,
}

impl TdsSummary {
    /// Summarise documents with their computed totals. Documents without TDS are skipped.
    pub fn from_documents<'a>(
        documents: impl IntoIterator<Item = (&'a TaxableDocument, &'a DocumentTotals)>,
    ) -> Self {
        let mut by_section: BTreeMap<String, TdsSectionTotals> = BTreeMap::new();
        for (document, totals) in documents {
            let Some(tds) = &document.tds else {
                continue;
            };
            let section = tds
                .section
                .clone()
                .unwrap_or_else(|| UNSPECIFIED_SECTION.to_string());
            let row = by_section
                .entry(section.clone())
                .or_insert_with(|| TdsSectionTotals {
                    section,
                    deductee_count: 0,
                    total_payment: Money::zero(),
                    total_tds: Money::zero(),
                });
            row.deductee_count += 1;
            row.total_payment += &totals.taxable_amount;
            row.total_tds += &totals.tds_amount;
        }

        let sections: Vec<TdsSectionTotals> = by_section.into_values().collect();
        let total_tds = sections.iter().map(|row| &row.total_tds).sum();
        Self {
            sections,
            total_tds,
        }
    }

    pub fn section(&self, section: &str) -> Option<&TdsSectionTotals> {
        self.sections.iter().find(|row| row.section == section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::gst::{compute_totals, LineItem, Withholding};
    use bigdecimal::BigDecimal;

    fn totals(amount: i64, gst: i64, inter_state: bool) -> DocumentTotals {
        let line = LineItem::new(
            "Item",
            BigDecimal::from(1),
            BigDecimal::from(amount),
            BigDecimal::from(gst),
        );
        let mut doc = TaxableDocument::new(vec![line]);
        doc.is_igst = inter_state;
        compute_totals(&doc).unwrap()
    }

    #[test]
    fn test_net_liability_per_head() {
        let sales = vec![totals(10000, 18, false), totals(5000, 12, true)];
        let purchases = vec![totals(2000, 18, false)];

        let summary = GstSummary::from_documents(&sales, &purchases);

        assert_eq!(summary.output_tax.taxable_amount, Money::from_rupees(15000));
        assert_eq!(summary.output_tax.cgst, Money::from_rupees(900));
        assert_eq!(summary.output_tax.igst, Money::from_rupees(600));
        assert_eq!(summary.input_tax.sgst, Money::from_rupees(180));
        assert_eq!(summary.net_cgst, Money::from_rupees(720));
        assert_eq!(summary.net_sgst, Money::from_rupees(720));
        assert_eq!(summary.net_igst, Money::from_rupees(600));
        assert_eq!(summary.net_liability(), Money::from_rupees(2040));
    }

    #[test]
    fn test_excess_input_credit_goes_negative() {
        let sales: Vec<DocumentTotals> = Vec::new();
        let summary = GstSummary::from_documents(&sales, &[totals(1000, 18, true)]);
        assert_eq!(summary.net_igst, -Money::from_rupees(180));
    }

    fn service(amount: i64, tds: Option<Withholding>) -> TaxableDocument {
        let line = LineItem::new(
            "Service",
            BigDecimal::from(1),
            BigDecimal::from(amount),
            BigDecimal::from(18),
        );
        let doc = TaxableDocument::new(vec![line]);
        match tds {
            Some(tds) => doc.with_tds(tds),
            None => doc,
        }
    }

    #[test]
    fn test_tds_grouped_by_section() {
        let documents = vec![
            service(10000, Some(Withholding::new(BigDecimal::from(10)).under_section("194J"))),
            service(5000, Some(Withholding::new(BigDecimal::from(10)).under_section("194J"))),
            service(20000, Some(Withholding::new(BigDecimal::from(2)).under_section("194C"))),
            service(3000, Some(Withholding::new(BigDecimal::from(1)))),
            service(8000, None),
        ];
        let computed: Vec<DocumentTotals> =
            documents.iter().map(|d| compute_totals(d).unwrap()).collect();

        let summary = TdsSummary::from_documents(documents.iter().zip(computed.iter()));

        let sections: Vec<_> = summary.sections.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(sections, vec!["194C", "194J", UNSPECIFIED_SECTION]);

        let professional = summary.section("194J").unwrap();
        assert_eq!(professional.deductee_count, 2);
        assert_eq!(professional.total_payment, Money::from_rupees(15000));
        assert_eq!(professional.total_tds, Money::from_rupees(1500));

        assert_eq!(summary.section("194C").unwrap().total_tds, Money::from_rupees(400));
        assert_eq!(
            summary.section(UNSPECIFIED_SECTION).unwrap().total_tds,
            Money::from_rupees(30)
        );
        assert_eq!(summary.total_tds, Money::from_rupees(1930));
    }

    #[test]
    fn test_no_tds_documents_give_empty_summary() {
        let doc = service(1000, None);
        let totals = compute_totals(&doc).unwrap();
        let summary = TdsSummary::from_documents([(&doc, &totals)]);
        assert!(summary.sections.is_empty());
        assert_eq!(summary.total_tds, Money::zero());
    }
}
