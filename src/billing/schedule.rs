//! Billing schedule generation and installment lifecycle

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{Money, MONEY_SCALE};
use crate::tax::gst::{compute_totals, DocumentTotals, LineItem, TaxError, TaxableDocument};

/// Upper bound on installments produced by one generation run
pub const MAX_INSTALLMENTS: u32 = 1200;

/// How often a commitment is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingFrequency {
    OneTime,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
    Milestone,
}

impl BillingFrequency {
    /// Calendar months between installments; `None` for frequencies that never generate
    pub fn period_months(&self) -> Option<u32> {
        match self {
            BillingFrequency::Monthly => Some(1),
            BillingFrequency::Quarterly => Some(3),
            BillingFrequency::HalfYearly => Some(6),
            BillingFrequency::Yearly => Some(12),
            BillingFrequency::OneTime | BillingFrequency::Milestone => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingFrequency::OneTime => "ONE_TIME",
            BillingFrequency::Monthly => "MONTHLY",
            BillingFrequency::Quarterly => "QUARTERLY",
            BillingFrequency::HalfYearly => "HALF_YEARLY",
            BillingFrequency::Yearly => "YEARLY",
            BillingFrequency::Milestone => "MILESTONE",
        }
    }
}

/// The commercial commitment (client purchase order) a schedule bills against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: String,
    pub frequency: BillingFrequency,
    /// Pre-tax value of the whole commitment
    pub taxable_amount: Money,
    pub gst_rate: BigDecimal,
    pub cess_rate: BigDecimal,
    pub is_igst: bool,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

impl Commitment {
    pub fn new(
        id: impl Into<String>,
        frequency: BillingFrequency,
        taxable_amount: Money,
        gst_rate: BigDecimal,
        valid_from: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            frequency,
            taxable_amount,
            gst_rate,
            cess_rate: BigDecimal::from(0),
            is_igst: false,
            valid_from,
            valid_until: None,
        }
    }

    pub fn valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    pub fn inter_state(mut self) -> Self {
        self.is_igst = true;
        self
    }
}

/// Installment lifecycle. `Invoiced` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    PiRaised,
    Invoiced,
    Cancelled,
}

impl InstallmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallmentStatus::Invoiced | InstallmentStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: InstallmentStatus) -> bool {
        use InstallmentStatus::*;
        matches!(
            (self, next),
            (Pending, PiRaised) | (Pending, Invoiced) | (PiRaised, Invoiced) | (Pending, Cancelled)
        )
    }
}

/// How far a commitment has been billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    /// Nothing invoiced yet
    Active,
    Partial,
    /// Invoiced amount has reached the commitment
    Completed,
}

/// Invoiced and remaining value of a commitment, derived from its installments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub commitment_id: String,
    /// Pre-tax value of the commitment
    pub commitment_amount: Money,
    /// Σ taxable amount of invoiced installments
    pub invoiced_amount: Money,
    /// Σ total (with tax) of invoiced installments
    pub invoiced_total: Money,
    /// commitment − invoiced; negative if over-billed
    pub remaining_amount: Money,
    pub status: FulfillmentStatus,
}

/// One dated billing installment of a commitment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: Uuid,
    pub commitment_id: String,
    /// 1-based, unique within the commitment
    pub installment_number: u32,
    pub description: String,
    pub due_date: NaiveDate,
    /// Taxable share of the commitment
    pub amount: Money,
    /// CGST + SGST + IGST on `amount`
    pub gst_amount: Money,
    pub cess_amount: Money,
    pub total_amount: Money,
    pub status: InstallmentStatus,
    pub gst_rate: BigDecimal,
    pub cess_rate: BigDecimal,
    pub is_igst: bool,
    /// Set when a proforma invoice is raised from this installment
    pub proforma_reference: Option<String>,
    /// Set when an invoice is raised from this installment
    pub invoice_reference: Option<String>,
}

impl Installment {
    fn priced(
        commitment: &Commitment,
        installment_number: u32,
        description: String,
        due_date: NaiveDate,
        amount: Money,
    ) -> ScheduleResult<Self> {
        let totals = price(commitment, &description, &amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            commitment_id: commitment.id.clone(),
            installment_number,
            description,
            due_date,
            gst_amount: totals.gst_amount(),
            cess_amount: totals.cess_amount,
            total_amount: totals.total_amount,
            amount,
            status: InstallmentStatus::Pending,
            gst_rate: commitment.gst_rate.clone(),
            cess_rate: commitment.cess_rate.clone(),
            is_igst: commitment.is_igst,
            proforma_reference: None,
            invoice_reference: None,
        })
    }

    /// Single-line document for raising a proforma or invoice from this installment
    pub fn to_document(&self) -> TaxableDocument {
        let line = LineItem::new(
            self.description.clone(),
            BigDecimal::from(1),
            self.amount.as_decimal().clone(),
            self.gst_rate.clone(),
        )
        .with_cess(self.cess_rate.clone());

        let mut doc = TaxableDocument::new(vec![line]);
        doc.is_igst = self.is_igst;
        doc
    }

    pub fn is_active(&self) -> bool {
        self.status != InstallmentStatus::Cancelled
    }
}

fn price(
    commitment: &Commitment,
    description: &str,
    amount: &Money,
) -> ScheduleResult<DocumentTotals> {
    let line = LineItem::new(
        description,
        BigDecimal::from(1),
        amount.as_decimal().clone(),
        commitment.gst_rate.clone(),
    )
    .with_cess(commitment.cess_rate.clone());

    let mut doc = TaxableDocument::new(vec![line]);
    doc.is_igst = commitment.is_igst;
    Ok(compute_totals(&doc)?)
}

/// Resolve the inclusive generation window and the due dates inside it
fn due_dates(
    commitment: &Commitment,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> ScheduleResult<(NaiveDate, Vec<NaiveDate>)> {
    let months = commitment
        .frequency
        .period_months()
        .ok_or(ScheduleError::InvalidFrequency {
            frequency: commitment.frequency,
        })?;

    let end = end
        .or(commitment.valid_until)
        .ok_or(ScheduleError::InvalidDateRange {
            start,
            end: None,
            reason: "no end date given and the commitment has no valid_until".to_string(),
        })?;

    if start > end {
        return Err(ScheduleError::InvalidDateRange {
            start,
            end: Some(end),
            reason: "start is after end".to_string(),
        });
    }

    // Offsets are taken from `start` rather than chained, so a 31st-of-month
    // start keeps landing on month ends instead of drifting to the 28th.
    let mut dates = Vec::new();
    for step in 0..=MAX_INSTALLMENTS {
        let due = start
            .checked_add_months(Months::new(step * months))
            .ok_or_else(|| ScheduleError::InvalidDateRange {
                start,
                end: Some(end),
                reason: "due date out of calendar range".to_string(),
            })?;
        if due > end {
            return Ok((end, dates));
        }
        if step == MAX_INSTALLMENTS {
            break;
        }
        dates.push(due);
    }

    Err(ScheduleError::TooManyInstallments {
        limit: MAX_INSTALLMENTS,
    })
}

/// Build installments splitting `amount` equally over `dates`; the last one
/// absorbs the rounding remainder so the shares sum to `amount` exactly.
fn plan(
    commitment: &Commitment,
    dates: &[NaiveDate],
    amount: &Money,
    first_number: u32,
) -> ScheduleResult<Vec<Installment>> {
    let count = dates.len() as u32;
    let share = Money::from_decimal(
        &(amount.as_decimal() / BigDecimal::from(count))
            .with_scale_round(MONEY_SCALE, RoundingMode::Down),
    );
    if !share.is_positive() {
        return Err(ScheduleError::AmountTooSmall {
            commitment_id: commitment.id.clone(),
            amount: amount.clone(),
            installments: count,
        });
    }
    let leading_total = Money::from_decimal(&(share.as_decimal() * BigDecimal::from(count - 1)));
    let last_share = amount - &leading_total;

    dates
        .iter()
        .enumerate()
        .map(|(i, due)| {
            let amount = if i + 1 == dates.len() {
                last_share.clone()
            } else {
                share.clone()
            };
            let description = format!(
                "{} - {}",
                commitment.frequency.as_str(),
                due.format("%B %Y")
            );
            Installment::priced(commitment, first_number + i as u32, description, *due, amount)
        })
        .collect()
}

/// Expand a recurring commitment into PENDING installments between `start`
/// and `end` (inclusive), or the commitment's `valid_until` when `end` is omitted.
pub fn generate_schedule(
    commitment: &Commitment,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> ScheduleResult<Vec<Installment>> {
    if !commitment.taxable_amount.is_positive() {
        return Err(ScheduleError::InvalidAmount {
            commitment_id: commitment.id.clone(),
            amount: commitment.taxable_amount.clone(),
        });
    }
    let (_, dates) = due_dates(commitment, start, end)?;
    plan(commitment, &dates, &commitment.taxable_amount, 1)
}

/// All installments of one commitment. Mutated only through generation,
/// milestone entry, and the documented status transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSchedule {
    pub commitment_id: String,
    installments: Vec<Installment>,
}

impl BillingSchedule {
    pub fn new(commitment_id: impl Into<String>) -> Self {
        Self {
            commitment_id: commitment_id.into(),
            installments: Vec::new(),
        }
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn get(&self, installment_number: u32) -> Option<&Installment> {
        self.installments
            .iter()
            .find(|i| i.installment_number == installment_number)
    }

    /// Σ amount over installments that are not cancelled
    pub fn scheduled_amount(&self) -> Money {
        self.installments
            .iter()
            .filter(|i| i.is_active())
            .map(|i| &i.amount)
            .sum()
    }

    fn next_number(&self) -> u32 {
        self.installments
            .iter()
            .map(|i| i.installment_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn remaining(&self, commitment: &Commitment) -> ScheduleResult<Money> {
        let remaining = &commitment.taxable_amount - &self.scheduled_amount();
        if remaining.is_positive() {
            Ok(remaining)
        } else {
            Err(ScheduleError::ExceedsCommitment {
                commitment_id: commitment.id.clone(),
                remaining,
            })
        }
    }

    fn check_commitment(&self, commitment: &Commitment) -> ScheduleResult<()> {
        if commitment.id != self.commitment_id {
            return Err(ScheduleError::CommitmentMismatch {
                expected: self.commitment_id.clone(),
                found: commitment.id.clone(),
            });
        }
        Ok(())
    }

    /// Generate installments for a window, refusing to overlap active ones.
    ///
    /// The unscheduled remainder of the commitment is split over the new
    /// installments and numbering continues after the highest existing number.
    pub fn generate(
        &mut self,
        commitment: &Commitment,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> ScheduleResult<&[Installment]> {
        self.check_commitment(commitment)?;
        let (window_end, dates) = due_dates(commitment, start, end)?;

        if self
            .installments
            .iter()
            .any(|i| i.is_active() && i.due_date >= start && i.due_date <= window_end)
        {
            tracing::warn!(
                commitment = %commitment.id,
                %start,
                end = %window_end,
                "refusing to generate an overlapping billing schedule"
            );
            return Err(ScheduleError::DuplicateSchedule {
                commitment_id: commitment.id.clone(),
                start,
                end: window_end,
            });
        }

        let remaining = self.remaining(commitment)?;
        let generated = plan(commitment, &dates, &remaining, self.next_number())?;
        let offset = self.installments.len();
        self.installments.extend(generated);

        tracing::info!(
            commitment = %commitment.id,
            frequency = commitment.frequency.as_str(),
            installments = dates.len(),
            amount = %remaining,
            "generated billing schedule"
        );

        Ok(&self.installments[offset..])
    }

    /// Record a hand-entered milestone installment
    pub fn add_milestone(
        &mut self,
        commitment: &Commitment,
        description: impl Into<String>,
        due_date: NaiveDate,
        amount: Money,
    ) -> ScheduleResult<&Installment> {
        self.check_commitment(commitment)?;
        if commitment.frequency != BillingFrequency::Milestone {
            return Err(ScheduleError::InvalidFrequency {
                frequency: commitment.frequency,
            });
        }
        if !amount.is_positive() {
            return Err(ScheduleError::InvalidAmount {
                commitment_id: commitment.id.clone(),
                amount,
            });
        }
        let remaining = self.remaining(commitment)?;
        if amount > remaining {
            return Err(ScheduleError::ExceedsCommitment {
                commitment_id: commitment.id.clone(),
                remaining,
            });
        }

        let installment = Installment::priced(
            commitment,
            self.next_number(),
            description.into(),
            due_date,
            amount,
        )?;
        self.installments.push(installment);
        let index = self.installments.len() - 1;
        Ok(&self.installments[index])
    }

    fn transition(
        &mut self,
        installment_number: u32,
        next: InstallmentStatus,
    ) -> ScheduleResult<&mut Installment> {
        let installment = self
            .installments
            .iter_mut()
            .find(|i| i.installment_number == installment_number)
            .ok_or(ScheduleError::InstallmentNotFound { installment_number })?;

        if !installment.status.can_transition_to(next) {
            return Err(ScheduleError::InvalidStatusTransition {
                installment_number,
                from: installment.status,
                to: next,
            });
        }
        installment.status = next;
        Ok(installment)
    }

    /// Invoiced against outstanding value. Cancelled and not-yet-invoiced
    /// installments count as unbilled.
    pub fn fulfillment(&self, commitment: &Commitment) -> ScheduleResult<Fulfillment> {
        self.check_commitment(commitment)?;

        let invoiced: Vec<&Installment> = self
            .installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Invoiced)
            .collect();
        let invoiced_amount: Money = invoiced.iter().map(|i| &i.amount).sum();
        let invoiced_total: Money = invoiced.iter().map(|i| &i.total_amount).sum();
        let remaining_amount = &commitment.taxable_amount - &invoiced_amount;

        let status = if invoiced_amount.is_zero() {
            FulfillmentStatus::Active
        } else if invoiced_amount >= commitment.taxable_amount {
            FulfillmentStatus::Completed
        } else {
            FulfillmentStatus::Partial
        };

        Ok(Fulfillment {
            commitment_id: commitment.id.clone(),
            commitment_amount: commitment.taxable_amount.clone(),
            invoiced_amount,
            invoiced_total,
            remaining_amount,
            status,
        })
    }

    /// PENDING → PI_RAISED
    pub fn raise_proforma(
        &mut self,
        installment_number: u32,
        proforma_reference: impl Into<String>,
    ) -> ScheduleResult<&Installment> {
        let installment = self.transition(installment_number, InstallmentStatus::PiRaised)?;
        installment.proforma_reference = Some(proforma_reference.into());
        Ok(installment)
    }

    /// PENDING or PI_RAISED → INVOICED
    pub fn mark_invoiced(
        &mut self,
        installment_number: u32,
        invoice_reference: impl Into<String>,
    ) -> ScheduleResult<&Installment> {
        let installment = self.transition(installment_number, InstallmentStatus::Invoiced)?;
        installment.invoice_reference = Some(invoice_reference.into());
        Ok(installment)
    }

    /// PENDING → CANCELLED
    pub fn cancel(&mut self, installment_number: u32) -> ScheduleResult<&Installment> {
        let installment = self.transition(installment_number, InstallmentStatus::Cancelled)?;
        Ok(installment)
    }
}

/// Billing schedule errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Schedules cannot be generated for {} billing", .frequency.as_str())]
    InvalidFrequency { frequency: BillingFrequency },
    #[error("Invalid date range starting {start}: {reason}")]
    InvalidDateRange {
        start: NaiveDate,
        end: Option<NaiveDate>,
        reason: String,
    },
    #[error("Commitment {commitment_id} already has active installments between {start} and {end}")]
    DuplicateSchedule {
        commitment_id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("Installment {installment_number} not found")]
    InstallmentNotFound { installment_number: u32 },
    #[error("Installment {installment_number} cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition {
        installment_number: u32,
        from: InstallmentStatus,
        to: InstallmentStatus,
    },
    #[error("Schedule belongs to commitment {expected}, not {found}")]
    CommitmentMismatch { expected: String, found: String },
    #[error("Commitment {commitment_id} has only {remaining} left to schedule")]
    ExceedsCommitment {
        commitment_id: String,
        remaining: Money,
    },
    #[error("Commitment {commitment_id} amount {amount} must be positive")]
    InvalidAmount {
        commitment_id: String,
        amount: Money,
    },
    #[error(
        "{amount} on {commitment_id} is too small to split into {installments} installments"
    )]
    AmountTooSmall {
        commitment_id: String,
        amount: Money,
        installments: u32,
    },
    #[error("A schedule may not exceed {limit} installments")]
    TooManyInstallments { limit: u32 },
    #[error(transparent)]
    Tax(#[from] TaxError),
}

/// Result type for schedule operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(amount: i64) -> Commitment {
        Commitment::new(
            "PO-1",
            BillingFrequency::Monthly,
            Money::from_rupees(amount),
            BigDecimal::from(18),
            date(2025, 1, 1),
        )
        .valid_until(date(2025, 12, 31))
    }

    #[test]
    fn test_twelve_equal_monthly_installments() {
        let schedule = generate_schedule(&monthly(12000), date(2025, 1, 1), None).unwrap();

        assert_eq!(schedule.len(), 12);
        for (i, installment) in schedule.iter().enumerate() {
            assert_eq!(installment.installment_number, i as u32 + 1);
            assert_eq!(installment.amount, Money::from_rupees(1000));
            assert_eq!(installment.gst_amount, Money::from_rupees(180));
            assert_eq!(installment.total_amount, Money::from_rupees(1180));
            assert_eq!(installment.status, InstallmentStatus::Pending);
        }
        assert_eq!(schedule[0].description, "MONTHLY - January 2025");
        assert_eq!(schedule[11].due_date, date(2025, 12, 1));
    }

    #[test]
    fn test_last_installment_absorbs_remainder() {
        let schedule = generate_schedule(&monthly(1000), date(2025, 1, 1), Some(date(2025, 3, 1)))
            .unwrap();

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].amount, "333.33".parse().unwrap());
        assert_eq!(schedule[1].amount, "333.33".parse().unwrap());
        assert_eq!(schedule[2].amount, "333.34".parse().unwrap());
        let total: Money = schedule.iter().map(|i| &i.amount).sum();
        assert_eq!(total, Money::from_rupees(1000));
        // GST priced per installment, not divided from the aggregate
        assert_eq!(schedule[0].gst_amount, "60.00".parse().unwrap());
        assert_eq!(schedule[2].gst_amount, "60.00".parse().unwrap());
    }

    #[test]
    fn test_due_dates_strictly_increase_from_month_end() {
        let commitment = Commitment::new(
            "PO-2",
            BillingFrequency::Monthly,
            Money::from_rupees(400),
            BigDecimal::from(5),
            date(2024, 1, 31),
        );
        let schedule =
            generate_schedule(&commitment, date(2024, 1, 31), Some(date(2024, 4, 30))).unwrap();

        let dates: Vec<_> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30)
            ]
        );
    }

    #[test]
    fn test_quarterly_and_yearly_steps() {
        let mut commitment = monthly(4000);
        commitment.frequency = BillingFrequency::Quarterly;
        let schedule = generate_schedule(&commitment, date(2025, 1, 1), None).unwrap();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[3].due_date, date(2025, 10, 1));

        commitment.frequency = BillingFrequency::Yearly;
        let schedule =
            generate_schedule(&commitment, date(2025, 1, 1), Some(date(2027, 1, 1))).unwrap();
        assert_eq!(schedule.len(), 3);
    }

    #[test]
    fn test_one_time_and_milestone_never_generate() {
        for frequency in [BillingFrequency::OneTime, BillingFrequency::Milestone] {
            let mut commitment = monthly(1000);
            commitment.frequency = frequency;
            assert_eq!(
                generate_schedule(&commitment, date(2025, 1, 1), None),
                Err(ScheduleError::InvalidFrequency { frequency })
            );
        }
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let result = generate_schedule(&monthly(1000), date(2025, 6, 1), Some(date(2025, 1, 1)));
        assert!(matches!(
            result,
            Err(ScheduleError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_missing_end_date_is_rejected() {
        let mut commitment = monthly(1000);
        commitment.valid_until = None;
        assert!(matches!(
            generate_schedule(&commitment, date(2025, 1, 1), None),
            Err(ScheduleError::InvalidDateRange { end: None, .. })
        ));
    }

    #[test]
    fn test_overlapping_generation_is_rejected() {
        let commitment = monthly(12000);
        let mut schedule = BillingSchedule::new("PO-1");
        schedule
            .generate(&commitment, date(2025, 1, 1), Some(date(2025, 6, 30)))
            .unwrap();

        let err = schedule
            .generate(&commitment, date(2025, 6, 1), None)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateSchedule { .. }));
        assert_eq!(schedule.installments().len(), 6);
    }

    #[test]
    fn test_follow_on_generation_splits_remainder() {
        let commitment = monthly(12000);
        let mut schedule = BillingSchedule::new("PO-1");
        schedule
            .generate(&commitment, date(2025, 1, 1), Some(date(2025, 3, 31)))
            .unwrap();
        schedule.cancel(3).unwrap();

        let second = schedule
            .generate(&commitment, date(2025, 4, 1), None)
            .unwrap();
        assert_eq!(second.len(), 9);
        assert_eq!(second[0].installment_number, 4);
        assert_eq!(schedule.scheduled_amount(), Money::from_rupees(12000));
    }

    #[test]
    fn test_status_transitions() {
        let mut schedule = BillingSchedule::new("PO-1");
        schedule
            .generate(&monthly(3000), date(2025, 1, 1), Some(date(2025, 3, 1)))
            .unwrap();

        schedule.raise_proforma(1, "PI-001").unwrap();
        let invoiced = schedule.mark_invoiced(1, "INV-001").unwrap();
        assert_eq!(invoiced.status, InstallmentStatus::Invoiced);
        assert_eq!(invoiced.proforma_reference.as_deref(), Some("PI-001"));

        schedule.mark_invoiced(2, "INV-002").unwrap();
        schedule.cancel(3).unwrap();

        assert!(matches!(
            schedule.cancel(1),
            Err(ScheduleError::InvalidStatusTransition { .. })
        ));
        assert!(matches!(
            schedule.raise_proforma(3, "PI-003"),
            Err(ScheduleError::InvalidStatusTransition { .. })
        ));
        assert!(matches!(
            schedule.cancel(9),
            Err(ScheduleError::InstallmentNotFound { installment_number: 9 })
        ));
    }

    #[test]
    fn test_milestones_cannot_exceed_commitment() {
        let commitment = Commitment::new(
            "PO-3",
            BillingFrequency::Milestone,
            Money::from_rupees(10000),
            BigDecimal::from(18),
            date(2025, 1, 1),
        );
        let mut schedule = BillingSchedule::new("PO-3");
        schedule
            .add_milestone(
                &commitment,
                "Design sign-off",
                date(2025, 2, 1),
                Money::from_rupees(4000),
            )
            .unwrap();
        let second = schedule
            .add_milestone(&commitment, "Go-live", date(2025, 5, 1), Money::from_rupees(6000))
            .unwrap();
        assert_eq!(second.installment_number, 2);
        assert_eq!(second.total_amount, Money::from_rupees(7080));

        assert!(matches!(
            schedule.add_milestone(&commitment, "Extra", date(2025, 6, 1), Money::from_rupees(1)),
            Err(ScheduleError::ExceedsCommitment { .. })
        ));
    }

    #[test]
    fn test_fulfillment_follows_invoicing() {
        let commitment = monthly(3000);
        let mut schedule = BillingSchedule::new("PO-1");
        schedule
            .generate(&commitment, date(2025, 1, 1), Some(date(2025, 3, 1)))
            .unwrap();

        let fresh = schedule.fulfillment(&commitment).unwrap();
        assert_eq!(fresh.status, FulfillmentStatus::Active);
        assert_eq!(fresh.invoiced_amount, Money::zero());
        assert_eq!(fresh.remaining_amount, Money::from_rupees(3000));

        schedule.raise_proforma(1, "PI-001").unwrap();
        assert_eq!(
            schedule.fulfillment(&commitment).unwrap().status,
            FulfillmentStatus::Active
        );

        schedule.mark_invoiced(1, "INV-001").unwrap();
        let partial = schedule.fulfillment(&commitment).unwrap();
        assert_eq!(partial.status, FulfillmentStatus::Partial);
        assert_eq!(partial.invoiced_amount, Money::from_rupees(1000));
        assert_eq!(partial.invoiced_total, Money::from_rupees(1180));
        assert_eq!(partial.remaining_amount, Money::from_rupees(2000));

        schedule.mark_invoiced(2, "INV-002").unwrap();
        schedule.mark_invoiced(3, "INV-003").unwrap();
        let done = schedule.fulfillment(&commitment).unwrap();
        assert_eq!(done.status, FulfillmentStatus::Completed);
        assert_eq!(done.remaining_amount, Money::zero());
    }

    #[test]
    fn test_fulfillment_rejects_other_commitment() {
        let schedule = BillingSchedule::new("PO-1");
        let mut other = monthly(1000);
        other.id = "PO-9".to_string();
        assert!(matches!(
            schedule.fulfillment(&other),
            Err(ScheduleError::CommitmentMismatch { .. })
        ));
    }

    #[test]
    fn test_installment_document_matches_its_amounts() {
        let schedule = generate_schedule(&monthly(1000), date(2025, 1, 1), Some(date(2025, 3, 1)))
            .unwrap();
        let totals = compute_totals(&schedule[2].to_document()).unwrap();
        assert_eq!(totals.taxable_amount, schedule[2].amount);
        assert_eq!(totals.total_amount, schedule[2].total_amount);
    }
}
