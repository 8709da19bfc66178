//! Validation utilities

use std::collections::HashSet;

use crate::money::Money;
use crate::traits::*;
use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &Money) -> LedgerResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "Amount must be positive, got {}",
            amount
        )))
    }
}

/// Validate that an account code is valid
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 20 {
        return Err(LedgerError::Validation(
            "Account code cannot exceed 20 characters".to_string(),
        ));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(LedgerError::Validation(format!(
            "Account code '{}' may only contain letters, digits, '-', '_' and '.'",
            code
        )));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_narration(narration: &str) -> LedgerResult<()> {
    if narration.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Voucher narration cannot be empty".to_string(),
        ));
    }

    if narration.len() > 500 {
        return Err(LedgerError::Validation(
            "Voucher narration cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Stricter voucher validator for manual journal entry screens
pub struct StrictVoucherValidator;

impl VoucherValidator for StrictVoucherValidator {
    fn validate_voucher(&self, voucher: &Voucher) -> LedgerResult<()> {
        voucher.validate()?;
        validate_narration(&voucher.narration)?;

        let mut seen = HashSet::new();
        for entry in &voucher.entries {
            validate_account_code(&entry.account_code)?;
            if !seen.insert((entry.account_code.as_str(), entry.entry_type())) {
                return Err(LedgerError::Validation(format!(
                    "Account '{}' appears more than once on the {:?} side of voucher {}",
                    entry.account_code,
                    entry.entry_type(),
                    voucher.voucher_number
                )));
            }
        }

        Ok(())
    }
}
