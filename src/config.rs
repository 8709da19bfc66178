//! Posting configuration: financial-year start and the account codes used by
//! the posting patterns

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Account codes the posting patterns debit and credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingAccounts {
    pub cash: String,
    pub bank: String,
    pub accounts_receivable: String,
    pub cgst_input: String,
    pub sgst_input: String,
    pub igst_input: String,
    pub cess_input: String,
    pub tds_receivable: String,
    pub tcs_receivable: String,
    pub accounts_payable: String,
    pub cgst_output: String,
    pub sgst_output: String,
    pub igst_output: String,
    pub cess_output: String,
    pub tds_payable: String,
    pub tcs_payable: String,
    pub sales: String,
    pub purchases: String,
}

impl Default for PostingAccounts {
    fn default() -> Self {
        Self {
            cash: "1000".into(),
            bank: "1010".into(),
            accounts_receivable: "1100".into(),
            cgst_input: "1200".into(),
            sgst_input: "1210".into(),
            igst_input: "1220".into(),
            cess_input: "1230".into(),
            tds_receivable: "1300".into(),
            tcs_receivable: "1310".into(),
            accounts_payable: "2100".into(),
            cgst_output: "2200".into(),
            sgst_output: "2210".into(),
            igst_output: "2220".into(),
            cess_output: "2230".into(),
            tds_payable: "2300".into(),
            tcs_payable: "2310".into(),
            sales: "4000".into(),
            purchases: "5000".into(),
        }
    }
}

impl PostingAccounts {
    fn codes(&self) -> [(&'static str, &str); 18] {
        [
            ("cash", &self.cash),
            ("bank", &self.bank),
            ("accounts_receivable", &self.accounts_receivable),
            ("cgst_input", &self.cgst_input),
            ("sgst_input", &self.sgst_input),
            ("igst_input", &self.igst_input),
            ("cess_input", &self.cess_input),
            ("tds_receivable", &self.tds_receivable),
            ("tcs_receivable", &self.tcs_receivable),
            ("accounts_payable", &self.accounts_payable),
            ("cgst_output", &self.cgst_output),
            ("sgst_output", &self.sgst_output),
            ("igst_output", &self.igst_output),
            ("cess_output", &self.cess_output),
            ("tds_payable", &self.tds_payable),
            ("tcs_payable", &self.tcs_payable),
            ("sales", &self.sales),
            ("purchases", &self.purchases),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Month (1-12) in which the financial year begins; April in India
    pub financial_year_start_month: u32,
    pub accounts: PostingAccounts,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            financial_year_start_month: 4,
            accounts: PostingAccounts::default(),
        }
    }
}

impl PostingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PostingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no posting config found, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=12).contains(&self.financial_year_start_month) {
            return Err(ConfigError::Invalid(format!(
                "financial_year_start_month must be 1-12, got {}",
                self.financial_year_start_month
            )));
        }
        for (field, code) in self.accounts.codes() {
            if code.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "account code for {} cannot be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
