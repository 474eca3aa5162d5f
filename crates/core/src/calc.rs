//! Calculation payloads: typed inputs, results, and validation.
//!
//! Inputs and results are tagged unions keyed by calculation type, so
//! engine dispatch is checked at compile time instead of probing dynamic
//! payload maps at runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for principal / loan amounts (EUR).
pub const MAX_AMOUNT: f64 = 10_000_000.0;
/// Upper bound for the monthly contribution (EUR).
pub const MAX_MONTHLY_PAYMENT: f64 = 50_000.0;
/// Upper bound for the annual interest rate (percent).
pub const MAX_ANNUAL_RATE: f64 = 20.0;
/// Upper bound for the investment / loan term in years.
pub const MAX_YEARS: u32 = 50;

/// Input validation failure, raised synchronously at enqueue time.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} out of range: {value} (allowed {min} to {max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("years out of range: {0} (allowed 1 to {MAX_YEARS})")]
    Years(u32),
}

/// The fixed set of supported calculation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcType {
    CompoundInterest,
    LoanAmortization,
}

impl std::fmt::Display for CalcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompoundInterest => write!(f, "compound_interest"),
            Self::LoanAmortization => write!(f, "loan_amortization"),
        }
    }
}

/// How often interest is capitalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Compounding periods per year.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Self::Monthly => 12,
            Self::Quarterly => 4,
            Self::Yearly => 1,
        }
    }
}

/// A calculation request payload, one variant per [`CalcType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalcInput {
    CompoundInterest {
        /// Initial capital (EUR).
        principal: f64,
        /// Additional contribution per month (EUR), 0 = none.
        monthly_payment: f64,
        /// Annual interest rate in percent.
        annual_rate: f64,
        /// Investment duration in years.
        years: u32,
        compound_frequency: Frequency,
    },
    LoanAmortization {
        /// Loan amount (EUR).
        loan_amount: f64,
        /// Annual interest rate in percent.
        annual_rate: f64,
        /// Loan term in years.
        years: u32,
    },
}

impl CalcInput {
    /// The calculation kind this payload belongs to.
    pub fn calc_type(&self) -> CalcType {
        match self {
            Self::CompoundInterest { .. } => CalcType::CompoundInterest,
            Self::LoanAmortization { .. } => CalcType::LoanAmortization,
        }
    }

    /// Check all field ranges. Bounds follow the production request model:
    /// amounts up to 10M EUR, rates in (0, 20] percent, terms of 1-50 years.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Self::CompoundInterest {
                principal,
                monthly_payment,
                annual_rate,
                years,
                ..
            } => {
                check_range("principal", principal, f64::MIN_POSITIVE, MAX_AMOUNT)?;
                check_range("monthly_payment", monthly_payment, 0.0, MAX_MONTHLY_PAYMENT)?;
                check_range("annual_rate", annual_rate, f64::MIN_POSITIVE, MAX_ANNUAL_RATE)?;
                check_years(years)
            }
            Self::LoanAmortization {
                loan_amount,
                annual_rate,
                years,
            } => {
                check_range("loan_amount", loan_amount, f64::MIN_POSITIVE, MAX_AMOUNT)?;
                check_range("annual_rate", annual_rate, f64::MIN_POSITIVE, MAX_ANNUAL_RATE)?;
                check_years(years)
            }
        }
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: if min == f64::MIN_POSITIVE { 0.0 } else { min },
            max,
        });
    }
    Ok(())
}

fn check_years(years: u32) -> Result<(), ValidationError> {
    if years == 0 || years > MAX_YEARS {
        return Err(ValidationError::Years(years));
    }
    Ok(())
}

/// One row of the per-year capital development breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBreakdown {
    pub year: u32,
    pub start_amount: f64,
    pub contributions: f64,
    pub interest: f64,
    pub end_amount: f64,
    /// Interest earned this year relative to the starting amount, percent.
    pub growth_rate: f64,
}

/// One row of the per-year loan repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySchedule {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub remaining_balance: f64,
}

/// A calculation result, one variant per [`CalcType`]. All money values
/// are rounded to cents (half-up).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalcResult {
    CompoundInterest {
        final_amount: f64,
        total_contributions: f64,
        total_interest: f64,
        /// Compound annual growth rate, percent.
        annual_return: f64,
        yearly_breakdown: Vec<YearlyBreakdown>,
    },
    LoanAmortization {
        monthly_payment: f64,
        total_paid: f64,
        total_interest: f64,
        schedule: Vec<YearlySchedule>,
    },
}

impl CalcResult {
    pub fn calc_type(&self) -> CalcType {
        match self {
            Self::CompoundInterest { .. } => CalcType::CompoundInterest,
            Self::LoanAmortization { .. } => CalcType::LoanAmortization,
        }
    }
}

/// Round a money value to cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
