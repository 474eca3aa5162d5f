//! Compound interest math.
//!
//! Follows the production calculator: `A = P(1 + r/n)^(nt)` for the
//! principal, the annuity future-value factor for the monthly payment
//! stream (compounded monthly), CAGR for the annualized return, and a
//! simplified mid-year model for the per-year breakdown.

use zins_core::calc::{round_cents, CalcResult, Frequency, YearlyBreakdown};

/// Grow `principal` at `rate` (decimal, e.g. 0.04) compounded
/// `periods_per_year` times per year for `years` years.
fn grow_principal(principal: f64, rate: f64, periods_per_year: u32, years: u32) -> f64 {
    if rate == 0.0 {
        return principal;
    }
    let period_rate = rate / f64::from(periods_per_year);
    let total_periods = periods_per_year * years;
    principal * (1.0 + period_rate).powi(total_periods as i32)
}

/// Future value of `monthly_payment` contributed every month for
/// `years` years at `rate` (decimal), compounded monthly.
fn grow_payments(monthly_payment: f64, rate: f64, years: u32) -> f64 {
    let total_months = years * 12;
    let monthly_rate = rate / 12.0;
    if monthly_rate == 0.0 {
        return monthly_payment * f64::from(total_months);
    }
    let factor = (1.0 + monthly_rate).powi(total_months as i32);
    monthly_payment * ((factor - 1.0) / monthly_rate)
}

/// Compound annual growth rate in percent.
fn annual_return(total_contributions: f64, final_amount: f64, years: u32) -> f64 {
    if total_contributions <= 0.0 || years == 0 {
        return 0.0;
    }
    let cagr = (final_amount / total_contributions).powf(1.0 / f64::from(years)) - 1.0;
    round_cents(cagr * 100.0)
}

/// Per-year development, assuming contributions arrive mid-year on average.
fn yearly_breakdown(
    principal: f64,
    monthly_payment: f64,
    rate: f64,
    years: u32,
) -> Vec<YearlyBreakdown> {
    let mut rows = Vec::with_capacity(years as usize);
    let mut current = principal;

    for year in 1..=years {
        let start = current;
        let contributions = monthly_payment * 12.0;
        let interest = if rate == 0.0 {
            0.0
        } else {
            (start + contributions / 2.0) * rate
        };
        let end = start + contributions + interest;
        let growth_rate = if start > 0.0 {
            round_cents(interest / start * 100.0)
        } else {
            0.0
        };

        rows.push(YearlyBreakdown {
            year,
            start_amount: round_cents(start),
            contributions: round_cents(contributions),
            interest: round_cents(interest),
            end_amount: round_cents(end),
            growth_rate,
        });
        current = end;
    }

    rows
}

/// Run the full compound interest calculation. Inputs are assumed to be
/// validated; `annual_rate` is in percent.
pub fn compute(
    principal: f64,
    monthly_payment: f64,
    annual_rate: f64,
    years: u32,
    compound_frequency: Frequency,
) -> CalcResult {
    let rate = annual_rate / 100.0;
    let periods = compound_frequency.periods_per_year();

    let (final_amount, total_contributions) = if monthly_payment == 0.0 {
        (grow_principal(principal, rate, periods, years), principal)
    } else {
        let grown = grow_principal(principal, rate, periods, years)
            + grow_payments(monthly_payment, rate, years);
        let contributed = principal + monthly_payment * 12.0 * f64::from(years);
        (grown, contributed)
    };

    let total_interest = final_amount - total_contributions;

    CalcResult::CompoundInterest {
        final_amount: round_cents(final_amount),
        total_contributions: round_cents(total_contributions),
        total_interest: round_cents(total_interest),
        annual_return: annual_return(total_contributions, final_amount, years),
        yearly_breakdown: yearly_breakdown(principal, monthly_payment, rate, years),
    }
}
