//! Loan amortization math: fixed-payment annuity schedule.

use zins_core::calc::{round_cents, CalcResult, YearlySchedule};

/// Fixed monthly payment `M = P * r(1+r)^n / ((1+r)^n - 1)` for monthly
/// rate `r` and `n` monthly payments.
fn monthly_payment(loan_amount: f64, monthly_rate: f64, total_months: u32) -> f64 {
    if monthly_rate == 0.0 {
        return loan_amount / f64::from(total_months);
    }
    let factor = (1.0 + monthly_rate).powi(total_months as i32);
    loan_amount * (monthly_rate * factor) / (factor - 1.0)
}

/// Run the full amortization. Inputs are assumed to be validated;
/// `annual_rate` is in percent.
pub fn compute(loan_amount: f64, annual_rate: f64, years: u32) -> CalcResult {
    let monthly_rate = annual_rate / 100.0 / 12.0;
    let total_months = years * 12;
    let payment = monthly_payment(loan_amount, monthly_rate, total_months);

    let mut schedule = Vec::with_capacity(years as usize);
    let mut balance = loan_amount;
    let mut total_interest = 0.0;

    for year in 1..=years {
        let mut principal_paid = 0.0;
        let mut interest_paid = 0.0;

        for _ in 0..12 {
            let interest = balance * monthly_rate;
            // The last payment may be slightly larger or smaller than the
            // nominal one once rounding drift accumulates; clamp so the
            // balance lands exactly on zero.
            let principal = (payment - interest).min(balance);
            balance -= principal;
            interest_paid += interest;
            principal_paid += principal;
        }

        total_interest += interest_paid;
        schedule.push(YearlySchedule {
            year,
            principal_paid: round_cents(principal_paid),
            interest_paid: round_cents(interest_paid),
            remaining_balance: round_cents(balance),
        });
    }

    CalcResult::LoanAmortization {
        monthly_payment: round_cents(payment),
        total_paid: round_cents(loan_amount + total_interest),
        total_interest: round_cents(total_interest),
        schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpack(result: CalcResult) -> (f64, f64, f64, Vec<YearlySchedule>) {
        match result {
            CalcResult::LoanAmortization {
                monthly_payment,
                total_paid,
                total_interest,
                schedule,
            } => (monthly_payment, total_paid, total_interest, schedule),
            other => panic!("unexpected result variant: {other:?}"),
        }
    }

    #[test]
    fn standard_thirty_year_mortgage() {
        // 100k at 6% over 30 years: the classic 599.55/month.
        let (payment, total_paid, total_interest, schedule) = unpack(compute(100_000.0, 6.0, 30));
        assert!((payment - 599.55).abs() < 0.01, "got {payment}");
        assert!((total_paid - 215_838.19).abs() < 1.0, "got {total_paid}");
        assert!((total_interest - 115_838.19).abs() < 1.0);
        assert_eq!(schedule.len(), 30);
    }

    #[test]
    fn balance_reaches_zero() {
        let (_, _, _, schedule) = unpack(compute(250_000.0, 3.5, 15));
        let last = schedule.last().unwrap();
        assert!(last.remaining_balance.abs() < 0.01, "got {}", last.remaining_balance);
    }

    #[test]
    fn balances_strictly_decrease() {
        let (_, _, _, schedule) = unpack(compute(50_000.0, 4.0, 10));
        let mut previous = 50_000.0;
        for row in &schedule {
            assert!(row.remaining_balance < previous);
            previous = row.remaining_balance;
        }
    }

    #[test]
    fn principal_payments_sum_to_loan() {
        let (_, _, _, schedule) = unpack(compute(120_000.0, 5.0, 20));
        let paid: f64 = schedule.iter().map(|r| r.principal_paid).sum();
        assert!((paid - 120_000.0).abs() < 0.5, "got {paid}");
    }

    #[test]
    fn interest_share_shrinks_over_time() {
        let (_, _, _, schedule) = unpack(compute(200_000.0, 4.0, 25));
        assert!(schedule.first().unwrap().interest_paid > schedule.last().unwrap().interest_paid);
        assert!(schedule.first().unwrap().principal_paid < schedule.last().unwrap().principal_paid);
    }

    #[test]
    fn totals_are_consistent() {
        let (payment, total_paid, total_interest, _) = unpack(compute(80_000.0, 2.5, 10));
        assert!((total_paid - (80_000.0 + total_interest)).abs() < 0.01);
        // 120 nominal payments cover the total within rounding drift.
        assert!((payment * 120.0 - total_paid).abs() < 1.0);
    }
}
