//! Built-in in-process engine.

use async_trait::async_trait;
use tracing::debug;

use zins_core::calc::{CalcInput, CalcResult};

use crate::{compound, loan, CalculationEngine, EngineError};

/// Pure in-process implementation of every supported calculation type.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEngine;

impl LocalEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CalculationEngine for LocalEngine {
    async fn invoke(&self, input: &CalcInput) -> Result<CalcResult, EngineError> {
        input.validate()?;
        debug!(calc_type = %input.calc_type(), "Running local calculation");

        let result = match *input {
            CalcInput::CompoundInterest {
                principal,
                monthly_payment,
                annual_rate,
                years,
                compound_frequency,
            } => compound::compute(principal, monthly_payment, annual_rate, years, compound_frequency),
            CalcInput::LoanAmortization {
                loan_amount,
                annual_rate,
                years,
            } => loan::compute(loan_amount, annual_rate, years),
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zins_core::calc::Frequency;

    #[tokio::test]
    async fn dispatches_compound_interest() {
        let engine = LocalEngine::new();
        let input = CalcInput::CompoundInterest {
            principal: 1000.0,
            monthly_payment: 0.0,
            annual_rate: 5.0,
            years: 10,
            compound_frequency: Frequency::Yearly,
        };
        let result = engine.invoke(&input).await.unwrap();
        assert!(matches!(result, CalcResult::CompoundInterest { .. }));
    }

    #[tokio::test]
    async fn dispatches_loan_amortization() {
        let engine = LocalEngine::new();
        let input = CalcInput::LoanAmortization {
            loan_amount: 100_000.0,
            annual_rate: 6.0,
            years: 30,
        };
        let result = engine.invoke(&input).await.unwrap();
        assert!(matches!(result, CalcResult::LoanAmortization { .. }));
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let engine = LocalEngine::new();
        let input = CalcInput::LoanAmortization {
            loan_amount: -1.0,
            annual_rate: 6.0,
            years: 30,
        };
        assert!(matches!(
            engine.invoke(&input).await,
            Err(EngineError::InvalidInput(_))
        ));
    }
}
