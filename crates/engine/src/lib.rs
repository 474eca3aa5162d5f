//! The calculation engine capability and its built-in local implementation.

pub mod compound;
pub mod loan;
pub mod local;

use async_trait::async_trait;
use thiserror::Error;

use zins_core::calc::{CalcInput, CalcResult, ValidationError};

pub use local::LocalEngine;

/// Engine failure for a single invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("computation error: {0}")]
    Computation(String),
}

/// The pluggable capability that performs the actual domain computation.
///
/// Implementations are pure functions of input to result; they may be
/// slow (a remote rate service, a WASM module), which is why invocation
/// is async and the scheduler bounds it with a timeout.
#[async_trait]
pub trait CalculationEngine: Send + Sync {
    async fn invoke(&self, input: &CalcInput) -> Result<CalcResult, EngineError>;
}
