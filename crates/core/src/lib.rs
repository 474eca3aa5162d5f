pub mod calc;
pub mod config;
pub mod task;

pub use calc::{CalcInput, CalcResult, CalcType, Frequency, ValidationError, YearlyBreakdown, YearlySchedule};
pub use config::QueueConfig;
pub use task::{Priority, Task, TaskId, TaskStatus};
