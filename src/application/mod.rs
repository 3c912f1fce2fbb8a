//! Application layer - the extraction handler and the services it drives.
//!
//! The handler owns the attempt flow; `invoker`, `retry` and `audit` are the
//! pieces that touch the outside world through ports.

pub mod audit;
pub mod handlers;
pub mod invoker;
pub mod retry;

pub use audit::{AttemptRecord, AuditRecorder};
pub use handlers::{
    ExtractExpenseConfig, ExtractExpenseError, ExtractExpenseHandler, ExtractionOutcome,
};
pub use invoker::{Invocation, InvocationError, ModelInvoker};
pub use retry::{Attempted, RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
