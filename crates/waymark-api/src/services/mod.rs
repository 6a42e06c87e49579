//! Request-scoped services: backend construction, the save pipeline, and
//! usage-ledger bookkeeping.

pub mod backends;
pub mod pipeline;
pub mod usage;

pub use pipeline::{run_save, PipelineDeps, SaveInput, SaveOutcome, StageOutcome, StageReport};
