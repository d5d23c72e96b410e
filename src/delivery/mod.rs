//! The delivery cycle: state machine, run journal, and the pipeline that
//! drives a feature from failing test to open change request.

pub mod journal;
pub mod pipeline;
pub mod state;

pub use journal::RunJournal;
pub use pipeline::{DeliveryPipeline, PipelineOptions};
pub use state::{CycleState, DeliveryOutcome, IterationState};
