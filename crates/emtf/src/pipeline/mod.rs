//! Track-finding pipeline.
//!
//! Stages, in call order:
//! recognition (hits -> roads) -> cleaning -> slimming -> pT assignment ->
//! track producer. Each stage consumes the previous stage's complete output
//! and borrows the shared [`TriggerContext`](crate::TriggerContext).
//!
//! Entry point: `process_event`, wrapped by [`TrackBuilder`](crate::TrackBuilder).

pub mod cleaning;
pub mod pt_assign;
pub mod recognition;
mod result;
mod run;
pub mod slimming;
pub mod track_producer;

pub use result::{EventResult, StageCounts};

pub(crate) use run::process_event;
