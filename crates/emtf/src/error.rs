//! Error type shared by every pipeline stage.

use crate::hit::HitType;
use crate::road::RoadId;

/// Result alias used throughout the crate.
pub type EmtfResult<T> = Result<T, EmtfError>;

/// Fatal conditions. Any of these aborts the run; filtered hits and roads
/// are never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum EmtfError {
    /// A hit passed the legit-hit predicate but has no layer assignment.
    #[error("no layer defined for legit hit (type={kind:?}, station={station}, ring={ring})")]
    InvalidLayer {
        /// Technology of the offending hit.
        kind: HitType,
        /// Station number as read from the hit.
        station: i32,
        /// Ring number as read from the hit.
        ring: i32,
    },
    /// A hit carries a sector/endcap outside the detector layout.
    #[error("invalid hit: {0}")]
    InvalidHit(String),
    /// Pattern bank array is missing, mistyped or mis-shaped.
    #[error("pattern bank array '{name}': {reason}")]
    BankFormat {
        /// Array name inside the bank document.
        name: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A track would have been emitted with a non-positive corrected pT.
    #[error("non-positive corrected pT {pt} for road {road:?}")]
    NonPositivePt {
        /// Road the track was built from.
        road: RoadId,
        /// Offending corrected pT.
        pt: f32,
    },
    /// Parallel per-road batches disagree in length.
    #[error("batch length mismatch: {what} has {got} entries, expected {expected}")]
    BatchMismatch {
        /// Which batch was short or long.
        what: &'static str,
        /// Reference length (number of slim roads).
        expected: usize,
        /// Actual length.
        got: usize,
    },
    /// The momentum model failed to produce predictions.
    #[error("pT model: {0}")]
    Model(String),
    /// Underlying I/O failure when reading a resource.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Malformed JSON resource.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
