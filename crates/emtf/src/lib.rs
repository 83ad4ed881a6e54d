//! emtf — endcap muon track-finder trigger emulator.
//!
//! Reconstructs trigger tracks from per-event muon-detector hits (CSC, RPC,
//! GEM, ME0) with the integer semantics of the sector-processor firmware.
//! The pipeline stages are:
//!
//! 1. **Recognition** – classify hits into layers and zones, match them
//!    against the pattern bank and build candidate roads per sector.
//! 2. **Cleaning** – collapse phi-adjacent duplicates, require a consistent
//!    bunch crossing and suppress overlapping roads.
//! 3. **Slimming** – keep the best hit per layer.
//! 4. **pT assignment** – encode roads and query a [`PtModel`].
//! 5. **Track producer** – trigger decision, pT calibration and [`Track`]
//!    assembly.
//!
//! # Public API
//! - [`TrackBuilder`] as the primary entry point,
//! - [`PatternBank`] and [`TrackBuildConfig`] for setup,
//! - [`PtModel`] as the seam for trained momentum models,
//! - hit, road and track records plus the stage modules under [`pipeline`].

mod bank;
mod builder;
mod config;
mod context;
mod error;
pub mod geometry;
mod hit;
mod model;
mod particle;
pub mod pipeline;
mod road;
mod track;

#[cfg(test)]
mod test_utils;

pub use bank::{BankArray, PatternBank, BANK_SHAPE};
pub use builder::TrackBuilder;
pub use config::{CleaningConfig, RecognitionConfig, TrackBuildConfig, TriggerConfig};
pub use context::TriggerContext;
pub use error::{EmtfError, EmtfResult};
pub use geometry::GeometryTables;
pub use hit::{Hit, HitType, RoadHit};
pub use model::{EncodedRoad, LutPtModel, Prediction, PtModel, N_FEATURES};
pub use particle::{particles_to_parameters, Particle};
pub use pipeline::{EventResult, StageCounts};
pub use road::{roads_to_variables, Road, RoadId, RoadVariables, N_ROAD_VARIABLES};
pub use track::{Track, TrackFit};
