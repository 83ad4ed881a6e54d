//! Geometry and encoding tables for the endcap trigger.
//!
//! - [`tables`]: the immutable lookup tables (layer, zone, partner, bend and
//!   phi corrections, road quality and sort code) bundled in
//!   [`GeometryTables`].
//! - [`mode`]: station-coverage bitmask predicates.
//! - [`coords`]: conversions between integer trigger codes and physical
//!   angles, plus binning helpers.

pub mod coords;
pub mod mode;
pub mod tables;

pub use coords::{find_eta_bin, find_pt_bin};
pub use mode::{is_muopen, is_single, is_singlemu, station_bit, MODE_ALL_STATIONS};
pub use tables::{GeometryTables, ZoneSet};

/// Number of canonical layers: 5 CSC + 4 RPC + 2 GEM + 1 ME0.
pub const N_LAYERS: usize = 12;

/// Number of pT bins in the pattern bank.
pub const N_PT_BINS: usize = 9;

/// Number of eta zones in the pattern bank.
pub const N_ETA_ZONES: usize = 6;

/// Number of sector processors (6 sectors x 2 endcaps).
pub const N_SECTORS: usize = 12;

/// q/pT bin edges (1/GeV) of the pattern bank.
pub const PT_BINS: [f32; N_PT_BINS + 1] = [
    -0.5, -0.365, -0.26, -0.155, -0.07, 0.07, 0.155, 0.26, 0.365, 0.5,
];

/// |eta| zone edges, highest eta first (zone 0 is the most forward).
pub const ETA_BINS: [f32; N_ETA_ZONES + 1] = [2.4, 2.15, 1.98, 1.8, 1.7, 1.55, 1.2];

/// Azimuth codes per quadstrip (4 strips x 8 codes).
pub const QUADSTRIP: i32 = 32;

/// Highest valid road phi bin.
pub const MAX_PHI_BIN: i32 = 4928 / QUADSTRIP;

/// Layer indices by name.
pub mod layer {
    pub const ME11: usize = 0;
    pub const ME12: usize = 1;
    pub const ME2: usize = 2;
    pub const ME3: usize = 3;
    pub const ME4: usize = 4;
    pub const RE1: usize = 5;
    pub const RE2: usize = 6;
    pub const RE3: usize = 7;
    pub const RE4: usize = 8;
    pub const GE11: usize = 9;
    pub const GE21: usize = 10;
    pub const ME0: usize = 11;
}
