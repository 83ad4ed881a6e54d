//! Final trigger tracks.

use crate::error::{EmtfError, EmtfResult};
use crate::geometry::coords::{
    calc_eta_from_theta_deg, calc_phi_glob_deg, calc_phi_loc_deg, calc_theta_deg_from_int,
};
use crate::geometry::QUADSTRIP;
use crate::hit::RoadHit;
use crate::road::Road;

/// A road that passed the trigger decision.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub endcap: i32,
    pub sector: i32,
    pub hits: Vec<RoadHit>,
    pub mode: u8,
    /// Model pT before calibration (GeV).
    pub xml_pt: f32,
    /// Calibrated pT (GeV).
    pub pt: f32,
    pub q: i32,
    /// Local phi code of the road centre.
    pub emtf_phi: i32,
    pub emtf_theta: f32,
    pub ndof: usize,
    /// Model discriminant.
    pub chi2: f32,
    /// Global phi in degrees.
    pub phi: f64,
    pub eta: f64,
}

/// Per-track measurements from the track producer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFit {
    pub mode: u8,
    pub xml_pt: f32,
    pub pt: f32,
    pub q: i32,
    pub ndof: usize,
    pub chi2: f32,
}

impl Track {
    /// Fails if the calibrated pT is not positive.
    pub fn new(road: &Road, fit: TrackFit) -> EmtfResult<Self> {
        if fit.pt.is_nan() || fit.pt <= 0.0 {
            return Err(EmtfError::NonPositivePt {
                road: road.id,
                pt: fit.pt,
            });
        }
        let emtf_phi = road.id.iphi * QUADSTRIP;
        let phi = calc_phi_glob_deg(calc_phi_loc_deg(emtf_phi), road.id.sector);
        let eta = calc_eta_from_theta_deg(
            calc_theta_deg_from_int(f64::from(road.theta_median)),
            road.id.endcap,
        );
        Ok(Self {
            endcap: road.id.endcap,
            sector: road.id.sector,
            hits: road.hits.clone(),
            mode: fit.mode,
            xml_pt: fit.xml_pt,
            pt: fit.pt,
            q: fit.q,
            emtf_phi,
            emtf_theta: road.theta_median,
            ndof: fit.ndof,
            chi2: fit.chi2,
            phi,
            eta,
        })
    }
}
