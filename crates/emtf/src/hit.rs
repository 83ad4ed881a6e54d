//! Detector hit records: raw input hits and their classified road copies.

use crate::error::{EmtfError, EmtfResult};

/// Muon detector technology.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HitType {
    /// Drift tubes (barrel; never classified in the endcap).
    Dt,
    /// Cathode strip chambers, the dominant technology.
    Csc,
    /// Resistive plate chambers.
    Rpc,
    /// Gas electron multipliers (GE1/1, GE2/1).
    Gem,
    /// ME0 station in front of ME1/1.
    Me0,
}

impl HitType {
    /// Numeric code used by the ntuple producer (`kDT=0 .. kME0=4`).
    pub const fn code(self) -> usize {
        match self {
            Self::Dt => 0,
            Self::Csc => 1,
            Self::Rpc => 2,
            Self::Gem => 3,
            Self::Me0 => 4,
        }
    }
}

impl TryFrom<i32> for HitType {
    type Error = EmtfError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Dt),
            1 => Ok(Self::Csc),
            2 => Ok(Self::Rpc),
            3 => Ok(Self::Gem),
            4 => Ok(Self::Me0),
            other => Err(EmtfError::InvalidHit(format!("unknown hit type code {other}"))),
        }
    }
}

/// A hit candidate as delivered by the event source.
///
/// `emtf_phi`, `emtf_theta` and `bend` are the integer trigger-primitive
/// codes; `quality` is the cluster width for RPC hits.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Hit {
    #[serde(rename = "type")]
    pub kind: HitType,
    pub station: i32,
    pub ring: i32,
    /// Sector in [1, 6].
    pub sector: i32,
    /// Endcap, -1 or +1.
    pub endcap: i32,
    pub bx: i32,
    /// Front/rear chamber flag (0 or 1).
    #[serde(default)]
    pub fr: i32,
    pub emtf_phi: i32,
    pub emtf_theta: i32,
    #[serde(default)]
    pub bend: i32,
    #[serde(default)]
    pub quality: i32,
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub sim_tp1: i32,
    #[serde(default)]
    pub sim_tp2: i32,
}

impl Hit {
    /// Legit-hit predicate: CSC hits in BX -1 or 0, everything else in BX 0;
    /// RPC hits additionally need a cluster width of at most 9.
    pub fn is_legit(&self) -> bool {
        let bx_ok = match self.kind {
            HitType::Csc => self.bx == -1 || self.bx == 0,
            _ => self.bx == 0,
        };
        let quality_ok = match self.kind {
            HitType::Rpc => self.quality <= 9,
            _ => true,
        };
        bx_ok && quality_ok
    }

    /// True for hits the Run-2 trigger could use: CSC, and RPC outside the
    /// iRPC rings RE3/1 and RE4/1.
    pub fn is_valid_for_run2(&self) -> bool {
        match self.kind {
            HitType::Csc => true,
            HitType::Rpc => !((self.station == 3 || self.station == 4) && self.ring == 1),
            _ => false,
        }
    }

    /// Sector-processor index: 0..5 for the positive endcap, 6..11 for the
    /// negative one.
    pub fn endsec(&self) -> EmtfResult<usize> {
        if !(1..=6).contains(&self.sector) {
            return Err(EmtfError::InvalidHit(format!(
                "sector {} outside [1, 6]",
                self.sector
            )));
        }
        match self.endcap {
            1 => Ok((self.sector - 1) as usize),
            -1 => Ok((self.sector - 1 + 6) as usize),
            other => Err(EmtfError::InvalidHit(format!("endcap {other} is not +/-1"))),
        }
    }

    /// Simulation-truth marker: the hit belongs to the generated muon.
    pub fn is_real(&self) -> bool {
        self.sim_tp1 == 0 && self.sim_tp2 == 0
    }
}

/// A classified hit attached to roads.
///
/// Carries the corrected phi and bend computed by the road builder for the
/// hit's sector; raw codes are not kept.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoadHit {
    #[serde(rename = "type")]
    pub kind: HitType,
    pub station: i32,
    pub ring: i32,
    pub endsec: usize,
    pub fr: i32,
    pub bx: i32,
    pub emtf_layer: usize,
    pub emtf_phi: i32,
    pub emtf_theta: i32,
    pub emtf_bend: i32,
    pub time: f32,
    pub sim_tp: bool,
}
