//! Momentum-model seam: the encoded road contract and model implementations.
//!
//! A [`PtModel`] receives one [`EncodedRoad`] per slim road and returns one
//! [`Prediction`] per input, in order. The pipeline never looks inside the
//! model; [`LutPtModel`] is a pure-table stand-in that keeps the crate usable
//! without a trained network.

use std::path::Path;

use crate::error::{EmtfError, EmtfResult};
use crate::geometry::{N_LAYERS, N_PT_BINS};

/// Per-layer encoded fields: phi, theta, bend.
pub const N_ENCODED_LAYER_FIELDS: usize = 3;

/// Encoded feature count: per-layer fields plus straightness, zone and
/// theta-median scalars.
pub const N_FEATURES: usize = N_LAYERS * N_ENCODED_LAYER_FIELDS + 3;

/// One road as seen by the model.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncodedRoad {
    #[serde(with = "feature_array")]
    pub features: [f32; N_FEATURES],
    /// `true` for layers without a retained hit.
    pub mask: [bool; N_LAYERS],
}

impl EncodedRoad {
    /// Layers with a retained hit.
    pub fn ndof(&self) -> usize {
        self.mask.iter().filter(|&&missing| !missing).count()
    }

    /// pT bin the road was built in.
    pub fn straightness(&self) -> i32 {
        (self.features[N_FEATURES - 3] * 4.0 + 4.0).round() as i32
    }

    pub fn zone(&self) -> i32 {
        (self.features[N_FEATURES - 2] * 5.0).round() as i32
    }

    /// Median theta code of the retained CSC hits.
    pub fn theta_median(&self) -> i32 {
        (self.features[N_FEATURES - 1] * 83.0 + 3.0).round() as i32
    }
}

// serde only derives arrays up to 32 elements.
mod feature_array {
    use super::N_FEATURES;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[f32; N_FEATURES], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[f32; N_FEATURES], D::Error> {
        let v = Vec::<f32>::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| D::Error::invalid_length(len, &"39 features"))
    }
}

/// Model output for one road.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prediction {
    /// Regressed signed inverse pT (1/GeV).
    pub inv_pt: f32,
    pub discriminant: f32,
}

impl Prediction {
    /// Unscaled |pT| in GeV.
    pub fn pt(&self) -> f32 {
        (1.0 / self.inv_pt).abs()
    }

    /// Charge sign; 0 when the regression returned exactly zero.
    pub fn charge(&self) -> i32 {
        if self.inv_pt > 0.0 {
            1
        } else if self.inv_pt < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Inverse-pT regression plus discriminant, evaluated on a whole batch.
pub trait PtModel: Send + Sync {
    fn predict(&self, batch: &[EncodedRoad]) -> EmtfResult<Vec<Prediction>>;
}

impl<F> PtModel for F
where
    F: Fn(&[EncodedRoad]) -> EmtfResult<Vec<Prediction>> + Send + Sync,
{
    fn predict(&self, batch: &[EncodedRoad]) -> EmtfResult<Vec<Prediction>> {
        self(batch)
    }
}

/// Table model: inverse pT looked up from the road's straightness bin,
/// discriminant = fraction of layers present.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LutPtModel {
    /// Signed inverse pT per pT bin.
    pub inv_pt: Vec<f32>,
}

impl Default for LutPtModel {
    fn default() -> Self {
        Self {
            inv_pt: vec![
                -0.4325, -0.3125, -0.2075, -0.1125, 0.02, 0.1125, 0.2075, 0.3125, 0.4325,
            ],
        }
    }
}

impl LutPtModel {
    pub fn from_json_file(path: &Path) -> EmtfResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&data)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> EmtfResult<()> {
        if self.inv_pt.len() != N_PT_BINS {
            return Err(EmtfError::Model(format!(
                "table has {} entries, expected {}",
                self.inv_pt.len(),
                N_PT_BINS
            )));
        }
        Ok(())
    }
}

impl PtModel for LutPtModel {
    fn predict(&self, batch: &[EncodedRoad]) -> EmtfResult<Vec<Prediction>> {
        self.validate()?;
        let max_bin = (N_PT_BINS - 1) as i32;
        Ok(batch
            .iter()
            .map(|road| {
                let bin = road.straightness().clamp(0, max_bin) as usize;
                Prediction {
                    inv_pt: self.inv_pt[bin],
                    discriminant: road.ndof() as f32 / N_LAYERS as f32,
                }
            })
            .collect())
    }
}
