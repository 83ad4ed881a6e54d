//! Momentum assignment: encode slim roads and query the pT model once per
//! event.

use crate::error::{EmtfError, EmtfResult};
use crate::geometry::{layer, N_LAYERS, QUADSTRIP};
use crate::model::{EncodedRoad, PtModel, Prediction, N_FEATURES};
use crate::road::RoadVariables;

/// Theta residual scale (theta codes per unit feature).
const THETA_SCALE: f32 = 8.0;

/// Field indices inside [`RoadVariables`].
const PHI: usize = 0;
const THETA: usize = 1;
const BEND: usize = 2;

/// Maps [`RoadVariables`] onto the model input layout.
///
/// Per layer: phi relative to the road centre in quadstrips, theta relative
/// to the CSC median over [`THETA_SCALE`], and the corrected bend. Missing
/// layers encode as zero and are flagged in the mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder;

impl Encoder {
    pub fn encode(&self, vars: &RoadVariables) -> EncodedRoad {
        let [ipt, ieta, iphi] = vars.road_info();
        let road_phi = iphi * QUADSTRIP as f32;
        let theta_median = csc_theta_median(vars);

        let mut features = [0.0f32; N_FEATURES];
        let mut mask = [true; N_LAYERS];
        for lay in 0..N_LAYERS {
            if vars.is_missing(lay) {
                continue;
            }
            mask[lay] = false;
            features[lay] = (vars.field(PHI, lay) - road_phi) / QUADSTRIP as f32;
            features[N_LAYERS + lay] = (vars.field(THETA, lay) - theta_median) / THETA_SCALE;
            features[2 * N_LAYERS + lay] = vars.field(BEND, lay);
        }
        features[N_FEATURES - 3] = (ipt - 4.0) / 4.0;
        features[N_FEATURES - 2] = ieta / 5.0;
        features[N_FEATURES - 1] = (theta_median - 3.0) / 83.0;
        EncodedRoad { features, mask }
    }

    pub fn encode_batch(&self, vars: &[RoadVariables]) -> Vec<EncodedRoad> {
        vars.iter().map(|v| self.encode(v)).collect()
    }
}

/// Median theta over the CSC layers present; 0 when none are.
fn csc_theta_median(vars: &RoadVariables) -> f32 {
    let mut thetas: Vec<f32> = (layer::ME11..=layer::ME4)
        .filter(|&l| !vars.is_missing(l))
        .map(|l| vars.field(THETA, l))
        .collect();
    if thetas.is_empty() {
        return 0.0;
    }
    thetas.sort_by(f32::total_cmp);
    let n = thetas.len();
    if n % 2 == 1 {
        thetas[n / 2]
    } else {
        (thetas[n / 2 - 1] + thetas[n / 2]) / 2.0
    }
}

/// Encoded batch with the model's predictions, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PtAssignment {
    pub encoded: Vec<EncodedRoad>,
    pub predictions: Vec<Prediction>,
}

/// Encode `variables` and run the model on the whole batch. An empty batch
/// returns empty outputs without calling the model.
pub fn run(variables: &[RoadVariables], model: &dyn PtModel) -> EmtfResult<PtAssignment> {
    if variables.is_empty() {
        return Ok(PtAssignment::default());
    }
    let encoded = Encoder.encode_batch(variables);
    let predictions = model.predict(&encoded)?;
    if predictions.len() != encoded.len() {
        return Err(EmtfError::BatchMismatch {
            what: "predictions",
            expected: encoded.len(),
            got: predictions.len(),
        });
    }
    tracing::debug!("pT assignment: {} roads", encoded.len());
    Ok(PtAssignment {
        encoded,
        predictions,
    })
}
