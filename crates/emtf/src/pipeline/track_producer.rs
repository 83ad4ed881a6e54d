//! Track producer: trigger decision, pT calibration and track assembly.

use crate::config::TriggerConfig;
use crate::error::{EmtfError, EmtfResult};
use crate::geometry::{find_pt_bin, is_singlemu, layer, GeometryTables, N_LAYERS};
use crate::model::{EncodedRoad, Prediction};
use crate::road::Road;
use crate::track::{Track, TrackFit};

/// Mode reported for roads accepted through the ME0 override.
const MODE_ME0_OVERRIDE: u8 = 11;

/// Station-group bit of each layer: ME1/1, ME1/2, RE1, GE1/1, ME0 -> bit 3;
/// ME2, RE2, GE2/1 -> bit 2; ME3, RE3 -> bit 1; ME4, RE4 -> bit 0.
const LAYER_STATION_BIT: [u8; N_LAYERS] = [3, 3, 2, 1, 0, 3, 2, 1, 0, 3, 2, 3];

/// Model pT (GeV) below which calibration is bypassed.
const CALIBRATION_MIN_PT: f32 = 2.0;

/// Calibrated pT at the lower edge of each 0.5 GeV bin of [0, 60).
const PT_CALIBRATION_LUT: [f32; 120] = [
    1.8005, 1.5194, 1.5708, 1.8247, 2.1989, 2.6489, 3.1625, 3.7251, //
    4.3240, 4.9595, 5.6337, 6.3424, 7.0590, 7.7485, 8.4050, 9.0398, //
    9.6598, 10.2800, 10.9236, 11.6060, 12.3216, 13.0521, 13.7887, 14.5427, //
    15.2964, 16.0232, 16.7303, 17.4535, 18.2066, 19.0044, 19.8400, 20.6934, //
    21.5215, 22.3143, 23.1066, 23.8221, 24.4586, 25.1335, 25.9083, 26.7333, //
    27.5310, 28.2623, 28.9778, 29.7226, 30.5507, 31.4670, 32.4541, 33.5263, //
    34.5659, 35.5155, 36.4457, 37.4019, 38.3762, 39.3604, 40.3595, 41.3763, //
    42.3333, 43.2434, 44.2686, 45.5962, 47.0878, 48.3783, 49.4891, 50.5445, //
    51.4431, 52.2846, 53.1180, 53.9492, 54.7793, 55.6090, 56.4384, 57.2676, //
    58.0967, 58.9257, 59.7547, 60.5836, 61.4125, 62.2413, 63.0702, 63.8990, //
    64.7278, 65.5566, 66.3854, 67.2142, 68.0430, 68.8718, 69.7006, 70.5293, //
    71.3581, 72.1869, 73.0157, 73.8444, 74.6732, 75.5020, 76.3307, 77.1595, //
    77.9882, 78.8170, 79.6458, 80.4745, 81.3033, 82.1321, 82.9608, 83.7896, //
    84.6183, 85.4471, 86.2759, 87.1046, 87.9334, 88.7621, 89.5909, 90.4197, //
    91.2484, 92.0772, 92.9059, 93.7347, 94.5635, 95.3922, 96.2210, 97.0497,
];

/// Piecewise-linear pT calibration over fixed-width bins.
#[derive(Debug, Clone, PartialEq)]
pub struct PtCalibration {
    lut: Vec<f32>,
    min: f32,
    max: f32,
}

impl Default for PtCalibration {
    fn default() -> Self {
        Self {
            lut: PT_CALIBRATION_LUT.to_vec(),
            min: 0.0,
            max: 60.0,
        }
    }
}

impl PtCalibration {
    fn step(&self) -> f32 {
        (self.max - self.min) / self.lut.len() as f32
    }

    /// Bin of `pt` after clipping into `[min, max)`; the last bin is folded
    /// into its neighbour so interpolation always has an upper edge.
    pub fn bin(&self, pt: f32) -> usize {
        let nbins = self.lut.len();
        let x = pt.clamp(self.min, self.max - 1e-5);
        let bin = ((x - self.min) / (self.max - self.min) * nbins as f32) as usize;
        bin.min(nbins - 2)
    }

    /// Calibrated pT for a model pT. Values up to 2 GeV pass through.
    pub fn correct(&self, xml_pt: f32) -> f32 {
        if xml_pt <= CALIBRATION_MIN_PT {
            return xml_pt;
        }
        let bin = self.bin(xml_pt);
        let step = self.step();
        let x0 = bin as f32 * step;
        let x1 = (bin + 1) as f32 * step;
        let (y0, y1) = (self.lut[bin], self.lut[bin + 1]);
        (xml_pt - x0) / (x1 - x0) * (y1 - y0) + y0
    }
}

/// Station-group coverage of the layers present in `mask`, with the ME0
/// override applied.
pub fn mode_from_mask(mask: &[bool; N_LAYERS]) -> u8 {
    let present = |l: usize| !mask[l];
    let mut mode = 0u8;
    for lay in (0..N_LAYERS).filter(|&l| present(l)) {
        mode |= 1 << LAYER_STATION_BIT[lay];
    }
    let me0_full = present(layer::ME0)
        && present(layer::ME11)
        && (present(layer::ME2) || present(layer::ME3) || present(layer::ME4));
    if !is_singlemu(mode) && me0_full {
        mode = MODE_ME0_OVERRIDE;
    }
    mode
}

/// Trigger decision for one road.
pub fn pass_trigger(
    straightness: i32,
    mode: u8,
    prediction: &Prediction,
    tables: &GeometryTables,
    config: &TriggerConfig,
) -> bool {
    let quality1 = tables.road_quality(straightness.max(0) as usize);
    let quality2 = tables.road_quality(find_pt_bin(prediction.inv_pt));
    if !(is_singlemu(mode) && quality2 <= quality1 + 1) {
        return false;
    }
    let pt = prediction.pt();
    let discr = prediction.discriminant;
    if pt > config.high_pt_cut {
        discr > config.high_pt_discr
    } else if pt > config.discr_pt_cut {
        discr > config.mid_pt_discr
    } else {
        discr >= 0.0
    }
}

/// Build tracks for the slim roads that pass the trigger.
///
/// All three batches must be index-aligned.
pub fn run(
    roads: &[Road],
    encoded: &[EncodedRoad],
    predictions: &[Prediction],
    tables: &GeometryTables,
    config: &TriggerConfig,
    calibration: &PtCalibration,
) -> EmtfResult<Vec<Track>> {
    if encoded.len() != roads.len() {
        return Err(EmtfError::BatchMismatch {
            what: "encoded roads",
            expected: roads.len(),
            got: encoded.len(),
        });
    }
    if predictions.len() != roads.len() {
        return Err(EmtfError::BatchMismatch {
            what: "predictions",
            expected: roads.len(),
            got: predictions.len(),
        });
    }

    let mut tracks = Vec::new();
    for ((road, enc), pred) in roads.iter().zip(encoded).zip(predictions) {
        let mode = mode_from_mask(&enc.mask);
        if !pass_trigger(enc.straightness(), mode, pred, tables, config) {
            continue;
        }
        let xml_pt = pred.pt();
        let fit = TrackFit {
            mode,
            xml_pt,
            pt: calibration.correct(xml_pt),
            q: pred.charge(),
            ndof: enc.ndof(),
            chi2: pred.discriminant,
        };
        tracks.push(Track::new(road, fit)?);
    }
    tracing::debug!(
        "Track producer: {} roads -> {} tracks",
        roads.len(),
        tracks.len()
    );
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::N_FEATURES;
    use crate::test_utils::{road_hit, road_with_hits};
    use approx::assert_relative_eq;

    fn mask_with(layers: &[usize]) -> [bool; N_LAYERS] {
        let mut mask = [true; N_LAYERS];
        for &l in layers {
            mask[l] = false;
        }
        mask
    }

    fn encoded(strg: i32, layers: &[usize]) -> EncodedRoad {
        let mut features = [0.0f32; N_FEATURES];
        features[N_FEATURES - 3] = (strg as f32 - 4.0) / 4.0;
        EncodedRoad {
            features,
            mask: mask_with(layers),
        }
    }

    fn pred(inv_pt: f32, discriminant: f32) -> Prediction {
        Prediction {
            inv_pt,
            discriminant,
        }
    }

    #[test]
    fn calibration_is_monotone_over_domain() {
        let calib = PtCalibration::default();
        let mut prev = calib.correct(2.0001);
        let mut x = 2.0001f32;
        while x < 60.0 {
            let y = calib.correct(x);
            assert!(y >= prev - 1e-4, "pT {x}: {y} < {prev}");
            prev = y;
            x += 0.05;
        }
    }

    #[test]
    fn calibration_boundaries() {
        let calib = PtCalibration::default();
        assert_eq!(calib.correct(0.0), 0.0);
        assert_eq!(calib.correct(1.5), 1.5);
        assert_eq!(calib.bin(0.0), 0);
        assert_eq!(calib.bin(60.0), 118);
        assert_eq!(calib.bin(1000.0), 118);
        assert_relative_eq!(calib.correct(2.25), 2.4239, epsilon = 1e-3);
        // Unclipped value extrapolates along the last segment.
        let at_max = calib.correct(60.0);
        assert_relative_eq!(at_max, 97.0497 + (97.0497 - 96.2210), epsilon = 1e-3);
        assert!(calib.correct(100.0) > at_max);
    }

    #[test]
    fn mode_groups_stations() {
        assert_eq!(mode_from_mask(&mask_with(&[0, 2, 3, 4])), 15);
        assert_eq!(mode_from_mask(&mask_with(&[9, 6, 7])), 14);
        assert_eq!(mode_from_mask(&mask_with(&[5])), 8);
        assert_eq!(mode_from_mask(&mask_with(&[])), 0);
    }

    #[test]
    fn me0_override_reports_mode_eleven() {
        assert_eq!(mode_from_mask(&mask_with(&[11, 0, 2])), MODE_ME0_OVERRIDE);
        // Already single-mu: left alone.
        assert_eq!(mode_from_mask(&mask_with(&[11, 0, 2, 3])), 14);
        // ME1/2 does not satisfy the ME1/1 requirement.
        assert_eq!(mode_from_mask(&mask_with(&[11, 1, 2])), 12);
    }

    #[test]
    fn trigger_thresholds_by_pt_regime() {
        let tables = GeometryTables::new();
        let cfg = TriggerConfig::default();
        // 1/0.05 = 20 GeV, high-pT regime.
        assert!(pass_trigger(4, 15, &pred(0.05, 0.9), &tables, &cfg));
        assert!(!pass_trigger(4, 15, &pred(0.05, 0.85), &tables, &cfg));
        // 10 GeV.
        assert!(pass_trigger(4, 15, &pred(0.1, 0.75), &tables, &cfg));
        assert!(!pass_trigger(4, 15, &pred(0.1, 0.7), &tables, &cfg));
        // 5 GeV passes on any non-negative discriminant.
        assert!(pass_trigger(7, 15, &pred(0.2, 0.0), &tables, &cfg));
        assert!(!pass_trigger(7, 15, &pred(0.2, f32::NAN), &tables, &cfg));
    }

    #[test]
    fn trigger_requires_compatible_quality() {
        let tables = GeometryTables::new();
        let cfg = TriggerConfig::default();
        // Road built as very curved (quality 0), model says straight (quality 4).
        assert!(!pass_trigger(0, 15, &pred(0.01, 1.0), &tables, &cfg));
        // Road straight, model curved: one-sided test passes.
        assert!(pass_trigger(4, 15, &pred(-0.45, 1.0), &tables, &cfg));
        assert!(!pass_trigger(4, 12, &pred(-0.45, 1.0), &tables, &cfg));
    }

    #[test]
    fn isolated_layer_fails_the_trigger() {
        let tables = GeometryTables::new();
        let cfg = TriggerConfig::default();
        let enc = encoded(4, &[layer::ME3]);
        assert_eq!(enc.ndof(), 1);
        let mode = mode_from_mask(&enc.mask);
        assert_eq!(mode, 1 << 1);
        assert!(!pass_trigger(enc.straightness(), mode, &pred(0.2, 1.0), &tables, &cfg));

        let road = road_with_hits(100, vec![road_hit(layer::ME3, 3200, 20)]);
        let tracks = run(
            &[road],
            &[enc],
            &[pred(0.2, 1.0)],
            &tables,
            &cfg,
            &PtCalibration::default(),
        )
        .unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn passing_road_becomes_a_track() {
        let tables = GeometryTables::new();
        let layers = [layer::ME11, layer::ME2, layer::ME3, layer::ME4];
        let road = road_with_hits(
            100,
            layers.iter().map(|&l| road_hit(l, 3200, 20)).collect(),
        );
        let tracks = run(
            &[road],
            &[encoded(7, &layers)],
            &[pred(-0.2, 0.3)],
            &tables,
            &TriggerConfig::default(),
            &PtCalibration::default(),
        )
        .unwrap();
        assert_eq!(tracks.len(), 1);
        let trk = &tracks[0];
        assert_eq!(trk.mode, 15);
        assert_eq!(trk.ndof, 4);
        assert_eq!(trk.q, -1);
        assert_relative_eq!(trk.xml_pt, 5.0, epsilon = 1e-5);
        assert!(trk.pt > trk.xml_pt);
        assert_eq!(trk.hits.len(), 4);
    }

    #[test]
    fn misaligned_batches_are_fatal() {
        let tables = GeometryTables::new();
        let road = road_with_hits(100, vec![road_hit(0, 3200, 20)]);
        let err = run(
            &[road.clone(), road],
            &[encoded(4, &[0]), encoded(4, &[0])],
            &[pred(0.1, 1.0)],
            &tables,
            &TriggerConfig::default(),
            &PtCalibration::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EmtfError::BatchMismatch {
                what: "predictions",
                ..
            }
        ));
    }
}
