//! Tunable parameters of the track-building pipeline.

use std::path::Path;

use crate::error::EmtfResult;

/// Pattern-recognition (road building) controls.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Half-width (quadstrips) of the phi offsets probed against the bank.
    pub phi_window: i32,
    /// Drop hits the Run-2 trigger could not use (GEM, ME0, iRPC).
    pub only_use_run2: bool,
    /// Build roads for the 12 sector processors on the rayon pool.
    pub parallel_sectors: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            phi_window: 23,
            only_use_run2: false,
            parallel_sectors: true,
        }
    }
}

/// Road-cleaning controls.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Padding (phi bins) applied to both group spans in the overlap test.
    pub span_padding: i32,
    /// Roads need fewer than this many CSC layers with BX <= -1.
    pub max_early_layers: usize,
    /// Roads need at least this many CSC layers with BX <= 0.
    pub min_in_time_layers: usize,
    /// Roads need fewer than this many CSC layers with BX > 0.
    pub max_late_layers: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            span_padding: 2,
            max_early_layers: 3,
            min_in_time_layers: 2,
            max_late_layers: 2,
        }
    }
}

/// Trigger decision thresholds on the model discriminant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Above this regressed pT (GeV) the high-pT cut applies.
    pub high_pt_cut: f32,
    /// Discriminant cut above `high_pt_cut` (98% signal retention).
    pub high_pt_discr: f32,
    /// Above this regressed pT (GeV) the mid-pT cut applies.
    pub discr_pt_cut: f32,
    /// Discriminant cut between `discr_pt_cut` and `high_pt_cut`.
    pub mid_pt_discr: f32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            high_pt_cut: 14.0,
            high_pt_discr: 0.8597,
            discr_pt_cut: 8.0,
            mid_pt_discr: 0.7217,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackBuildConfig {
    pub recognition: RecognitionConfig,
    pub cleaning: CleaningConfig,
    pub trigger: TriggerConfig,
}

impl TrackBuildConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> EmtfResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: TrackBuildConfig =
            serde_json::from_str(r#"{"trigger": {"discr_pt_cut": 10.0}}"#).unwrap();
        assert_eq!(cfg.trigger.discr_pt_cut, 10.0);
        assert_eq!(cfg.trigger.high_pt_discr, 0.8597);
        assert_eq!(cfg.recognition.phi_window, 23);
        assert_eq!(cfg.cleaning, CleaningConfig::default());
    }
}
