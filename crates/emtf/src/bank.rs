//! Pattern bank: expected phi windows and inter-layer templates.
//!
//! The bank document (`emtf.pattern_bank.v1`) carries three `int32` arrays
//! of shape `(pt bins, eta zones, layers, 3)`:
//! - `patterns_phi`: `[min, mid, max]` phi offset window in quadstrips,
//! - `patterns_theta`: theta windows (optional, zero when absent),
//! - `patterns_match`: per-layer templates, slot 1 is the mean phi offset to
//!   the layer's slimming partner.

use std::path::Path;

use crate::error::{EmtfError, EmtfResult};
use crate::geometry::{N_ETA_ZONES, N_LAYERS, N_PT_BINS};

const BANK_SCHEMA_V1: &str = "emtf.pattern_bank.v1";

/// Shape every bank array must have.
pub const BANK_SHAPE: [usize; 4] = [N_PT_BINS, N_ETA_ZONES, N_LAYERS, 3];

const BANK_LEN: usize = N_PT_BINS * N_ETA_ZONES * N_LAYERS * 3;

/// One serialized bank array.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankArray {
    pub dtype: String,
    pub shape: Vec<usize>,
    pub data: Vec<i32>,
}

impl BankArray {
    /// Wrap row-major `int32` data with the bank shape.
    pub fn new(data: Vec<i32>) -> Self {
        Self {
            dtype: "int32".to_string(),
            shape: BANK_SHAPE.to_vec(),
            data,
        }
    }

    fn validate(self, name: &str) -> EmtfResult<Vec<i32>> {
        let fail = |reason: String| EmtfError::BankFormat {
            name: name.to_string(),
            reason,
        };
        if self.dtype != "int32" {
            return Err(fail(format!("dtype '{}' (expected 'int32')", self.dtype)));
        }
        if self.shape != BANK_SHAPE {
            return Err(fail(format!(
                "shape {:?} (expected {:?})",
                self.shape, BANK_SHAPE
            )));
        }
        if self.data.len() != BANK_LEN {
            return Err(fail(format!(
                "{} values for shape {:?} (expected {})",
                self.data.len(),
                BANK_SHAPE,
                BANK_LEN
            )));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternBankDocV1 {
    schema: String,
    patterns_phi: BankArray,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patterns_theta: Option<BankArray>,
    patterns_match: BankArray,
}

/// Immutable pattern bank shared by every sector and stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBank {
    phi: Vec<i32>,
    theta: Vec<i32>,
    matching: Vec<i32>,
}

#[inline]
fn flat_index(ipt: usize, zone: usize, layer: usize, slot: usize) -> usize {
    ((ipt * N_ETA_ZONES + zone) * N_LAYERS + layer) * 3 + slot
}

impl PatternBank {
    /// Build from validated arrays. `theta` defaults to zeros.
    pub fn from_arrays(
        phi: BankArray,
        theta: Option<BankArray>,
        matching: BankArray,
    ) -> EmtfResult<Self> {
        let phi = phi.validate("patterns_phi")?;
        let theta = match theta {
            Some(arr) => arr.validate("patterns_theta")?,
            None => vec![0; BANK_LEN],
        };
        let matching = matching.validate("patterns_match")?;
        Ok(Self {
            phi,
            theta,
            matching,
        })
    }

    /// Load a bank from a JSON document on disk.
    pub fn from_json_file(path: &Path) -> EmtfResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> EmtfResult<Self> {
        let doc: PatternBankDocV1 = serde_json::from_str(data)?;
        if doc.schema != BANK_SCHEMA_V1 {
            return Err(EmtfError::BankFormat {
                name: "schema".to_string(),
                reason: format!(
                    "unsupported schema '{}' (expected '{}')",
                    doc.schema, BANK_SCHEMA_V1
                ),
            });
        }
        let bank = Self::from_arrays(doc.patterns_phi, doc.patterns_theta, doc.patterns_match)?;
        let populated = bank.populated_windows();
        if populated == 0 {
            tracing::warn!("Pattern bank has no populated phi windows; no roads will be built");
        } else {
            tracing::debug!("Loaded pattern bank: {} populated phi windows", populated);
        }
        Ok(bank)
    }

    /// Serialize to the JSON bank document.
    pub fn to_json_string(&self) -> EmtfResult<String> {
        let doc = PatternBankDocV1 {
            schema: BANK_SCHEMA_V1.to_string(),
            patterns_phi: BankArray::new(self.phi.clone()),
            patterns_theta: Some(BankArray::new(self.theta.clone())),
            patterns_match: BankArray::new(self.matching.clone()),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Phi offset window `[min, mid, max]` in quadstrips.
    pub fn phi_window(&self, ipt: usize, zone: usize, layer: usize) -> [i32; 3] {
        let base = flat_index(ipt, zone, layer, 0);
        [self.phi[base], self.phi[base + 1], self.phi[base + 2]]
    }

    pub fn theta_window(&self, ipt: usize, zone: usize, layer: usize) -> [i32; 3] {
        let base = flat_index(ipt, zone, layer, 0);
        [self.theta[base], self.theta[base + 1], self.theta[base + 2]]
    }

    /// Mean phi offset from `layer` to its slimming partner.
    pub fn match_offset(&self, ipt: usize, zone: usize, layer: usize) -> i32 {
        self.matching[flat_index(ipt, zone, layer, 1)]
    }

    /// Number of (ipt, zone, layer) cells with a non-empty phi window.
    pub fn populated_windows(&self) -> usize {
        self.phi.chunks_exact(3).filter(|w| w[0] <= w[2]).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::straight_bank;

    #[test]
    fn rejects_wrong_dtype() {
        let mut phi = BankArray::new(vec![0; BANK_LEN]);
        phi.dtype = "float32".to_string();
        let err = PatternBank::from_arrays(phi, None, BankArray::new(vec![0; BANK_LEN]))
            .unwrap_err();
        match err {
            EmtfError::BankFormat { name, .. } => assert_eq!(name, "patterns_phi"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_wrong_shape() {
        let mut matching = BankArray::new(vec![0; BANK_LEN]);
        matching.shape = vec![9, 6, 11, 3];
        let err = PatternBank::from_arrays(BankArray::new(vec![0; BANK_LEN]), None, matching)
            .unwrap_err();
        assert!(matches!(err, EmtfError::BankFormat { ref name, .. } if name == "patterns_match"));
    }

    #[test]
    fn rejects_short_data() {
        let err = PatternBank::from_arrays(
            BankArray::new(vec![0; BANK_LEN - 1]),
            None,
            BankArray::new(vec![0; BANK_LEN]),
        )
        .unwrap_err();
        assert!(matches!(err, EmtfError::BankFormat { .. }));
    }

    #[test]
    fn rejects_unknown_schema() {
        let bank = straight_bank();
        let json = bank
            .to_json_string()
            .unwrap()
            .replace(BANK_SCHEMA_V1, "emtf.pattern_bank.v0");
        assert!(matches!(
            PatternBank::from_json_str(&json),
            Err(EmtfError::BankFormat { .. })
        ));
    }

    #[test]
    fn json_document_loads_back() {
        let bank = straight_bank();
        let json = bank.to_json_string().unwrap();
        let loaded = PatternBank::from_json_str(&json).unwrap();
        assert_eq!(loaded, bank);
        assert_eq!(loaded.phi_window(4, 0, 0), [0, 0, 0]);
        assert_eq!(loaded.populated_windows(), N_ETA_ZONES * N_LAYERS);
    }

    #[test]
    fn indexing_is_row_major() {
        let data: Vec<i32> = (0..BANK_LEN as i32).collect();
        let bank = PatternBank::from_arrays(
            BankArray::new(data.clone()),
            None,
            BankArray::new(data),
        )
        .unwrap();
        assert_eq!(bank.phi_window(0, 0, 1), [3, 4, 5]);
        assert_eq!(bank.match_offset(1, 0, 0), (N_ETA_ZONES * N_LAYERS * 3 + 1) as i32);
        assert_eq!(bank.theta_window(8, 5, 11), [0, 0, 0]);
    }
}
