//! Roads: coarse track stubs keyed by sector, pT bin, zone and phi bin.

use crate::geometry::N_LAYERS;
use crate::hit::RoadHit;

/// Road identity. Field order defines the lexicographic order the cleaner
/// groups by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RoadId {
    pub endcap: i32,
    pub sector: i32,
    pub ipt: usize,
    pub ieta: usize,
    pub iphi: i32,
}

impl RoadId {
    /// Same endcap and sector.
    pub fn same_sector(&self, other: &RoadId) -> bool {
        self.endcap == other.endcap && self.sector == other.sector
    }

    /// Identical except for the phi bin.
    pub fn same_family(&self, other: &RoadId) -> bool {
        self.same_sector(other) && self.ipt == other.ipt && self.ieta == other.ieta
    }
}

/// A candidate road and the hits attached to it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Road {
    pub id: RoadId,
    pub hits: Vec<RoadHit>,
    /// Station coverage over all hits.
    pub mode: u8,
    /// Station coverage over CSC and ME0 hits.
    pub mode_csc: u8,
    pub quality: i32,
    pub sort_code: i32,
    /// Median CSC theta code (may be fractional).
    pub theta_median: f32,
}

/// Number of per-layer variable blocks.
pub const N_LAYER_FIELDS: usize = 6;

/// Length of [`RoadVariables`]: six per-layer blocks, the mask block and
/// three road scalars.
pub const N_ROAD_VARIABLES: usize = N_LAYERS * (N_LAYER_FIELDS + 1) + 3;

/// Flat per-road variables handed to the encoder.
///
/// Layout: `phi[12] theta[12] bend[12] bx[12] ring[12] fr[12] mask[12]
/// ipt ieta iphi`. Missing layers hold NaN and mask 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadVariables(pub [f32; N_ROAD_VARIABLES]);

impl RoadVariables {
    /// Value of per-layer `field` (0..6) at `layer`.
    pub fn field(&self, field: usize, layer: usize) -> f32 {
        self.0[field * N_LAYERS + layer]
    }

    pub fn is_missing(&self, layer: usize) -> bool {
        self.0[N_LAYER_FIELDS * N_LAYERS + layer] != 0.0
    }

    /// `(ipt, ieta, iphi)` as stored.
    pub fn road_info(&self) -> [f32; 3] {
        let base = (N_LAYER_FIELDS + 1) * N_LAYERS;
        [self.0[base], self.0[base + 1], self.0[base + 2]]
    }
}

impl Road {
    /// Encode the road's hits as [`RoadVariables`]. The first hit seen in a
    /// layer wins.
    pub fn to_variables(&self) -> RoadVariables {
        let mut arr = [0.0f32; N_ROAD_VARIABLES];
        arr[..N_LAYER_FIELDS * N_LAYERS].fill(f32::NAN);
        arr[N_LAYER_FIELDS * N_LAYERS..(N_LAYER_FIELDS + 1) * N_LAYERS].fill(1.0);

        let mut seen = [false; N_LAYERS];
        for hit in &self.hits {
            let lay = hit.emtf_layer;
            if seen[lay] {
                continue;
            }
            seen[lay] = true;
            let values = [
                hit.emtf_phi as f32,
                hit.emtf_theta as f32,
                hit.emtf_bend as f32,
                hit.bx as f32,
                hit.ring as f32,
                hit.fr as f32,
            ];
            for (field, value) in values.into_iter().enumerate() {
                arr[field * N_LAYERS + lay] = value;
            }
            arr[N_LAYER_FIELDS * N_LAYERS + lay] = 0.0;
        }

        let base = (N_LAYER_FIELDS + 1) * N_LAYERS;
        arr[base] = self.id.ipt as f32;
        arr[base + 1] = self.id.ieta as f32;
        arr[base + 2] = self.id.iphi as f32;
        RoadVariables(arr)
    }

    /// Distinct layers with at least one hit, ascending.
    pub fn layers(&self) -> Vec<usize> {
        let mut present = [false; N_LAYERS];
        for hit in &self.hits {
            present[hit.emtf_layer] = true;
        }
        (0..N_LAYERS).filter(|&l| present[l]).collect()
    }
}

/// Variables for a batch of roads.
pub fn roads_to_variables(roads: &[Road]) -> Vec<RoadVariables> {
    roads.iter().map(Road::to_variables).collect()
}
