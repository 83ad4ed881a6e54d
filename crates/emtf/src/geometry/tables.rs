//! Immutable lookup tables keyed by (technology, station, ring) and layer.

use crate::hit::{Hit, HitType};

use super::{coords::find_pt_bin, N_ETA_ZONES, N_LAYERS};

const N_TYPES: usize = 5;
const N_STATIONS: usize = 5;
const N_RINGS: usize = 5;

/// (type, station, ring) -> layer.
const LAYER_ENTRIES: [(HitType, usize, usize, usize); 21] = [
    (HitType::Csc, 1, 4, 0), // ME1/1a
    (HitType::Csc, 1, 1, 0), // ME1/1b
    (HitType::Csc, 1, 2, 1), // ME1/2
    (HitType::Csc, 1, 3, 1), // ME1/3
    (HitType::Csc, 2, 1, 2),
    (HitType::Csc, 2, 2, 2),
    (HitType::Csc, 3, 1, 3),
    (HitType::Csc, 3, 2, 3),
    (HitType::Csc, 4, 1, 4),
    (HitType::Csc, 4, 2, 4),
    (HitType::Rpc, 1, 2, 5),
    (HitType::Rpc, 2, 2, 6),
    (HitType::Rpc, 3, 1, 7),
    (HitType::Rpc, 3, 2, 7),
    (HitType::Rpc, 3, 3, 7),
    (HitType::Rpc, 4, 1, 8),
    (HitType::Rpc, 4, 2, 8),
    (HitType::Rpc, 4, 3, 8),
    (HitType::Gem, 1, 1, 9),
    (HitType::Gem, 2, 1, 10),
    (HitType::Me0, 1, 1, 11),
];

/// (type, station, ring, zone) -> closed theta interval.
const ZONE_ENTRIES: &[(HitType, usize, usize, usize, i32, i32)] = &[
    (HitType::Csc, 1, 4, 0, 4, 17),
    (HitType::Csc, 1, 4, 1, 16, 26),
    (HitType::Csc, 1, 4, 2, 24, 37),
    (HitType::Csc, 1, 4, 3, 34, 43),
    (HitType::Csc, 1, 4, 4, 40, 53),
    (HitType::Csc, 1, 1, 0, 4, 17),
    (HitType::Csc, 1, 1, 1, 16, 26),
    (HitType::Csc, 1, 1, 2, 24, 37),
    (HitType::Csc, 1, 1, 3, 34, 43),
    (HitType::Csc, 1, 1, 4, 40, 53),
    (HitType::Csc, 1, 2, 4, 46, 54),
    (HitType::Csc, 1, 2, 5, 52, 88),
    (HitType::Csc, 1, 3, 4, 46, 54),
    (HitType::Csc, 1, 3, 5, 52, 88),
    //
    (HitType::Csc, 2, 1, 0, 4, 17),
    (HitType::Csc, 2, 1, 1, 16, 25),
    (HitType::Csc, 2, 1, 2, 24, 36),
    (HitType::Csc, 2, 1, 3, 34, 43),
    (HitType::Csc, 2, 1, 4, 40, 49),
    (HitType::Csc, 2, 2, 5, 53, 88),
    //
    (HitType::Csc, 3, 1, 0, 4, 17),
    (HitType::Csc, 3, 1, 1, 16, 25),
    (HitType::Csc, 3, 1, 2, 24, 36),
    (HitType::Csc, 3, 1, 3, 34, 40),
    (HitType::Csc, 3, 2, 4, 44, 54),
    (HitType::Csc, 3, 2, 5, 52, 88),
    //
    (HitType::Csc, 4, 1, 0, 4, 17),
    (HitType::Csc, 4, 1, 1, 16, 25),
    (HitType::Csc, 4, 1, 2, 24, 35),
    (HitType::Csc, 4, 2, 3, 38, 43),
    (HitType::Csc, 4, 2, 4, 41, 54),
    (HitType::Csc, 4, 2, 5, 52, 88),
    //
    (HitType::Rpc, 1, 2, 5, 52, 84),
    (HitType::Rpc, 2, 2, 5, 56, 76),
    (HitType::Rpc, 3, 1, 0, 4, 20),
    (HitType::Rpc, 3, 1, 1, 20, 24),
    (HitType::Rpc, 3, 1, 2, 24, 32),
    (HitType::Rpc, 3, 2, 3, 40, 40),
    (HitType::Rpc, 3, 2, 4, 40, 52),
    (HitType::Rpc, 3, 2, 5, 48, 84),
    (HitType::Rpc, 3, 3, 3, 40, 40),
    (HitType::Rpc, 3, 3, 4, 40, 52),
    (HitType::Rpc, 3, 3, 5, 48, 84),
    (HitType::Rpc, 4, 1, 0, 8, 16),
    (HitType::Rpc, 4, 1, 1, 16, 28),
    (HitType::Rpc, 4, 1, 2, 24, 28),
    (HitType::Rpc, 4, 2, 3, 36, 44),
    (HitType::Rpc, 4, 2, 4, 44, 52),
    (HitType::Rpc, 4, 2, 5, 52, 84),
    (HitType::Rpc, 4, 3, 3, 36, 44),
    (HitType::Rpc, 4, 3, 4, 44, 52),
    (HitType::Rpc, 4, 3, 5, 52, 84),
    //
    (HitType::Gem, 1, 1, 1, 17, 26),
    (HitType::Gem, 1, 1, 2, 24, 37),
    (HitType::Gem, 1, 1, 3, 35, 45),
    (HitType::Gem, 1, 1, 4, 40, 52),
    (HitType::Gem, 2, 1, 0, 7, 19),
    (HitType::Gem, 2, 1, 1, 18, 24),
    (HitType::Gem, 2, 1, 2, 23, 35),
    (HitType::Gem, 2, 1, 3, 34, 45),
    (HitType::Gem, 2, 1, 4, 40, 46),
    //
    (HitType::Me0, 1, 1, 0, 4, 17),
    (HitType::Me0, 1, 1, 1, 16, 23),
];

/// Slimming partner of each layer.
const LAYER_PARTNERS: [usize; N_LAYERS] = [2, 2, 0, 0, 0, 0, 2, 3, 4, 0, 2, 0];

/// Sort-code priority bit of each layer.
///
/// 10: ME1/1, 9: GE1/1, 8: ME1/2, 7: ME2, 6: GE2/1, 5: ME3&4, 4: RE1&2,
/// 3: RE3&4, bits 2..0 hold the road quality.
const SORT_CODE_BITS: [u32; N_LAYERS] = [10, 8, 7, 5, 5, 4, 4, 3, 3, 9, 6, 10];

/// ME1/1a strip pitch relative to ME1/1b.
const ME11A_BEND_SCALE: f64 = 0.026331 / 0.014264;

/// Phi bend-correction coefficients (rear, front) for ME1/1b, ME1/1a, ME1/2-3.
const ME11B_PHI_CORR: [f64; 2] = [-1.3861, 1.3692];
const ME11A_PHI_CORR: [f64; 2] = [-1.6419, 1.6012];
const ME12_PHI_CORR: [f64; 2] = [-0.9237, 0.8287];

/// Set of eta zones a hit belongs to (bit `z` set for zone `z`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ZoneSet(u8);

impl ZoneSet {
    pub fn contains(self, zone: usize) -> bool {
        zone < N_ETA_ZONES && self.0 & (1 << zone) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Zones in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..N_ETA_ZONES).filter(move |&z| self.contains(z))
    }

    fn insert(&mut self, zone: usize) {
        self.0 |= 1 << zone;
    }
}

/// Geometry/encoding lookup tables, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct GeometryTables {
    layers: [[[Option<u8>; N_RINGS]; N_STATIONS]; N_TYPES],
    zones: [[[[Option<(i32, i32)>; N_ETA_ZONES]; N_RINGS]; N_STATIONS]; N_TYPES],
    partners: [usize; N_LAYERS],
    sort_code_bits: [u32; N_LAYERS],
    best_pt_bin: i32,
}

impl Default for GeometryTables {
    fn default() -> Self {
        Self::new()
    }
}

fn lut_index(kind: HitType, station: i32, ring: i32) -> Option<(usize, usize, usize)> {
    let station = usize::try_from(station).ok().filter(|&s| s < N_STATIONS)?;
    let ring = usize::try_from(ring).ok().filter(|&r| r < N_RINGS)?;
    Some((kind.code(), station, ring))
}

impl GeometryTables {
    pub fn new() -> Self {
        let mut layers = [[[None; N_RINGS]; N_STATIONS]; N_TYPES];
        for &(kind, station, ring, layer) in &LAYER_ENTRIES {
            layers[kind.code()][station][ring] = Some(layer as u8);
        }

        let mut zones = [[[[None; N_ETA_ZONES]; N_RINGS]; N_STATIONS]; N_TYPES];
        for &(kind, station, ring, zone, lo, hi) in ZONE_ENTRIES {
            zones[kind.code()][station][ring][zone] = Some((lo, hi));
        }

        Self {
            layers,
            zones,
            partners: LAYER_PARTNERS,
            sort_code_bits: SORT_CODE_BITS,
            best_pt_bin: find_pt_bin(0.0) as i32,
        }
    }

    /// Canonical layer of (type, station, ring); `None` for combinations
    /// outside the endcap layout.
    pub fn layer(&self, kind: HitType, station: i32, ring: i32) -> Option<usize> {
        let (t, s, r) = lut_index(kind, station, ring)?;
        self.layers[t][s][r].map(usize::from)
    }

    /// All populated (type, station, ring, layer) entries.
    pub fn layer_entries(&self) -> Vec<(HitType, i32, i32, usize)> {
        let kinds = [
            HitType::Dt,
            HitType::Csc,
            HitType::Rpc,
            HitType::Gem,
            HitType::Me0,
        ];
        let mut out = Vec::new();
        for kind in kinds {
            for station in 0..N_STATIONS as i32 {
                for ring in 0..N_RINGS as i32 {
                    if let Some(layer) = self.layer(kind, station, ring) {
                        out.push((kind, station, ring, layer));
                    }
                }
            }
        }
        out
    }

    /// Zones whose theta interval contains `theta`.
    pub fn zones(&self, kind: HitType, station: i32, ring: i32, theta: i32) -> ZoneSet {
        let mut set = ZoneSet::default();
        let Some((t, s, r)) = lut_index(kind, station, ring) else {
            return set;
        };
        for (zone, window) in self.zones[t][s][r].iter().enumerate() {
            if let Some((lo, hi)) = *window {
                if lo <= theta && theta <= hi {
                    set.insert(zone);
                }
            }
        }
        set
    }

    /// Slimming partner of `layer` for road zone `zone`.
    ///
    /// Outer zones (5+) have no ME1/1 coverage and fall back to ME1/2.
    pub fn partner(&self, layer: usize, zone: usize) -> usize {
        let partner = self.partners[layer];
        if zone >= 5 && partner == 0 {
            1
        } else {
            partner
        }
    }

    /// Road quality: peaks at the straight-track bin and decays linearly.
    pub fn road_quality(&self, ipt: usize) -> i32 {
        self.best_pt_bin - (ipt as i32 - self.best_pt_bin).abs()
    }

    /// Road sort code from the layers present and the road quality.
    pub fn road_sort_code<I>(&self, quality: i32, layers: I) -> i32
    where
        I: IntoIterator<Item = usize>,
    {
        let mut code = 0i32;
        for layer in layers {
            code |= 1 << self.sort_code_bits[layer];
        }
        code | quality
    }

    /// Corrected bend code.
    pub fn bend(&self, hit: &Hit) -> i32 {
        match hit.kind {
            HitType::Csc => {
                let mut bend = hit.bend;
                match hit.station {
                    1 if hit.ring == 4 => {
                        bend = (f64::from(bend) * ME11A_BEND_SCALE).round() as i32;
                    }
                    2..=4 => {
                        bend = if (-8..=8).contains(&bend) {
                            0
                        } else if bend > 8 {
                            1
                        } else {
                            -1
                        };
                    }
                    _ => {}
                }
                bend * hit.endcap
            }
            HitType::Gem => hit.bend * hit.endcap,
            HitType::Me0 => hit.bend,
            HitType::Rpc | HitType::Dt => 0,
        }
    }

    /// Bend-corrected phi code. Only station-1 CSC hits are corrected.
    pub fn phi(&self, hit: &Hit) -> i32 {
        if hit.kind != HitType::Csc || hit.station != 1 {
            return hit.emtf_phi;
        }
        let coeffs = match hit.ring {
            1 => &ME11B_PHI_CORR,
            4 => &ME11A_PHI_CORR,
            _ => &ME12_PHI_CORR,
        };
        let mut corr = coeffs[usize::from(hit.fr != 0)] * f64::from(hit.bend);
        if hit.endcap != 1 {
            corr = -corr;
        }
        hit.emtf_phi + corr.round() as i32
    }
}
