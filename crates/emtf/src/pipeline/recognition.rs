//! Pattern recognition: classify hits per sector and build candidate roads.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::bank::PatternBank;
use crate::config::RecognitionConfig;
use crate::context::TriggerContext;
use crate::error::{EmtfError, EmtfResult};
use crate::geometry::{
    is_muopen, is_singlemu, station_bit, GeometryTables, MAX_PHI_BIN, N_ETA_ZONES, N_LAYERS,
    N_PT_BINS, N_SECTORS, QUADSTRIP,
};
use crate::hit::{Hit, HitType, RoadHit};
use crate::road::{Road, RoadId};

/// ME0-compatible submask with ME0, ME1/1 and a CSC station 2-4 all present.
const MODE_ME0_FULL: u8 = 0b111;

/// Bank matches per (zone, layer): `(ipt, phi offset)` pairs whose phi
/// window contains the offset.
///
/// Pairs are ordered by pT bin, then by offset.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCache {
    window: i32,
    cells: Vec<Vec<(usize, i32)>>,
}

impl PatternCache {
    /// Probe every offset in `[-window, +window]` against the bank.
    pub fn build(bank: &PatternBank, window: i32) -> Self {
        let mut cells = Vec::with_capacity(N_ETA_ZONES * N_LAYERS);
        for zone in 0..N_ETA_ZONES {
            for layer in 0..N_LAYERS {
                let mut matches = Vec::new();
                for ipt in 0..N_PT_BINS {
                    let [lo, _, hi] = bank.phi_window(ipt, zone, layer);
                    for offset in -window..=window {
                        if lo <= offset && offset <= hi {
                            matches.push((ipt, offset));
                        }
                    }
                }
                cells.push(matches);
            }
        }
        Self { window, cells }
    }

    pub fn window(&self) -> i32 {
        self.window
    }

    pub fn matches(&self, zone: usize, layer: usize) -> &[(usize, i32)] {
        &self.cells[zone * N_LAYERS + layer]
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_matches(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

/// A legit hit with its layer resolved.
#[derive(Debug, Clone, Copy)]
struct SectorHit {
    hit: Hit,
    endsec: usize,
    layer: usize,
}

/// Build roads for all 12 sector processors.
///
/// Sectors are visited endcap -1 first, sectors 1..6 within an endcap; the
/// returned roads keep that order, with each sector's roads sorted by id.
pub fn run(
    hits: &[Hit],
    ctx: &TriggerContext,
    config: &RecognitionConfig,
) -> EmtfResult<Vec<Road>> {
    let tables = ctx.tables();
    let mut sector_modes = [0u8; N_SECTORS];
    let mut sector_hits: Vec<Vec<SectorHit>> = vec![Vec::new(); N_SECTORS];

    for hit in hits.iter().filter(|h| h.is_legit()) {
        let endsec = hit.endsec()?;
        let layer = tables
            .layer(hit.kind, hit.station, hit.ring)
            .ok_or(EmtfError::InvalidLayer {
                kind: hit.kind,
                station: hit.station,
                ring: hit.ring,
            })?;
        if matches!(hit.kind, HitType::Csc | HitType::Me0) {
            sector_modes[endsec] |= station_bit(hit.station);
        }
        sector_hits[endsec].push(SectorHit {
            hit: *hit,
            endsec,
            layer,
        });
    }

    let processors: Vec<(i32, i32, usize)> = [-1, 1]
        .into_iter()
        .flat_map(|endcap| {
            (1..=6).map(move |sector| {
                let endsec = crate::geometry::coords::find_endsec(endcap, sector);
                (endcap, sector, endsec)
            })
        })
        .collect();

    let build = |&(endcap, sector, endsec): &(i32, i32, usize)| {
        build_sector_roads(
            endcap,
            sector,
            sector_modes[endsec],
            &sector_hits[endsec],
            ctx,
            config,
        )
    };
    let per_sector: Vec<Vec<Road>> = if config.parallel_sectors {
        processors.par_iter().map(build).collect()
    } else {
        processors.iter().map(build).collect()
    };

    let roads: Vec<Road> = per_sector.into_iter().flatten().collect();
    tracing::debug!(
        "Pattern recognition: {} hits -> {} roads",
        hits.len(),
        roads.len()
    );
    Ok(roads)
}

fn build_sector_roads(
    endcap: i32,
    sector: i32,
    sector_mode: u8,
    hits: &[SectorHit],
    ctx: &TriggerContext,
    config: &RecognitionConfig,
) -> Vec<Road> {
    // Early exit on CSC/ME0-only coverage.
    if !is_muopen(sector_mode) {
        return Vec::new();
    }

    let tables = ctx.tables();
    let cache = ctx.cache();
    let mut candidates: BTreeMap<RoadId, Vec<RoadHit>> = BTreeMap::new();

    for sh in hits {
        let hit = &sh.hit;
        if config.only_use_run2 && !hit.is_valid_for_run2() {
            continue;
        }
        let road_hit = RoadHit {
            kind: hit.kind,
            station: hit.station,
            ring: hit.ring,
            endsec: sh.endsec,
            fr: hit.fr,
            bx: hit.bx,
            emtf_layer: sh.layer,
            emtf_phi: tables.phi(hit),
            emtf_theta: hit.emtf_theta,
            emtf_bend: tables.bend(hit),
            time: hit.time,
            sim_tp: hit.is_real(),
        };
        let zones = tables.zones(hit.kind, hit.station, hit.ring, hit.emtf_theta);

        // Quadstrip-quantized phi, rounded to the nearest quadstrip.
        let hit_x = (road_hit.emtf_phi + QUADSTRIP / 2).div_euclid(QUADSTRIP);
        for zone in zones.iter() {
            for &(ipt, offset) in cache.matches(zone, sh.layer) {
                let iphi = hit_x - offset;
                if (0..=MAX_PHI_BIN).contains(&iphi) {
                    let id = RoadId {
                        endcap,
                        sector,
                        ipt,
                        ieta: zone,
                        iphi,
                    };
                    candidates.entry(id).or_default().push(road_hit);
                }
            }
        }
    }

    let n_candidates = candidates.len();
    let roads: Vec<Road> = candidates
        .into_iter()
        .filter_map(|(id, road_hits)| make_road(id, road_hits, tables))
        .collect();
    tracing::trace!(
        "Sector {}{}: {} hits, {} candidates, {} roads",
        if endcap == 1 { '+' } else { '-' },
        sector,
        hits.len(),
        n_candidates,
        roads.len()
    );
    roads
}

/// Station coverage of a set of road hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadModes {
    /// All hits.
    pub mode: u8,
    /// CSC and ME0 hits only.
    pub mode_csc: u8,
    /// Bit 2: ME0, bit 1: ME1/1, bit 0: CSC station 2-4.
    pub mode_me0: u8,
}

impl RoadModes {
    pub fn from_hits(hits: &[RoadHit]) -> Self {
        let mut modes = Self::default();
        for hit in hits {
            let bit = station_bit(hit.station);
            modes.mode |= bit;
            if matches!(hit.kind, HitType::Csc | HitType::Me0) {
                modes.mode_csc |= bit;
            }
            match hit.kind {
                HitType::Me0 => modes.mode_me0 |= 1 << 2,
                HitType::Csc if hit.station == 1 && (hit.ring == 1 || hit.ring == 4) => {
                    modes.mode_me0 |= 1 << 1
                }
                HitType::Csc if hit.station >= 2 => modes.mode_me0 |= 1 << 0,
                _ => {}
            }
        }
        modes
    }

    /// Modified single-muon requirement for emitting a road.
    pub fn accepts(&self) -> bool {
        (is_singlemu(self.mode) && is_muopen(self.mode_csc)) || self.mode_me0 == MODE_ME0_FULL
    }
}

/// Median of the CSC theta codes; NaN without CSC hits.
pub fn csc_theta_median(hits: &[RoadHit]) -> f32 {
    let mut thetas: Vec<i32> = hits
        .iter()
        .filter(|h| h.kind == HitType::Csc)
        .map(|h| h.emtf_theta)
        .collect();
    if thetas.is_empty() {
        return f32::NAN;
    }
    thetas.sort_unstable();
    let n = thetas.len();
    if n % 2 == 1 {
        thetas[n / 2] as f32
    } else {
        ((f64::from(thetas[n / 2 - 1]) + f64::from(thetas[n / 2])) / 2.0) as f32
    }
}

fn make_road(id: RoadId, hits: Vec<RoadHit>, tables: &GeometryTables) -> Option<Road> {
    let modes = RoadModes::from_hits(&hits);
    if !modes.accepts() {
        return None;
    }
    let quality = tables.road_quality(id.ipt);
    let sort_code = tables.road_sort_code(quality, hits.iter().map(|h| h.emtf_layer));
    let theta_median = csc_theta_median(&hits);
    Some(Road {
        id,
        hits,
        mode: modes.mode,
        mode_csc: modes.mode_csc,
        quality,
        sort_code,
        theta_median,
    })
}
