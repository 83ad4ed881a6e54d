//! Shared builders for hit-, road- and bank-based unit tests.

use crate::bank::{BankArray, PatternBank, BANK_SHAPE};
use crate::context::TriggerContext;
use crate::geometry::{layer, GeometryTables, N_ETA_ZONES, N_LAYERS, N_PT_BINS};
use crate::hit::{Hit, HitType, RoadHit};
use crate::pipeline::recognition::{csc_theta_median, RoadModes};
use crate::road::{Road, RoadId};

/// In-time hit in endcap +1, sector 1.
pub(crate) fn hit(kind: HitType, station: i32, ring: i32, phi: i32, theta: i32) -> Hit {
    Hit {
        kind,
        station,
        ring,
        sector: 1,
        endcap: 1,
        bx: 0,
        fr: 0,
        emtf_phi: phi,
        emtf_theta: theta,
        bend: 0,
        quality: 0,
        time: 0.0,
        sim_tp1: 0,
        sim_tp2: 0,
    }
}

pub(crate) fn csc_hit(station: i32, ring: i32, phi: i32, theta: i32) -> Hit {
    hit(HitType::Csc, station, ring, phi, theta)
}

/// Bank built cell by cell from `phi(ipt)` windows and a constant match
/// offset.
fn bank_with(phi: impl Fn(usize) -> [i32; 3], match_offset: i32) -> PatternBank {
    let n: usize = BANK_SHAPE.iter().product();
    let mut phi_data = Vec::with_capacity(n);
    let mut match_data = Vec::with_capacity(n);
    for ipt in 0..N_PT_BINS {
        for _zone in 0..N_ETA_ZONES {
            for _lay in 0..N_LAYERS {
                phi_data.extend_from_slice(&phi(ipt));
                match_data.extend_from_slice(&[match_offset, match_offset, match_offset]);
            }
        }
    }
    PatternBank::from_arrays(BankArray::new(phi_data), None, BankArray::new(match_data))
        .expect("test bank is well-formed")
}

/// Only the straight pT bin matches, and only at offset 0.
pub(crate) fn straight_bank() -> PatternBank {
    bank_with(
        |ipt| if ipt == 4 { [0, 0, 0] } else { [99, 0, -99] },
        0,
    )
}

/// Every pT bin matches offsets in `[-half_width, half_width]`.
pub(crate) fn wide_bank(half_width: i32) -> PatternBank {
    bank_with(|_| [-half_width, 0, half_width], 0)
}

/// Straight bank with every match offset set to `offset`.
pub(crate) fn match_bank(offset: i32) -> PatternBank {
    bank_with(
        |ipt| if ipt == 4 { [0, 0, 0] } else { [99, 0, -99] },
        offset,
    )
}

pub(crate) fn straight_context() -> TriggerContext {
    TriggerContext::new(straight_bank(), 23)
}

/// Classified hit on `lay` with the layer's usual (type, station, ring).
pub(crate) fn road_hit(lay: usize, phi: i32, theta: i32) -> RoadHit {
    let (kind, station, ring) = match lay {
        layer::ME11 => (HitType::Csc, 1, 1),
        layer::ME12 => (HitType::Csc, 1, 2),
        layer::ME2 => (HitType::Csc, 2, 1),
        layer::ME3 => (HitType::Csc, 3, 1),
        layer::ME4 => (HitType::Csc, 4, 1),
        layer::RE1 => (HitType::Rpc, 1, 2),
        layer::RE2 => (HitType::Rpc, 2, 2),
        layer::RE3 => (HitType::Rpc, 3, 1),
        layer::RE4 => (HitType::Rpc, 4, 1),
        layer::GE11 => (HitType::Gem, 1, 1),
        layer::GE21 => (HitType::Gem, 2, 1),
        _ => (HitType::Me0, 1, 1),
    };
    RoadHit {
        kind,
        station,
        ring,
        endsec: 0,
        fr: 0,
        bx: 0,
        emtf_layer: lay,
        emtf_phi: phi,
        emtf_theta: theta,
        emtf_bend: 0,
        time: 0.0,
        sim_tp: true,
    }
}

/// Road in endcap +1, sector 1, straight pT bin, zone 0.
pub(crate) fn road_with_hits(iphi: i32, hits: Vec<RoadHit>) -> Road {
    let tables = GeometryTables::new();
    let id = RoadId {
        endcap: 1,
        sector: 1,
        ipt: 4,
        ieta: 0,
        iphi,
    };
    let modes = RoadModes::from_hits(&hits);
    let quality = tables.road_quality(id.ipt);
    let sort_code = tables.road_sort_code(quality, hits.iter().map(|h| h.emtf_layer));
    let theta_median = csc_theta_median(&hits);
    Road {
        id,
        hits,
        mode: modes.mode,
        mode_csc: modes.mode_csc,
        quality,
        sort_code,
        theta_median,
    }
}
