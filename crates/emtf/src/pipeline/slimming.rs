//! Road slimming: reduce every cleaned road to at most one hit per layer.

use crate::bank::PatternBank;
use crate::context::TriggerContext;
use crate::geometry::{GeometryTables, N_LAYERS, QUADSTRIP};
use crate::hit::RoadHit;
use crate::road::Road;

/// Running per-layer phi/theta estimates after slimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerEstimates {
    pub phi: [i32; N_LAYERS],
    pub theta: [i32; N_LAYERS],
}

/// Slim each road independently, preserving order.
pub fn run(roads: &[Road], ctx: &TriggerContext) -> Vec<Road> {
    let slim: Vec<Road> = roads
        .iter()
        .map(|road| slim_road(road, ctx.tables(), ctx.bank()).0)
        .collect();
    tracing::debug!("Road slimming: {} roads", slim.len());
    slim
}

/// Pick the best hit per layer, walking layers in index order.
///
/// Each layer is matched against its partner layer: against the partner's
/// (already slimmed) hits when it has any, otherwise against the partner's
/// running phi estimate. Candidates are ranked by theta distance to the road
/// median, then by phi distance to the expected position; the first minimum
/// wins. Empty layers extrapolate their estimate from the partner.
pub fn slim_road(
    road: &Road,
    tables: &GeometryTables,
    bank: &PatternBank,
) -> (Road, LayerEstimates) {
    let ipt = road.id.ipt;
    let ieta = road.id.ieta;
    let road_phi = road.id.iphi * QUADSTRIP;
    let road_theta = road.theta_median;

    let mut by_layer: [Vec<RoadHit>; N_LAYERS] = std::array::from_fn(|_| Vec::new());
    for hit in &road.hits {
        by_layer[hit.emtf_layer].push(*hit);
    }

    let mut est = LayerEstimates {
        phi: [road_phi; N_LAYERS],
        theta: [road_theta as i32; N_LAYERS],
    };

    for lay in 0..N_LAYERS {
        let mean_dphi = bank.match_offset(ipt, ieta, lay);
        let partner = tables.partner(lay, ieta);

        if by_layer[lay].is_empty() {
            est.phi[lay] = est.phi[partner] + mean_dphi;
            est.theta[lay] = road_theta as i32;
            continue;
        }

        let mut best: Option<(f32, i32, RoadHit)> = None;
        for hit in &by_layer[lay] {
            let dtheta = (hit.emtf_theta as f32 - road_theta).abs();
            let mut consider = |dphi: i32| {
                let better = match best {
                    None => true,
                    Some((bt, bp, _)) => dtheta < bt || (dtheta == bt && dphi < bp),
                };
                if better {
                    best = Some((dtheta, dphi, *hit));
                }
            };
            if by_layer[partner].is_empty() {
                consider((hit.emtf_phi - (est.phi[partner] + mean_dphi)).abs());
            } else {
                for other in &by_layer[partner] {
                    consider((hit.emtf_phi - (other.emtf_phi + mean_dphi)).abs());
                }
            }
        }

        if let Some((_, _, hit)) = best {
            est.phi[lay] = hit.emtf_phi;
            est.theta[lay] = hit.emtf_theta;
            by_layer[lay] = vec![hit];
        }
    }

    let hits: Vec<RoadHit> = by_layer.into_iter().flatten().collect();
    let slim = Road {
        id: road.id,
        hits,
        mode: road.mode,
        mode_csc: road.mode_csc,
        quality: road.quality,
        sort_code: road.sort_code,
        theta_median: road.theta_median,
    };
    (slim, est)
}
