//! Road cleaning: collapse phi-adjacent duplicates, apply the BX window and
//! greedily suppress overlapping roads.

use std::collections::BTreeMap;

use crate::config::CleaningConfig;
use crate::geometry::{layer, N_LAYERS};
use crate::hit::{HitType, RoadHit};
use crate::road::{Road, RoadId};

/// Layers whose hits may belong to at most one surviving road.
const EXCLUSIVE_LAYERS: [usize; 3] = [layer::ME11, layer::ME12, layer::ME0];

/// Phi span `(first iphi, last iphi)` of the group a road was chosen from.
pub type GroupSpan = (i32, i32);

/// Clean a batch of roads. The output is ordered by sort code, highest first.
pub fn run(roads: Vec<Road>, config: &CleaningConfig) -> Vec<Road> {
    let n_in = roads.len();
    let grouped = collapse_groups(roads);
    let n_grouped = grouped.len();

    let mut survivors: Vec<(Road, GroupSpan)> = grouped
        .into_iter()
        .filter(|(road, _)| passes_bx_window(road, config))
        .collect();
    let n_in_time = survivors.len();

    survivors.sort_by(|a, b| b.0.sort_code.cmp(&a.0.sort_code));

    let mut kept: Vec<(Road, GroupSpan)> = Vec::new();
    for (road, span) in survivors {
        let overlaps = kept.iter().any(|(other, other_span)| {
            other.id.same_sector(&road.id)
                && (spans_overlap(span, *other_span, config.span_padding)
                    || shares_exclusive_hit(&road, other))
        });
        if !overlaps {
            kept.push((road, span));
        }
    }

    tracing::debug!(
        "Road cleaning: {} roads -> {} groups -> {} in time -> {} kept",
        n_in,
        n_grouped,
        n_in_time,
        kept.len()
    );
    kept.into_iter().map(|(road, _)| road).collect()
}

/// Group roads that differ only by consecutive phi bins and keep one local
/// maximum of sort code per group.
pub fn collapse_groups(roads: Vec<Road>) -> Vec<(Road, GroupSpan)> {
    let by_id: BTreeMap<RoadId, Road> = roads.into_iter().map(|r| (r.id, r)).collect();
    let ids: Vec<RoadId> = by_id.keys().copied().collect();

    let mut groups: Vec<Vec<RoadId>> = Vec::new();
    for id in ids {
        match groups.last_mut() {
            Some(group)
                if group[0].same_family(&id) && id.iphi == group[0].iphi + group.len() as i32 =>
            {
                group.push(id)
            }
            _ => groups.push(vec![id]),
        }
    }

    let mut by_id = by_id;
    groups
        .into_iter()
        .filter_map(|group| {
            let chosen = pick_local_max(&group, &by_id);
            let span = (group[0].iphi, group[group.len() - 1].iphi);
            by_id.remove(&chosen).map(|road| (road, span))
        })
        .collect()
}

/// Indices visited from the middle outwards: `m, m-1, m+1, m-2, m+2, ...`,
/// stopping at the first index outside the group.
pub fn middle_out(len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let middle = len / 2;
    let mut order = vec![middle];
    for shift in 1..=middle {
        order.push(middle - shift);
        if middle + shift >= len {
            break;
        }
        order.push(middle + shift);
    }
    order
}

fn pick_local_max(group: &[RoadId], by_id: &BTreeMap<RoadId, Road>) -> RoadId {
    let sort_code = |i: usize| by_id.get(&group[i]).map(|r| r.sort_code);
    let mut chosen = group[0];
    for i in middle_out(group.len()) {
        chosen = group[i];
        let Some(code) = sort_code(i) else { continue };
        let left = i.checked_sub(1).and_then(sort_code);
        let right = if i + 1 < group.len() {
            sort_code(i + 1)
        } else {
            None
        };
        let beaten = left.is_some_and(|c| code < c) || right.is_some_and(|c| code < c);
        if !beaten {
            break;
        }
    }
    chosen
}

/// BX window on CSC layers: few early layers, enough in-time layers and few
/// late ones. Each layer is counted once per bucket.
pub fn passes_bx_window(road: &Road, config: &CleaningConfig) -> bool {
    let mut early = [false; N_LAYERS];
    let mut in_time = [false; N_LAYERS];
    let mut late = [false; N_LAYERS];
    for hit in road.hits.iter().filter(|h| h.kind == HitType::Csc) {
        let l = hit.emtf_layer;
        if hit.bx <= -1 {
            early[l] = true;
        }
        if hit.bx <= 0 {
            in_time[l] = true;
        }
        if hit.bx > 0 {
            late[l] = true;
        }
    }
    let count = |set: &[bool; N_LAYERS]| set.iter().filter(|&&b| b).count();
    count(&early) < config.max_early_layers
        && count(&in_time) >= config.min_in_time_layers
        && count(&late) < config.max_late_layers
}

/// Padded phi spans intersect.
pub fn spans_overlap(a: GroupSpan, b: GroupSpan, padding: i32) -> bool {
    a.1 + padding >= b.0 && a.0 - padding <= b.1
}

fn exclusive_hits(road: &Road) -> impl Iterator<Item = &RoadHit> {
    road.hits
        .iter()
        .filter(|h| EXCLUSIVE_LAYERS.contains(&h.emtf_layer))
}

/// Both roads hold a hit with the same (layer, phi) in ME1/1, ME1/2 or ME0.
pub fn shares_exclusive_hit(a: &Road, b: &Road) -> bool {
    exclusive_hits(a).any(|ha| {
        exclusive_hits(b).any(|hb| ha.emtf_layer == hb.emtf_layer && ha.emtf_phi == hb.emtf_phi)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{road_hit, road_with_hits};

    fn family(iphis: &[i32], codes: &[i32]) -> Vec<Road> {
        iphis
            .iter()
            .zip(codes)
            .map(|(&iphi, &code)| {
                let mut road = road_with_hits(
                    iphi,
                    vec![
                        road_hit(0, iphi * 32, 20),
                        road_hit(2, iphi * 32, 20),
                        road_hit(3, iphi * 32, 20),
                    ],
                );
                road.sort_code = code;
                road
            })
            .collect()
    }

    #[test]
    fn middle_out_order() {
        assert_eq!(middle_out(1), vec![0]);
        assert_eq!(middle_out(2), vec![1, 0]);
        assert_eq!(middle_out(4), vec![2, 1, 3, 0]);
        assert_eq!(middle_out(5), vec![2, 1, 3, 0, 4]);
        assert!(middle_out(0).is_empty());
    }

    #[test]
    fn contiguous_family_collapses_to_its_peak() {
        let roads = family(&[10, 11, 12, 13, 14], &[5, 6, 9, 7, 5]);
        let out = collapse_groups(roads);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0.id.iphi, 12);
        assert_eq!(out[0].1, (10, 14));
    }

    #[test]
    fn middle_is_skipped_when_a_neighbour_beats_it() {
        // Visit order 11, 10, 12: 11 loses to 10, 10 has no better neighbour.
        let roads = family(&[10, 11, 12], &[5, 4, 6]);
        let out = collapse_groups(roads);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0.id.iphi, 10);
    }

    #[test]
    fn gap_in_phi_starts_a_new_group() {
        let roads = family(&[10, 11, 13], &[5, 5, 5]);
        let out = collapse_groups(roads);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].1, (10, 11));
        assert_eq!(out[1].1, (13, 13));
    }

    #[test]
    fn bx_window_counts_csc_layers() {
        let cfg = CleaningConfig::default();
        let mut early = road_hit(0, 3200, 20);
        early.bx = -1;
        let road = road_with_hits(100, vec![early, road_hit(2, 3200, 20)]);
        assert!(passes_bx_window(&road, &cfg));

        // Only one distinct in-time layer.
        let road = road_with_hits(100, vec![road_hit(0, 3200, 20), road_hit(0, 3300, 20)]);
        assert!(!passes_bx_window(&road, &cfg));

        let mut late_a = road_hit(3, 3200, 20);
        late_a.bx = 1;
        let mut late_b = road_hit(4, 3200, 20);
        late_b.bx = 1;
        let road = road_with_hits(
            100,
            vec![road_hit(0, 3200, 20), road_hit(2, 3200, 20), late_a, late_b],
        );
        assert!(!passes_bx_window(&road, &cfg));
    }

    #[test]
    fn overlapping_roads_keep_the_higher_sort_code() {
        let cfg = CleaningConfig::default();
        let mut a = family(&[50], &[100]);
        let mut b = family(&[60], &[200]);
        // Same ME1/1 hit in both roads.
        b[0].hits[0] = a[0].hits[0];
        b[0].id.ipt = 3;
        a.append(&mut b);
        let out = run(a, &cfg);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sort_code, 200);
    }

    #[test]
    fn padded_spans_overlap() {
        assert!(spans_overlap((10, 12), (14, 15), 2));
        assert!(!spans_overlap((10, 12), (15, 16), 2));
        assert!(spans_overlap((20, 20), (18, 18), 2));
    }

    #[test]
    fn other_sectors_never_suppress() {
        let cfg = CleaningConfig::default();
        let mut roads = family(&[50], &[100]);
        let mut other = roads[0].clone();
        other.id.sector = 2;
        other.sort_code = 300;
        roads.push(other);
        let out = run(roads, &cfg);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id.sector, 2);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let cfg = CleaningConfig::default();
        let mut roads = family(&[10, 11, 12, 30], &[5, 9, 6, 8]);
        let mut other_pt = family(&[40, 41], &[7, 7]);
        for road in &mut other_pt {
            road.id.ipt = 2;
        }
        roads.append(&mut other_pt);

        let once = run(roads, &cfg);
        let twice = run(once.clone(), &cfg);
        let ids = |roads: &[Road]| roads.iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(once.len(), 3);
    }
}
