//! Angle conversions between integer trigger codes and physical coordinates.
//!
//! Local phi codes count 1/60 degree from 22 degrees below the sector's
//! lower edge; sector 1 starts at 15 degrees global phi. Theta codes map
//! [8.5, 45] degrees onto [0, 128].

use std::f64::consts::PI;

use super::{ETA_BINS, N_ETA_ZONES, N_PT_BINS, PT_BINS};

/// Signed azimuth difference wrapped to [-pi, pi).
pub fn delta_phi(lhs: f64, rhs: f64) -> f64 {
    let mut rad = lhs - rhs;
    while rad < -PI {
        rad += 2.0 * PI;
    }
    while rad >= PI {
        rad -= 2.0 * PI;
    }
    rad
}

/// Wrap degrees to [-180, 180).
pub fn range_phi_deg(mut deg: f64) -> f64 {
    while deg < -180.0 {
        deg += 360.0;
    }
    while deg >= 180.0 {
        deg -= 360.0;
    }
    deg
}

/// Local phi (degrees) relative to the lower edge of `sector`.
pub fn calc_phi_loc_deg_from_glob(glob: f64, sector: i32) -> f64 {
    let glob = range_phi_deg(glob);
    glob - 15.0 - 60.0 * f64::from(sector - 1)
}

/// Global phi (degrees) to the integer local phi code of `sector`.
pub fn calc_phi_loc_int(glob: f64, sector: i32) -> i32 {
    let mut loc = calc_phi_loc_deg_from_glob(glob, sector);
    if loc + 22.0 < 0.0 {
        loc += 360.0;
    }
    ((loc + 22.0) * 60.0).round() as i32
}

/// Integer local phi code to local degrees.
pub fn calc_phi_loc_deg(bits: i32) -> f64 {
    f64::from(bits) / 60.0 - 22.0
}

/// Local degrees of `sector` to global degrees in [-180, 180).
pub fn calc_phi_glob_deg(loc: f64, sector: i32) -> f64 {
    let glob = loc + 15.0 + 60.0 * f64::from(sector - 1);
    if glob >= 180.0 {
        glob - 360.0
    } else {
        glob
    }
}

/// Polar angle (degrees) to the integer theta code; negative endcap folds
/// theta around 90 degrees.
pub fn calc_theta_int(theta: f64, endcap: i32) -> i32 {
    let theta = if endcap == -1 { 180.0 - theta } else { theta };
    ((theta - 8.5) * 128.0 / (45.0 - 8.5)).round() as i32
}

pub fn calc_theta_rad_from_eta(eta: f64) -> f64 {
    1.0f64.atan2(eta.sinh())
}

pub fn calc_theta_deg_from_eta(eta: f64) -> f64 {
    calc_theta_rad_from_eta(eta).to_degrees()
}

/// Theta code (possibly fractional, e.g. a median) to degrees.
pub fn calc_theta_deg_from_int(theta_int: f64) -> f64 {
    theta_int * (45.0 - 8.5) / 128.0 + 8.5
}

pub fn calc_eta_from_theta_deg(theta_deg: f64, endcap: i32) -> f64 {
    let eta = -(theta_deg.to_radians() / 2.0).tan().ln();
    if endcap == -1 {
        -eta
    } else {
        eta
    }
}

/// Bend a vertex phi (radians) to the second muon station.
///
/// 1.204 rad/(GeV^-1) is the bending at eta 1.9, scaled by sinh.
pub fn extrapolate_to_emtf(phi: f64, invpt: f64, eta: f64) -> f64 {
    let eta_sf = 1.9f64.sinh() / eta.abs().sinh();
    phi - 1.204 * invpt * eta_sf
}

/// Sector (1..6) containing global phi in radians.
pub fn find_sector(phi: f64) -> i32 {
    let dphi = delta_phi(phi, PI / 12.0);
    let dphi = (dphi / (PI / 3.0)).floor() as i32;
    if dphi < 0 {
        7 + dphi
    } else {
        1 + dphi
    }
}

pub fn find_endcap(eta: f64) -> i32 {
    if eta >= 0.0 {
        1
    } else {
        -1
    }
}

/// Sector-processor index of (endcap, sector).
pub fn find_endsec(endcap: i32, sector: i32) -> usize {
    if endcap == 1 {
        (sector - 1) as usize
    } else {
        (sector - 1 + 6) as usize
    }
}

/// pT bin of a q/pT value, clipped to the bank's bins.
pub fn find_pt_bin(invpt: f32) -> usize {
    if invpt.is_nan() {
        return N_PT_BINS - 1;
    }
    let n = PT_BINS[1..].iter().filter(|&&edge| edge <= invpt).count();
    n.min(N_PT_BINS - 1)
}

/// Eta zone of an eta value, clipped to the bank's zones.
pub fn find_eta_bin(eta: f32) -> usize {
    let abs_eta = eta.abs();
    let n = ETA_BINS[1..].iter().filter(|&&edge| edge > abs_eta).count();
    n.min(N_ETA_ZONES - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn straight_track_lands_in_the_middle_bin() {
        assert_eq!(find_pt_bin(0.0), 4);
        assert_eq!(find_pt_bin(-0.07), 4);
        assert_eq!(find_pt_bin(0.07), 5);
        assert_eq!(find_pt_bin(-0.9), 0);
        assert_eq!(find_pt_bin(0.9), 8);
    }

    #[test]
    fn eta_bins_count_from_forward() {
        assert_eq!(find_eta_bin(2.3), 0);
        assert_eq!(find_eta_bin(-2.0), 1);
        assert_eq!(find_eta_bin(1.6), 4);
        assert_eq!(find_eta_bin(1.0), 5);
    }

    #[test]
    fn local_phi_roundtrip() {
        let glob = 47.25;
        let bits = calc_phi_loc_int(glob, 1);
        assert_eq!(bits, ((47.25 - 15.0 + 22.0) * 60.0f64).round() as i32);
        let back = calc_phi_glob_deg(calc_phi_loc_deg(bits), 1);
        assert_relative_eq!(back, glob, epsilon = 1e-9);
    }

    #[test]
    fn global_phi_wraps_for_last_sector() {
        let bits = calc_phi_loc_int(-30.0, 6);
        assert_eq!(bits, 2220);
        let glob = calc_phi_glob_deg(calc_phi_loc_deg(bits), 6);
        assert_relative_eq!(glob, -30.0, epsilon = 1e-9);
    }

    #[test]
    fn theta_code_and_eta_agree() {
        let theta_deg = calc_theta_deg_from_eta(2.0);
        let code = calc_theta_int(theta_deg, 1);
        let eta = calc_eta_from_theta_deg(calc_theta_deg_from_int(f64::from(code)), 1);
        assert_relative_eq!(eta, 2.0, epsilon = 0.02);
        let eta_neg = calc_eta_from_theta_deg(calc_theta_deg_from_int(f64::from(code)), -1);
        assert_relative_eq!(eta_neg, -eta, epsilon = 1e-12);
    }

    #[test]
    fn sectors_start_at_fifteen_degrees() {
        assert_eq!(find_sector(20f64.to_radians()), 1);
        assert_eq!(find_sector(80f64.to_radians()), 2);
        assert_eq!(find_sector(10f64.to_radians()), 6);
        assert_eq!(find_sector(-100f64.to_radians()), 5);
        assert_eq!(find_endsec(1, 3), 2);
        assert_eq!(find_endsec(-1, 3), 8);
    }

    #[test]
    fn extrapolation_bends_with_charge() {
        let phi = 0.5;
        assert!(extrapolate_to_emtf(phi, 0.1, 1.9) < phi);
        assert!(extrapolate_to_emtf(phi, -0.1, 1.9) > phi);
        assert_relative_eq!(extrapolate_to_emtf(phi, 0.1, 1.9), phi - 0.1204, epsilon = 1e-12);
    }
}
