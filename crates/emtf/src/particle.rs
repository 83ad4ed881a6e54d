//! Generator-level particles and training-target helpers.

use crate::geometry::coords::{
    calc_phi_loc_int, extrapolate_to_emtf, find_endcap, find_sector,
};
use crate::geometry::{find_eta_bin, find_pt_bin, QUADSTRIP};
use crate::road::RoadId;

/// A generated muon. `phi` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Particle {
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub q: i32,
    #[serde(default)]
    pub bx: i32,
}

impl Particle {
    pub fn inv_pt(&self) -> f32 {
        self.q as f32 / self.pt
    }

    /// Regression targets `[q/pt, phi, eta]`.
    pub fn to_parameters(&self) -> [f32; 3] {
        [self.inv_pt(), self.phi, self.eta]
    }

    /// In-time muon above 5 GeV inside the endcap acceptance.
    pub fn is_important(&self) -> bool {
        (1.24..=2.4).contains(&self.eta.abs()) && self.bx == 0 && self.pt > 5.0
    }

    /// Road the particle should produce, from its phi bent to the trigger
    /// station.
    pub fn expected_road_id(&self) -> RoadId {
        let inv_pt = self.inv_pt();
        let exphi = extrapolate_to_emtf(f64::from(self.phi), f64::from(inv_pt), f64::from(self.eta));
        let sector = find_sector(exphi);
        let endcap = find_endcap(f64::from(self.eta));
        let emtf_phi = calc_phi_loc_int(exphi.to_degrees(), sector);
        RoadId {
            endcap,
            sector,
            ipt: find_pt_bin(inv_pt),
            ieta: find_eta_bin(self.eta),
            iphi: (emtf_phi + QUADSTRIP / 2).div_euclid(QUADSTRIP),
        }
    }
}

/// Targets for a batch of particles.
pub fn particles_to_parameters(particles: &[Particle]) -> Vec<[f32; 3]> {
    particles.iter().map(Particle::to_parameters).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn muon(pt: f32, eta: f32, phi: f32, q: i32) -> Particle {
        Particle {
            pt,
            eta,
            phi,
            q,
            bx: 0,
        }
    }

    #[test]
    fn parameters_are_charge_over_pt() {
        let p = muon(20.0, -1.9, 0.5, -1);
        let params = p.to_parameters();
        assert_relative_eq!(params[0], -0.05);
        assert_relative_eq!(params[1], 0.5);
        assert_relative_eq!(params[2], -1.9);
        assert_eq!(particles_to_parameters(&[p, p]).len(), 2);
    }

    #[test]
    fn importance_window() {
        assert!(muon(20.0, 1.9, 0.0, 1).is_important());
        assert!(!muon(4.0, 1.9, 0.0, 1).is_important());
        assert!(!muon(20.0, 1.0, 0.0, 1).is_important());
        let mut late = muon(20.0, 1.9, 0.0, 1);
        late.bx = 1;
        assert!(!late.is_important());
    }

    #[test]
    fn stiff_muon_maps_to_its_sector() {
        // 45 degrees is sector 1 (15..75 degrees); at 100 TeV the bending is negligible.
        let p = muon(100_000.0, 1.9, 45f32.to_radians(), 1);
        let id = p.expected_road_id();
        assert_eq!(id.endcap, 1);
        assert_eq!(id.sector, 1);
        assert_eq!(id.ipt, 4);
        assert_eq!(id.ieta, 2);
        // (45 - 15 + 22) degrees * 60 codes per degree / 32.
        assert_eq!(id.iphi, ((52.0 * 60.0 + 16.0) / 32.0f64).floor() as i32);
    }
}
