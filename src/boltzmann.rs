// SPDX-License-Identifier: AGPL-3.0-only

//! Collaborator seam for linear-theory spectra.
//!
//! Computing the linear matter power spectrum and transfer function from
//! cosmological parameters is the surrounding system's job (Boltzmann
//! solver, fitting formula, or tabulated emulator). Mode generation only
//! needs point evaluations on the wavenumber grid, so the seam is a trait
//! with two scalar methods.
//!
//! Consistency contract: local-type non-Gaussianity reduces to the
//! Gaussian branch at `f_nl = 0` only when the implementation satisfies
//! `linear_power(k) = (linear_transfer(k) · k²)² · primordial_curvature(k)`.

use crate::config::{Cosmology, MeshConfig};

/// Point evaluations of linear-theory quantities.
///
/// `a` is an optional scale factor; `None` means the caller does not want
/// the output scaled by growth.
pub trait LinearSpectrum {
    /// Linear matter power spectrum `P_lin(k, a)` \[L³\].
    fn linear_power(&self, k: f64, a: Option<f64>, cosmo: &Cosmology, conf: &MeshConfig) -> f64;

    /// Linear transfer function `T_lin(k, a)` relating the primordial
    /// curvature to the matter overdensity (without the `k²` factor,
    /// which the non-Gaussian pipeline applies itself).
    fn linear_transfer(&self, k: f64, a: Option<f64>, cosmo: &Cosmology, conf: &MeshConfig)
        -> f64;
}

/// Dimensionful primordial curvature power spectrum \[L³\]:
///
/// `P_prim(k) = 2π² A_s (k/k_pivot)^(n_s−1) k⁻³`
///
/// Diverges at `k = 0` (returns `inf`); the caller zeroes the DC entry
/// explicitly, since the zero mode carries no physical primordial power.
#[must_use]
pub fn primordial_curvature(k: f64, cosmo: &Cosmology) -> f64 {
    2.0 * std::f64::consts::PI.powi(2)
        * cosmo.a_s
        * (k / cosmo.k_pivot).powf(cosmo.n_s - 1.0)
        * k.powi(-3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerances::EXACT_F64;

    #[test]
    fn pivot_scale_amplitude() {
        // At k = k_pivot the tilt factor is 1: P = 2π² A_s / k³.
        let cosmo = Cosmology::new(2.1e-9, 0.965, 0.05);
        let p = primordial_curvature(0.05, &cosmo);
        let expected = 2.0 * std::f64::consts::PI.powi(2) * 2.1e-9 / 0.05f64.powi(3);
        assert!((p / expected - 1.0).abs() < EXACT_F64);
    }

    #[test]
    fn red_tilt_decreases_with_k() {
        let cosmo = Cosmology::new(2.1e-9, 0.965, 0.05);
        let dimless = |k: f64| primordial_curvature(k, &cosmo) * k.powi(3);
        assert!(dimless(0.5) < dimless(0.05), "n_s < 1 tilts power down");
    }

    #[test]
    fn diverges_at_dc() {
        let cosmo = Cosmology::new(2.1e-9, 0.965, 0.05);
        assert!(primordial_curvature(0.0, &cosmo).is_infinite());
    }
}
