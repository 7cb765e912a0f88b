// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: mode generation end-to-end.
//!
//! Exercises the public API across module boundaries: white-noise
//! statistics and determinism, Gaussian synthesis normalization, and the
//! non-Gaussian pipeline's reduction to the Gaussian branch at f_nl = 0.

use firstlight::boltzmann::primordial_curvature;
use firstlight::fourier::{irfftn, Norm};
use firstlight::{
    linear_modes, tolerances, white_noise, Cosmology, LinearSpectrum, MeshConfig, Modes,
    Precision,
};

/// Flat power spectrum with optional quadratic growth scaling.
struct ConstPower(f64);

impl LinearSpectrum for ConstPower {
    fn linear_power(&self, _k: f64, a: Option<f64>, _: &Cosmology, _: &MeshConfig) -> f64 {
        let growth = a.unwrap_or(1.0);
        self.0 * growth * growth
    }
    fn linear_transfer(&self, _k: f64, a: Option<f64>, _: &Cosmology, _: &MeshConfig) -> f64 {
        a.unwrap_or(1.0)
    }
}

/// Collaborator satisfying `P_lin = (T k²)² P_prim`, the consistency
/// condition under which the non-Gaussian branch at f_nl = 0 must
/// reproduce the Gaussian branch exactly.
struct SelfConsistent;

impl SelfConsistent {
    fn transfer(k: f64) -> f64 {
        1.0 / (1.0 + k * k)
    }
}

impl LinearSpectrum for SelfConsistent {
    fn linear_power(&self, k: f64, _a: Option<f64>, cosmo: &Cosmology, _: &MeshConfig) -> f64 {
        if k == 0.0 {
            return 0.0;
        }
        let t2 = Self::transfer(k) * k * k;
        t2 * t2 * primordial_curvature(k, cosmo)
    }
    fn linear_transfer(&self, k: f64, _a: Option<f64>, _: &Cosmology, _: &MeshConfig) -> f64 {
        Self::transfer(k)
    }
}

fn real_data(modes: &Modes) -> &[f64] {
    modes.as_real().expect("real representation").data()
}

#[test]
fn white_noise_moments() {
    let conf = MeshConfig::new([32, 32, 32], 1.0).unwrap();
    let modes = white_noise(100, &conf, true, false);
    let field = modes.as_real().unwrap();
    assert!(field.mean().abs() < tolerances::NOISE_MOMENTS, "mean {}", field.mean());
    assert!(
        (field.variance() - 1.0).abs() < tolerances::NOISE_MOMENTS,
        "variance {}",
        field.variance()
    );
}

#[test]
fn white_noise_bit_identical_across_calls() {
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    for &(real, unit_abs) in &[(true, false), (false, false), (false, true), (true, true)] {
        let a = white_noise(7, &conf, real, unit_abs);
        let b = white_noise(7, &conf, real, unit_abs);
        match (&a, &b) {
            (Modes::Real(x), Modes::Real(y)) => {
                assert!(x
                    .data()
                    .iter()
                    .zip(y.data())
                    .all(|(p, q)| p.to_bits() == q.to_bits()));
            }
            (Modes::Fourier(x), Modes::Fourier(y)) => {
                assert!(x.data().iter().zip(y.data()).all(|(p, q)| {
                    p.re.to_bits() == q.re.to_bits() && p.im.to_bits() == q.im.to_bits()
                }));
            }
            _ => panic!("representations disagree for real={real}, unit_abs={unit_abs}"),
        }
    }
}

#[test]
fn white_noise_seeds_decorrelate() {
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let a = white_noise(1, &conf, true, false);
    let b = white_noise(2, &conf, true, false);
    let matches = real_data(&a)
        .iter()
        .zip(real_data(&b))
        .filter(|(x, y)| x == y)
        .count();
    assert_eq!(matches, 0);
}

#[test]
fn white_noise_fourier_inverts_to_real() {
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let fourier = white_noise(55, &conf, false, false);
    let real = white_noise(55, &conf, true, false);
    let inverted = irfftn(fourier.as_fourier().unwrap(), Norm::Ortho);
    let diff = inverted
        .data()
        .iter()
        .zip(real_data(&real))
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max);
    assert!(diff < tolerances::FFT_ROUND_TRIP, "round trip residual {diff}");
}

#[test]
fn unit_abs_preserves_phases() {
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let plain = white_noise(13, &conf, false, false);
    let unit = white_noise(13, &conf, false, true);
    for (c, u) in plain
        .as_fourier()
        .unwrap()
        .data()
        .iter()
        .zip(unit.as_fourier().unwrap().data())
    {
        let expected = *c / c.norm();
        assert!((expected - *u).norm() < tolerances::EXACT_F64);
    }
}

#[test]
fn unit_abs_real_output_keeps_unit_variance() {
    let conf = MeshConfig::new([16, 16, 16], 1.0).unwrap();
    let modes = white_noise(77, &conf, true, true);
    let field = modes.as_real().unwrap();
    assert!(field.mean().abs() < tolerances::NOISE_MOMENTS);
    assert!((field.variance() - 1.0).abs() < tolerances::NOISE_MOMENTS);
}

#[test]
fn gaussian_synthesis_variance_matches_flat_spectrum() {
    // δ(k) = √(P₀ V) ω(k) with flat P₀ gives real-space variance P₀/cell_vol.
    let spacing = 0.5;
    let conf = MeshConfig::new([16, 16, 16], spacing).unwrap();
    let cosmo = Cosmology::new(2.1e-9, 0.965, 0.05);
    let p0 = 4.0;
    let expected = p0 / conf.ptcl_cell_vol();

    let mut variance = 0.0;
    let seeds = [3u64, 5, 8, 13, 21];
    for &seed in &seeds {
        let modes = white_noise(seed, &conf, false, false);
        let out = linear_modes(modes, &cosmo, &conf, &ConstPower(p0), None, true).unwrap();
        variance += out.as_real().unwrap().variance();
    }
    variance /= seeds.len() as f64;

    assert!(
        (variance / expected - 1.0).abs() < tolerances::SYNTHESIS_VARIANCE,
        "variance {variance} vs expected {expected}"
    );
}

#[test]
fn gaussian_synthesis_fourier_power_matches_flat_spectrum() {
    // Mean |δ(k)|² over modes recovers P₀ · V for a flat spectrum.
    let conf = MeshConfig::new([16, 16, 16], 1.0).unwrap();
    let cosmo = Cosmology::new(2.1e-9, 0.965, 0.05);
    let p0 = 2.0;

    let modes = white_noise(29, &conf, false, false);
    let out = linear_modes(modes, &cosmo, &conf, &ConstPower(p0), None, false).unwrap();
    let spec = out.as_fourier().unwrap();
    let mean_power =
        spec.data().iter().map(|c| c.norm_sqr()).sum::<f64>() / spec.data().len() as f64;
    let expected = p0 * conf.box_vol();
    assert!(
        (mean_power / expected - 1.0).abs() < tolerances::SYNTHESIS_VARIANCE,
        "mean power {mean_power} vs expected {expected}"
    );
}

#[test]
fn growth_scaling_is_linear_in_amplitude() {
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let cosmo = Cosmology::new(2.1e-9, 0.965, 0.05);
    let p0 = 1.0;

    let unscaled = linear_modes(
        white_noise(4, &conf, false, false),
        &cosmo,
        &conf,
        &ConstPower(p0),
        None,
        false,
    )
    .unwrap();
    let halved = linear_modes(
        white_noise(4, &conf, false, false),
        &cosmo,
        &conf,
        &ConstPower(p0),
        Some(0.5),
        false,
    )
    .unwrap();

    for (u, h) in unscaled
        .as_fourier()
        .unwrap()
        .data()
        .iter()
        .zip(halved.as_fourier().unwrap().data())
    {
        assert!((*u * 0.5 - *h).norm() <= tolerances::EXACT_F64 * (1.0 + u.norm()));
    }
}

#[test]
fn f_nl_zero_reduces_to_gaussian_branch() {
    // With a collaborator satisfying P_lin = (T k²)² P_prim, the
    // non-Gaussian pipeline at f_nl = 0 must reproduce the Gaussian
    // branch through all six of its extra FFT passes.
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let gaussian_cosmo = Cosmology::new(1.0, 0.96, 1.0);
    let ng_cosmo = gaussian_cosmo.clone().with_f_nl_loc(0.0);

    let gaussian = linear_modes(
        white_noise(31, &conf, false, false),
        &gaussian_cosmo,
        &conf,
        &SelfConsistent,
        None,
        false,
    )
    .unwrap();
    let non_gaussian = linear_modes(
        white_noise(31, &conf, false, false),
        &ng_cosmo,
        &conf,
        &SelfConsistent,
        None,
        false,
    )
    .unwrap();

    let g = gaussian.as_fourier().unwrap();
    let n = non_gaussian.as_fourier().unwrap();
    let scale = g.data().iter().map(|c| c.norm()).fold(0.0, f64::max);
    let diff = g
        .data()
        .iter()
        .zip(n.data())
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max);
    assert!(
        diff < tolerances::PIPELINE_F64 * scale,
        "branches differ by {diff} (scale {scale})"
    );
}

#[test]
fn f_nl_nonzero_perturbs_the_field() {
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let gaussian_cosmo = Cosmology::new(1.0, 0.96, 1.0);
    let ng_cosmo = gaussian_cosmo.clone().with_f_nl_loc(100.0);

    let gaussian = linear_modes(
        white_noise(31, &conf, false, false),
        &gaussian_cosmo,
        &conf,
        &SelfConsistent,
        None,
        true,
    )
    .unwrap();
    let non_gaussian = linear_modes(
        white_noise(31, &conf, false, false),
        &ng_cosmo,
        &conf,
        &SelfConsistent,
        None,
        true,
    )
    .unwrap();

    let scale = real_data(&gaussian)
        .iter()
        .fold(0.0f64, |m, x| m.max(x.abs()));
    let diff = real_data(&gaussian)
        .iter()
        .zip(real_data(&non_gaussian))
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(
        diff > 1e-3 * scale,
        "f_nl = 100 should move the field (diff {diff}, scale {scale})"
    );

    // The transfer factor zeroes the DC mode, so the perturbed field
    // still has (numerically) zero mean.
    let ng_field = non_gaussian.as_real().unwrap();
    assert!(
        ng_field.mean().abs() < tolerances::PIPELINE_F64 * scale,
        "non-Gaussian output mean {}",
        ng_field.mean()
    );
}

#[test]
fn non_gaussian_output_bit_stable_across_thread_pools() {
    // The mean subtraction inside the f_nl pipeline must not pick up
    // scheduling-dependent rounding, or equal seeds stop giving
    // bit-identical output.
    let conf = MeshConfig::new([8, 8, 8], 1.0).unwrap();
    let cosmo = Cosmology::new(1.0, 0.96, 1.0).with_f_nl_loc(10.0);

    let run = || {
        linear_modes(
            white_noise(19, &conf, false, false),
            &cosmo,
            &conf,
            &SelfConsistent,
            None,
            true,
        )
        .unwrap()
    };
    let one = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(run);
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(8)
        .build()
        .unwrap()
        .install(run);

    assert!(
        real_data(&one)
            .iter()
            .zip(real_data(&many))
            .all(|(a, b)| a.to_bits() == b.to_bits()),
        "f_nl output drifted with pool size"
    );
}

#[test]
fn single_precision_outputs_are_f32_representable() {
    let conf = MeshConfig::new([8, 8, 8], 1.0)
        .unwrap()
        .with_precision(Precision::Single);
    let cosmo = Cosmology::new(1.0, 0.96, 1.0).with_f_nl_loc(10.0);

    let noise = white_noise(2, &conf, true, false);
    assert!(real_data(&noise).iter().all(|&v| v == f64::from(v as f32)));

    let out = linear_modes(
        white_noise(2, &conf, false, false),
        &cosmo,
        &conf,
        &SelfConsistent,
        None,
        true,
    )
    .unwrap();
    assert!(real_data(&out).iter().all(|&v| v == f64::from(v as f32)));
}
