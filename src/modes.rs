// SPDX-License-Identifier: AGPL-3.0-only

//! Initial-condition modes: seeded white noise and linear mode synthesis.
//!
//! Data flow: seed → [`white_noise`] → dimensionless modes →
//! [`linear_modes`] → linear matter overdensity modes, colored either by
//! the linear power spectrum (Gaussian branch) or by the local-type
//! non-Gaussian pipeline when the cosmology carries an `f_nl` amplitude.
//! Every call is a pure function of its arguments; the only stochastic
//! state is the seed.
//!
//! # Units
//!
//! White noise is dimensionless in both representations. Synthesized
//! modes are \[L³\] in Fourier form and dimensionless in real form — the
//! real form comes from the physical-spacing inverse transform, not the
//! orthonormal one (see `DESIGN.md` on this asymmetry).

use rayon::prelude::*;

use crate::boltzmann::{primordial_curvature, LinearSpectrum};
use crate::config::{Cosmology, MeshConfig, Precision};
use crate::error::FirstlightError;
use crate::fourier::{
    crop_antialias, irfftn, pad_antialias, radial_wavenumbers, rfftn, Norm, RealField,
    SpectralField,
};
use crate::rng::Xoshiro256pp;

/// Curvature-to-potential conversion: `f_nl` is conventionally defined
/// for the Bardeen potential Φ = (3/5)ζ.
const F_NL_CONVENTION: f64 = 3.0 / 5.0;

/// Mode array in real-space or Fourier (half-spectrum) representation.
#[derive(Clone, Debug)]
pub enum Modes {
    Real(RealField),
    Fourier(SpectralField),
}

impl Modes {
    /// Extents of the underlying real grid, independent of representation.
    #[must_use]
    pub fn grid_shape(&self) -> [usize; 3] {
        match self {
            Self::Real(field) => field.shape(),
            Self::Fourier(spec) => spec.full_shape(),
        }
    }

    #[must_use]
    pub fn as_real(&self) -> Option<&RealField> {
        match self {
            Self::Real(field) => Some(field),
            Self::Fourier(_) => None,
        }
    }

    #[must_use]
    pub fn as_fourier(&self) -> Option<&SpectralField> {
        match self {
            Self::Fourier(spec) => Some(spec),
            Self::Real(_) => None,
        }
    }
}

fn demote_real(mut field: RealField, precision: Precision) -> RealField {
    if precision == Precision::Single {
        field
            .data_mut()
            .par_iter_mut()
            .for_each(|v| *v = precision.demote(*v));
    }
    field
}

fn demote_fourier(mut spec: SpectralField, precision: Precision) -> SpectralField {
    if precision == Precision::Single {
        spec.data_mut().par_iter_mut().for_each(|c| {
            c.re = precision.demote(c.re);
            c.im = precision.demote(c.im);
        });
    }
    spec
}

/// White-noise Fourier or real modes.
///
/// The grid is filled row-major from a generator seeded only by `seed`,
/// so equal seeds give bit-identical output independent of call history.
/// Both representations are dimensionless with zero mean and unit
/// variance.
///
/// - `real`: return real-space modes instead of the Fourier half-spectrum.
///   The raw normal samples already have the right moments, so this path
///   skips the transforms entirely when `unit_abs` is off.
/// - `unit_abs`: rescale every spectral coefficient to unit magnitude,
///   keeping only the phase. A coefficient of exactly zero magnitude
///   would divide by zero here; for continuous noise that is a
///   measure-zero event and is deliberately not guarded.
#[must_use]
pub fn white_noise(seed: u64, conf: &MeshConfig, real: bool, unit_abs: bool) -> Modes {
    let mut rng = Xoshiro256pp::new(seed);
    let mut field = RealField::zeros(conf.ptcl_grid_shape);
    for v in field.data_mut() {
        *v = rng.standard_normal();
    }

    if real && !unit_abs {
        return Modes::Real(demote_real(field, conf.precision));
    }

    let mut spec = rfftn(&field, Norm::Ortho);
    if unit_abs {
        for c in spec.data_mut() {
            let magnitude = c.norm();
            *c /= magnitude;
        }
    }
    if real {
        return Modes::Real(demote_real(irfftn(&spec, Norm::Ortho), conf.precision));
    }
    Modes::Fourier(demote_fourier(spec, conf.precision))
}

/// Square root with an explicitly specified backward rule.
///
/// Forward is a plain `sqrt`. Negative input yields NaN and is not
/// guarded: a negative power spectrum is an upstream physics error, and
/// the NaN propagates to the caller rather than being masked here.
#[inline]
#[must_use]
pub fn safe_sqrt(x: f64) -> f64 {
    x.sqrt()
}

/// Backward rule paired one-to-one with [`safe_sqrt`].
///
/// Given the forward output `y` and the cotangent `y_cot` flowing back
/// through the node, the cotangent with respect to the input is
/// `0.5 / y · y_cot` where `y ≠ 0` and exactly 0 where `y = 0`. The
/// naive chain rule would inject `1/(2√0) = inf` at the explicitly
/// zeroed DC bin of the primordial spectrum; the zero branch keeps that
/// bin inert under differentiation and matches the analytic derivative
/// everywhere else.
#[inline]
#[must_use]
pub fn safe_sqrt_bwd(y: f64, y_cot: f64) -> f64 {
    if y != 0.0 {
        0.5 / y * y_cot
    } else {
        0.0
    }
}

/// Linear matter overdensity Fourier or real modes.
///
/// `modes` carries white-noise prior modes in either representation;
/// `spectrum` supplies the linear power spectrum and transfer function
/// (see [`LinearSpectrum`]); `a` optionally scales the output by growth.
/// The scale factor is a single scalar forwarded to every collaborator
/// evaluation; per-mode scale-factor arrays are not supported.
///
/// Gaussian branch: `δ(k) = √(V · P_lin(k)) · ω(k)`.
///
/// Non-Gaussian branch (cosmology carries `f_nl_loc`): samples a
/// curvature field from the primordial spectrum, squares it in real
/// space on a 3/2-padded grid so the quadratic power above the Nyquist
/// limit cannot alias back, recombines as
/// `ζ = ζ_G + (3/5) f_nl (ζ_G² − ⟨ζ_G²⟩)`, and applies the transfer
/// function `T_lin(k) k²`.
///
/// # Errors
///
/// [`FirstlightError::ShapeMismatch`] when the modes do not match the
/// configured grid; [`FirstlightError::PadAlignment`] when the
/// non-Gaussian branch runs on extents not divisible by 4.
pub fn linear_modes(
    modes: Modes,
    cosmo: &Cosmology,
    conf: &MeshConfig,
    spectrum: &dyn LinearSpectrum,
    a: Option<f64>,
    real: bool,
) -> Result<Modes, FirstlightError> {
    let shape = conf.ptcl_grid_shape;
    if modes.grid_shape() != shape {
        return Err(FirstlightError::ShapeMismatch {
            expected: shape,
            got: modes.grid_shape(),
        });
    }

    let k = radial_wavenumbers(shape, conf.ptcl_spacing);

    let mut spec = match modes {
        Modes::Real(field) => rfftn(&field, Norm::Ortho),
        Modes::Fourier(spec) => spec,
    };

    if let Some(f_nl) = cosmo.f_nl_loc {
        if shape.iter().any(|n| n % 4 != 0) {
            return Err(FirstlightError::PadAlignment { shape });
        }

        let transfer_k2: Vec<f64> = k
            .iter()
            .map(|&k| spectrum.linear_transfer(k, a, cosmo, conf) * k * k)
            .collect();

        // Primordial curvature spectrum with the DC entry zeroed: the
        // zero mode has no physical primordial power. This zero is the
        // bin the safe_sqrt backward rule guards.
        let mut p_prim: Vec<f64> = k
            .iter()
            .map(|&k| primordial_curvature(k, cosmo))
            .collect();
        p_prim[0] = 0.0;

        let cell_vol = conf.ptcl_cell_vol();
        spec.data_mut()
            .par_iter_mut()
            .zip(p_prim.par_iter())
            .for_each(|(m, &p)| *m *= safe_sqrt(p / cell_vol));

        // Curvature field in real space, then its square on the enlarged
        // grid; both FFT pairs inside the pad/square/crop sequence use
        // the backward convention, which cancels across the sequence.
        let zeta_g = irfftn(&spec, Norm::Ortho);
        let padded = pad_antialias(&rfftn(&zeta_g, Norm::Backward))?;
        let mut enlarged = irfftn(&padded, Norm::Backward);
        enlarged.data_mut().par_iter_mut().for_each(|v| *v *= *v);
        let squared = irfftn(
            &crop_antialias(&rfftn(&enlarged, Norm::Backward), shape)?,
            Norm::Backward,
        );

        // The mean subtraction removes the DC offset of the squared
        // zero-mean field (E[X²] ≠ 0).
        let offset = squared.mean();
        let mut zeta = zeta_g;
        zeta.data_mut()
            .par_iter_mut()
            .zip(squared.data().par_iter())
            .for_each(|(z, &q)| *z += F_NL_CONVENTION * f_nl * (q - offset));
        let zeta = demote_real(zeta, conf.precision);

        spec = rfftn(&zeta, Norm::Ortho);
        let discretization = conf.box_vol() / (conf.ptcl_num() as f64).sqrt();
        spec.data_mut()
            .par_iter_mut()
            .zip(transfer_k2.par_iter())
            .for_each(|(m, &t)| *m *= t * discretization);
    } else {
        let box_vol = conf.box_vol();
        let p_lin: Vec<f64> = k
            .iter()
            .map(|&k| spectrum.linear_power(k, a, cosmo, conf))
            .collect();
        spec.data_mut()
            .par_iter_mut()
            .zip(p_lin.par_iter())
            .for_each(|(m, &p)| *m *= safe_sqrt(p * box_vol));
    }

    if real {
        let field = irfftn(&spec, Norm::Spacing(conf.ptcl_spacing));
        Ok(Modes::Real(demote_real(field, conf.precision)))
    } else {
        Ok(Modes::Fourier(demote_fourier(spec, conf.precision)))
    }
}
