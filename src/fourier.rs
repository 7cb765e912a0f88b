// SPDX-License-Identifier: AGPL-3.0-only

//! 3-D Fourier machinery for mode generation.
//!
//! Real fields live on the full particle grid; spectral fields use the
//! real-to-complex half-spectrum layout (last axis truncated to `n/2 + 1`,
//! the high half implied by Hermitian symmetry). Transforms run as rustfft
//! complex lanes along each axis.
//!
//! # Normalization conventions
//!
//! | `Norm` | forward | inverse |
//! |--------|---------|---------|
//! | `Backward` | 1 | 1/N |
//! | `Ortho` | 1/√N | 1/√N |
//! | `Spacing(s)` | s³ | 1/(N s³) |
//!
//! N is the full real-grid site count. `Ortho` preserves total variance
//! across the transform. `Spacing` makes the forward transform a Riemann
//! sum for the continuum Fourier integral (units gain \[L³\]) and the
//! inverse its dimensionally consistent partner; the two conventions must
//! not be mixed within one round trip.

use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{FftDirection, FftPlanner};

use crate::error::FirstlightError;

/// Transform normalization convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Norm {
    /// Unscaled forward, 1/N inverse (the FFT library default).
    Backward,
    /// 1/√N on both directions; round trips preserve total variance.
    Ortho,
    /// Physical convention tied to the grid spacing `s`.
    Spacing(f64),
}

impl Norm {
    fn forward_scale(self, n: usize) -> f64 {
        match self {
            Self::Backward => 1.0,
            Self::Ortho => 1.0 / (n as f64).sqrt(),
            Self::Spacing(s) => s * s * s,
        }
    }

    fn inverse_scale(self, n: usize) -> f64 {
        match self {
            Self::Backward => 1.0 / n as f64,
            Self::Ortho => 1.0 / (n as f64).sqrt(),
            Self::Spacing(s) => 1.0 / (n as f64 * s * s * s),
        }
    }
}

/// Real scalar field on the full particle grid, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct RealField {
    shape: [usize; 3],
    data: Vec<f64>,
}

impl RealField {
    #[must_use]
    pub fn zeros(shape: [usize; 3]) -> Self {
        let n = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; n],
        }
    }

    /// Wrap an existing buffer, checking the length against the shape.
    pub fn from_vec(shape: [usize; 3], data: Vec<f64>) -> Result<Self, FirstlightError> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(FirstlightError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[must_use]
    pub fn at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[(i * self.shape[1] + j) * self.shape[2] + k]
    }

    /// Sample mean over all grid sites.
    ///
    /// Bit-reproducible across thread pools; see [`stable_sum_by`].
    #[must_use]
    pub fn mean(&self) -> f64 {
        stable_sum_by(&self.data, |x| x) / self.data.len() as f64
    }

    /// Sample variance over all grid sites.
    ///
    /// Bit-reproducible across thread pools; see [`stable_sum_by`].
    #[must_use]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        stable_sum_by(&self.data, |x| (x - mean) * (x - mean)) / self.data.len() as f64
    }
}

/// Partial-sum chunk size for [`stable_sum_by`]; fixed so the reduction
/// tree shape never varies.
const SUM_CHUNK: usize = 4096;

/// Scheduling-independent parallel sum of `f(x)` over a slice.
///
/// A naive `par_iter().sum()` lets work stealing decide the order in which
/// partials combine, so the floating-point result varies with thread count
/// and run-to-run scheduling. Here the slice splits into fixed-size chunks,
/// each chunk reduces serially, and the per-chunk partials combine in index
/// order. The rounding sequence is then a pure function of the input, which
/// keeps every quantity downstream of a grid mean bit-identical for equal
/// seeds.
fn stable_sum_by<F>(data: &[f64], f: F) -> f64
where
    F: Fn(f64) -> f64 + Sync,
{
    let partials: Vec<f64> = data
        .par_chunks(SUM_CHUNK)
        .map(|chunk| chunk.iter().map(|&x| f(x)).sum::<f64>())
        .collect();
    partials.iter().sum()
}

/// Complex field in the half-spectrum (real-to-complex) layout.
///
/// Stores `[n0, n1, n2/2 + 1]` coefficients of a real field on the
/// `full_shape = [n0, n1, n2]` grid; the missing high half of the last
/// axis is implied by `F(-k) = conj(F(k))`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralField {
    full_shape: [usize; 3],
    data: Vec<Complex64>,
}

impl SpectralField {
    /// Extents of the real grid this spectrum inverts to.
    #[must_use]
    pub fn full_shape(&self) -> [usize; 3] {
        self.full_shape
    }

    /// Extents of the stored coefficient array.
    #[must_use]
    pub fn stored_shape(&self) -> [usize; 3] {
        let [n0, n1, n2] = self.full_shape;
        [n0, n1, n2 / 2 + 1]
    }

    #[must_use]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    #[must_use]
    pub fn at(&self, i: usize, j: usize, k: usize) -> Complex64 {
        let [_, n1, h] = self.stored_shape();
        self.data[(i * n1 + j) * h + k]
    }
}

/// One complex FFT per lane along `axis` of a full row-major cube.
///
/// The planner is shared across axes of one transform so repeated lengths
/// reuse their plan instead of re-planning per axis.
fn fft_axis(
    planner: &mut FftPlanner<f64>,
    data: &mut [Complex64],
    shape: [usize; 3],
    axis: usize,
    direction: FftDirection,
) {
    let [n0, n1, n2] = shape;
    let len = shape[axis];
    if len == 1 {
        return;
    }
    let fft = planner.plan_fft(len, direction);

    if axis == 2 {
        // contiguous lanes
        fft.process(data);
        return;
    }

    let stride = if axis == 0 { n1 * n2 } else { n2 };
    let mut lane = vec![Complex64::new(0.0, 0.0); len];
    let bases: Vec<usize> = match axis {
        0 => (0..n1 * n2).collect(),
        _ => (0..n0)
            .flat_map(|i| (0..n2).map(move |k| i * n1 * n2 + k))
            .collect(),
    };
    for base in bases {
        for (l, slot) in lane.iter_mut().enumerate() {
            *slot = data[base + l * stride];
        }
        fft.process(&mut lane);
        for (l, &value) in lane.iter().enumerate() {
            data[base + l * stride] = value;
        }
    }
}

fn scale_in_place(data: &mut [Complex64], scale: f64) {
    if scale != 1.0 {
        data.par_iter_mut().for_each(|c| *c *= scale);
    }
}

/// Forward real-to-complex 3-D transform.
#[must_use]
pub fn rfftn(field: &RealField, norm: Norm) -> SpectralField {
    let [n0, n1, n2] = field.shape();
    let mut cube: Vec<Complex64> = field
        .data()
        .iter()
        .map(|&x| Complex64::new(x, 0.0))
        .collect();
    let mut planner = FftPlanner::new();
    for axis in [2, 1, 0] {
        fft_axis(&mut planner, &mut cube, [n0, n1, n2], axis, FftDirection::Forward);
    }

    let h = n2 / 2 + 1;
    let mut data = Vec::with_capacity(n0 * n1 * h);
    for row in 0..n0 * n1 {
        data.extend_from_slice(&cube[row * n2..row * n2 + h]);
    }
    scale_in_place(&mut data, norm.forward_scale(n0 * n1 * n2));
    SpectralField {
        full_shape: [n0, n1, n2],
        data,
    }
}

/// Inverse complex-to-real 3-D transform.
///
/// The high half of the last axis is reconstructed by Hermitian symmetry
/// before the inverse lanes run; only the real parts survive, so a
/// spectrum that is not Hermitian-consistent on its stored planes silently
/// loses its imaginary component, as with any irfftn.
#[must_use]
pub fn irfftn(spec: &SpectralField, norm: Norm) -> RealField {
    let [n0, n1, n2] = spec.full_shape;
    let h = n2 / 2 + 1;
    let mut cube = vec![Complex64::new(0.0, 0.0); n0 * n1 * n2];
    for row in 0..n0 * n1 {
        cube[row * n2..row * n2 + h].copy_from_slice(&spec.data[row * h..(row + 1) * h]);
    }
    for i in 0..n0 {
        let im = (n0 - i) % n0;
        for j in 0..n1 {
            let jm = (n1 - j) % n1;
            for k in h..n2 {
                cube[(i * n1 + j) * n2 + k] = spec.data[(im * n1 + jm) * h + (n2 - k)].conj();
            }
        }
    }
    let mut planner = FftPlanner::new();
    for axis in [2, 1, 0] {
        fft_axis(&mut planner, &mut cube, [n0, n1, n2], axis, FftDirection::Inverse);
    }

    let scale = norm.inverse_scale(n0 * n1 * n2);
    let data: Vec<f64> = cube.par_iter().map(|c| c.re * scale).collect();
    RealField {
        shape: [n0, n1, n2],
        data,
    }
}

/// Per-axis angular wavenumbers for the half-spectrum layout.
///
/// Axes 0 and 1 carry the usual positive-then-negative frequency order;
/// the reduced last axis carries non-negative frequencies only. Units are
/// radians per \[L\]: `k_j = 2π j / (n s)`.
#[must_use]
pub fn fftfreq(shape: [usize; 3], spacing: f64) -> [Vec<f64>; 3] {
    let full = |n: usize| -> Vec<f64> {
        (0..n)
            .map(|j| {
                let j = if j <= (n - 1) / 2 {
                    j as f64
                } else {
                    j as f64 - n as f64
                };
                2.0 * std::f64::consts::PI * j / (n as f64 * spacing)
            })
            .collect()
    };
    let reduced = |n: usize| -> Vec<f64> {
        (0..=n / 2)
            .map(|j| 2.0 * std::f64::consts::PI * j as f64 / (n as f64 * spacing))
            .collect()
    };
    [full(shape[0]), full(shape[1]), reduced(shape[2])]
}

/// Radial wavenumber magnitude per stored coefficient, flattened row-major.
///
/// Element 0 is the DC mode with `k = 0`.
#[must_use]
pub fn radial_wavenumbers(shape: [usize; 3], spacing: f64) -> Vec<f64> {
    let [kx, ky, kz] = fftfreq(shape, spacing);
    let mut k = Vec::with_capacity(kx.len() * ky.len() * kz.len());
    for &x in &kx {
        for &y in &ky {
            for &z in &kz {
                k.push((x * x + y * y + z * z).sqrt());
            }
        }
    }
    k
}

/// Cyclic roll along one of the two full axes of a stored coefficient cube.
fn roll(data: &[Complex64], dims: [usize; 3], axis: usize, shift: usize) -> Vec<Complex64> {
    let [n0, n1, h] = dims;
    let mut out = vec![Complex64::new(0.0, 0.0); data.len()];
    for i in 0..n0 {
        let oi = if axis == 0 { (i + shift) % n0 } else { i };
        for j in 0..n1 {
            let oj = if axis == 1 { (j + shift) % n1 } else { j };
            let src = (i * n1 + j) * h;
            let dst = (oi * n1 + oj) * h;
            out[dst..dst + h].copy_from_slice(&data[src..src + h]);
        }
    }
    out
}

const ANTIALIAS_AMPLITUDE: f64 = 1.5 * 1.5 * 1.5;

/// Zero-pad a half-spectrum by the 3/2 anti-aliasing margin.
///
/// The zero frequency is centered on the two full axes, each padded by
/// `n/4` on both sides; the reduced axis gains `n2/4` on its high side.
/// Amplitudes scale by `(3/2)³` to compensate the implicit normalization
/// change of the enlarged grid, then the centering shift is undone.
///
/// Requires every extent divisible by 4 so the margins are exact
/// (half-integer margins would split a frequency bin).
pub fn pad_antialias(spec: &SpectralField) -> Result<SpectralField, FirstlightError> {
    let [n0, n1, n2] = spec.full_shape;
    if n0 % 4 != 0 || n1 % 4 != 0 || n2 % 4 != 0 {
        return Err(FirstlightError::PadAlignment {
            shape: spec.full_shape,
        });
    }
    let h = n2 / 2 + 1;
    let centered = roll(&roll(&spec.data, [n0, n1, h], 0, n0 / 2), [n0, n1, h], 1, n1 / 2);

    let (m0, m1, hp) = (3 * n0 / 2, 3 * n1 / 2, h + n2 / 4);
    let mut padded = vec![Complex64::new(0.0, 0.0); m0 * m1 * hp];
    for i in 0..n0 {
        for j in 0..n1 {
            let src = (i * n1 + j) * h;
            let dst = ((i + n0 / 4) * m1 + (j + n1 / 4)) * hp;
            for k in 0..h {
                padded[dst + k] = centered[src + k] * ANTIALIAS_AMPLITUDE;
            }
        }
    }

    let data = roll(
        &roll(&padded, [m0, m1, hp], 0, m0 - m0 / 2),
        [m0, m1, hp],
        1,
        m1 - m1 / 2,
    );
    Ok(SpectralField {
        full_shape: [m0, m1, 3 * n2 / 2],
        data,
    })
}

/// Crop a 3/2-padded half-spectrum back to `target` extents.
///
/// Exact inverse of [`pad_antialias`]: re-center, slice off the `n/4`
/// margins (high side only on the reduced axis), divide out the `(3/2)³`
/// amplitude compensation, undo the centering.
pub fn crop_antialias(
    spec: &SpectralField,
    target: [usize; 3],
) -> Result<SpectralField, FirstlightError> {
    let [n0, n1, n2] = target;
    if n0 % 4 != 0 || n1 % 4 != 0 || n2 % 4 != 0 {
        return Err(FirstlightError::PadAlignment { shape: target });
    }
    let expected = [3 * n0 / 2, 3 * n1 / 2, 3 * n2 / 2];
    if spec.full_shape != expected {
        return Err(FirstlightError::ShapeMismatch {
            expected,
            got: spec.full_shape,
        });
    }
    let [m0, m1, _] = expected;
    let hp = (3 * n2 / 2) / 2 + 1;
    let h = n2 / 2 + 1;
    let centered = roll(&roll(&spec.data, [m0, m1, hp], 0, m0 / 2), [m0, m1, hp], 1, m1 / 2);

    let mut cropped = vec![Complex64::new(0.0, 0.0); n0 * n1 * h];
    for i in 0..n0 {
        for j in 0..n1 {
            let src = ((i + n0 / 4) * m1 + (j + n1 / 4)) * hp;
            let dst = (i * n1 + j) * h;
            for k in 0..h {
                cropped[dst + k] = centered[src + k] / ANTIALIAS_AMPLITUDE;
            }
        }
    }

    let data = roll(
        &roll(&cropped, [n0, n1, h], 0, n0 - n0 / 2),
        [n0, n1, h],
        1,
        n1 - n1 / 2,
    );
    Ok(SpectralField {
        full_shape: target,
        data,
    })
}
