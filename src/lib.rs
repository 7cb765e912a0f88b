// SPDX-License-Identifier: AGPL-3.0-only

//! firstlight — initial-condition modes for cosmological particle-mesh
//! simulations.
//!
//! Draws reproducible white-noise modes from an integer seed and colors
//! them with a physically motivated power spectrum, producing linear
//! Gaussian or local-type primordial-non-Gaussian matter overdensity
//! modes in Fourier or real space. Every public operation is a pure,
//! stateless array transform: same inputs, bit-identical outputs, no
//! global state.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `config` | Mesh and cosmology parameter containers |
//! | `error` | Typed failure modes |
//! | `rng` | Seeded xoshiro256++ with Box–Muller normals |
//! | `fourier` | 3-D real↔half-spectrum FFT, wavenumber grids, anti-aliasing pad/crop |
//! | `boltzmann` | Collaborator trait for linear-theory spectra |
//! | `modes` | `white_noise` and `linear_modes` |
//! | `tolerances` | Justified numerical tolerances for the test suites |
//!
//! ## Conventions
//!
//! Forward/inverse transforms inside the generators use the orthonormal
//! normalization (total variance preserved); the final real-space output
//! of `linear_modes` uses the physical-spacing convention so the field
//! comes out dimensionless. The non-Gaussian squaring step runs on a
//! grid padded by 3/2 per axis, the standard convolution-theorem margin
//! for one quadratic nonlinearity.

pub mod boltzmann;
pub mod config;
pub mod error;
pub mod fourier;
pub mod modes;
pub mod rng;
pub mod tolerances;

pub use boltzmann::LinearSpectrum;
pub use config::{Cosmology, MeshConfig, Precision};
pub use error::FirstlightError;
pub use fourier::{RealField, SpectralField};
pub use modes::{linear_modes, safe_sqrt, safe_sqrt_bwd, white_noise, Modes};
