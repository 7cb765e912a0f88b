// SPDX-License-Identifier: AGPL-3.0-only

//! Simulation mesh and cosmology parameter containers.
//!
//! Both structs are consumed read-only by the mode generators. Derived
//! quantities (cell volume, box volume, particle count) are methods of the
//! stored shape and spacing, so the mesh invariants hold by construction
//! rather than by convention.

use serde::Serialize;

use crate::error::FirstlightError;

/// Floating-point precision of arrays handed across the public API.
///
/// Internal arithmetic is always f64; `Single` demotes every element
/// through f32 at the API boundary. The demotion point matters for the
/// non-Gaussian pipeline, whose real-space squaring runs at full internal
/// precision before the final cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// Round a value to this precision.
    #[inline]
    #[must_use]
    pub fn demote(self, x: f64) -> f64 {
        match self {
            Self::Single => f64::from(x as f32),
            Self::Double => x,
        }
    }
}

/// Particle-mesh configuration in comoving units.
#[derive(Clone, Debug, Serialize)]
#[must_use]
pub struct MeshConfig {
    /// Lagrangian particle grid extents (modes are sampled on this grid).
    pub ptcl_grid_shape: [usize; 3],
    /// Grid spacing, identical per axis \[L\].
    pub ptcl_spacing: f64,
    /// Output array precision.
    pub precision: Precision,
}

impl MeshConfig {
    /// Build a mesh configuration, rejecting degenerate grids.
    pub fn new(ptcl_grid_shape: [usize; 3], ptcl_spacing: f64) -> Result<Self, FirstlightError> {
        if ptcl_grid_shape.contains(&0) || ptcl_spacing <= 0.0 {
            return Err(FirstlightError::EmptyGrid);
        }
        Ok(Self {
            ptcl_grid_shape,
            ptcl_spacing,
            precision: Precision::Double,
        })
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Total number of particles / grid sites.
    #[must_use]
    pub fn ptcl_num(&self) -> usize {
        self.ptcl_grid_shape.iter().product()
    }

    /// Volume of one grid cell: spacing³ \[L³\].
    #[must_use]
    pub fn ptcl_cell_vol(&self) -> f64 {
        self.ptcl_spacing.powi(3)
    }

    /// Comoving box volume: cell volume × particle count \[L³\].
    #[must_use]
    pub fn box_vol(&self) -> f64 {
        self.ptcl_cell_vol() * self.ptcl_num() as f64
    }
}

/// Primordial spectrum parameters, plus optional local-type
/// non-Gaussianity.
///
/// When `f_nl_loc` is `None` the Gaussian branch of
/// [`crate::modes::linear_modes`] runs and the amplitude is never read;
/// the `Option` encodes the flag/value pair as one field.
#[derive(Clone, Debug, Serialize)]
#[must_use]
pub struct Cosmology {
    /// Primordial scalar amplitude `A_s` at the pivot scale.
    pub a_s: f64,
    /// Scalar spectral tilt `n_s`.
    pub n_s: f64,
    /// Pivot wavenumber `k_pivot` \[1/L\].
    pub k_pivot: f64,
    /// Local-type non-Gaussianity amplitude, `None` for Gaussian initial
    /// conditions.
    pub f_nl_loc: Option<f64>,
}

impl Cosmology {
    pub fn new(a_s: f64, n_s: f64, k_pivot: f64) -> Self {
        Self {
            a_s,
            n_s,
            k_pivot,
            f_nl_loc: None,
        }
    }

    /// Enable local-type non-Gaussianity with amplitude `f_nl`.
    pub fn with_f_nl_loc(mut self, f_nl: f64) -> Self {
        self.f_nl_loc = Some(f_nl);
        self
    }
}
