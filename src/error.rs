// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for mode-generation operations.
//!
//! Replaces `Result<_, String>` in public APIs with a proper enum so callers
//! can pattern-match on failure modes (shape mismatch, padding alignment)
//! rather than parsing opaque strings. Numerical failures (NaN from a
//! negative power spectrum) are deliberately *not* represented here: they
//! propagate through the arithmetic, matching the unguarded square root
//! documented in [`crate::modes::safe_sqrt`].

use std::fmt;

/// Errors arising from mode generation and Fourier-grid operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstlightError {
    /// Input modes do not match the configured particle grid.
    ///
    /// Raised before any transform; silent broadcasting between mismatched
    /// grids would corrupt the wavenumber bookkeeping.
    ShapeMismatch {
        expected: [usize; 3],
        got: [usize; 3],
    },

    /// Grid extents are not divisible by 4, so the 3/2 anti-aliasing
    /// margins of the non-Gaussian pipeline cannot be formed exactly.
    PadAlignment { shape: [usize; 3] },

    /// A flat buffer does not hold one value per grid site.
    BufferLength { expected: usize, got: usize },

    /// A grid extent or the grid spacing is zero.
    EmptyGrid,
}

impl fmt::Display for FirstlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, got } => write!(
                f,
                "mode array shape {got:?} does not match particle grid {expected:?}"
            ),
            Self::PadAlignment { shape } => write!(
                f,
                "grid extents {shape:?} must each be divisible by 4 for anti-aliasing padding"
            ),
            Self::BufferLength { expected, got } => write!(
                f,
                "buffer holds {got} values but the grid has {expected} sites"
            ),
            Self::EmptyGrid => write!(f, "grid shape and spacing must be nonzero"),
        }
    }
}

impl std::error::Error for FirstlightError {}
