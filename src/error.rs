// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for boolean path operations.

use thiserror::Error;

/// Errors reported by the boolean/overlay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BooleanOpError {
    /// The input path is malformed: NaN or infinite coordinates, or a close
    /// command whose target does not match the start of its subpath.
    #[error("invalid input path: {0}")]
    InvalidInput(&'static str),

    /// A curved command reached the overlay core. Paths must be flattened
    /// before boolean operations; curves are accepted only by
    /// `ray_intersections`.
    #[error("curve commands are not supported in boolean operations")]
    UnsupportedCurve,

    /// A sweep invariant was violated. This indicates a bug in the
    /// intersection or rounding logic, not in the input.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(&'static str),
}
