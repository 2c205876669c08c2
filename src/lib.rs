// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Robust boolean operations and spatial classification for planar vector
//! paths.
//!
//! The core is a snap-rounded Bentley-Ottmann plane sweep: intersections are
//! found column by column, every endpoint is collapsed onto a regular grid,
//! and segments passing through a hot grid square are broken up at its
//! centre so later predicates stay stable. On top of the same sweep sit the
//! boolean operations (intersection, union, difference, symmetric
//! difference, subdivision), the settle operation that removes
//! self-intersections of a single path, a DE-9IM relation classifier, and a
//! horizontal ray caster.
//!
//! Inputs are flat command streams; curves must be flattened beforehand
//! (only [`Path::ray_intersections`] accepts them directly). Contours may be
//! oriented either way, may self-intersect, overlap and touch arbitrarily;
//! subject contours may be open.
//!
//! ```
//! use path_booleanop::Path;
//!
//! let mut p = Path::new();
//! p.move_to(0.0, 0.0).line_to(2.0, 0.0).line_to(2.0, 2.0).line_to(0.0, 2.0).close();
//! let mut q = Path::new();
//! q.move_to(1.0, 1.0).line_to(3.0, 1.0).line_to(3.0, 3.0).line_to(1.0, 3.0).close();
//!
//! let both = p.and(&q).unwrap();
//! assert!((both.signed_area() - 1.0).abs() < 1e-6);
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

mod booleanop;
mod compare_segments;
mod connect_edges;
mod error;
mod init_events;
mod intersection;
mod path;
mod point;
mod possible_intersection;
mod ray;
mod relate;
mod snap_round;
mod status;
mod sweep_event;

pub use booleanop::{boolean_op, settle};
pub use error::BooleanOpError;
pub use path::{Path, PathCmd};
pub use point::Point;
pub use ray::RayHit;
pub use relate::Relation;

/// Mapping from winding count to filled/unfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// Filled where the winding count is non-zero.
    NonZero,
    /// Filled where the winding count is odd.
    EvenOdd,
}

impl FillRule {
    pub(crate) fn fills(self, windings: i32) -> bool {
        match self {
            FillRule::NonZero => windings != 0,
            FillRule::EvenOdd => windings % 2 != 0,
        }
    }
}

/// The boolean operation to perform. `Settle` ignores the clipping path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Clean up a single path: the settled subject alone.
    Settle,
    /// Keep what both inputs fill.
    Intersection,
    /// Keep what either input fills.
    Union,
    /// Keep what the subject fills without the clipping path.
    Difference,
    /// Keep what exactly one input fills.
    Xor,
    /// Keep all boundaries; doubly filled parts split into two contours.
    Divide,
}

const DEFAULT_GRID_EPSILON: f64 = 1e-8;

// snap grid spacing, stored as bits for atomic access
static GRID_EPSILON: AtomicU64 = AtomicU64::new(DEFAULT_GRID_EPSILON.to_bits());

/// The spacing of the snap grid used by the sweep. Defaults to `1e-8`.
pub fn grid_epsilon() -> f64 {
    f64::from_bits(GRID_EPSILON.load(AtomicOrdering::Relaxed))
}

/// Configure the process-wide snap grid. A smaller grid follows the input
/// geometry more faithfully but leaves less numerical headroom; the value
/// must stay well above the intersection tolerance (`1e-10`), coarser than
/// about `1e-9`. Out-of-range values are ignored.
pub fn set_grid_epsilon(eps: f64) {
    if eps.is_finite() && eps >= 1e-9 {
        GRID_EPSILON.store(eps.to_bits(), AtomicOrdering::Relaxed);
    } else {
        log::warn!("ignoring snap grid spacing {eps}, keeping {}", grid_epsilon());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_epsilon_default_and_guard() {
        assert_eq!(grid_epsilon(), 1e-8);
        set_grid_epsilon(f64::NAN);
        assert_eq!(grid_epsilon(), 1e-8);
        set_grid_epsilon(1e-11);
        assert_eq!(grid_epsilon(), 1e-8);
    }

    #[test]
    fn fill_rules() {
        assert!(FillRule::NonZero.fills(-2));
        assert!(!FillRule::NonZero.fills(0));
        assert!(FillRule::EvenOdd.fills(-1));
        assert!(!FillRule::EvenOdd.fills(2));
    }
}
