// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Numerically careful segment intersection.
//!
//! The primitive reports zero, one or two intersection points. Two points
//! occur only for collinear segments that overlap along an interval, in which
//! case the interval's endpoints are returned. Tangent intersections at an
//! endpoint are kept; the caller decides whether they cause a split.

use arrayvec::ArrayVec;

use crate::point::{Point, EPSILON};

/// Intersect two segments given in sweep order (`a0` before `a1`, `b0`
/// before `b1`). Returned points are sorted in sweep order and snapped onto
/// coinciding segment endpoints, so tangencies compare exactly.
pub(crate) fn intersect_segments(
    a0: Point,
    a1: Point,
    b0: Point,
    b1: Point,
) -> ArrayVec<Point, 2> {
    let mut zs = ArrayVec::new();
    let da = a1 - a0;
    let db = b1 - b0;
    let div = da.cross(db);

    if div != 0.0 {
        let ta = (b0 - a0).cross(db) / div;
        let tb = (b0 - a0).cross(da) / div;
        // parameter tolerance equivalent to a distance of EPSILON
        let ea = EPSILON / da.x.hypot(da.y);
        let eb = EPSILON / db.x.hypot(db.y);
        if -ea <= ta && ta <= 1.0 + ea && -eb <= tb && tb <= 1.0 + eb {
            let z = a0.lerp(a1, ta.clamp(0.0, 1.0));
            zs.push(snap_to_endpoints(z, a0, a1, b0, b1));
        }
        return zs;
    }

    // parallel: only collinear segments intersect meaningfully
    let la = da.x.hypot(da.y);
    if da.cross(b0 - a0).abs() > EPSILON * la || da.cross(b1 - a0).abs() > EPSILON * la {
        return zs;
    }

    // overlap interval of b projected onto a
    let len2 = da.dot(da);
    let t0 = (b0 - a0).dot(da) / len2;
    let t1 = (b1 - a0).dot(da) / len2;
    let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    let lo = lo.max(0.0);
    let hi = hi.min(1.0);
    if hi < lo {
        return zs;
    }

    let z0 = snap_to_endpoints(a0.lerp(a1, lo), a0, a1, b0, b1);
    let z1 = snap_to_endpoints(a0.lerp(a1, hi), a0, a1, b0, b1);
    zs.push(z0);
    if z1 != z0 && (hi - lo) * la > EPSILON {
        zs.push(z1);
    }
    zs
}

fn snap_to_endpoints(mut z: Point, a0: Point, a1: Point, b0: Point, b1: Point) -> Point {
    if z.dist(a0) <= EPSILON {
        z = a0;
    } else if z.dist(a1) <= EPSILON {
        z = a1;
    }
    if z.dist(b0) <= EPSILON {
        z = b0;
    } else if z.dist(b1) <= EPSILON {
        z = b1;
    }
    z
}

/// Real roots of `a t² + b t + c = 0`.
pub(crate) fn solve_quadratic(a: f64, b: f64, c: f64) -> ArrayVec<f64, 2> {
    let mut roots = ArrayVec::new();
    if a.abs() <= EPSILON {
        if b.abs() > EPSILON {
            roots.push(-c / b);
        }
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    if disc == 0.0 {
        roots.push(-b / (2.0 * a));
        return roots;
    }
    // avoid cancellation between -b and the discriminant root
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    roots.push(q / a);
    if q != 0.0 {
        roots.push(c / q);
    } else {
        roots.push(0.0);
    }
    if roots[0] > roots[1] {
        roots.swap(0, 1);
    }
    roots
}

/// Real roots of `a t³ + b t² + c t + d = 0`, ascending.
pub(crate) fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> ArrayVec<f64, 3> {
    let mut roots = ArrayVec::new();
    if a.abs() <= EPSILON {
        roots.extend(solve_quadratic(b, c, d));
        return roots;
    }

    let p = b / a;
    let q = c / a;
    let r = d / a;
    let big_q = (p * p - 3.0 * q) / 9.0;
    let big_r = (2.0 * p * p * p - 9.0 * p * q + 27.0 * r) / 54.0;

    if big_r * big_r < big_q * big_q * big_q {
        // three real roots
        let theta = (big_r / (big_q * big_q * big_q).sqrt()).acos();
        let s = -2.0 * big_q.sqrt();
        let shift = p / 3.0;
        roots.push(s * (theta / 3.0).cos() - shift);
        roots.push(s * ((theta + 2.0 * std::f64::consts::PI) / 3.0).cos() - shift);
        roots.push(s * ((theta - 2.0 * std::f64::consts::PI) / 3.0).cos() - shift);
        roots.sort_by(|x, y| x.partial_cmp(y).unwrap());
    } else {
        let big_a = -big_r.signum() * (big_r.abs() + (big_r * big_r - big_q.powi(3)).sqrt()).cbrt();
        let big_b = if big_a != 0.0 { big_q / big_a } else { 0.0 };
        roots.push(big_a + big_b - p / 3.0);
    }
    roots
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn crossing_segments_meet_once() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        );
        assert_eq!(zs.len(), 1);
        assert_relative_eq!(zs[0].x, 1.0);
        assert_relative_eq!(zs[0].y, 1.0);
    }

    #[test]
    fn endpoint_touch_is_reported_exactly() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        );
        assert_eq!(zs.len(), 1);
        assert_eq!(zs[0], Point::new(1.0, 1.0));
    }

    #[test]
    fn tangent_through_interior_snaps_to_vertex() {
        // b ends exactly on a's interior
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 5.0),
        );
        assert_eq!(zs.len(), 1);
        assert_eq!(zs[0], Point::new(2.0, 0.0));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        );
        assert!(zs.is_empty());
        // parallel but shifted along the line
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        );
        assert!(zs.is_empty());
    }

    #[test]
    fn collinear_overlap_returns_interval() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(5.0, 0.0),
        );
        assert_eq!(zs.len(), 2);
        assert_eq!(zs[0], Point::new(1.0, 0.0));
        assert_eq!(zs[1], Point::new(3.0, 0.0));
    }

    #[test]
    fn collinear_vertical_overlap() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 3.0),
        );
        assert_eq!(zs.len(), 2);
        assert_eq!(zs[0], Point::new(0.0, 1.0));
        assert_eq!(zs[1], Point::new(0.0, 2.0));
    }

    #[test]
    fn collinear_endpoint_touch_is_single() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert_eq!(zs.len(), 1);
        assert_eq!(zs[0], Point::new(1.0, 0.0));
    }

    #[test]
    fn near_miss_within_tolerance_still_hits() {
        let zs = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 1e-11),
            Point::new(1.0, 1.0),
        );
        assert_eq!(zs.len(), 1);
    }

    #[test]
    fn quadratic_roots() {
        let roots = solve_quadratic(1.0, -3.0, 2.0);
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0], 1.0);
        assert_relative_eq!(roots[1], 2.0);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn cubic_roots() {
        // (t - 1)(t - 2)(t - 3)
        let roots = solve_cubic(1.0, -6.0, 11.0, -6.0);
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(roots[2], 3.0, epsilon = 1e-9);

        let roots = solve_cubic(1.0, 0.0, 0.0, -8.0);
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2.0, epsilon = 1e-9);
    }
}
