// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Intersections of a path with a horizontal ray.
//!
//! This is the one entry point that accepts curved commands: quadratic and
//! cubic segments reduce to root finding on their y polynomial, elliptical
//! arcs to a harmonic equation on the centre parameterization.

use std::cmp::Ordering;
use std::f64::consts::PI;

use crate::error::BooleanOpError;
use crate::intersection::{intersect_segments, solve_cubic, solve_quadratic};
use crate::path::{Path, PathCmd};
use crate::point::{approx_equal, in_interval, Point, EPSILON};

/// One intersection of a ray with the path. `t` is the parameter along the
/// ray: zero when the hit coincides with the ray origin, NaN otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Point,
    pub t: f64,
}

impl Path {
    /// The intersections of this path with the ray from `(x, y)` towards
    /// `(∞, y)`, sorted along the ray. An intersection is tangent only at
    /// the ray origin itself. Runs in O(n) over the path segments.
    pub fn ray_intersections(&self, x: f64, y: f64) -> Result<Vec<RayHit>, BooleanOpError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(BooleanOpError::InvalidInput("ray origin must be finite"));
        }
        self.ensure_finite()?;

        let origin = Point::new(x, y);
        let mut hits: Vec<Point> = Vec::new();
        let mut start = Point::default();
        for cmd in self.cmds() {
            match *cmd {
                PathCmd::MoveTo(_) => {}
                PathCmd::LineTo(end) | PathCmd::Close(end) => {
                    let ymin = start.y.min(end.y);
                    let ymax = start.y.max(end.y);
                    let xmax = start.x.max(end.x);
                    if in_interval(y, ymin, ymax) && x <= xmax + EPSILON {
                        ray_line(&mut hits, origin, xmax, start, end);
                    }
                }
                PathCmd::QuadTo(c, end) => {
                    let ymin = start.y.min(end.y).min(c.y);
                    let ymax = start.y.max(end.y).max(c.y);
                    let xmax = start.x.max(end.x).max(c.x);
                    if in_interval(y, ymin, ymax) && x <= xmax + EPSILON {
                        ray_quad(&mut hits, origin, start, c, end);
                    }
                }
                PathCmd::CubeTo(c1, c2, end) => {
                    let ymin = start.y.min(end.y).min(c1.y.min(c2.y));
                    let ymax = start.y.max(end.y).max(c1.y.max(c2.y));
                    let xmax = start.x.max(end.x).max(c1.x.max(c2.x));
                    if in_interval(y, ymin, ymax) && x <= xmax + EPSILON {
                        ray_cube(&mut hits, origin, start, c1, c2, end);
                    }
                }
                PathCmd::ArcTo {
                    rx,
                    ry,
                    rot,
                    large,
                    sweep,
                    to,
                } => {
                    ray_arc(&mut hits, origin, start, rx, ry, rot, large, sweep, to);
                }
            }
            start = cmd.end();
        }

        let mut hits: Vec<RayHit> = hits
            .into_iter()
            .map(|p| RayHit {
                point: p,
                t: if p.dist(origin) <= EPSILON { 0.0 } else { f64::NAN },
            })
            .collect();
        hits.sort_by(|a, b| {
            if approx_equal(a.point.x, b.point.x) {
                Ordering::Equal
            } else {
                a.point.x.partial_cmp(&b.point.x).unwrap_or(Ordering::Equal)
            }
        });
        Ok(hits)
    }
}

fn ray_line(hits: &mut Vec<Point>, origin: Point, xmax: f64, start: Point, end: Point) {
    if start == end {
        return;
    }
    let ray_end = Point::new(xmax + 1.0, origin.y);
    // order the segment in sweep direction
    let ordered = start.x < end.x || start.x == end.x && start.y < end.y;
    let (b0, b1) = if ordered { (start, end) } else { (end, start) };
    for z in intersect_segments(origin, ray_end, b0, b1) {
        hits.push(z);
    }
}

fn quad_point(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let a = p0.lerp(c, t);
    let b = c.lerp(p1, t);
    a.lerp(b, t)
}

fn cube_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let a = p0.lerp(c1, t);
    let b = c1.lerp(c2, t);
    let c = c2.lerp(p1, t);
    let ab = a.lerp(b, t);
    let bc = b.lerp(c, t);
    ab.lerp(bc, t)
}

fn ray_quad(hits: &mut Vec<Point>, origin: Point, p0: Point, c: Point, p1: Point) {
    // y(t) - y = 0 is quadratic in t
    let a = p0.y - 2.0 * c.y + p1.y;
    let b = 2.0 * (c.y - p0.y);
    let d = p0.y - origin.y;
    for t in solve_quadratic(a, b, d) {
        if !(-EPSILON..=1.0 + EPSILON).contains(&t) {
            continue;
        }
        let z = quad_point(p0, c, p1, t.clamp(0.0, 1.0));
        if origin.x <= z.x + EPSILON {
            hits.push(Point::new(z.x, origin.y));
        }
    }
}

fn ray_cube(hits: &mut Vec<Point>, origin: Point, p0: Point, c1: Point, c2: Point, p1: Point) {
    let a = -p0.y + 3.0 * c1.y - 3.0 * c2.y + p1.y;
    let b = 3.0 * p0.y - 6.0 * c1.y + 3.0 * c2.y;
    let c = -3.0 * p0.y + 3.0 * c1.y;
    let d = p0.y - origin.y;
    for t in solve_cubic(a, b, c, d) {
        if !(-EPSILON..=1.0 + EPSILON).contains(&t) {
            continue;
        }
        let z = cube_point(p0, c1, c2, p1, t.clamp(0.0, 1.0));
        if origin.x <= z.x + EPSILON {
            hits.push(Point::new(z.x, origin.y));
        }
    }
}

/// Convert an endpoint arc to its centre parameterization: centre, corrected
/// radii, start angle and end angle (signed sweep applied).
#[allow(clippy::too_many_arguments)]
fn ellipse_to_center(
    p0: Point,
    rx: f64,
    ry: f64,
    phi: f64,
    large: bool,
    sweep: bool,
    p1: Point,
) -> (Point, f64, f64, f64, f64) {
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if p0 == p1 || rx == 0.0 || ry == 0.0 {
        return (p0, rx, ry, 0.0, 0.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();
    let dx = (p0.x - p1.x) / 2.0;
    let dy = (p0.y - p1.y) / 2.0;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    // scale up too small radii
    let lambda = x1p * x1p / (rx * rx) + y1p * y1p / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
    let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
    let mut coef = (num / den).max(0.0).sqrt();
    if large == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;
    let cx = cos_phi * cxp - sin_phi * cyp + (p0.x + p1.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (p0.y + p1.y) / 2.0;

    let theta0 = ((y1p - cyp) / ry).atan2((x1p - cxp) / rx);
    let theta1 = ((-y1p - cyp) / ry).atan2((-x1p - cxp) / rx);
    let mut dtheta = theta1 - theta0;
    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }
    (Point::new(cx, cy), rx, ry, theta0, theta0 + dtheta)
}

#[allow(clippy::too_many_arguments)]
fn ray_arc(
    hits: &mut Vec<Point>,
    origin: Point,
    p0: Point,
    rx: f64,
    ry: f64,
    phi: f64,
    large: bool,
    sweep: bool,
    p1: Point,
) {
    let (c, rx, ry, theta0, theta1) = ellipse_to_center(p0, rx, ry, phi, large, sweep, p1);
    if rx == 0.0 || ry == 0.0 || theta0 == theta1 {
        return;
    }
    let reach = rx.max(ry);
    if !in_interval(origin.y, c.y - reach, c.y + reach) || origin.x > c.x + reach + EPSILON {
        return;
    }

    // on the ellipse, y(θ) = cy + rx sin(φ) cos(θ) + ry cos(φ) sin(θ);
    // rewrite as R sin(θ + δ) and solve for the scan height
    let (sin_phi, cos_phi) = phi.sin_cos();
    let a = rx * sin_phi;
    let b = ry * cos_phi;
    let r = a.hypot(b);
    let rhs = origin.y - c.y;
    if r == 0.0 || rhs.abs() > r + EPSILON {
        return;
    }
    let delta = a.atan2(b);
    let s = (rhs / r).clamp(-1.0, 1.0).asin();
    let candidates = [s - delta, PI - s - delta];

    let span = theta1 - theta0;
    for theta in candidates {
        // bring the solution into the traversed angular interval
        let rel = if span >= 0.0 {
            (theta - theta0).rem_euclid(2.0 * PI)
        } else {
            -((theta0 - theta).rem_euclid(2.0 * PI))
        };
        if rel.abs() > span.abs() + EPSILON {
            continue;
        }
        let theta = theta0 + rel;
        let x = c.x + rx * cos_phi * theta.cos() - ry * sin_phi * theta.sin();
        if origin.x <= x + EPSILON {
            hits.push(Point::new(x, origin.y));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn arc_center_of_unit_half_circle() {
        // half circle from (1,0) to (-1,0) through (0,1)
        let (c, rx, ry, theta0, theta1) = ellipse_to_center(
            Point::new(1.0, 0.0),
            1.0,
            1.0,
            0.0,
            false,
            true,
            Point::new(-1.0, 0.0),
        );
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rx, 1.0);
        assert_relative_eq!(ry, 1.0);
        assert_relative_eq!(theta0, 0.0, epsilon = 1e-12);
        assert_relative_eq!(theta1, PI, epsilon = 1e-12);
    }

    #[test]
    fn ray_hits_quad_arch_twice() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).quad_to(1.0, 2.0, 2.0, 0.0);
        let hits = p.ray_intersections(-1.0, 0.5).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].point.x < hits[1].point.x);
        assert!(hits.iter().all(|h| h.t.is_nan()));
    }

    #[test]
    fn ray_hits_cubic_once_per_crossing() {
        let mut p = Path::new();
        p.move_to(0.0, -1.0).cube_to(0.5, 1.0, 1.5, -1.0, 2.0, 1.0);
        let hits = p.ray_intersections(-1.0, 0.9).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn ray_through_circle_hits_twice() {
        let mut p = Path::new();
        p.move_to(1.0, 0.0)
            .arc_to(1.0, 1.0, 0.0, false, true, -1.0, 0.0)
            .arc_to(1.0, 1.0, 0.0, false, true, 1.0, 0.0)
            .close();
        let hits = p.ray_intersections(-2.0, 0.5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].point.x, -(0.75_f64.sqrt()), epsilon = 1e-9);
        assert_relative_eq!(hits[1].point.x, 0.75_f64.sqrt(), epsilon = 1e-9);
    }
}
