// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tests for ray casting against paths.

use approx::assert_relative_eq;

use path_booleanop::Path;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
    let mut p = Path::new();
    p.move_to(x0, y0)
        .line_to(x1, y0)
        .line_to(x1, y1)
        .line_to(x0, y1)
        .close();
    p
}

#[test]
fn ray_through_a_square() {
    let p = rect(0.0, 0.0, 2.0, 2.0);
    let hits = p.ray_intersections(-1.0, 0.5).unwrap();
    assert_eq!(hits.len(), 2);
    assert_relative_eq!(hits[0].point.x, 0.0);
    assert_relative_eq!(hits[1].point.x, 2.0);
    assert_relative_eq!(hits[0].point.y, 0.5);
    // neither hit lies on the ray origin
    assert!(hits[0].t.is_nan());
    assert!(hits[1].t.is_nan());
}

#[test]
fn ray_starting_on_the_boundary_is_tangent_there() {
    let p = rect(0.0, 0.0, 2.0, 2.0);
    let hits = p.ray_intersections(0.0, 0.5).unwrap();
    assert_eq!(hits.len(), 2);
    assert_relative_eq!(hits[0].point.x, 0.0);
    assert_eq!(hits[0].t, 0.0);
    assert!(hits[1].t.is_nan());
}

#[test]
fn ray_misses_above() {
    let p = rect(0.0, 0.0, 2.0, 2.0);
    assert!(p.ray_intersections(-1.0, 3.0).unwrap().is_empty());
    // starting right of the shape misses too
    assert!(p.ray_intersections(3.0, 1.0).unwrap().is_empty());
}

#[test]
fn hit_parity_matches_even_odd_containment() {
    // a ring: outer square with a hole
    let mut p = rect(0.0, 0.0, 10.0, 10.0);
    p.append(&rect(3.0, 3.0, 7.0, 7.0).reverse());

    // inside the ring material
    let hits = p.ray_intersections(-5.0, 1.5).unwrap();
    assert_eq!(hits.len() % 2, 0);
    assert_eq!(hits.len(), 2);

    // inside the hole: crosses hole boundary once and outer once
    let hits = p.ray_intersections(5.0, 5.0).unwrap();
    assert_eq!(hits.len(), 2);

    // a probe point in the material: odd crossing count to its right
    let hits = p.ray_intersections(1.0, 5.0).unwrap();
    assert_eq!(hits.len() % 2, 1);
    assert_eq!(hits.len(), 3);
}

#[test]
fn sorted_along_the_ray() {
    let mut p = rect(0.0, 0.0, 1.0, 4.0);
    p.append(&rect(2.0, 0.0, 3.0, 4.0));
    p.append(&rect(4.0, 0.0, 5.0, 4.0));
    let hits = p.ray_intersections(-1.0, 2.0).unwrap();
    let xs: Vec<f64> = hits.iter().map(|h| h.point.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn open_polyline_crossing() {
    let mut p = Path::new();
    p.move_to(1.0, -1.0).line_to(1.0, 1.0).line_to(3.0, 1.0);
    let hits = p.ray_intersections(0.0, 0.0).unwrap();
    assert_eq!(hits.len(), 1);
    assert_relative_eq!(hits[0].point.x, 1.0);
}

#[test]
fn rejects_nan_origin() {
    let p = rect(0.0, 0.0, 1.0, 1.0);
    assert!(p.ray_intersections(f64::NAN, 0.0).is_err());
}
