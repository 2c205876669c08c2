// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tests for DE-9IM classification and intersection listing.

use path_booleanop::{Path, Point};

fn poly(points: &[(f64, f64)]) -> Path {
    let mut p = Path::new();
    let mut it = points.iter();
    let first = it.next().unwrap();
    p.move_to(first.0, first.1);
    for pt in it {
        p.line_to(pt.0, pt.1);
    }
    p.close();
    p
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
    poly(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
}

#[test]
fn equal_squares_relate_as_equal() {
    let p = rect(0.0, 0.0, 1.0, 1.0);
    let (rel, _zs) = p.relate(&p.clone()).unwrap();
    assert!(rel.equals());
    assert!(rel.intersects());
    assert!(rel.contains());
    assert!(rel.within());
    assert!(!rel.touches());
    assert!(!rel.overlaps());
}

#[test]
fn touching_squares_share_two_boundary_points() {
    let p = rect(0.0, 0.0, 1.0, 1.0);
    let q = rect(1.0, 0.0, 2.0, 1.0);

    let (rel, zs) = p.relate(&q).unwrap();
    assert!(rel.touches());
    assert!(!rel.overlaps());
    assert!(rel.intersects());
    assert!(!rel.equals());

    assert_eq!(zs.len(), 2);
    assert_eq!(zs[0], Point::new(1.0, 0.0));
    assert_eq!(zs[1], Point::new(1.0, 1.0));
}

#[test]
fn disjoint_squares() {
    let p = rect(0.0, 0.0, 1.0, 1.0);
    let q = rect(5.0, 5.0, 6.0, 6.0);

    let (rel, zs) = p.relate(&q).unwrap();
    assert!(rel.disjoint());
    assert!(!rel.intersects());
    assert!(!rel.touches());
    assert!(zs.is_empty());
    // only exterior-facing bits are set
    assert_eq!(rel.bits() & 0x1b, 0);
}

#[test]
fn contained_square() {
    let p = rect(0.0, 0.0, 10.0, 10.0);
    let q = rect(2.0, 2.0, 4.0, 4.0);

    assert!(p.contains(&q).unwrap());
    assert!(!p.within(&q).unwrap());
    assert!(q.within(&p).unwrap());
    assert!(p.overlaps(&q).unwrap() == false);
    assert!(p.intersects(&q).unwrap());
    assert!(!p.touches(&q).unwrap());
}

#[test]
fn crossing_squares_overlap() {
    let p = rect(0.0, 0.0, 2.0, 2.0);
    let q = rect(1.0, 1.0, 3.0, 3.0);

    let (rel, zs) = p.relate(&q).unwrap();
    assert!(rel.overlaps());
    assert!(rel.intersects());
    assert!(!rel.touches());
    assert!(!rel.contains());

    // boundaries cross at (1,2) and (2,1)
    assert!(zs.contains(&Point::new(1.0, 2.0)));
    assert!(zs.contains(&Point::new(2.0, 1.0)));
    // sorted left to right, bottom to top
    for w in zs.windows(2) {
        assert!(w[0].x < w[1].x || (w[0].x == w[1].x && w[0].y <= w[1].y));
    }
}

#[test]
fn corner_touch_is_a_single_point() {
    let p = rect(0.0, 0.0, 1.0, 1.0);
    let q = rect(1.0, 1.0, 2.0, 2.0);

    let (rel, zs) = p.relate(&q).unwrap();
    assert!(rel.touches());
    assert!(!rel.overlaps());
    assert_eq!(zs, vec![Point::new(1.0, 1.0)]);
}

#[test]
fn intersections_of_crossing_triangles() {
    let p = poly(&[(0.0, 0.0), (4.0, 0.0), (2.0, 4.0)]);
    let q = rect(0.0, 1.0, 4.0, 2.0);

    let zs = p.intersections(&q).unwrap();
    // the two slanted triangle edges each cross the rectangle twice
    assert_eq!(zs.len(), 4);
    for z in &zs {
        assert!(z.y == 1.0 || z.y == 2.0);
    }
}

#[test]
fn empty_input_relates_as_nothing() {
    let p = rect(0.0, 0.0, 1.0, 1.0);
    let empty = Path::new();
    let (rel, zs) = p.relate(&empty).unwrap();
    assert!(rel.disjoint());
    assert!(zs.is_empty());
    assert_eq!(rel.to_string(), "FFFFFFFFT");
}

#[test]
fn relation_errors_on_curves() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0).quad_to(1.0, 1.0, 2.0, 0.0).close();
    let q = rect(0.0, 0.0, 1.0, 1.0);
    assert!(p.relate(&q).is_err());
}
