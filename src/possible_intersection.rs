// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Intersection handling between neighbouring segments of the sweep.
//!
//! Found intersections split the segments in place: the original records stay
//! valid for the queue and the status, the two new endpoint records enter the
//! queue as a fresh right/left pair.

use std::collections::BinaryHeap;
use std::rc::Rc;

use log::warn;

use crate::error::BooleanOpError;
use crate::intersection::intersect_segments;
use crate::point::Point;
use crate::sweep_event::SweepEvent;

/// Test the neighbouring segments `a` (below) and `b` (above) and split them
/// at their intersections. When `clamp` is set (processing a right event, or
/// re-testing around a snapped square centre), intersections are never
/// allowed to land before that position; rounding may otherwise disturb the
/// queue order. Returns whether any segment was split.
pub(crate) fn add_intersections(
    queue: &mut BinaryHeap<Rc<SweepEvent>>,
    clamp: Option<Point>,
    a: &Rc<SweepEvent>,
    b: &Rc<SweepEvent>,
) -> Result<bool, BooleanOpError> {
    let mut zs = intersect_segments(
        a.point.get(),
        a.other().point.get(),
        b.point.get(),
        b.other().point.get(),
    );
    if zs.is_empty() {
        return Ok(false);
    }

    if let Some(origin) = clamp {
        for z in zs.iter_mut() {
            let zold = *z;
            if z.x < origin.x {
                z.x = origin.x;
            } else if z.x == origin.x && z.y < origin.y {
                z.y = origin.y;
            }

            let a_max_y = a.point.get().y.max(a.other().point.get().y);
            let b_max_y = b.point.get().y.max(b.other().point.get().y);
            if a.other().point.get().x < z.x
                || b.other().point.get().x < z.x
                || a_max_y < z.y
                || b_max_y < z.y
            {
                warn!(
                    "intersection moved outside of segment: {} => {}",
                    zold, z
                );
            }
        }
    }

    let a_changed = split_at_intersections(&zs, queue, a, true)?;
    let b_changed = split_at_intersections(&zs, queue, b, false)?;
    Ok(a_changed || b_changed)
}

/// Split `s` at every intersection point, right-most first so earlier points
/// stay inside the shrinking left piece. Tangencies at the segment's own
/// endpoints are ignored. Pieces turned vertical by rounding get their
/// endpoints reordered; if that happens to the piece already anchored in the
/// sweep, its content is swapped with the new lower endpoint so existing
/// references keep pointing at the sweep-earlier end.
fn split_at_intersections(
    zs: &[Point],
    queue: &mut BinaryHeap<Rc<SweepEvent>>,
    s: &Rc<SweepEvent>,
    is_a: bool,
) -> Result<bool, BooleanOpError> {
    let mut changed = false;
    for &z in zs.iter().rev() {
        if z == s.point.get() || z == s.other().point.get() {
            continue;
        }

        let (right, left) = s.split_at(z);

        if left.point.get().x == left.other().point.get().x {
            // the piece after the split is vertical
            left.vertical.set(true);
            left.other().vertical.set(true);
            if left.other().point.get().y < left.point.get().y {
                left.reverse();
            }
        } else if right.point.get().x == right.other().point.get().x {
            // the piece before the split is vertical
            right.vertical.set(true);
            right.other().vertical.set(true);
            if right.point.get().y < right.other().point.get().y {
                if is_a {
                    warn!("reversing the first piece of the lower segment");
                }
                if right.other().node.get().is_some() {
                    return Err(BooleanOpError::InternalInconsistency(
                        "piece turned vertical while already in the status",
                    ));
                }
                right.reverse();

                // swap content with the queued left endpoint so the queue
                // keeps seeing the sweep-earlier end; events of this square
                // are re-sorted after the column anyway
                let first = right.other();
                right.swap_content_with(&first);
                first.set_other(&right);
                right.set_other(&first);
            }
        }

        queue.push(right);
        queue.push(left);
        changed = true;
    }
    Ok(changed)
}
