// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The snap-rounded Bentley-Ottmann driver.
//!
//! The sweep advances one column at a time, a column being all events whose
//! snapped x equals the current grid column. Each column is processed in
//! phases:
//!
//! 1. run the classical sweep for the column, discovering intersections
//!    between newly adjacent segments;
//! 2. break up every segment crossing a hot tolerance square;
//! 3. snap all endpoints of the column onto the square centres;
//! 4. re-sort the affected status ranges and re-test changed adjacencies,
//!    re-entering phase 1 if a split lands back in the column;
//! 5. compute winding fields for the new left endpoints and merge segments
//!    that snapping made identical.
//!
//! A second pass over the accumulated squares reconstructs the result
//! contours. The approach follows Hobby's stable snap rounding, with the
//! special cases (overlaps, multiple endpoints per vertex, verticals)
//! handled in the manner of Martinez et al.

use std::collections::BinaryHeap;
use std::rc::Rc;

use crate::connect_edges::connect_edges;
use crate::error::BooleanOpError;
use crate::init_events::add_path_endpoints;
use crate::path::Path;
use crate::point::snap;
use crate::possible_intersection::add_intersections;
use crate::snap_round::ToleranceSquares;
use crate::status::SweepStatus;
use crate::sweep_event::SweepEvent;
use crate::{grid_epsilon, FillRule, Operation};

/// Perform a boolean operation between two paths. Both inputs must be
/// flattened; any fill rule handling is `NonZero`. The subject may contain
/// open subpaths, the clipping path is implicitly closed.
///
/// The result groups each filling contour (counter-clockwise) with its holes
/// (clockwise) as subsequent subpaths; filling contours are ordered left to
/// right, then bottom to top.
pub fn boolean_op(subject: &Path, clipping: &Path, op: Operation) -> Result<Path, BooleanOpError> {
    subject.ensure_finite()?;
    clipping.ensure_finite()?;
    if subject.has_curves() || clipping.has_curves() {
        return Err(BooleanOpError::UnsupportedCurve);
    }
    let rs = sweep(
        subject.split(),
        Some(clipping.split()),
        op,
        FillRule::NonZero,
    )?;
    Ok(Path::merge(rs))
}

/// Settle a single path: remove self-intersections and overlaps, orient
/// filling contours counter-clockwise and holes clockwise, and separate
/// components as far as possible.
pub fn settle(path: &Path, fill_rule: FillRule) -> Result<Path, BooleanOpError> {
    path.ensure_finite()?;
    if path.has_curves() {
        return Err(BooleanOpError::UnsupportedCurve);
    }
    let rs = sweep(path.split(), None, Operation::Settle, fill_rule)?;
    Ok(Path::merge(rs))
}

impl Path {
    /// See [`settle`].
    pub fn settle(&self, fill_rule: FillRule) -> Result<Path, BooleanOpError> {
        settle(self, fill_rule)
    }

    /// The intersection of this path with `q`.
    pub fn and(&self, q: &Path) -> Result<Path, BooleanOpError> {
        boolean_op(self, q, Operation::Intersection)
    }

    /// The union of this path with `q`.
    pub fn or(&self, q: &Path) -> Result<Path, BooleanOpError> {
        boolean_op(self, q, Operation::Union)
    }

    /// The symmetric difference of this path with `q`.
    pub fn xor(&self, q: &Path) -> Result<Path, BooleanOpError> {
        boolean_op(self, q, Operation::Xor)
    }

    /// This path minus `q`.
    pub fn not(&self, q: &Path) -> Result<Path, BooleanOpError> {
        boolean_op(self, q, Operation::Difference)
    }

    /// This path subdivided by `q`: boundaries of both are kept, segments
    /// inside both appear in two contours.
    pub fn div(&self, q: &Path) -> Result<Path, BooleanOpError> {
        boolean_op(self, q, Operation::Divide)
    }
}

/// The sweep over pre-split subpaths. `qs` is ignored for `Settle`.
pub(crate) fn sweep(
    ps: Vec<Path>,
    qs: Option<Vec<Path>>,
    op: Operation,
    fill_rule: FillRule,
) -> Result<Vec<Path>, BooleanOpError> {
    let qs = if op == Operation::Settle { None } else { qs };

    // one empty side makes the answer a settle of the other (or nothing)
    if let Some(qs) = &qs {
        if qs.is_empty() {
            if op == Operation::Intersection {
                return Ok(Vec::new());
            }
            return sweep(ps, None, Operation::Settle, fill_rule);
        }
    }
    if ps.is_empty() {
        if let Some(qs) = qs {
            if op == Operation::Union || op == Operation::Xor {
                return sweep(qs, None, Operation::Settle, fill_rule);
            }
        }
        return Ok(Vec::new());
    }

    let eps = grid_epsilon();

    let mut events: Vec<Rc<SweepEvent>> = Vec::new();
    let mut seg = 0;
    for p in &ps {
        seg = add_path_endpoints(&mut events, p, seg, false)?;
    }
    if let Some(qs) = &qs {
        let mut seg = 0;
        for q in qs {
            // an open clipping contour makes no sense, close it
            if !q.is_closed() {
                let mut closed = q.clone();
                closed.close();
                seg = add_path_endpoints(&mut events, &closed, seg, true)?;
            } else {
                seg = add_path_endpoints(&mut events, q, seg, true)?;
            }
        }
    }

    // each column re-entry subdivides at least one segment inside a bounded
    // column, so this budget is a safety net, not a tuning knob
    let reentry_budget = 64 + 8 * events.len();

    let mut queue: BinaryHeap<Rc<SweepEvent>> = BinaryHeap::from(events);
    let mut status = SweepStatus::new();
    let mut squares = ToleranceSquares::new();

    while !queue.is_empty() {
        let n = squares.len();
        let x = snap(queue.peek().unwrap().point.get().x, eps);
        let mut reentries = 0usize;

        'column: loop {
            // Phase 1: classical sweep of the column. Left events are peeked
            // rather than popped: discovered intersections may push events
            // that order before the current one.
            loop {
                let Some(event) = queue.peek().cloned() else {
                    break;
                };
                if snap(event.point.get().x, eps) != x {
                    break;
                }

                if !event.left.get() {
                    queue.pop();

                    let left = event.other();
                    let Some(nid) = left.node.get() else {
                        return Err(BooleanOpError::InternalInconsistency(
                            "right endpoint without a status node",
                        ));
                    };
                    if !status.holds(nid, &left) {
                        return Err(BooleanOpError::InternalInconsistency(
                            "status node no longer carries its endpoint",
                        ));
                    }

                    // the segments around the removed one become adjacent
                    let prev = status.prev(nid);
                    let next = status.next(nid);
                    if let (Some(p), Some(nx)) = (prev, next) {
                        let (pe, ne) = (status.event(p), status.event(nx));
                        add_intersections(&mut queue, Some(event.point.get()), &pe, &ne)?;
                    }

                    squares.add(x, &event, prev.or(next), eps);
                    status.remove(nid);
                } else {
                    let (prev, next) = status.find_prev_next(&event);
                    if let Some(p) = prev {
                        let pe = status.event(p);
                        add_intersections(&mut queue, None, &pe, &event)?;
                    }
                    if let Some(nx) = next {
                        let ne = status.event(nx);
                        add_intersections(&mut queue, None, &event, &ne)?;
                    }
                    if !queue.peek().is_some_and(|t| Rc::ptr_eq(t, &event)) {
                        // the queue order changed, re-examine
                        continue;
                    }
                    queue.pop();

                    let nid = status.insert_after(prev, &event);
                    squares.add(x, &event, Some(nid), eps);
                }
            }

            // Phase 2: break up segments crossing the hot squares.
            squares.breakup_crossing_segments(n, x, &mut status, eps);

            // Phase 3: snap the column onto the grid.
            squares.snap_column(n, x, eps);

            // Phases 4 and 5, square by square, bottom to top.
            for j in n..squares.len() {
                let range = (squares.square(j).lower, squares.square(j).upper);
                if let (Some(lower), Some(upper)) = range {
                    // the snapped range of the status in pre-snap order
                    let mut ids = Vec::new();
                    let mut orig = Vec::new();
                    let mut node = Some(lower);
                    while let Some(cur) = node {
                        ids.push(cur);
                        orig.push(status.event(cur));
                        if cur == upper {
                            break;
                        }
                        node = status.next(cur);
                    }

                    // segments whose order now contradicts their overlap are
                    // cut to the shorter reach, preventing intersections from
                    // drifting column over column
                    for k in 0..orig.len().saturating_sub(1) {
                        let a = &orig[k];
                        let b = &orig[k + 1];
                        if a.compare_v(b) == std::cmp::Ordering::Greater {
                            let ao = a.other().point.get();
                            let bo = b.other().point.get();
                            if bo.x < ao.x {
                                let (r, l) = a.split_at(bo);
                                queue.push(r);
                                queue.push(l);
                            } else if ao.x < bo.x {
                                let (r, l) = b.split_at(ao);
                                queue.push(r);
                                queue.push(l);
                            }
                        }
                    }

                    // Phase 4: re-sort the range on the snapped data
                    let mut sorted = orig.clone();
                    sorted.sort_by(|a, b| a.compare_v(b));
                    for (id, ev) in ids.iter().zip(sorted.iter()) {
                        status.set_event(*id, ev);
                    }

                    // neighbours of the range may intersect the re-sorted ends
                    let centre = crate::point::Point::new(squares.square(j).x, squares.square(j).y);
                    let mut has = false;
                    if let Some(p) = status.prev(lower) {
                        let (pe, le) = (status.event(p), status.event(lower));
                        has |= add_intersections(&mut queue, Some(centre), &pe, &le)?;
                    }
                    if let Some(nx) = status.next(upper) {
                        let (ue, ne) = (status.event(upper), status.event(nx));
                        has |= add_intersections(&mut queue, Some(centre), &ue, &ne)?;
                    }

                    // segments that changed relative order may face a new
                    // neighbour above; the old neighbours were tested already
                    for (i, ev) in sorted.iter().enumerate().take(sorted.len() - 1) {
                        if Rc::ptr_eq(ev, &orig[i]) {
                            continue;
                        }
                        let nid = ev.node.get().expect("sorted event lost its node");
                        let j0 = orig
                            .iter()
                            .position(|e| Rc::ptr_eq(e, ev))
                            .expect("event vanished from its own range");
                        if let Some(nx) = status.next(nid) {
                            let ne = status.event(nx);
                            let was_below = j0 > 0 && Rc::ptr_eq(&ne, &orig[j0 - 1]);
                            let was_above = j0 + 1 < orig.len() && Rc::ptr_eq(&ne, &orig[j0 + 1]);
                            if !was_below && !was_above {
                                has |= add_intersections(&mut queue, Some(centre), ev, &ne)?;
                            }
                        }
                    }

                    if queue
                        .peek()
                        .is_some_and(|t| snap(t.point.get().x, eps) == x)
                    {
                        // a split landed in this column, run it through the
                        // classical sweep before going on
                        reentries += 1;
                        if reentries > reentry_budget {
                            return Err(BooleanOpError::InternalInconsistency(
                                "column did not settle within its re-entry budget",
                            ));
                        }
                        continue 'column;
                    } else if has {
                        // cutting may have made segments equal to adjacent
                        // overlapping ones, order them again
                        let mut resorted = sorted.clone();
                        resorted.sort_by(|a, b| a.compare_v(b));
                        for (id, ev) in ids.iter().zip(resorted.iter()) {
                            status.set_event(*id, ev);
                        }
                    }
                }

                // Phase 5: winding fields in queue order
                squares
                    .square_mut(j)
                    .events
                    .sort_by(|a, b| a.compare_h(b));

                let below_square = squares.square(j).node.map(|nid| status.event(nid));
                let events = squares.square(j).events.clone();
                for (i, event) in events.iter().enumerate() {
                    if !event.left.get() {
                        merge_overlapping(&event.other(), op, fill_rule);
                    } else if event.node.get().is_none() {
                        // vertical: order against the last left endpoint in
                        // the square, or the first segment below it
                        let prev = if i > 0 && events[i - 1].left.get() {
                            Some(events[i - 1].clone())
                        } else {
                            below_square.clone()
                        };
                        event.compute_windings(prev.as_ref());
                        event.apply_result(op, fill_rule);
                    } else {
                        let prev = status.prev(event.node.get().unwrap()).map(|p| status.event(p));
                        event.compute_windings(prev.as_ref());
                        event.apply_result(op, fill_rule);
                    }
                }
            }

            break;
        }
    }
    status.clear();

    connect_edges(&squares, op)
}

/// Coalesce segments with identical endpoints after snapping. Windings are
/// re-taken from the first true predecessor since the order used to compute
/// them may have changed; predecessors lose their selection flags. Each
/// endpoint is handled once, in whichever order the events come in.
fn merge_overlapping(s: &Rc<SweepEvent>, op: Operation, fill_rule: FillRule) {
    if s.overlapped.get() {
        return;
    }

    let mut prev = s.prev();
    while let Some(p) = prev.clone() {
        if p.overlapped.get()
            || s.point.get() != p.point.get()
            || s.other().point.get() != p.other().point.get()
        {
            break;
        }

        if s.clipping == p.clipping {
            s.self_windings.set(s.self_windings.get() + p.self_windings.get());
            s.other_self_windings
                .set(s.other_self_windings.get() + p.other_self_windings.get());
        } else {
            s.self_windings
                .set(s.self_windings.get() + p.other_self_windings.get());
            s.other_self_windings
                .set(s.other_self_windings.get() + p.self_windings.get());
        }
        p.windings.set(0);
        p.self_windings.set(0);
        p.other_windings.set(0);
        p.other_self_windings.set(0);
        p.in_result.set(0);
        p.other().in_result.set(0);
        p.overlapped.set(true);
        prev = p.prev();
    }

    let unchanged = match (&prev, &s.prev()) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    };
    if unchanged {
        return;
    }

    match &prev {
        None => {
            s.windings.set(0);
            s.other_windings.set(0);
        }
        Some(p) => {
            if s.clipping == p.clipping {
                s.windings.set(p.windings.get() + p.self_windings.get());
                s.other_windings
                    .set(p.other_windings.get() + p.other_self_windings.get());
            } else {
                s.windings
                    .set(p.other_windings.get() + p.other_self_windings.get());
                s.other_windings
                    .set(p.windings.get() + p.self_windings.get());
            }
        }
    }
    s.apply_result(op, fill_rule);
    s.set_prev(prev.as_ref());
}
