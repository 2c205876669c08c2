// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The endpoint record driving the sweep.
//!
//! Each physical segment is represented by two linked endpoint events. The
//! events are shared between the queue, the status tree and the tolerance
//! squares, so the record lives behind `Rc` with interior mutability and the
//! pair link is a symmetric `Weak` back-reference.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::point::Point;
use crate::{FillRule, Operation};

pub(crate) struct SweepEvent {
    /// Segment belongs to the clipping input (otherwise the subject).
    pub clipping: bool,
    /// Stable id distinguishing same-geometry segments.
    pub segment: usize,

    /// Position of this endpoint.
    pub point: Cell<Point>,
    /// The paired endpoint of the segment.
    other: RefCell<Weak<SweepEvent>>,
    /// This endpoint is the sweep-order-earlier of the pair.
    pub left: Cell<bool>,
    /// Segment has equal x at both endpoints.
    pub vertical: Cell<bool>,
    /// Original direction of travel is left-to-right (bottom-to-top if vertical).
    pub increasing: Cell<bool>,
    /// Segment is part of an unclosed contour.
    pub open: Cell<bool>,
    /// Endpoint is a terminal end of an open contour.
    pub end: Cell<bool>,

    /// Back-reference into the status tree.
    pub node: Cell<Option<usize>>,

    /// Windings of the own input immediately below the segment.
    pub windings: Cell<i32>,
    /// Windings of the other input immediately below the segment.
    pub other_windings: Cell<i32>,
    /// Winding contribution across this segment (with overlap accumulation).
    pub self_windings: Cell<i32>,
    pub other_self_windings: Cell<i32>,
    /// Segment immediately below at left-event time.
    prev: RefCell<Weak<SweepEvent>>,

    /// Index into the tolerance-square list.
    pub square: Cell<usize>,
    /// 0 = omit, 1 = use once, 2 = use twice (divide only).
    pub in_result: Cell<u8>,
    /// Segment was coalesced into an adjacent identical segment.
    pub overlapped: Cell<bool>,

    /// Windings outside the contour being built, for hole nesting.
    pub result_windings: Cell<i32>,
    /// 1-based index into the result list, 0 while unassigned.
    pub index: Cell<usize>,
}

impl SweepEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        point: Point,
        clipping: bool,
        open: bool,
        end: bool,
        segment: usize,
        left: bool,
        increasing: bool,
        vertical: bool,
    ) -> Rc<SweepEvent> {
        Rc::new(SweepEvent {
            clipping,
            segment,
            point: Cell::new(point),
            other: RefCell::new(Weak::new()),
            left: Cell::new(left),
            vertical: Cell::new(vertical),
            increasing: Cell::new(increasing),
            open: Cell::new(open),
            end: Cell::new(end),
            node: Cell::new(None),
            windings: Cell::new(0),
            other_windings: Cell::new(0),
            self_windings: Cell::new(0),
            other_self_windings: Cell::new(0),
            prev: RefCell::new(Weak::new()),
            square: Cell::new(0),
            in_result: Cell::new(0),
            overlapped: Cell::new(false),
            result_windings: Cell::new(0),
            index: Cell::new(0),
        })
    }

    /// Copy of this record, links not yet rewired.
    fn clone_record(&self) -> Rc<SweepEvent> {
        Rc::new(SweepEvent {
            clipping: self.clipping,
            segment: self.segment,
            point: self.point.clone(),
            other: RefCell::new(self.other.borrow().clone()),
            left: self.left.clone(),
            vertical: self.vertical.clone(),
            increasing: self.increasing.clone(),
            open: self.open.clone(),
            end: self.end.clone(),
            node: Cell::new(None),
            windings: self.windings.clone(),
            other_windings: self.other_windings.clone(),
            self_windings: self.self_windings.clone(),
            other_self_windings: self.other_self_windings.clone(),
            prev: RefCell::new(self.prev.borrow().clone()),
            square: self.square.clone(),
            in_result: self.in_result.clone(),
            overlapped: self.overlapped.clone(),
            result_windings: self.result_windings.clone(),
            index: self.index.clone(),
        })
    }

    pub fn other(&self) -> Rc<SweepEvent> {
        self.other
            .borrow()
            .upgrade()
            .expect("paired endpoint released while still referenced")
    }

    pub fn set_other(&self, other: &Rc<SweepEvent>) {
        *self.other.borrow_mut() = Rc::downgrade(other);
    }

    pub fn prev(&self) -> Option<Rc<SweepEvent>> {
        self.prev.borrow().upgrade()
    }

    pub fn set_prev(&self, prev: Option<&Rc<SweepEvent>>) {
        *self.prev.borrow_mut() = prev.map(Rc::downgrade).unwrap_or_default();
    }

    /// The y of the segment at `x`, by linear interpolation between the
    /// endpoints. Unbounded for (nearly) vertical segments.
    pub fn interpolate_y(&self, x: f64) -> f64 {
        let p = self.point.get();
        let o = self.other().point.get();
        let t = (x - p.x) / (o.x - p.x);
        p.lerp(o, t).y
    }

    /// Split the segment at `z`, keeping this record in place so references
    /// from the queue and the status stay valid. Returns the new pair
    /// `(right, left)`: `self..right` is the earlier piece, `left..other` the
    /// later one.
    pub fn split_at(self: &Rc<Self>, z: Point) -> (Rc<SweepEvent>, Rc<SweepEvent>) {
        let far = self.other();
        let right = far.clone_record();
        let left = self.clone_record();
        right.point.set(z);
        left.point.set(z);
        right.end.set(false);
        left.end.set(false);

        right.set_other(self);
        far.set_other(&left);
        left.set_other(&far);
        self.set_other(&right);
        (right, left)
    }

    /// Reverse the direction of travel of the segment.
    pub fn reverse(&self) {
        let other = self.other();
        let was_left = self.left.get();
        self.left.set(!was_left);
        other.left.set(was_left);
        self.increasing.set(!self.increasing.get());
        other.increasing.set(!other.increasing.get());
    }

    /// Exchange the mutable content of two records, leaving the pair links
    /// for the caller to rewire. Used when a right half turned vertical by
    /// rounding must take the place of its already-queued left endpoint.
    pub fn swap_content_with(&self, b: &SweepEvent) {
        debug_assert_eq!(self.segment, b.segment);
        swap_cells(&self.point, &b.point);
        self.other.swap(&b.other);
        swap_cells(&self.left, &b.left);
        swap_cells(&self.vertical, &b.vertical);
        swap_cells(&self.increasing, &b.increasing);
        swap_cells(&self.open, &b.open);
        swap_cells(&self.end, &b.end);
        swap_cells(&self.node, &b.node);
        swap_cells(&self.windings, &b.windings);
        swap_cells(&self.other_windings, &b.other_windings);
        swap_cells(&self.self_windings, &b.self_windings);
        swap_cells(&self.other_self_windings, &b.other_self_windings);
        self.prev.swap(&b.prev);
        swap_cells(&self.square, &b.square);
        swap_cells(&self.in_result, &b.in_result);
        swap_cells(&self.overlapped, &b.overlapped);
        swap_cells(&self.result_windings, &b.result_windings);
        swap_cells(&self.index, &b.index);
    }

    /// Winding fields of a fresh left endpoint, taken from the segment below.
    /// Vertical predecessors are skipped; `prev` itself is recorded as-is.
    pub fn compute_windings(&self, prev: Option<&Rc<SweepEvent>>) {
        if !self.open.get() {
            self.self_windings
                .set(if self.increasing.get() { 1 } else { -1 });
        }

        self.set_prev(prev);
        let mut below = prev.cloned();
        while let Some(p) = below.clone() {
            if !p.vertical.get() {
                break;
            }
            below = p.prev();
        }

        match below {
            Some(p) => {
                if self.clipping == p.clipping {
                    self.windings.set(p.windings.get() + p.self_windings.get());
                    self.other_windings
                        .set(p.other_windings.get() + p.other_self_windings.get());
                } else {
                    self.windings
                        .set(p.other_windings.get() + p.other_self_windings.get());
                    self.other_windings
                        .set(p.windings.get() + p.self_windings.get());
                }
            }
            // fields may hold stale values copied at a split
            None => {
                self.windings.set(0);
                self.other_windings.set(0);
            }
        }
    }

    /// Whether the segment appears in the result of `op`, by comparing the
    /// fill state directly below and above the segment.
    pub fn in_result(&self, op: Operation, fill_rule: FillRule) -> u8 {
        let mut lower = self.windings.get();
        let mut lower_other = self.other_windings.get();
        let mut upper = lower + self.self_windings.get();
        let mut upper_other = lower_other + self.other_self_windings.get();
        if self.clipping {
            std::mem::swap(&mut lower, &mut lower_other);
            std::mem::swap(&mut upper, &mut upper_other);
        }
        let fills = |w: i32| fill_rule.fills(w);

        if self.open.get() {
            // open contours exist only on the subject
            let keep = match op {
                Operation::Settle | Operation::Union | Operation::Divide => true,
                Operation::Intersection => fills(lower_other) || fills(upper_other),
                Operation::Difference | Operation::Xor => {
                    !fills(lower_other) || !fills(upper_other)
                }
            };
            return u8::from(keep);
        }

        let (below, above) = match op {
            Operation::Settle => (fills(lower), fills(upper)),
            Operation::Intersection => (
                fills(lower) && fills(lower_other),
                fills(upper) && fills(upper_other),
            ),
            Operation::Union => (
                fills(lower) || fills(lower_other),
                fills(upper) || fills(upper_other),
            ),
            Operation::Difference => (
                fills(lower) && !fills(lower_other),
                fills(upper) && !fills(upper_other),
            ),
            Operation::Xor => (
                fills(lower) != fills(lower_other),
                fills(upper) != fills(upper_other),
            ),
            Operation::Divide => {
                let below = fills(lower);
                let above = fills(upper);
                return if below && above {
                    2
                } else if below || above {
                    1
                } else {
                    0
                };
            }
        };

        u8::from(below != above)
    }

    /// Evaluate the selection table and store the result on both endpoints.
    pub fn apply_result(&self, op: Operation, fill_rule: FillRule) {
        let r = self.in_result(op, fill_rule);
        self.in_result.set(r);
        self.other().in_result.set(r);
    }
}

fn swap_cells<T: Copy>(a: &Cell<T>, b: &Cell<T>) {
    let t = a.get();
    a.set(b.get());
    b.set(t);
}

impl fmt::Debug for SweepEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let input = if self.clipping { "Q" } else { "P" };
        let arrow = if self.left.get() { "→" } else { "←" };
        let other = self
            .other
            .borrow()
            .upgrade()
            .map(|o| o.point.get().to_string())
            .unwrap_or_else(|| "?".into());
        write!(
            f,
            "{}-{}({}{}{})",
            input,
            self.segment,
            self.point.get(),
            arrow,
            other
        )
    }
}

// The queue ordering: smaller x first, then smaller y, right endpoints before
// left endpoints at the same position, then the lower tangent first (which
// secures CCW orientation of the output). Reversed because the standard
// binary heap is a max-heap.
impl Ord for SweepEvent {
    fn cmp(&self, b: &Self) -> Ordering {
        b.compare_h(self)
    }
}

impl PartialOrd for SweepEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SweepEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SweepEvent {}

impl SweepEvent {
    /// The queue comparator, in natural (unreversed) direction.
    pub fn compare_h(&self, b: &SweepEvent) -> Ordering {
        let pa = self.point.get();
        let pb = b.point.get();
        if pa.x != pb.x {
            return pa.x.partial_cmp(&pb.x).unwrap_or(Ordering::Equal);
        }
        if pa.y != pb.y {
            return pa.y.partial_cmp(&pb.y).unwrap_or(Ordering::Equal);
        }
        match (self.left.get(), b.left.get()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => self.compare_tangents(b),
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn make_pair(
        left: (f64, f64),
        right: (f64, f64),
        clipping: bool,
        segment: usize,
    ) -> (Rc<SweepEvent>, Rc<SweepEvent>) {
        let lp = Point::new(left.0, left.1);
        let rp = Point::new(right.0, right.1);
        let vertical = lp.x == rp.x;
        let a = SweepEvent::new(lp, clipping, false, false, segment, true, true, vertical);
        let b = SweepEvent::new(rp, clipping, false, false, segment, false, true, vertical);
        a.set_other(&b);
        b.set_other(&a);
        (a, b)
    }

    #[test]
    fn right_events_pop_before_left_events() {
        let (l1, _r1) = make_pair((0.0, 0.0), (1.0, 0.0), false, 0);
        let (_l2, r2) = make_pair((-1.0, 0.0), (0.0, 0.0), false, 1);
        // at (0,0): r2 is a right event, l1 a left event
        assert_eq!(r2.compare_h(&l1), Ordering::Less);
        // reversed heap order makes the right event the max
        assert_eq!(r2.cmp(&l1), Ordering::Greater);
    }

    #[test]
    fn queue_sorts_by_x_then_y() {
        let (a, _a) = make_pair((0.0, 0.0), (1.0, 0.0), false, 0);
        let (b, _b) = make_pair((0.0, 1.0), (1.0, 1.0), false, 1);
        let (c, _c) = make_pair((1.0, -5.0), (2.0, 0.0), false, 2);
        assert_eq!(a.compare_h(&b), Ordering::Less);
        assert_eq!(b.compare_h(&c), Ordering::Less);
    }

    #[test]
    fn lower_tangent_first_at_shared_origin() {
        let (low, _low) = make_pair((0.0, 0.0), (2.0, 0.5), false, 0);
        let (high, _high) = make_pair((0.0, 0.0), (2.0, 2.0), false, 1);
        assert_eq!(low.compare_h(&high), Ordering::Less);
        assert_eq!(high.compare_h(&low), Ordering::Greater);
    }

    #[test]
    fn split_keeps_pair_links_symmetric() {
        let (a, b) = make_pair((0.0, 0.0), (2.0, 2.0), false, 0);
        let (r, l) = a.split_at(Point::new(1.0, 1.0));
        for ev in [&a, &b, &r, &l] {
            assert!(Rc::ptr_eq(&ev.other().other(), ev));
        }
        assert_eq!(a.other().point.get(), Point::new(1.0, 1.0));
        assert_eq!(l.other().point.get(), Point::new(2.0, 2.0));
        assert!(!r.left.get());
        assert!(l.left.get());
    }

    #[test]
    fn selection_table_settle_keeps_boundary() {
        let (a, _b) = make_pair((0.0, 0.0), (1.0, 0.0), false, 0);
        a.compute_windings(None);
        assert_eq!(a.in_result(Operation::Settle, FillRule::NonZero), 1);
        // buried inside an extra winding of fill nothing changes across it
        a.windings.set(1);
        assert_eq!(a.in_result(Operation::Settle, FillRule::NonZero), 0);
        // but under even-odd it still flips parity
        assert_eq!(a.in_result(Operation::Settle, FillRule::EvenOdd), 1);
    }

    #[test]
    fn selection_table_divide_counts_sides() {
        let (a, _b) = make_pair((0.0, 0.0), (1.0, 0.0), false, 0);
        a.compute_windings(None);
        a.windings.set(1); // filled below and, via the self winding, above
        assert_eq!(a.in_result(Operation::Divide, FillRule::NonZero), 2);
        a.windings.set(0);
        assert_eq!(a.in_result(Operation::Divide, FillRule::NonZero), 1);
    }
}
