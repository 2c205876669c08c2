// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tolerance squares and the break-up of segments crossing them.
//!
//! A tolerance square is an axis-aligned square of grid spacing side length
//! centred on a snap-grid point. It is inclusive of its left and bottom edge
//! but owns only the bottom-left corner. All events landing in a square are
//! collapsed onto the centre; segments passing through a hot square are
//! broken up at the centre first, so no segment ever passes close by an
//! output vertex without sharing it.

use std::rc::Rc;

use crate::point::{snap, Point};
use crate::status::SweepStatus;
use crate::sweep_event::SweepEvent;

pub(crate) struct ToleranceSquare {
    /// Snapped column.
    pub x: f64,
    /// Snapped row centre.
    pub y: f64,
    /// All endpoints whose snapped position lands here.
    pub events: Vec<Rc<SweepEvent>>,

    /// Reference node inside or near the square; after break-up this is the
    /// first node completely below the square.
    pub node: Option<usize>,

    /// Range of status nodes crossing the square.
    pub lower: Option<usize>,
    pub upper: Option<usize>,
}

/// All squares of the sweep so far, ordered by column then row.
#[derive(Default)]
pub(crate) struct ToleranceSquares {
    squares: Vec<ToleranceSquare>,
}

/// The y values of a segment at the two tolerance edges `x_left`/`x_right`,
/// or at its endpoints where those come first.
pub(crate) fn tolerance_edge_y(ev: &Rc<SweepEvent>, x_left: f64, x_right: f64) -> (f64, f64) {
    let s = if ev.left.get() { ev.clone() } else { ev.other() };
    let p = s.point.get();
    let o = s.other().point.get();
    let y0 = if p.x < x_left {
        s.interpolate_y(x_left)
    } else {
        p.y
    };
    let y1 = if x_right <= o.x {
        s.interpolate_y(x_right)
    } else {
        o.y
    };
    (y0, y1)
}

impl ToleranceSquares {
    pub fn new() -> Self {
        ToleranceSquares::default()
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn square(&self, i: usize) -> &ToleranceSquare {
        &self.squares[i]
    }

    pub fn square_mut(&mut self, i: usize) -> &mut ToleranceSquare {
        &mut self.squares[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToleranceSquare> {
        self.squares.iter()
    }

    /// Index of the square at or above `(x, y)`; the flag tells whether the
    /// square exists or has to be inserted at that index. Only the tail of
    /// the list belongs to the current column, so the scan runs backwards.
    fn find(&self, x: f64, y: f64) -> (usize, bool) {
        for i in (0..self.squares.len()).rev() {
            let sq = &self.squares[i];
            if sq.x < x || sq.y < y {
                return (i + 1, false);
            }
            if sq.y == y {
                return (i, true);
            }
        }
        (0, false)
    }

    /// Register an event in the square of its snapped position. `ref_node` is
    /// the event's own node for left events; for right events the node below
    /// the removed one (or the one above if none). Squares still referring to
    /// the node about to be removed are re-pointed.
    pub fn add(&mut self, x: f64, event: &Rc<SweepEvent>, ref_node: Option<usize>, eps: f64) {
        let y = snap(event.point.get().y, eps);
        match self.find(x, y) {
            (idx, true) => {
                self.squares[idx].node = ref_node;
                self.squares[idx].events.push(event.clone());
            }
            (idx, false) => {
                self.squares.insert(
                    idx,
                    ToleranceSquare {
                        x,
                        y,
                        events: vec![event.clone()],
                        node: ref_node,
                        lower: None,
                        upper: None,
                    },
                );
            }
        }

        // (nearly) vertical segments may be the reference for surrounding
        // squares; re-point those at the replacement node
        if !event.left.get() {
            let orig = event.other().node.get();
            if orig.is_some() {
                for i in (0..self.squares.len()).rev() {
                    if self.squares[i].x != x {
                        break;
                    }
                    if self.squares[i].node == orig {
                        self.squares[i].node = ref_node;
                    }
                }
            }
        }
    }

    /// Break one segment at `(x, y)` into the events of square `index`,
    /// unless it already starts or ends there. The status node migrates to
    /// the piece extending right. Returns the left endpoint of that piece.
    fn breakup_segment(
        &mut self,
        event: &Rc<SweepEvent>,
        index: usize,
        x: f64,
        y: f64,
        status: &mut SweepStatus,
        eps: f64,
    ) -> Rc<SweepEvent> {
        let p = event.point.get();
        let o = event.other().point.get();
        if (snap(p.x, eps) == x && snap(p.y, eps) == y)
            || (snap(o.x, eps) == x && snap(o.y, eps) == y)
        {
            return event.clone();
        }

        // the original record stays in place to not disturb queue or status
        let (right, left) = event.split_at(Point::new(x, y));
        right.square.set(index);
        left.square.set(index);

        if let Some(nid) = event.node.get() {
            event.node.set(None);
            status.set_event(nid, &left);
        }

        self.squares[index].events.push(right);
        self.squares[index].events.push(left.clone());
        left
    }

    /// Find and break up every segment crossing a tolerance square of the
    /// current column (squares `n..`), bottom to top. Upwards-sloped
    /// segments are found through the status range of each square, segments
    /// ending inside a square are cascaded through the stack of squares they
    /// came through.
    pub fn breakup_crossing_segments(
        &mut self,
        n: usize,
        x: f64,
        status: &mut SweepStatus,
        eps: f64,
    ) {
        let x0 = x - eps / 2.0;
        let x1 = x + eps / 2.0;

        for i in n..self.squares.len() {
            let y_top = self.squares[i].y + eps / 2.0;
            let y_bottom = self.squares[i].y - eps / 2.0;

            // the range is re-derived each pass; a column re-entry may have
            // removed nodes a previous pass had found
            self.squares[i].lower = None;
            self.squares[i].upper = None;

            // from the reference node, locate the lower/upper nodes crossing
            // this square; the reference may sit inside, below or above
            if let Some(start) = self.squares[i].node {
                let (y0, y1) = tolerance_edge_y(&status.event(start), x0, x1);
                let below = y0 < y_bottom && y1 <= y_bottom;
                let above = y_top <= y0 && y_top <= y1;
                if !below && !above {
                    self.squares[i].lower = Some(start);
                    self.squares[i].upper = Some(start);
                }

                if !above {
                    let mut next = status.next(start);
                    while let Some(nx) = next {
                        let (y0, y1) = tolerance_edge_y(&status.event(nx), x0, x1);
                        if y_top <= y0 && y_top <= y1 {
                            break;
                        }
                        if y0 < y_bottom && y1 <= y_bottom {
                            self.squares[i].node = Some(nx);
                            next = status.next(nx);
                            continue;
                        }
                        self.squares[i].upper = Some(nx);
                        if self.squares[i].lower.is_none() {
                            // reference node was below the square
                            self.squares[i].lower = Some(nx);
                        }
                        next = status.next(nx);
                    }
                }

                if !below {
                    let from = self.squares[i].node.unwrap();
                    let mut prev = status.prev(from);
                    while let Some(pv) = prev {
                        let (y0, y1) = tolerance_edge_y(&status.event(pv), x0, x1);
                        if y0 < y_bottom && y1 <= y_bottom {
                            // exclusive of the bottom-right corner
                            break;
                        }
                        if y_top <= y0 && y_top <= y1 {
                            prev = status.prev(pv);
                            continue;
                        }
                        self.squares[i].lower = Some(pv);
                        if self.squares[i].upper.is_none() {
                            // reference node was above the square
                            self.squares[i].upper = Some(pv);
                        }
                        prev = status.prev(pv);
                    }
                    self.squares[i].node = prev;
                }
            }

            // segments extending right are in the status range
            if let Some(lower) = self.squares[i].lower {
                let upper = self.squares[i].upper;
                let y = self.squares[i].y;
                let mut node = Some(lower);
                while let Some(cur) = node {
                    let ev = status.event(cur);
                    self.breakup_segment(&ev, i, x, y, status, eps);
                    if Some(cur) == upper {
                        break;
                    }
                    node = status.next(cur);
                }
            }

            // segments ending in this square that pass through other squares
            // of the stack are cascaded, lowest (or highest) square first
            for k in 0..self.squares[i].events.len() {
                let event = self.squares[i].events[k].clone();
                if event.left.get() {
                    continue;
                }
                let (y0, _) = tolerance_edge_y(&event, x0, x1);
                let mut s = event.other();
                if y0 < y_bottom {
                    // comes from below: find the lowest square it crosses
                    let mut j0 = i;
                    for j in (0..i).rev() {
                        if self.squares[j].x != x || self.squares[j].y + eps / 2.0 <= y0 {
                            break;
                        }
                        j0 = j;
                    }
                    for j in j0..i {
                        let y = self.squares[j].y;
                        s = self.breakup_segment(&s, j, x, y, status, eps);
                    }
                } else if y_top <= y0 {
                    // comes from above: find the highest square it crosses
                    let mut j0 = i;
                    for j in i + 1..self.squares.len() {
                        if y0 < self.squares[j].y - eps / 2.0 {
                            break;
                        }
                        j0 = j;
                    }
                    for j in (i + 1..=j0).rev() {
                        let y = self.squares[j].y;
                        s = self.breakup_segment(&s, j, x, y, status, eps);
                    }
                }
            }
        }
    }

    /// Snap every event of the current column onto its square centre. Marks
    /// pieces turned vertical (reversing those now upside down) and deletes
    /// segments collapsed to a point.
    pub fn snap_column(&mut self, n: usize, x: f64, eps: f64) {
        for j in n..self.squares.len() {
            let y = self.squares[j].y;
            let events = std::mem::take(&mut self.squares[j].events);
            let mut kept = Vec::with_capacity(events.len());
            for event in &events {
                event.square.set(j);
                event.point.set(Point::new(x, y));

                let other = event.other().point.get().gridsnap(eps);
                if event.point.get() == other {
                    // collapsed to a point
                    continue;
                }
                if x == other.x {
                    // became vertical through snapping or break-up
                    event.vertical.set(true);
                    event.other().vertical.set(true);
                    if !event.left.get() && event.point.get().y < other.y {
                        // now sloping downwards, reverse
                        event.reverse();
                    }
                }
                kept.push(event.clone());
            }
            self.squares[j].events = kept;
        }
    }
}
