// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! DE-9IM spatial relation between two paths.
//!
//! A thinner sweep reuses the queue, status, intersection and winding
//! machinery of the boolean driver but performs no snap rounding, break-up or
//! reconstruction. It batches simultaneous right events per position and
//! derives the relation bits from the fill state of both inputs directly
//! below and above each segment, plus the explicit endpoint coincidences.

use std::collections::BinaryHeap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;

use itertools::Itertools;

use crate::error::BooleanOpError;
use crate::init_events::add_path_endpoints;
use crate::path::Path;
use crate::point::Point;
use crate::possible_intersection::add_intersections;
use crate::status::SweepStatus;
use crate::sweep_event::SweepEvent;

/// The DE-9IM relation of two paths, one bit per interior/boundary pairing.
/// `EE` (exterior meets exterior) is always true and carries no bit.
///
/// Note the conventions of this library: `contains` does not require interior
/// containment of the boundary (covers semantics), `touches` means meeting
/// without interior overlap, and `overlaps` ignores dimensionality (equal
/// shapes do not overlap, crossing lines do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relation(u8);

impl Relation {
    /// interior(p) intersects interior(q)
    pub const II: Relation = Relation(0x01);
    /// interior(p) intersects boundary(q)
    pub const IB: Relation = Relation(0x02);
    /// interior(p) intersects exterior(q)
    pub const IE: Relation = Relation(0x04);
    /// boundary(p) intersects interior(q)
    pub const BI: Relation = Relation(0x08);
    /// boundary(p) intersects boundary(q)
    pub const BB: Relation = Relation(0x10);
    /// boundary(p) intersects exterior(q)
    pub const BE: Relation = Relation(0x20);
    /// exterior(p) intersects interior(q)
    pub const EI: Relation = Relation(0x40);
    /// exterior(p) intersects boundary(q)
    pub const EB: Relation = Relation(0x80);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// No point in common.
    pub fn disjoint(self) -> bool {
        self.0 & 0x1b == 0
    }

    /// At least one point in common: touch, overlap, containment or equality.
    pub fn intersects(self) -> bool {
        self.0 & 0x1b != 0
    }

    /// The shapes cover the same set of points.
    pub fn equals(self) -> bool {
        self.0 & 0xe5 == 0x01
    }

    /// The boundaries meet but the interiors stay apart.
    pub fn touches(self) -> bool {
        self.0 & 0x01 == 0 && self.0 & 0x1a != 0
    }

    /// Every point of the other shape lies inside or on this one (covers).
    pub fn contains(self) -> bool {
        self.0 & 0x1b != 0 && self.0 & 0xc0 == 0
    }

    /// `contains` with the shapes swapped (covered-by).
    pub fn within(self) -> bool {
        self.0 & 0x1b != 0 && self.0 & 0x24 == 0
    }

    /// Some but not all points in common.
    pub fn overlaps(self) -> bool {
        self.0 & 0x45 == 0x45
    }
}

impl BitOr for Relation {
    type Output = Relation;
    fn bitor(self, rhs: Relation) -> Relation {
        Relation(self.0 | rhs.0)
    }
}

impl BitOrAssign for Relation {
    fn bitor_assign(&mut self, rhs: Relation) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Relation {
    /// The matrix in row-major order `II IB IE / BI BB BE / EI EB EE`, `T`
    /// for intersecting pairs, with `EE` always `T`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..8 {
            f.write_str(if self.0 >> i & 1 != 0 { "T" } else { "F" })?;
        }
        f.write_str("T")
    }
}

impl Path {
    /// The DE-9IM relation between this path and `q`, along with all their
    /// intersection points sorted left to right, then bottom to top.
    pub fn relate(&self, q: &Path) -> Result<(Relation, Vec<Point>), BooleanOpError> {
        relate_paths(self, q, true)
    }

    /// All intersection points of this path with `q`, tangent or secant.
    /// Partially coincident paths intersect at the start and end of the
    /// shared part; equal paths have no intersections.
    pub fn intersections(&self, q: &Path) -> Result<Vec<Point>, BooleanOpError> {
        Ok(relate_paths(self, q, true)?.1)
    }

    /// True if the paths share at least one point.
    pub fn intersects(&self, q: &Path) -> Result<bool, BooleanOpError> {
        Ok(relate_paths(self, q, false)?.0.intersects())
    }

    /// True if the paths touch along the boundary without overlapping interiors.
    pub fn touches(&self, q: &Path) -> Result<bool, BooleanOpError> {
        Ok(relate_paths(self, q, false)?.0.touches())
    }

    /// True if the interiors share at least one point without the shapes
    /// being equal or contained in one another.
    pub fn overlaps(&self, q: &Path) -> Result<bool, BooleanOpError> {
        Ok(relate_paths(self, q, false)?.0.overlaps())
    }

    /// True if `q` lies inside or on this path (covers semantics: equal
    /// shapes contain each other).
    pub fn contains(&self, q: &Path) -> Result<bool, BooleanOpError> {
        Ok(relate_paths(self, q, false)?.0.contains())
    }

    /// True if this path lies inside or on `q`.
    pub fn within(&self, q: &Path) -> Result<bool, BooleanOpError> {
        Ok(relate_paths(self, q, false)?.0.within())
    }
}

/// Classify the relation at one event. For a left event the batched right
/// events at the same position contribute boundary crossings; for a right
/// event the left endpoint is inspected, overlapping segments of the batch
/// are folded into it, and the fill state on both sides updates the matrix.
fn event_relation(
    rel: &mut Relation,
    zs: &mut Vec<Point>,
    event: &Rc<SweepEvent>,
    rights: &[Rc<SweepEvent>],
) {
    if event.left.get() {
        // right events ending here do not appear in the status or in
        // event.prev; their crossings are recorded explicitly
        for right in rights {
            if right.clipping == event.clipping {
                continue;
            }
            let (p, q) = subject_first(event, right);
            *rel |= boundary_bits(
                p.open.get(),
                p.end.get(),
                q.open.get(),
                q.end.get(),
            );
            if (!right.other().overlapped.get() || right.end.get())
                && zs.last() != Some(&event.point.get())
            {
                // endpoint intersections of non-overlapped segments
                zs.push(event.point.get());
            }
        }
        return;
    }

    let event = event.other();
    if event.overlapped.get() {
        return;
    }

    let mut has_subject = !event.clipping;
    let mut has_clipping = event.clipping;
    for right in rights.iter().rev() {
        if right.other().point.get() != event.point.get() {
            break;
        }

        let other = right.other();
        if event.clipping == other.clipping {
            event
                .self_windings
                .set(event.self_windings.get() + other.self_windings.get());
            event
                .other_self_windings
                .set(event.other_self_windings.get() + other.other_self_windings.get());
        } else {
            event
                .self_windings
                .set(event.self_windings.get() + other.other_self_windings.get());
            event
                .other_self_windings
                .set(event.other_self_windings.get() + other.self_windings.get());

            let (p, q) = subject_first(&event, &other);
            let p_end = p.end.get() || p.other().end.get();
            let q_end = q.end.get() || q.other().end.get();
            if p.open.get() && q.open.get() {
                *rel |= Relation::II;
                if p_end && q_end {
                    *rel |= Relation::BB;
                } else if p_end {
                    *rel |= Relation::BI;
                } else if q_end {
                    *rel |= Relation::IB;
                }
            } else if p.open.get() {
                *rel |= Relation::IB;
                if p_end {
                    *rel |= Relation::BB;
                }
            } else if q.open.get() {
                *rel |= Relation::BI;
                if q_end {
                    *rel |= Relation::BB;
                }
            } else {
                *rel |= Relation::BB;
            }
        }
        other.set_prev(event.prev().as_ref());
        other.overlapped.set(true);
        has_subject |= !other.clipping;
        has_clipping |= other.clipping;
    }
    if has_subject && has_clipping {
        event.overlapped.set(true);
    }

    // endpoint coincidences with the segment below, left-to-left or
    // right-to-right; checked at the right event since overlaps may not have
    // been detected earlier
    if !event.overlapped.get() {
        if let Some(prev) = event.prev() {
            if event.clipping != prev.clipping {
                let equal_start = event.point.get() == prev.point.get();
                if equal_start || event.other().point.get() == prev.other().point.get() {
                    let (mut p, mut q) = subject_first(&event, &prev);
                    let mut e = event.clone();
                    if !equal_start {
                        p = p.other();
                        q = q.other();
                        e = event.other();
                    }
                    *rel |= boundary_bits(
                        p.open.get(),
                        p.end.get(),
                        q.open.get(),
                        q.end.get(),
                    );

                    let pt = e.point.get();
                    let mut index = zs.len();
                    while index > 0
                        && (pt.x < zs[index - 1].x
                            || pt.x == zs[index - 1].x && pt.y <= zs[index - 1].y)
                    {
                        index -= 1;
                    }
                    if index == zs.len() || zs[index] != pt {
                        zs.insert(index, pt);
                    }
                }
            }
        }
    }

    let mut p_below = event.windings.get() != 0;
    let mut p_above = event.windings.get() + event.self_windings.get() != 0;
    let mut q_below = event.other_windings.get() != 0;
    let mut q_above = event.other_windings.get() + event.other_self_windings.get() != 0;
    if event.clipping {
        std::mem::swap(&mut p_below, &mut q_below);
        std::mem::swap(&mut p_above, &mut q_above);
    }

    if event.open.get() {
        if !event.clipping && !has_clipping && q_below == q_above {
            *rel |= if q_below { Relation::II } else { Relation::IE };
        } else if event.clipping && !has_subject && p_below == p_above {
            *rel |= if p_below { Relation::II } else { Relation::EI };
        }
    } else {
        if p_below && q_below || p_above && q_above {
            *rel |= Relation::II;
        }
        if p_below && !q_below || p_above && !q_above {
            *rel |= Relation::IE;
        }
        if !p_below && q_below || !p_above && q_above {
            *rel |= Relation::EI;
        }
        if p_below == p_above && !has_subject {
            *rel |= if p_below { Relation::IB } else { Relation::EB };
        }
        if q_below == q_above && !has_clipping {
            *rel |= if q_below { Relation::BI } else { Relation::BE };
        }
    }
}

/// Order an event pair as (subject, clipping).
fn subject_first(a: &Rc<SweepEvent>, b: &Rc<SweepEvent>) -> (Rc<SweepEvent>, Rc<SweepEvent>) {
    if a.clipping {
        (b.clone(), a.clone())
    } else {
        (a.clone(), b.clone())
    }
}

/// The matrix bits of a boundary crossing between a subject endpoint and a
/// clipping endpoint, refined by which side is an open contour and whether
/// the endpoint is terminal.
fn boundary_bits(p_open: bool, p_end: bool, q_open: bool, q_end: bool) -> Relation {
    if p_open && q_open {
        if p_end && q_end {
            Relation::BB
        } else if p_end {
            Relation::BI
        } else if q_end {
            Relation::IB
        } else {
            Relation::II
        }
    } else if p_open {
        if p_end {
            Relation::BB
        } else {
            Relation::IB
        }
    } else if q_open {
        if q_end {
            Relation::BB
        } else {
            Relation::BI
        }
    } else {
        Relation::BB
    }
}

/// Only the last right event of each group of overlapping segments (same
/// left endpoint) is classified, receiving all preceding rights of the
/// position as its batch.
fn flush_rights(rel: &mut Relation, zs: &mut Vec<Point>, rights: &[Rc<SweepEvent>]) {
    let groups = rights
        .iter()
        .enumerate()
        .group_by(|(_, r)| r.other().point.get());
    for (_, group) in &groups {
        if let Some((i, right)) = group.last() {
            event_relation(rel, zs, right, &rights[..i]);
        }
    }
}

pub(crate) fn relate_paths(
    p: &Path,
    q: &Path,
    collect: bool,
) -> Result<(Relation, Vec<Point>), BooleanOpError> {
    p.ensure_finite()?;
    q.ensure_finite()?;
    if p.has_curves() || q.has_curves() {
        return Err(BooleanOpError::UnsupportedCurve);
    }

    let ps = p.split();
    let qs = q.split();
    if ps.is_empty() || qs.is_empty() {
        return Ok((Relation::default(), Vec::new()));
    }

    let mut events: Vec<Rc<SweepEvent>> = Vec::new();
    let mut seg = 0;
    for sp in &ps {
        seg = add_path_endpoints(&mut events, sp, seg, false)?;
    }
    let mut seg = 0;
    for sq in &qs {
        seg = add_path_endpoints(&mut events, sq, seg, true)?;
    }

    let mut queue: BinaryHeap<Rc<SweepEvent>> = BinaryHeap::from(events);
    let mut status = SweepStatus::new();
    let mut rel = Relation::default();
    let mut zs: Vec<Point> = Vec::new();

    // right events at the current position; processing is delayed until the
    // position moves on or a left event actually pops, since a left event may
    // still break an overlapping segment of the batch
    let mut rights: Vec<Rc<SweepEvent>> = Vec::new();
    let mut processed_rights = false;
    // popped events stay referenced until the sweep is done
    let mut done: Vec<Rc<SweepEvent>> = Vec::new();

    loop {
        let Some(event) = queue.peek().cloned() else {
            break;
        };

        if !rights.is_empty() && rights[0].point.get() != event.point.get() {
            if !processed_rights {
                flush_rights(&mut rel, &mut zs, &rights);
            }
            rights.clear();
        }

        if !event.left.get() {
            queue.pop();
            done.push(event.clone());

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

            let prev = status.prev(nid);
            let next = status.next(nid);
            if let (Some(pv), Some(nx)) = (prev, next) {
                let (pe, ne) = (status.event(pv), status.event(nx));
                add_intersections(&mut queue, Some(event.point.get()), &pe, &ne)?;
            }
            status.remove(nid);

            rights.push(event);
            processed_rights = false;
        } else {
            let (prev, next) = status.find_prev_next(&event);
            if let Some(pv) = prev {
                let pe = status.event(pv);
                add_intersections(&mut queue, None, &pe, &event)?;
            }
            if let Some(nx) = next {
                let ne = status.event(nx);
                add_intersections(&mut queue, None, &event, &ne)?;
            }
            if !queue.peek().is_some_and(|t| Rc::ptr_eq(t, &event)) {
                // queue order changed by a split
                continue;
            }
            if !processed_rights {
                flush_rights(&mut rel, &mut zs, &rights);
                processed_rights = true;
            }
            queue.pop();
            done.push(event.clone());

            status.insert_after(prev, &event);

            let prev_event = prev.map(|pv| status.event(pv));
            event.compute_windings(prev_event.as_ref());

            event_relation(&mut rel, &mut zs, &event, &rights);
        }
    }
    if !processed_rights {
        flush_rights(&mut rel, &mut zs, &rights);
    }
    drop(done);
    status.clear();

    if !collect {
        return Ok((rel, Vec::new()));
    }
    Ok((rel, zs))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relation_string_is_row_major_with_ee_true() {
        assert_eq!(Relation::default().to_string(), "FFFFFFFFT");
        assert_eq!((Relation::II | Relation::BB).to_string(), "TFFFTFFFT");
        let all = Relation(0xff);
        assert_eq!(all.to_string(), "TTTTTTTTT");
    }

    #[test]
    fn predicate_masks() {
        let equal = Relation::II | Relation::BB;
        assert!(equal.equals());
        assert!(equal.contains());
        assert!(equal.within());
        assert!(!equal.overlaps());
        assert!(!equal.touches());
        assert!(equal.intersects());

        let touching = Relation::BB | Relation::IE | Relation::EI | Relation::BE | Relation::EB;
        assert!(touching.touches());
        assert!(!touching.equals());
        assert!(!touching.contains());

        let overlapping = Relation::II
            | Relation::IB
            | Relation::IE
            | Relation::BI
            | Relation::BB
            | Relation::BE
            | Relation::EI
            | Relation::EB;
        assert!(overlapping.overlaps());
        assert!(!overlapping.contains());

        let disjoint = Relation::IE | Relation::EI | Relation::BE | Relation::EB;
        assert!(disjoint.disjoint());
        assert!(!disjoint.intersects());
    }
}
