// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Vertical ordering of segments at the sweep line.
//!
//! This is the comparator keeping the sweep status sorted: segments compare
//! by their y at the current sweep x, ties fall back to the tangent
//! direction, and coinciding segments are ordered deterministically by input
//! origin and segment id.

use std::cmp::Ordering;

use crate::sweep_event::SweepEvent;

impl SweepEvent {
    /// Tie-break for segments that coincide point for point: the clipping
    /// input lies virtually on top of the subject, same-origin segments sort
    /// by segment id.
    fn compare_overlaps(&self, b: &SweepEvent) -> Ordering {
        if self.clipping != b.clipping {
            return if b.clipping {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        self.segment.cmp(&b.segment)
    }

    /// Compare two segments that coincide at this event's position, by their
    /// tangent direction. Both events are on the same side (left or right) of
    /// their segments; at right endpoints the comparison is mirrored.
    pub(crate) fn compare_tangents(&self, b: &SweepEvent) -> Ordering {
        let sign = |ord: Ordering| {
            if self.left.get() {
                ord
            } else {
                ord.reverse()
            }
        };

        if self.vertical.get() {
            if b.vertical.get() {
                let ay = self.point.get().y;
                let by = b.point.get().y;
                return if ay == by {
                    sign(self.compare_overlaps(b))
                } else if ay < by {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            // a vertical segment lies above anything sharing its lower endpoint
            return Ordering::Greater;
        } else if b.vertical.get() {
            return Ordering::Less;
        }

        let ao = self.other().point.get();
        let bo = b.other().point.get();
        if ao == bo {
            return sign(self.compare_overlaps(b));
        }

        // interpolate on the segment whose other endpoint reaches farther
        let left = self.left.get();
        if left && ao.x < bo.x || !left && bo.x < ao.x {
            let by = b.interpolate_y(ao.x);
            if ao.y == by {
                sign(self.compare_overlaps(b))
            } else if ao.y < by {
                sign(Ordering::Less)
            } else {
                sign(Ordering::Greater)
            }
        } else {
            let ay = self.interpolate_y(bo.x);
            if ay == bo.y {
                sign(self.compare_overlaps(b))
            } else if ay < bo.y {
                sign(Ordering::Less)
            } else {
                sign(Ordering::Greater)
            }
        }
    }

    /// Compare this event against a segment `b` whose left endpoint lies
    /// strictly to the left: `b` is evaluated at this event's x.
    fn compare_below(&self, b: &SweepEvent) -> Ordering {
        let by = b.interpolate_y(self.point.get().x);
        let ay = self.point.get().y;
        if ay == by {
            self.compare_tangents(b)
        } else if ay < by {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// The status ordering: y at the sweep line of the later of the two left
    /// endpoints, with tangent tie-breaks. `self` is the probe.
    pub(crate) fn compare_v(&self, b: &SweepEvent) -> Ordering {
        let pa = self.point.get();
        let pb = b.point.get();
        if pa.x == pb.x {
            if pa.y == pb.y {
                self.compare_tangents(b)
            } else if pa.y < pb.y {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        } else if pa.x < pb.x {
            b.compare_below(self).reverse()
        } else {
            self.compare_below(b)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sweep_event::test::make_pair;

    #[test]
    fn orders_by_y_at_sweep_line() {
        let (lower, _a) = make_pair((0.0, 1.0), (2.0, 1.0), false, 0);
        let (upper, _b) = make_pair((-1.0, 0.0), (2.0, 3.0), false, 1);
        // at x = 0 the second segment passes through y = 1.33
        assert_eq!(lower.compare_v(&upper), Ordering::Less);
        assert_eq!(upper.compare_v(&lower), Ordering::Greater);
    }

    #[test]
    fn shared_origin_falls_back_to_tangent() {
        let (flat, _a) = make_pair((0.0, 1.0), (3.0, 1.0), false, 0);
        let (steep, _b) = make_pair((0.0, 1.0), (3.0, 4.0), false, 1);
        assert_eq!(flat.compare_v(&steep), Ordering::Less);
        assert_eq!(steep.compare_v(&flat), Ordering::Greater);
    }

    #[test]
    fn vertical_sorts_above_shared_lower_endpoint() {
        let (vertical, _a) = make_pair((0.0, 0.0), (0.0, 1.0), false, 0);
        let (slanted, _b) = make_pair((0.0, 0.0), (1.0, 1.0), false, 1);
        assert_eq!(vertical.compare_v(&slanted), Ordering::Greater);
        assert_eq!(slanted.compare_v(&vertical), Ordering::Less);
    }

    #[test]
    fn coinciding_segments_order_clipping_on_top() {
        let (subject, _a) = make_pair((0.0, 0.0), (1.0, 1.0), false, 7);
        let (clipping, _b) = make_pair((0.0, 0.0), (1.0, 1.0), true, 3);
        assert_eq!(subject.compare_v(&clipping), Ordering::Less);
        assert_eq!(clipping.compare_v(&subject), Ordering::Greater);
    }

    #[test]
    fn coinciding_same_origin_orders_by_segment_id() {
        let (a, _a) = make_pair((0.0, 0.0), (1.0, 1.0), false, 1);
        let (b, _b) = make_pair((0.0, 0.0), (1.0, 1.0), false, 2);
        assert_eq!(a.compare_v(&b), Ordering::Less);
        assert_eq!(b.compare_v(&a), Ordering::Greater);
    }

    #[test]
    fn overlapping_with_different_reach_uses_interpolation() {
        let (short, _a) = make_pair((0.0, 0.0), (1.0, 1.0), false, 0);
        let (long, _b) = make_pair((0.0, 0.0), (2.0, 2.0), false, 1);
        // same line, short one first by id after the tangent tie
        assert_eq!(short.compare_v(&long), Ordering::Less);
    }
}
