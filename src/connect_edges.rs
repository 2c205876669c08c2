// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Reconstructing the result contours from the swept, snapped events.
//!
//! The squares are walked in sweep order. Every selected left endpoint not
//! yet consumed starts a contour; at each shared vertex the next segment is
//! the first selected one clockwise from the arriving segment, which
//! separates the result into the smallest possible sub-contours. Hole
//! contours are recognised by the winding parity of the segment below their
//! first event, reversed to clockwise and appended to their filling ring.

use std::rc::Rc;

use crate::error::BooleanOpError;
use crate::path::Path;
use crate::snap_round::ToleranceSquares;
use crate::sweep_event::SweepEvent;
use crate::Operation;

pub(crate) fn connect_edges(
    squares: &ToleranceSquares,
    op: Operation,
) -> Result<Vec<Path>, BooleanOpError> {
    let mut rs: Vec<Path> = Vec::new();
    let mut ropen: Option<Path> = None;

    for sq in squares.iter() {
        for start in &sq.events {
            if !start.left.get() || start.in_result.get() == 0 {
                continue;
            }

            let mut cur = start.clone();
            // an open part may chain into another one found in this square
            loop {
                // windings outside the new contour, taken from the first
                // predecessor that made it into the result
                let mut windings = 0;
                let mut index = rs.len() + 1;
                if op != Operation::Divide {
                    let mut prev = cur.prev();
                    while let Some(p) = prev.clone() {
                        if p.index.get() != 0 {
                            break;
                        }
                        prev = p.prev();
                    }
                    if let Some(p) = prev {
                        windings = p.result_windings.get();
                        if windings % 2 != 0 {
                            // odd: the contour sits inside a filling ring
                            index = p.index.get();
                        }
                    }
                }

                let first = cur.clone();
                let mut r = Path::new();
                r.move_to(cur.point.get().x, cur.point.get().y);
                cur.index.set(index);
                cur.result_windings.set(windings);
                if !first.open.get() {
                    cur.result_windings.set(windings + 1);
                }

                loop {
                    let other = cur.other();
                    let nodes = &squares.square(other.square.get()).events;
                    let i0 = nodes
                        .iter()
                        .position(|e| Rc::ptr_eq(e, &other))
                        .ok_or(BooleanOpError::InternalInconsistency(
                            "endpoint missing from its tolerance square",
                        ))?;

                    // pick the next segment clockwise from the arriving one
                    let mut next: Option<Rc<SweepEvent>> = None;
                    let len = nodes.len();
                    let mut i = (i0 + len - 1) % len;
                    while i != i0 {
                        let cand = &nodes[i];
                        if cand.in_result.get() > 0 && cand.open.get() == first.open.get() {
                            next = Some(cand.clone());
                            break;
                        }
                        i = (i + len - 1) % len;
                    }

                    let Some(next) = next else {
                        if first.open.get() {
                            let o = other.point.get();
                            r.line_to(o.x, o.y);
                            break;
                        }
                        return Err(BooleanOpError::InternalInconsistency(
                            "closed contour has no continuation",
                        ));
                    };
                    if Rc::ptr_eq(&next, &first) {
                        // the contour returned to its start
                        first.open.set(false);
                        break;
                    }

                    cur = next;
                    r.line_to(cur.point.get().x, cur.point.get().y);
                    if cur.left.get() {
                        cur.in_result.set(cur.in_result.get().saturating_sub(1));
                        cur.index.set(index);
                        cur.result_windings
                            .set(windings + i32::from(!first.open.get()));
                    } else {
                        let left = cur.other();
                        left.in_result.set(left.in_result.get().saturating_sub(1));
                        left.index.set(index);
                        left.result_windings.set(windings);
                    }
                }
                first.in_result.set(first.in_result.get().saturating_sub(1));

                if first.open.get() {
                    if let Some(part) = ropen.take() {
                        // two open parts meet: travel one backwards into the other
                        let mut merged = r.reverse();
                        merged.append_skip_move(&part);
                        rs.push(merged);
                        break;
                    } else if let Some(cur2) = sq
                        .events
                        .iter()
                        .find(|e| e.in_result.get() > 0 && e.open.get())
                    {
                        ropen = Some(r);
                        cur = cur2.clone();
                        continue;
                    } else {
                        rs.push(r);
                        break;
                    }
                } else {
                    r.close();
                    if windings % 2 != 0 {
                        // orient the hole clockwise, group it with its ring
                        let hole = r.reverse();
                        rs.get_mut(index - 1)
                            .ok_or(BooleanOpError::InternalInconsistency(
                                "hole without a filling ring",
                            ))?
                            .append(&hole);
                    } else {
                        rs.push(r);
                    }
                    break;
                }
            }
        }
    }

    Ok(rs)
}
