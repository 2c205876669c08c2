// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turning subpaths into sweep events.

use std::rc::Rc;

use crate::error::BooleanOpError;
use crate::path::{Path, PathCmd};
use crate::sweep_event::SweepEvent;

/// Append the endpoint pairs of one subpath to the event list. `seg` numbers
/// segments consecutively across subpaths and is returned advanced. A close
/// command that is not at the end acts as a line back to the start; the
/// trailing close decides whether the contour is open.
pub(crate) fn add_path_endpoints(
    events: &mut Vec<Rc<SweepEvent>>,
    path: &Path,
    mut seg: usize,
    clipping: bool,
) -> Result<usize, BooleanOpError> {
    let cmds = path.cmds();
    if cmds.is_empty() {
        return Ok(seg);
    }

    let move_start = match cmds[0] {
        PathCmd::MoveTo(p) => p,
        _ => return Err(BooleanOpError::InvalidInput("subpath must start with a move")),
    };

    let mut open = !path.is_closed();
    if open && cmds.last().map(|c| c.end()) == Some(move_start) {
        // start and end coincide, consider the contour closed
        open = false;
    }

    let mut start = move_start;
    for (idx, cmd) in cmds.iter().enumerate().skip(1) {
        let end = match cmd {
            PathCmd::LineTo(p) => *p,
            PathCmd::Close(p) => {
                if *p != move_start {
                    return Err(BooleanOpError::InvalidInput(
                        "close target does not match subpath start",
                    ));
                }
                *p
            }
            PathCmd::MoveTo(_) => {
                return Err(BooleanOpError::InvalidInput("subpath contains a second move"))
            }
            _ => return Err(BooleanOpError::UnsupportedCurve),
        };
        seg += 1;

        if start == end {
            // zero-length segment
            continue;
        }

        let vertical = start.x == end.x;
        let increasing = if vertical {
            start.y < end.y
        } else {
            start.x < end.x
        };
        let a = SweepEvent::new(
            start,
            clipping,
            open,
            open && idx == 1,
            seg,
            increasing,
            increasing,
            vertical,
        );
        let b = SweepEvent::new(
            end,
            clipping,
            open,
            open && idx == cmds.len() - 1,
            seg,
            !increasing,
            increasing,
            vertical,
        );
        a.set_other(&b);
        b.set_other(&a);
        events.push(a);
        events.push(b);
        start = end;
    }
    Ok(seg)
}
