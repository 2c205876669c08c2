// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Flat command-stream representation of vector paths.
//!
//! The overlay core consumes paths made of `MoveTo`/`LineTo`/`Close` only;
//! curved commands are accepted by `ray_intersections` and rejected with
//! [`BooleanOpError::UnsupportedCurve`](crate::BooleanOpError) everywhere else.

use crate::error::BooleanOpError;
use crate::point::Point;

/// One command of a path.
///
/// `Close` carries its target point, which must coincide with the start of
/// the subpath it terminates. `ArcTo` is an SVG-style elliptical arc with
/// `rot` in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubeTo(Point, Point, Point),
    ArcTo {
        rx: f64,
        ry: f64,
        rot: f64,
        large: bool,
        sweep: bool,
        to: Point,
    },
    Close(Point),
}

impl PathCmd {
    /// The point the pen is at after this command.
    pub fn end(&self) -> Point {
        match *self {
            PathCmd::MoveTo(p)
            | PathCmd::LineTo(p)
            | PathCmd::QuadTo(_, p)
            | PathCmd::CubeTo(_, _, p)
            | PathCmd::ArcTo { to: p, .. }
            | PathCmd::Close(p) => p,
        }
    }

    fn is_curve(&self) -> bool {
        matches!(
            self,
            PathCmd::QuadTo(..) | PathCmd::CubeTo(..) | PathCmd::ArcTo { .. }
        )
    }

    fn for_each_point(&self, f: &mut impl FnMut(Point)) {
        match *self {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) | PathCmd::Close(p) => f(p),
            PathCmd::QuadTo(c, p) => {
                f(c);
                f(p);
            }
            PathCmd::CubeTo(c1, c2, p) => {
                f(c1);
                f(c2);
                f(p);
            }
            PathCmd::ArcTo { to, .. } => f(to),
        }
    }
}

/// A sequence of path commands, possibly holding several subpaths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    cmds: Vec<PathCmd>,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    pub fn cmds(&self) -> &[PathCmd] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.cmds.push(PathCmd::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.cmds.push(PathCmd::LineTo(Point::new(x, y)));
        self
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.cmds
            .push(PathCmd::QuadTo(Point::new(cx, cy), Point::new(x, y)));
        self
    }

    pub fn cube_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> &mut Self {
        self.cmds.push(PathCmd::CubeTo(
            Point::new(c1x, c1y),
            Point::new(c2x, c2y),
            Point::new(x, y),
        ));
        self
    }

    pub fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        rot: f64,
        large: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) -> &mut Self {
        self.cmds.push(PathCmd::ArcTo {
            rx,
            ry,
            rot,
            large,
            sweep,
            to: Point::new(x, y),
        });
        self
    }

    /// Close the current subpath back to its starting point.
    pub fn close(&mut self) -> &mut Self {
        let start = self.subpath_start().unwrap_or_default();
        self.cmds.push(PathCmd::Close(start));
        self
    }

    /// Push a raw command, bypassing the builder's bookkeeping.
    #[cfg(test)]
    pub(crate) fn push_cmd(&mut self, cmd: PathCmd) {
        self.cmds.push(cmd);
    }

    /// Start of the subpath currently being built.
    fn subpath_start(&self) -> Option<Point> {
        self.cmds.iter().rev().find_map(|cmd| match cmd {
            PathCmd::MoveTo(p) => Some(*p),
            _ => None,
        })
    }

    /// True if the last subpath ends with a close command.
    pub fn is_closed(&self) -> bool {
        matches!(self.cmds.last(), Some(PathCmd::Close(_)))
    }

    /// True if any command is a curve.
    pub(crate) fn has_curves(&self) -> bool {
        self.cmds.iter().any(|cmd| cmd.is_curve())
    }

    /// Split the path into its subpaths, one `MoveTo`-led path each.
    pub fn split(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        let mut cur = Path::new();
        let mut pen = Point::default();
        for cmd in &self.cmds {
            match cmd {
                PathCmd::MoveTo(p) => {
                    if cur.cmds.len() > 1 {
                        paths.push(std::mem::take(&mut cur));
                    } else {
                        cur.cmds.clear();
                    }
                    cur.cmds.push(PathCmd::MoveTo(*p));
                }
                _ => {
                    if cur.cmds.is_empty() {
                        // a path not starting with a move starts at the pen
                        cur.cmds.push(PathCmd::MoveTo(pen));
                    }
                    cur.cmds.push(*cmd);
                }
            }
            pen = cmd.end();
        }
        if cur.cmds.len() > 1 {
            paths.push(cur);
        }
        paths
    }

    /// Append all commands of `other` to this path.
    pub fn append(&mut self, other: &Path) -> &mut Self {
        self.cmds.extend_from_slice(&other.cmds);
        self
    }

    /// Append `other` continuing the current subpath, dropping its leading move.
    pub(crate) fn append_skip_move(&mut self, other: &Path) {
        let skip = usize::from(matches!(other.cmds.first(), Some(PathCmd::MoveTo(_))));
        self.cmds.extend_from_slice(&other.cmds[skip..]);
    }

    /// Concatenate several paths into one.
    pub fn merge(paths: Vec<Path>) -> Path {
        let mut out = Path::new();
        for p in paths {
            out.cmds.extend(p.cmds);
        }
        out
    }

    /// The same path travelled in the opposite direction.
    pub fn reverse(&self) -> Path {
        let mut out = Path::new();
        for sub in self.split() {
            let closed = sub.is_closed();
            let n = sub.cmds.len();
            let end = if closed { n - 1 } else { n };
            let points: Vec<Point> = sub.cmds[..end].iter().map(|c| c.end()).collect();
            let last = *points.last().unwrap();
            out.cmds.push(PathCmd::MoveTo(last));
            // walk commands backwards, each reversed command ends at the
            // start point of the original one
            for i in (1..end).rev() {
                let to = points[i - 1];
                match sub.cmds[i] {
                    // a close before the end acts as a line back to the start
                    PathCmd::LineTo(_) | PathCmd::Close(_) => out.cmds.push(PathCmd::LineTo(to)),
                    PathCmd::QuadTo(c, _) => out.cmds.push(PathCmd::QuadTo(c, to)),
                    PathCmd::CubeTo(c1, c2, _) => out.cmds.push(PathCmd::CubeTo(c2, c1, to)),
                    PathCmd::ArcTo {
                        rx,
                        ry,
                        rot,
                        large,
                        sweep,
                        ..
                    } => out.cmds.push(PathCmd::ArcTo {
                        rx,
                        ry,
                        rot,
                        large,
                        sweep: !sweep,
                        to,
                    }),
                    PathCmd::MoveTo(_) => unreachable!("split yields one move per subpath"),
                }
            }
            if closed {
                out.cmds.push(PathCmd::Close(last));
            }
        }
        out
    }

    /// Shoelace area of the path, treating curved segments as straight
    /// chords. Positive for counter-clockwise contours.
    pub fn signed_area(&self) -> f64 {
        let mut area = 0.0;
        let mut start = Point::default();
        let mut pen = Point::default();
        for cmd in &self.cmds {
            let end = cmd.end();
            match cmd {
                PathCmd::MoveTo(_) => {
                    // implicitly close a preceding open subpath
                    if pen != start {
                        area += pen.cross(start);
                    }
                    start = end;
                }
                PathCmd::Close(_) => {
                    area += pen.cross(start);
                    pen = start;
                    continue;
                }
                _ => area += pen.cross(end),
            }
            pen = end;
        }
        if pen != start {
            area += pen.cross(start);
        }
        area / 2.0
    }

    /// Reject NaN or infinite coordinates before the sweep touches anything.
    pub(crate) fn ensure_finite(&self) -> Result<(), BooleanOpError> {
        let mut ok = true;
        for cmd in &self.cmds {
            cmd.for_each_point(&mut |p| ok &= p.is_finite());
        }
        if ok {
            Ok(())
        } else {
            Err(BooleanOpError::InvalidInput("NaN or infinite coordinate"))
        }
    }
}
