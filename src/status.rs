// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The sweep status: an AVL tree over the active segments.
//!
//! Nodes live in a slab and are addressed by index, so every endpoint can
//! hold an O(1) back-reference to its node and neighbours are reachable in
//! amortized O(1) through parent links. Freed nodes are recycled through a
//! free list for the duration of a call. Insert/delete traffic dominates
//! lookups on overlay workloads, which is what this structure is tuned for.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::sweep_event::SweepEvent;

struct Node {
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    height: i32,
    event: Option<Rc<SweepEvent>>,
}

#[derive(Default)]
pub(crate) struct SweepStatus {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Option<usize>,
}

impl SweepStatus {
    pub fn new() -> Self {
        SweepStatus::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn event(&self, n: usize) -> Rc<SweepEvent> {
        self.nodes[n]
            .event
            .clone()
            .expect("status node without event")
    }

    /// True if the node currently carries exactly this event. Guards against
    /// stale node references after slab recycling.
    pub fn holds(&self, n: usize, event: &Rc<SweepEvent>) -> bool {
        self.nodes[n]
            .event
            .as_ref()
            .is_some_and(|e| Rc::ptr_eq(e, event))
    }

    /// Re-point a node at a different event, fixing the back-reference.
    pub fn set_event(&mut self, n: usize, event: &Rc<SweepEvent>) {
        self.nodes[n].event = Some(event.clone());
        event.node.set(Some(n));
    }

    fn new_node(&mut self, item: &Rc<SweepEvent>) -> usize {
        let node = Node {
            parent: None,
            left: None,
            right: None,
            height: 1,
            event: Some(item.clone()),
        };
        let n = match self.free.pop() {
            Some(n) => {
                self.nodes[n] = node;
                n
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        item.node.set(Some(n));
        n
    }

    fn return_node(&mut self, n: usize) {
        if let Some(event) = self.nodes[n].event.take() {
            event.node.set(None);
        }
        self.free.push(n);
    }

    pub fn first(&self) -> Option<usize> {
        let mut n = self.root?;
        while let Some(l) = self.nodes[n].left {
            n = l;
        }
        Some(n)
    }

    pub fn last(&self) -> Option<usize> {
        let mut n = self.root?;
        while let Some(r) = self.nodes[n].right {
            n = r;
        }
        Some(n)
    }

    pub fn prev(&self, mut n: usize) -> Option<usize> {
        if let Some(l) = self.nodes[n].left {
            n = l;
            while let Some(r) = self.nodes[n].right {
                n = r;
            }
            return Some(n);
        }
        while let Some(p) = self.nodes[n].parent {
            if self.nodes[p].left != Some(n) {
                return Some(p);
            }
            n = p;
        }
        None
    }

    pub fn next(&self, mut n: usize) -> Option<usize> {
        if let Some(r) = self.nodes[n].right {
            n = r;
            while let Some(l) = self.nodes[n].left {
                n = l;
            }
            return Some(n);
        }
        while let Some(p) = self.nodes[n].parent {
            if self.nodes[p].right != Some(n) {
                return Some(p);
            }
            n = p;
        }
        None
    }

    /// Walk down from the root; returns the last node on the search path and
    /// the direction the item would continue in (`Equal` for an exact match).
    fn locate(&self, item: &SweepEvent) -> Option<(usize, Ordering)> {
        let mut n = self.root?;
        loop {
            let cmp = item.compare_v(self.nodes[n].event.as_ref().unwrap());
            match cmp {
                Ordering::Less => match self.nodes[n].left {
                    Some(l) => n = l,
                    None => return Some((n, Ordering::Less)),
                },
                Ordering::Greater => match self.nodes[n].right {
                    Some(r) => n = r,
                    None => return Some((n, Ordering::Greater)),
                },
                Ordering::Equal => return Some((n, Ordering::Equal)),
            }
        }
    }

    /// The node holding a segment comparing equal to `item`, if any.
    pub fn find(&self, item: &SweepEvent) -> Option<usize> {
        match self.locate(item)? {
            (n, Ordering::Equal) => Some(n),
            _ => None,
        }
    }

    /// Neighbours the item would have if inserted now; for an exact match the
    /// match's own neighbours.
    pub fn find_prev_next(&self, item: &SweepEvent) -> (Option<usize>, Option<usize>) {
        match self.locate(item) {
            None => (None, None),
            Some((n, Ordering::Less)) => (self.prev(n), Some(n)),
            Some((n, Ordering::Greater)) => (Some(n), self.next(n)),
            Some((n, Ordering::Equal)) => (self.prev(n), self.next(n)),
        }
    }

    /// Insert by comparison. An equal item replaces the event in place.
    pub fn insert(&mut self, item: &Rc<SweepEvent>) -> usize {
        let Some((n, cmp)) = self.locate(item) else {
            let root = self.new_node(item);
            self.root = Some(root);
            return root;
        };

        let rebalance;
        let cur;
        match cmp {
            Ordering::Less => {
                let l = self.new_node(item);
                self.nodes[n].left = Some(l);
                self.nodes[l].parent = Some(n);
                rebalance = self.nodes[n].right.is_none();
                cur = l;
            }
            Ordering::Greater => {
                let r = self.new_node(item);
                self.nodes[n].right = Some(r);
                self.nodes[r].parent = Some(n);
                rebalance = self.nodes[n].left.is_none();
                cur = r;
            }
            Ordering::Equal => {
                if let Some(old) = self.nodes[n].event.take() {
                    old.node.set(None);
                }
                self.set_event(n, item);
                return n;
            }
        }

        if rebalance {
            if let Some(p) = self.nodes[n].parent {
                self.nodes[n].height += 1;
                self.rebalance(p);
            }
        }
        cur
    }

    /// Insert directly after `after` (`None` inserts as the left-most node).
    pub fn insert_after(&mut self, after: Option<usize>, item: &Rc<SweepEvent>) -> usize {
        let rebalance;
        let (n, cur) = match after {
            None => {
                let Some(root) = self.root else {
                    let root = self.new_node(item);
                    self.root = Some(root);
                    return root;
                };
                let mut n = root;
                while let Some(l) = self.nodes[n].left {
                    n = l;
                }
                let l = self.new_node(item);
                self.nodes[n].left = Some(l);
                self.nodes[l].parent = Some(n);
                rebalance = self.nodes[n].right.is_none();
                (n, l)
            }
            Some(mut n) => {
                if self.nodes[n].right.is_none() {
                    let r = self.new_node(item);
                    self.nodes[n].right = Some(r);
                    self.nodes[r].parent = Some(n);
                    rebalance = self.nodes[n].left.is_none();
                    (n, r)
                } else {
                    n = self.nodes[n].right.unwrap();
                    while let Some(l) = self.nodes[n].left {
                        n = l;
                    }
                    let l = self.new_node(item);
                    self.nodes[n].left = Some(l);
                    self.nodes[l].parent = Some(n);
                    rebalance = self.nodes[n].right.is_none();
                    (n, l)
                }
            }
        };

        if rebalance {
            if let Some(p) = self.nodes[n].parent {
                self.nodes[n].height += 1;
                self.rebalance(p);
            }
        }
        cur
    }

    pub fn remove(&mut self, n: usize) {
        let mut ancestor = self.nodes[n].parent;
        let (left, right) = (self.nodes[n].left, self.nodes[n].right);
        if left.is_none() || right.is_none() {
            let child = left.or(right);
            match self.nodes[n].parent {
                Some(p) => self.swap_child(p, n, child),
                None => self.root = child,
            }
            if let Some(c) = child {
                self.nodes[c].parent = self.nodes[n].parent;
            }
        } else {
            // replace by the in-order successor
            let mut succ = right.unwrap();
            while let Some(l) = self.nodes[succ].left {
                succ = l;
            }
            ancestor = self.nodes[succ].parent;
            if ancestor == Some(n) {
                ancestor = Some(succ);
            }
            let succ_parent = self.nodes[succ].parent.unwrap();
            let succ_right = self.nodes[succ].right;
            self.swap_child(succ_parent, succ, succ_right);

            self.nodes[succ].parent = self.nodes[n].parent;
            self.nodes[succ].left = self.nodes[n].left;
            self.nodes[succ].right = self.nodes[n].right;
            match self.nodes[n].parent {
                Some(p) => self.swap_child(p, n, Some(succ)),
                None => self.root = Some(succ),
            }
            if let Some(l) = self.nodes[succ].left {
                self.nodes[l].parent = Some(succ);
            }
            if let Some(r) = self.nodes[succ].right {
                self.nodes[r].parent = Some(succ);
            }
        }

        while let Some(a) = ancestor {
            self.rebalance(a);
            ancestor = self.nodes[a].parent;
        }
        self.return_node(n);
    }

    /// Release every node without touching the events beyond clearing their
    /// back-references.
    pub fn clear(&mut self) {
        let mut n = self.first();
        while let Some(cur) = n {
            n = self.next(cur);
            self.return_node(cur);
        }
        self.root = None;
    }

    fn balance(&self, n: usize) -> i32 {
        let mut r = 0;
        if let Some(l) = self.nodes[n].left {
            r -= self.nodes[l].height;
        }
        if let Some(right) = self.nodes[n].right {
            r += self.nodes[right].height;
        }
        r
    }

    fn update_height(&mut self, n: usize) {
        let mut h = 0;
        if let Some(l) = self.nodes[n].left {
            h = self.nodes[l].height;
        }
        if let Some(r) = self.nodes[n].right {
            h = h.max(self.nodes[r].height);
        }
        self.nodes[n].height = h + 1;
    }

    fn swap_child(&mut self, parent: usize, a: usize, b: Option<usize>) {
        if self.nodes[parent].right == Some(a) {
            self.nodes[parent].right = b;
        } else {
            self.nodes[parent].left = b;
        }
        if let Some(b) = b {
            self.nodes[b].parent = Some(parent);
        }
    }

    fn rotate_left(&mut self, a: usize) -> usize {
        let b = self.nodes[a].right.unwrap();
        match self.nodes[a].parent {
            Some(p) => self.swap_child(p, a, Some(b)),
            None => self.nodes[b].parent = None,
        }
        self.nodes[a].parent = Some(b);
        self.nodes[a].right = self.nodes[b].left;
        if let Some(r) = self.nodes[a].right {
            self.nodes[r].parent = Some(a);
        }
        self.nodes[b].left = Some(a);
        b
    }

    fn rotate_right(&mut self, a: usize) -> usize {
        let b = self.nodes[a].left.unwrap();
        match self.nodes[a].parent {
            Some(p) => self.swap_child(p, a, Some(b)),
            None => self.nodes[b].parent = None,
        }
        self.nodes[a].parent = Some(b);
        self.nodes[a].left = self.nodes[b].right;
        if let Some(l) = self.nodes[a].left {
            self.nodes[l].parent = Some(a);
        }
        self.nodes[b].right = Some(a);
        b
    }

    fn rebalance(&mut self, start: usize) {
        let mut n = start;
        loop {
            let oheight = self.nodes[n].height;
            let balance = self.balance(n);
            if balance == 2 {
                // right-heavy; a left-heavy right subtree is straightened
                // first so the rotation does not overshoot
                if let Some(r) = self.nodes[n].right {
                    if self.balance(r) < 0 {
                        let nr = self.rotate_right(r);
                        let demoted = self.nodes[nr].right.unwrap();
                        self.update_height(demoted);
                    }
                }
                n = self.rotate_left(n);
                let demoted = self.nodes[n].left.unwrap();
                self.update_height(demoted);
            } else if balance == -2 {
                if let Some(l) = self.nodes[n].left {
                    if self.balance(l) > 0 {
                        let nl = self.rotate_left(l);
                        let demoted = self.nodes[nl].left.unwrap();
                        self.update_height(demoted);
                    }
                }
                n = self.rotate_right(n);
                let demoted = self.nodes[n].right.unwrap();
                self.update_height(demoted);
            } else {
                debug_assert!((-2..=2).contains(&balance), "tree too far out of shape");
            }

            self.update_height(n);
            match self.nodes[n].parent {
                None => {
                    self.root = Some(n);
                    return;
                }
                Some(p) => {
                    if oheight == self.nodes[n].height {
                        return;
                    }
                    n = p;
                }
            }
        }
    }
}
