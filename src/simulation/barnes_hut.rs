//! # Barnes–Hut Quadtree (2D)
//!
//! This module implements a **2D Barnes–Hut quadtree** for approximating the
//! gravitational force on each body of an `N`-body system. It replaces the
//! naive `O(N²)` all-pairs sum with an approximate `O(N log N)` walk.
//!
//! ## Core Concepts
//!
//! - The simulation domain is recursively subdivided into 4 quadrants.
//! - Each quadrant that received a body becomes a node of the tree; empty
//!   quadrants are never allocated.
//! - A node holds nothing, exactly one body, or an *aggregate* point mass
//!   (total mass at the centre of mass) summarising everything below it.
//! - The aggregate is updated incrementally on every insertion, so the tree
//!   is ready for force queries as soon as the last body went in. There is
//!   no bottom-up pass.
//!
//! ## Exclusion
//!
//! Inserting a body with non-positive mass, or one lying outside the root
//! quadrant, is refused and the body is marked [`BodyStatus::Excluded`] in
//! place. Exclusion is permanent: an excluded body is refused by every later
//! tree and skipped by force evaluation and integration.
//!
//! ## Depth floor
//!
//! Two bodies at the same position can never be separated by splitting.
//! Nodes at [`MAX_DEPTH`] therefore stop subdividing and keep their bodies
//! in a flat list (a *cluster*), still summarised by an aggregate.
//!
//! [`BodyStatus::Excluded`]: crate::simulation::states::BodyStatus::Excluded

use std::fmt::{self, Write};

use crate::simulation::forces::Gravity;
use crate::simulation::quadrant::{ChildSlot, Quadrant};
use crate::simulation::states::{Body, NVec2};

/// Depth at which nodes stop subdividing.
pub const MAX_DEPTH: u32 = 48;

/// Synthetic body summarising a subtree: total mass at the centre of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMass {
    pub x: NVec2,
    pub m: f64,
}

impl PointMass {
    fn of(body: &Body) -> Self {
        Self { x: body.x, m: body.m }
    }

    /// Fold one more body into the aggregate.
    ///
    /// `m' = m + m_new`, `x' = (x * m + x_new * m_new) / m'`, same for y.
    fn absorb(&mut self, body: &Body) {
        let m = self.m + body.m;
        let x = (self.x.x * self.m + body.x.x * body.m) / m;
        let y = (self.x.y * self.m + body.x.y * body.m) / m;
        self.x = NVec2::new(x, y);
        self.m = m;
    }
}

/// Why a body was refused by [`QuadTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The body was excluded by an earlier tree.
    AlreadyExcluded,
    /// Mass is zero, negative or NaN.
    NonPositiveMass,
    /// Position lies outside the node's quadrant.
    OutOfBounds,
}

/// Outcome of a single insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Placed,
    Rejected(Rejection),
}

/// What a node currently holds.
///
/// `Single` owns a copy of the inserted body. `Internal` and `Cluster` own
/// an aggregate instead of a body, so they carry no body identity.
#[derive(Debug)]
enum Contents {
    Empty,
    Single(Body),
    Internal {
        aggregate: PointMass,
        children: [Option<Box<QuadTree>>; 4], // indexed by `ChildSlot`
    },
    Cluster {
        aggregate: PointMass,
        members: Vec<Body>,
    },
}

/// A quadtree node together with everything below it.
///
/// The root is simply a node at depth 0 covering the whole domain; dropping
/// it tears down the entire tree.
#[derive(Debug)]
pub struct QuadTree {
    quadrant: Quadrant,
    depth: u32,
    count: usize,
    contents: Contents,
}

impl QuadTree {
    /// An empty root node covering `quadrant`.
    pub fn new(quadrant: Quadrant) -> Self {
        Self::with_depth(quadrant, 0)
    }

    fn with_depth(quadrant: Quadrant, depth: u32) -> Self {
        Self {
            quadrant,
            depth,
            count: 0,
            contents: Contents::Empty,
        }
    }

    /// Build a quadtree over `domain` from every body in `bodies`.
    ///
    /// Bodies are inserted in slice order. Rejected bodies are marked
    /// excluded in place, see [`QuadTree::build_with`] to observe them.
    pub fn build(domain: Quadrant, bodies: &mut [Body]) -> Self {
        Self::build_with(domain, bodies, |_, _| {})
    }

    /// Build a quadtree and report every refused body.
    ///
    /// # Parameters
    /// - `domain`    : Root quadrant; bodies outside it are excluded.
    /// - `bodies`    : The full body array. Only the `status` of refused
    ///                 bodies is modified.
    /// - `on_reject` : Called once per refused body, after it was marked
    ///                 excluded, with the reason.
    ///
    /// # Returns
    /// The finished tree, aggregates included.
    pub fn build_with<F>(domain: Quadrant, bodies: &mut [Body], mut on_reject: F) -> Self
    where
        F: FnMut(&Body, Rejection),
    {
        let mut tree = Self::new(domain);
        for body in bodies.iter_mut() {
            if let Insertion::Rejected(reason) = tree.insert(body) {
                on_reject(body, reason);
            }
        }
        tree
    }

    /// Insert one body below this node.
    ///
    /// - Empty node: the body becomes the node's sole content.
    /// - Single-body node: the resident body is pushed down into its child
    ///   quadrant, the node switches to an aggregate of the resident, and the
    ///   new body is then inserted as for an internal node.
    /// - Internal node: the body is routed into exactly one child (created
    ///   on demand) and folded into this node's aggregate.
    ///
    /// The body count grows by one on every accepted insertion.
    ///
    /// # Parameters
    /// - `body`: Body to insert. A copy is stored in the tree; the original
    ///   is only touched when it is refused, in which case it is excluded.
    ///
    /// # Returns
    /// [`Insertion::Placed`] or the [`Rejection`] reason.
    pub fn insert(&mut self, body: &mut Body) -> Insertion {
        let rejection = if body.is_excluded() {
            Some(Rejection::AlreadyExcluded)
        } else if !(body.m > 0.0) {
            Some(Rejection::NonPositiveMass)
        } else if !self.quadrant.contains(&body.x) {
            Some(Rejection::OutOfBounds)
        } else {
            None
        };

        if let Some(reason) = rejection {
            body.exclude();
            return Insertion::Rejected(reason);
        }

        self.place(*body);
        Insertion::Placed
    }

    /// Compute the force exerted on `target` by everything in this subtree.
    ///
    /// - Empty node: no contribution.
    /// - Single body: exact pairwise force, or nothing if the body *is* the
    ///   target (matched by `id`).
    /// - Internal node: with `s` the side of this node's quadrant and `d` the
    ///   distance from the target to the aggregate, the whole subtree is
    ///   treated as one point mass when `s / d < theta`. Otherwise every
    ///   present child is visited (bottom-left, bottom-right, top-left,
    ///   top-right) and the results summed.
    ///
    /// `theta = 0` never accepts an aggregate and yields the exact sum.
    ///
    /// # Parameters
    /// - `target` : Body feeling the force. It does not need to be in the tree.
    /// - `gravity`: Force law.
    /// - `theta`  : Opening threshold.
    ///
    /// # Returns
    /// The net force vector on `target`.
    pub fn force_on(&self, target: &Body, gravity: &Gravity, theta: f64) -> NVec2 {
        match &self.contents {
            Contents::Empty => NVec2::zeros(),
            Contents::Single(body) => {
                if body.id == target.id {
                    return NVec2::zeros(); // no self-force
                }
                gravity.pairwise(target.m, &target.x, body.m, &body.x)
            }
            Contents::Internal {
                aggregate,
                children,
            } => {
                if self.far_enough(aggregate, target, theta) {
                    return gravity.pairwise(target.m, &target.x, aggregate.m, &aggregate.x);
                }
                children.iter().flatten().fold(NVec2::zeros(), |acc, child| {
                    acc + child.force_on(target, gravity, theta)
                })
            }
            Contents::Cluster { aggregate, members } => {
                if self.far_enough(aggregate, target, theta) {
                    return gravity.pairwise(target.m, &target.x, aggregate.m, &aggregate.x);
                }
                members
                    .iter()
                    .filter(|b| b.id != target.id)
                    .fold(NVec2::zeros(), |acc, b| {
                        acc + gravity.pairwise(target.m, &target.x, b.m, &b.x)
                    })
            }
        }
    }

    /// Number of bodies inserted below (and including) this node.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn quadrant(&self) -> &Quadrant {
        &self.quadrant
    }

    /// Total mass held by this subtree, 0 when empty.
    pub fn total_mass(&self) -> f64 {
        match &self.contents {
            Contents::Empty => 0.0,
            Contents::Single(body) => body.m,
            Contents::Internal { aggregate, .. } | Contents::Cluster { aggregate, .. } => {
                aggregate.m
            }
        }
    }

    /// Mass-weighted centroid of this subtree, `None` when empty.
    pub fn center_of_mass(&self) -> Option<NVec2> {
        match &self.contents {
            Contents::Empty => None,
            Contents::Single(body) => Some(body.x),
            Contents::Internal { aggregate, .. } | Contents::Cluster { aggregate, .. } => {
                Some(aggregate.x)
            }
        }
    }

    /// Child node in `slot`, if one was ever created.
    pub fn child(&self, slot: ChildSlot) -> Option<&QuadTree> {
        match &self.contents {
            Contents::Internal { children, .. } => children[slot.index()].as_deref(),
            _ => None,
        }
    }

    /// Number of children present (0 for leaves and clusters).
    pub fn child_count(&self) -> usize {
        match &self.contents {
            Contents::Internal { children, .. } => children.iter().flatten().count(),
            _ => 0,
        }
    }

    /// True for a depth-floor node holding several bodies in a flat list.
    pub fn is_cluster(&self) -> bool {
        matches!(self.contents, Contents::Cluster { .. })
    }

    /// Deepest node depth in this subtree (the root is depth 0).
    pub fn max_depth(&self) -> u32 {
        match &self.contents {
            Contents::Internal { children, .. } => children
                .iter()
                .flatten()
                .map(|c| c.max_depth())
                .max()
                .unwrap_or(self.depth),
            _ => self.depth,
        }
    }

    /// Number of allocated nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        match &self.contents {
            Contents::Internal { children, .. } => {
                1 + children.iter().flatten().map(|c| c.node_count()).sum::<usize>()
            }
            _ => 1,
        }
    }

    /// Indented one-line-per-node rendering of the occupied nodes.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.dump_into(&mut out, 0);
        out
    }

    // helpers ==============================================================================

    /// Place an already validated body. The caller guarantees the body lies
    /// inside this node's quadrant.
    fn place(&mut self, body: Body) {
        self.contents = match std::mem::replace(&mut self.contents, Contents::Empty) {
            Contents::Empty => Contents::Single(body),

            // cannot split any further: keep the bodies side by side
            Contents::Single(resident) if self.depth >= MAX_DEPTH => {
                let mut aggregate = PointMass::of(&resident);
                aggregate.absorb(&body);
                Contents::Cluster {
                    aggregate,
                    members: vec![resident, body],
                }
            }

            Contents::Single(resident) => {
                let mut children: [Option<Box<QuadTree>>; 4] = Default::default();
                self.push_down(&mut children, resident);
                let mut aggregate = PointMass::of(&resident);

                self.push_down(&mut children, body);
                aggregate.absorb(&body);
                Contents::Internal {
                    aggregate,
                    children,
                }
            }

            Contents::Internal {
                mut aggregate,
                mut children,
            } => {
                self.push_down(&mut children, body);
                aggregate.absorb(&body);
                Contents::Internal {
                    aggregate,
                    children,
                }
            }

            Contents::Cluster {
                mut aggregate,
                mut members,
            } => {
                members.push(body);
                aggregate.absorb(&body);
                Contents::Cluster { aggregate, members }
            }
        };
        self.count += 1;
    }

    /// Route `body` to the child quadrant containing it, creating the child
    /// node on first use.
    fn push_down(&self, children: &mut [Option<Box<QuadTree>>; 4], body: Body) {
        let slot = self.quadrant.child_for(&body.x);
        children[slot.index()]
            .get_or_insert_with(|| {
                Box::new(QuadTree::with_depth(self.quadrant.child(slot), self.depth + 1))
            })
            .place(body);
    }

    /// Multipole acceptance criterion: `side / distance < theta`.
    fn far_enough(&self, aggregate: &PointMass, target: &Body, theta: f64) -> bool {
        let s = self.quadrant.side();
        let r = aggregate.x - target.x;
        let d = (r.x * r.x + r.y * r.y).sqrt();
        s / d < theta
    }

    fn dump_into(&self, out: &mut String, level: usize) -> fmt::Result {
        if self.count == 0 {
            return Ok(());
        }
        for _ in 0..level {
            out.push_str("----");
        }
        match &self.contents {
            Contents::Empty => {}
            Contents::Single(body) => {
                writeln!(out, "{{ body: {}, bodies: {} }}", body.id, self.count)?;
            }
            Contents::Internal { children, .. } => {
                writeln!(out, "{{ aggregate, bodies: {} }}", self.count)?;
                for child in children.iter().flatten() {
                    child.dump_into(out, level + 1)?;
                }
            }
            Contents::Cluster { members, .. } => {
                let ids: Vec<String> = members.iter().map(|b| b.id.to_string()).collect();
                writeln!(out, "{{ cluster [{}], bodies: {} }}", ids.join(", "), self.count)?;
            }
        }
        Ok(())
    }
}
