//! Force evaluation for the n-body engine
//!
//! Defines the softened pairwise Newtonian law (`Gravity`) and the
//! `ForceEvaluator` trait with two implementations: an exact direct sum
//! and the Barnes–Hut quadtree walk

use crate::simulation::barnes_hut::QuadTree;
use crate::simulation::states::{Body, NVec2};

/// Gravitational constant used when none is configured.
pub const DEFAULT_G: f64 = 0.0001;

/// Separation below which the force stops growing.
pub const DEFAULT_R_LIMIT: f64 = 0.03;

/// Newtonian gravity with a hard softening floor
///
/// The force on a body of mass `m1` at `x1` from a mass `m2` at `x2` is,
/// per axis, `G * m1 * m2 * d_axis / max(|x2 - x1|, r_limit)^3`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub g: f64,       // gravitational constant
    pub r_limit: f64, // softening floor on the separation
}

impl Default for Gravity {
    fn default() -> Self {
        Self {
            g: DEFAULT_G,
            r_limit: DEFAULT_R_LIMIT,
        }
    }
}

impl Gravity {
    /// Attractive force felt by `(m1, x1)` towards `(m2, x2)`
    pub fn pairwise(&self, m1: f64, x1: &NVec2, m2: f64, x2: &NVec2) -> NVec2 {
        // r points from the body feeling the force to the other one
        let r = x2 - x1;
        let dist = (r.x * r.x + r.y * r.y).sqrt();
        let d = if dist < self.r_limit { self.r_limit } else { dist };
        let d3 = d * d * d;

        NVec2::new(
            (self.g * m1 * m2 * r.x) / d3,
            (self.g * m1 * m2 * r.y) / d3,
        )
    }
}

/// Anything that can produce the net force on a single body
pub trait ForceEvaluator {
    fn force_on(&self, target: &Body) -> NVec2;
}

/// Exact O(n^2) reference: sums the pairwise law over every other active body
pub struct DirectSum<'a> {
    pub bodies: &'a [Body],
    pub gravity: Gravity,
}

impl ForceEvaluator for DirectSum<'_> {
    fn force_on(&self, target: &Body) -> NVec2 {
        self.bodies
            .iter()
            .filter(|b| b.is_active() && b.id != target.id)
            .fold(NVec2::zeros(), |acc, b| {
                acc + self.gravity.pairwise(target.m, &target.x, b.m, &b.x)
            })
    }
}

/// Barnes–Hut evaluation against a tree built for the current step
/// `theta` trades accuracy for speed, `0` walks every leaf
pub struct BarnesHut<'a> {
    pub tree: &'a QuadTree,
    pub gravity: Gravity,
    pub theta: f64,
}

impl ForceEvaluator for BarnesHut<'_> {
    fn force_on(&self, target: &Body) -> NVec2 {
        self.tree.force_on(target, &self.gravity, self.theta)
    }
}
