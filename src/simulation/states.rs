//! Core state types for the N-body simulation.
//!
//! - `Body`   one point mass, identified by its stable `id`
//! - `System` the authoritative ordered body array plus simulation time `t`
//!
//! Exclusion from the physics is carried by `BodyStatus` rather than by a
//! magic mass value; the `-1` mass only appears at the file boundary.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

/// Mass written to / read from body files for an excluded body.
pub const EXCLUDED_MASS: f64 = -1.0;

/// Whether a body still takes part in tree insertion and force evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStatus {
    Active,
    /// Permanently removed from the physics for the rest of the run.
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: usize, // stable index into the global body array
    pub x: NVec2,  // position
    pub v: NVec2,  // velocity
    pub m: f64,    // mass
    pub status: BodyStatus,
}

impl Body {
    pub fn new(id: usize, x: NVec2, v: NVec2, m: f64) -> Self {
        Self {
            id,
            x,
            v,
            m,
            status: BodyStatus::Active,
        }
    }

    /// True while the body may be inserted into a tree and have forces applied.
    pub fn is_active(&self) -> bool {
        self.status == BodyStatus::Active && self.m > 0.0
    }

    /// Exclude the body for good. There is no way back to `Active`.
    pub fn exclude(&mut self) {
        self.status = BodyStatus::Excluded;
    }

    pub fn is_excluded(&self) -> bool {
        self.status == BodyStatus::Excluded
    }

    /// Mass as it is written to a body file.
    pub fn file_mass(&self) -> f64 {
        match self.status {
            BodyStatus::Active => self.m,
            BodyStatus::Excluded => EXCLUDED_MASS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub bodies: Vec<Body>, // ordered by id
    pub t: f64,            // time
}

impl System {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn active_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_active()).count()
    }
}
