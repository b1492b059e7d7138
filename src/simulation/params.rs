//! Numerical and physical parameters for a run
//!
//! `Parameters` holds runtime settings:
//! - step count and fixed step size `dt`,
//! - the Barnes-Hut opening threshold `theta`,
//! - worker gang size,
//! - the force law (`G`, softening floor) and the fixed simulation domain

use crate::error::ConfigError;
use crate::simulation::forces::Gravity;
use crate::simulation::quadrant::Quadrant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub steps: usize,      // number of time steps
    pub theta: f64,        // acceptance threshold, 0 = exact
    pub dt: f64,           // step size
    pub workers: usize,    // gang size, rank 0 coordinates
    pub gravity: Gravity,  // force law
    pub domain: Quadrant,  // root cell of every tree
}

impl Parameters {
    /// Parameters with the default force law and domain.
    pub fn new(steps: usize, theta: f64, dt: f64, workers: usize) -> Self {
        Self {
            steps,
            theta,
            dt,
            workers,
            gravity: Gravity::default(),
            domain: Quadrant::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        if !(self.theta.is_finite() && self.theta >= 0.0) {
            return Err(ConfigError::InvalidTheta(self.theta));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.dt));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if !(self.gravity.g.is_finite() && self.gravity.g > 0.0) {
            return Err(ConfigError::InvalidGravity(self.gravity.g));
        }
        if !(self.gravity.r_limit.is_finite() && self.gravity.r_limit > 0.0) {
            return Err(ConfigError::InvalidSoftening(self.gravity.r_limit));
        }
        Ok(())
    }
}
