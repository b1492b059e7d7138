//! Configuration types for loading simulation runs from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! run. Every field is optional here so that command-line flags can fill in
//! or override any of them; [`RunConfig::parameters`] checks that the
//! result is complete and valid.
//!
//! - [`RunConfig`]     – top-level run file
//! - [`PhysicsConfig`] – force law constants
//! - [`DomainConfig`]  – fixed simulation region
//!
//! # YAML format
//!
//! ```yaml
//! input: two_body.txt       # body file, relative to the run file
//! output: two_body_out.txt  # written after the last step
//! steps: 100
//! theta: 0.5                # 0 = exact
//! dt: 0.005
//! workers: 4                # default 1
//!
//! physics:                  # optional
//!   G: 0.0001
//!   r_limit: 0.03
//!
//! domain:                   # optional, default [0, 4] x [0, 4]
//!   x_min: 0.0
//!   y_min: 0.0
//!   x_max: 4.0
//!   y_max: 4.0
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::simulation::forces::{Gravity, DEFAULT_G, DEFAULT_R_LIMIT};
use crate::simulation::params::Parameters;
use crate::simulation::quadrant::Quadrant;

/// Force law constants
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PhysicsConfig {
    #[serde(rename = "G", default = "default_g")]
    pub g: f64, // gravitational constant
    #[serde(default = "default_r_limit")]
    pub r_limit: f64, // softening floor
}

impl From<PhysicsConfig> for Gravity {
    fn from(cfg: PhysicsConfig) -> Self {
        Gravity {
            g: cfg.g,
            r_limit: cfg.r_limit,
        }
    }
}

fn default_g() -> f64 {
    DEFAULT_G
}

fn default_r_limit() -> f64 {
    DEFAULT_R_LIMIT
}

/// Simulation region; bodies leaving it are excluded
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// Top-level run configuration
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub input: Option<PathBuf>,  // initial body file
    pub output: Option<PathBuf>, // final body file
    pub steps: Option<usize>,
    pub theta: Option<f64>,
    pub dt: Option<f64>,
    pub workers: Option<usize>,
    pub physics: Option<PhysicsConfig>,
    pub domain: Option<DomainConfig>,
}

impl RunConfig {
    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Resolve relative `input` / `output` paths against `dir`.
    pub fn relative_to(mut self, dir: &Path) -> Self {
        let resolve = |p: Option<PathBuf>| p.map(|p| if p.is_relative() { dir.join(p) } else { p });
        self.input = resolve(self.input);
        self.output = resolve(self.output);
        self
    }

    /// Runtime parameters, checked.
    pub fn parameters(&self) -> Result<Parameters, ConfigError> {
        let steps = self.steps.ok_or(ConfigError::Missing("steps"))?;
        let theta = self.theta.ok_or(ConfigError::Missing("theta"))?;
        let dt = self.dt.ok_or(ConfigError::Missing("dt"))?;

        let mut params = Parameters::new(steps, theta, dt, self.workers.unwrap_or(1));
        if let Some(physics) = self.physics {
            params.gravity = physics.into();
        }
        if let Some(d) = self.domain {
            params.domain = Quadrant::new(d.x_min, d.y_min, d.x_max, d.y_max)?;
        }
        params.validate()?;
        Ok(params)
    }

    pub fn input(&self) -> Result<&Path, ConfigError> {
        self.input.as_deref().ok_or(ConfigError::Missing("input file"))
    }

    pub fn output(&self) -> Result<&Path, ConfigError> {
        self.output.as_deref().ok_or(ConfigError::Missing("output file"))
    }
}
