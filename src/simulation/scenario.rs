//! Build a fully-initialized simulation run from configuration
//!
//! Takes a `RunConfig` (YAML / CLI facing) and produces a `Scenario`:
//! - numerical parameters (`Parameters`), validated
//! - system state (`System` with the loaded bodies at t = 0)
//! - where to write the result
//!
//! Only the coordinator ever touches the files; workers receive their
//! copy of the bodies through the engine's broadcast

use std::path::PathBuf;

use log::info;

use crate::configuration::config::RunConfig;
use crate::error::Result;
use crate::files::body_file::{load_bodies, save_bodies};
use crate::simulation::engine;
use crate::simulation::params::Parameters;
use crate::simulation::states::System;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: Parameters,
    pub system: System,
    pub output: PathBuf,
}

impl Scenario {
    /// Validate the configuration and load the initial bodies.
    ///
    /// Parameters are checked before the input file is opened, so a bad
    /// run file never costs a file read.
    pub fn build_scenario(cfg: &RunConfig) -> Result<Self> {
        let parameters = cfg.parameters()?;
        let input = cfg.input()?;
        let output = cfg.output()?.to_path_buf();

        let bodies = load_bodies(input)?;
        info!("loaded {} bodies from {}", bodies.len(), input.display());

        Ok(Self {
            parameters,
            system: System::new(bodies),
            output,
        })
    }

    /// Run every step and return the final state without writing it.
    pub fn run(self) -> Result<System> {
        engine::run(self.system, &self.parameters)
    }

    /// Run every step and write the final state to `self.output`.
    pub fn run_and_save(self) -> Result<System> {
        let output = self.output.clone();
        let system = self.run()?;
        save_bodies(&output, &system.bodies)?;
        info!(
            "wrote {} bodies ({} still active) to {}",
            system.bodies.len(),
            system.active_count(),
            output.display()
        );
        Ok(system)
    }
}
