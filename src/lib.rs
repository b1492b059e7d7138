pub mod error;
pub mod simulation;
pub mod configuration;
pub mod files;
pub mod benchmark;

pub use error::{CommError, ConfigError, SimError};

pub use simulation::states::{Body, BodyStatus, System, NVec2};
pub use simulation::quadrant::{ChildSlot, Quadrant};
pub use simulation::barnes_hut::{Insertion, QuadTree, Rejection};
pub use simulation::forces::{BarnesHut, DirectSum, ForceEvaluator, Gravity};
pub use simulation::integrator::integrate;
pub use simulation::params::Parameters;
pub use simulation::engine::{owned_indices, run};
pub use simulation::scenario::Scenario;

pub use configuration::config::{DomainConfig, PhysicsConfig, RunConfig};

pub use files::body_file::{load_bodies, read_bodies, save_bodies, write_bodies};

pub use benchmark::benchmark::{bench_gravity, bench_workers};
