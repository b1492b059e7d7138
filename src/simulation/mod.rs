pub mod states;
pub mod params;
pub mod quadrant;
pub mod forces;
pub mod barnes_hut;
pub mod integrator;
pub mod comm;
pub mod engine;
pub mod scenario;
