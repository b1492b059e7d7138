//! Fixed-step time integration for a single body
//!
//! One explicit scheme is used everywhere: the position advances with the
//! current velocity plus half the current acceleration, then the velocity
//! takes the full acceleration. It is not symplectic and drifts in energy
//! over long runs

use super::states::{Body, NVec2};

/// Advance `body` by one step of length `dt` under `force`.
///
/// ```text
/// a  = f / m
/// x' = x + v dt + 1/2 a dt^2
/// v' = v + a dt
/// ```
pub fn integrate(body: &mut Body, dt: f64, force: NVec2) {
    let ax = force.x / body.m;
    let ay = force.y / body.m;

    body.x.x = body.x.x + (body.v.x * dt) + (0.5 * ax * dt * dt);
    body.x.y = body.x.y + (body.v.y * dt) + (0.5 * ay * dt * dt);

    body.v.x = body.v.x + (ax * dt);
    body.v.y = body.v.y + (ay * dt);
}
