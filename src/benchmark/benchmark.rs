use std::time::Instant;

use crate::simulation::barnes_hut::QuadTree;
use crate::simulation::engine;
use crate::simulation::forces::{BarnesHut, DirectSum, ForceEvaluator, Gravity};
use crate::simulation::params::Parameters;
use crate::simulation::quadrant::Quadrant;
use crate::simulation::states::{Body, NVec2, System};

/// Deterministic body set of size `n` spread over the default domain
/// (no rand needed)
pub fn make_bodies(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec2::new(2.0 + (i_f * 0.37).sin() * 1.8, 2.0 + (i_f * 0.13).cos() * 1.8);
            let v = NVec2::new((i_f * 0.07).sin() * 0.01, (i_f * 0.11).cos() * 0.01);
            Body::new(i, x, v, 1.0 + (i % 5) as f64 * 0.25)
        })
        .collect()
}

/// Time one full force evaluation, direct sum vs Barnes–Hut, over growing N
pub fn bench_gravity() {
    let ns = [200, 400, 800, 1600, 3200, 6400];
    let gravity = Gravity::default();
    let theta = 0.5;

    for n in ns {
        let mut bodies = make_bodies(n);

        let direct = DirectSum {
            bodies: &bodies,
            gravity,
        };
        let t0 = Instant::now();
        let mut check = NVec2::zeros();
        for b in direct.bodies {
            check += direct.force_on(b);
        }
        let dt_direct = t0.elapsed().as_secs_f64();

        // tree build counts towards the Barnes–Hut time
        let t1 = Instant::now();
        let tree = QuadTree::build(Quadrant::default(), &mut bodies);
        let bh = BarnesHut {
            tree: &tree,
            gravity,
            theta,
        };
        for b in &bodies {
            check += bh.force_on(b);
        }
        let dt_bh = t1.elapsed().as_secs_f64();

        println!(
            "N = {n:5}, direct = {:8.6} s, BH = {:8.6} s (net {:.3e})",
            dt_direct,
            dt_bh,
            check.norm()
        );
    }
}

/// Time whole steps for different gang sizes
/// Paste output directly into a spreadsheet to graph
pub fn bench_workers() {
    let steps = 5;
    println!("N,workers,ms_per_step");

    for n in [1000, 4000, 16000] {
        let bodies = make_bodies(n);
        for workers in [1, 2, 4] {
            let params = Parameters::new(steps, 0.5, 0.005, workers);
            let t0 = Instant::now();
            if let Err(e) = engine::run(System::new(bodies.clone()), &params) {
                println!("{n},{workers},failed: {e}");
                continue;
            }
            let ms = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;
            println!("{n},{workers},{ms:.3}");
        }
    }
}
