//! Distributed step coordinator
//!
//! A run is a fixed gang of `workers` threads. Rank 0 (the coordinator)
//! holds the authoritative body array between steps; every other rank only
//! ever sees copies of it. Per step:
//!
//! 1. BROADCAST         coordinator sends its array to every peer
//! 2. BUILD_TREE        every rank builds the same quadtree over the full array
//! 3. PARTITION_COMPUTE rank `r` evaluates forces on bodies `r, r+W, r+2W, ...`
//! 4. INTEGRATE         rank `r` advances those bodies
//! 5. RECONCILE         peers send their bodies back, merged by `id`
//!
//! Because every rank builds its tree from an identical array, the result
//! does not depend on the number of workers.

use std::thread;
use std::time::Instant;

use log::{debug, info, log_enabled, trace, warn, Level};

use crate::error::{CommError, Result, SimError};
use crate::simulation::barnes_hut::{QuadTree, Rejection};
use crate::simulation::comm::{gang, Communicator, Inbound, Setup};
use crate::simulation::forces::{BarnesHut, ForceEvaluator};
use crate::simulation::integrator::integrate;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec2, System};

/// Indices owned by `rank` in a gang of `workers` over `n` bodies.
pub fn owned_indices(rank: usize, workers: usize, n: usize) -> impl Iterator<Item = usize> {
    (rank..n).step_by(workers.max(1))
}

/// Run `params.steps` steps over `system` and return the final state.
///
/// Parameters are validated before any worker is started. The calling
/// thread acts as the coordinator; `params.workers - 1` peers are spawned
/// and joined before returning.
pub fn run(system: System, params: &Parameters) -> Result<System> {
    params.validate()?;
    info!(
        "running {} steps over {} bodies with {} worker(s), theta = {}, dt = {}",
        params.steps,
        system.bodies.len(),
        params.workers,
        params.theta,
        params.dt
    );

    let mut endpoints = gang(params.workers);
    let coordinator = endpoints.remove(0);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(endpoints.len());
        let mut spawn_failure = None;
        for comm in endpoints {
            let rank = comm.rank();
            let builder = thread::Builder::new().name(format!("worker-{rank}"));
            match spawn_peer(scope, builder, comm) {
                Ok(handle) => handles.push((rank, handle)),
                Err(e) => {
                    spawn_failure = Some(e);
                    break;
                }
            }
        }

        let mut outcome = match spawn_failure {
            Some(e) => Err(e),
            None => run_worker(&coordinator, Some((system, *params))),
        };
        // closes the broadcast channels so peers stuck waiting can leave
        drop(coordinator);

        for (rank, handle) in handles {
            let joined = match handle.join() {
                Ok(result) => result.map(|_| ()),
                Err(_) => Err(SimError::WorkerPanicked { rank }),
            };
            if let Err(e) = joined {
                // a peer's own failure explains the coordinator's comm error
                let replace = match &outcome {
                    Ok(_) => true,
                    Err(SimError::Comm(_)) => !matches!(e, SimError::Comm(_)),
                    Err(_) => false,
                };
                if replace {
                    outcome = Err(e);
                }
            }
        }

        match outcome {
            Ok(Some(system)) => Ok(system),
            Ok(None) => Err(CommError::UnexpectedMessage { rank: 0 }.into()),
            Err(e) => Err(e),
        }
    })
}

/// Start one peer on its own scoped thread. A refused thread is a run error.
fn spawn_peer<'scope>(
    scope: &'scope thread::Scope<'scope, '_>,
    builder: thread::Builder,
    comm: Communicator,
) -> Result<thread::ScopedJoinHandle<'scope, Result<Option<System>>>> {
    let rank = comm.rank();
    builder
        .spawn_scoped(scope, move || run_worker(&comm, None))
        .map_err(|source| SimError::Spawn { rank, source })
}

/// The per-rank state machine. The coordinator passes the initial system and
/// the run parameters and gets the final system back; peers pass `None`.
fn run_worker(comm: &Communicator, init: Option<(System, Parameters)>) -> Result<Option<System>> {
    // INIT
    let (mut bodies, mut t, setup) = match init {
        Some((system, params)) => {
            let setup = Setup {
                params,
                body_count: system.bodies.len(),
            };
            (system.bodies, system.t, Some(setup))
        }
        None => (Vec::new(), 0.0, None),
    };
    let Setup { params, body_count } = comm.broadcast_setup(setup)?;

    let owned: Vec<usize> = owned_indices(comm.rank(), comm.size(), body_count).collect();
    let mut forces: Vec<Option<NVec2>> = vec![None; owned.len()];
    debug!("worker {} owns {} of {} bodies", comm.rank(), owned.len(), body_count);

    for step in 0..params.steps {
        let started = Instant::now();

        // BROADCAST
        comm.broadcast_bodies(&mut bodies)?;
        if bodies.len() != body_count {
            return Err(CommError::UnexpectedMessage { rank: comm.rank() }.into());
        }

        // BUILD_TREE
        let tree = build_tree(comm, &params, &mut bodies);
        let built = started.elapsed();

        // PARTITION_COMPUTE
        let evaluator = BarnesHut {
            tree: &tree,
            gravity: params.gravity,
            theta: params.theta,
        };
        for (force, &i) in forces.iter_mut().zip(&owned) {
            let body = &bodies[i];
            *force = body.is_active().then(|| evaluator.force_on(body));
        }

        // INTEGRATE
        for (force, &i) in forces.iter().zip(&owned) {
            if let Some(force) = force {
                integrate(&mut bodies[i], params.dt, *force);
            }
        }
        let computed = started.elapsed();

        // RECONCILE
        reconcile(comm, &mut bodies, &owned)?;
        t += params.dt;

        if comm.is_coordinator() {
            debug!(
                "step {}: tree {} nodes / depth {}, build {:?}, compute {:?}, total {:?}",
                step,
                tree.node_count(),
                tree.max_depth(),
                built,
                computed - built,
                started.elapsed()
            );
        }
    }

    // FINALIZE
    if comm.is_coordinator() {
        Ok(Some(System { bodies, t }))
    } else {
        Ok(None)
    }
}

/// Build this step's tree. Only the coordinator reports exclusions, peers
/// see exactly the same ones.
fn build_tree(comm: &Communicator, params: &Parameters, bodies: &mut [Body]) -> QuadTree {
    let report = comm.is_coordinator();
    let tree = QuadTree::build_with(params.domain, bodies, |body, reason| {
        if !report {
            return;
        }
        match reason {
            Rejection::AlreadyExcluded => {}
            Rejection::NonPositiveMass => {
                warn!("body {} has non-positive mass and is excluded", body.id)
            }
            Rejection::OutOfBounds => warn!(
                "body {} left the domain at ({}, {}) and is excluded",
                body.id, body.x.x, body.x.y
            ),
        }
    });

    if report && log_enabled!(Level::Trace) {
        trace!("quadtree:\n{}", tree.dump());
    }
    tree
}

/// Merge every rank's bodies back into the coordinator's array.
///
/// With a single worker there is nothing to do. Otherwise peers send each
/// owned body on its own, and the coordinator expects exactly the bodies it
/// does not own, in any order. A peer that leaves while it still owes bodies
/// fails the step.
fn reconcile(
    comm: &Communicator,
    bodies: &mut [Body],
    owned: &[usize],
) -> std::result::Result<(), CommError> {
    if comm.size() == 1 {
        return Ok(());
    }

    if !comm.is_coordinator() {
        for &i in owned {
            comm.send_to_coordinator(bodies[i])?;
        }
        return Ok(());
    }

    let (size, n) = (comm.size(), bodies.len());
    let mut owed: Vec<usize> = (0..size).map(|r| owned_indices(r, size, n).count()).collect();
    owed[0] = 0;
    let mut expected = n - owned.len();

    while expected > 0 {
        match comm.receive_from_peers()? {
            Inbound::Body(body) => {
                let rank = body.id % size;
                match (bodies.get_mut(body.id), owed.get_mut(rank)) {
                    (Some(slot), Some(left)) if *left > 0 => {
                        *slot = body;
                        *left -= 1;
                        expected -= 1;
                    }
                    _ => return Err(CommError::UnexpectedMessage { rank: comm.rank() }),
                }
            }
            Inbound::PeerLeft(rank) => {
                if owed.get(rank).is_some_and(|&left| left > 0) {
                    return Err(CommError::PeerLeft { rank });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(n: usize) -> Vec<Body> {
        (0..n)
            .map(|i| Body::new(i, NVec2::new(1.0, 1.0), NVec2::zeros(), 1.0))
            .collect()
    }

    #[test]
    fn reconcile_fails_when_a_peer_leaves_owing_bodies() {
        let mut endpoints = gang(3);
        let waiting = endpoints.pop().unwrap();
        let departed = endpoints.pop().unwrap();
        let coordinator = endpoints.pop().unwrap();
        drop(departed);

        thread::scope(|scope| {
            // rank 2 still holds an inbox sender while it waits for a broadcast
            let handle = scope.spawn(move || waiting.broadcast_bodies(&mut Vec::new()));

            let mut all = bodies(6);
            let owned: Vec<usize> = owned_indices(0, 3, 6).collect();
            assert_eq!(
                reconcile(&coordinator, &mut all, &owned),
                Err(CommError::PeerLeft { rank: 1 })
            );

            drop(coordinator);
            assert_eq!(handle.join().unwrap(), Err(CommError::ReceiveClosed { rank: 2 }));
        });
    }

    #[test]
    fn reconcile_ignores_peers_that_already_delivered() {
        let mut endpoints = gang(3);
        let late = endpoints.pop().unwrap();
        let early = endpoints.pop().unwrap();
        let coordinator = endpoints.pop().unwrap();

        let mut sent = bodies(6);
        for b in sent.iter_mut() {
            b.m = 2.0;
        }
        for i in owned_indices(1, 3, 6) {
            early.send_to_coordinator(sent[i]).unwrap();
        }
        drop(early);
        for i in owned_indices(2, 3, 6) {
            late.send_to_coordinator(sent[i]).unwrap();
        }

        let mut all = bodies(6);
        let owned: Vec<usize> = owned_indices(0, 3, 6).collect();
        reconcile(&coordinator, &mut all, &owned).unwrap();

        let masses: Vec<f64> = all.iter().map(|b| b.m).collect();
        assert_eq!(masses, vec![1.0, 2.0, 2.0, 1.0, 2.0, 2.0]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn refused_thread_is_a_run_error() {
        let mut endpoints = gang(2);
        let peer = endpoints.pop().unwrap();

        thread::scope(|scope| {
            // no address space can hold this stack
            let builder = thread::Builder::new().stack_size(1 << 60);
            match spawn_peer(scope, builder, peer) {
                Err(SimError::Spawn { rank, .. }) => assert_eq!(rank, 1),
                other => panic!("expected a spawn error, got {:?}", other.map(|_| ())),
            }
        });
    }
}
