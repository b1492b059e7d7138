//! Message passing inside a fixed worker gang.
//!
//! Rank 0 is the coordinator. It owns one outbound channel per peer, used
//! for collective broadcasts, and a single inbound channel that every peer
//! can send to. Peers only ever talk to the coordinator. All operations
//! block; a closed channel is reported as a [`CommError`] and ends the run.
//!
//! A peer endpoint announces itself on the inbox when it is dropped, even
//! while unwinding from a panic, so the coordinator never waits on a worker
//! that is gone.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::CommError;
use crate::simulation::params::Parameters;
use crate::simulation::states::Body;

/// Run-wide values broadcast once before the first step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setup {
    pub params: Parameters,
    pub body_count: usize,
}

/// Message taken from the coordinator's inbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inbound {
    /// An updated body from a peer.
    Body(Body),
    /// The peer with this rank dropped its endpoint and will send nothing more.
    PeerLeft(usize),
}

/// Payload of a collective broadcast.
#[derive(Debug, Clone)]
enum Broadcast {
    Setup(Setup),
    Bodies(Vec<Body>),
}

enum Link {
    Coordinator {
        peers: Vec<Sender<Broadcast>>,
        inbox: Receiver<Inbound>,
    },
    Peer {
        from_coordinator: Receiver<Broadcast>,
        to_coordinator: Sender<Inbound>,
    },
}

/// One worker's endpoint into the gang.
pub struct Communicator {
    rank: usize,
    size: usize,
    link: Link,
}

/// Create the endpoints of a gang of `size` workers, indexed by rank.
pub fn gang(size: usize) -> Vec<Communicator> {
    let size = size.max(1);
    let (to_coordinator, inbox) = unbounded();

    let mut peers = Vec::with_capacity(size - 1);
    let mut endpoints = Vec::with_capacity(size);
    for rank in 1..size {
        let (tx, rx) = unbounded();
        peers.push(tx);
        endpoints.push(Communicator {
            rank,
            size,
            link: Link::Peer {
                from_coordinator: rx,
                to_coordinator: to_coordinator.clone(),
            },
        });
    }
    // only peers keep a sender, so the inbox closes once they are all gone
    drop(to_coordinator);

    endpoints.insert(
        0,
        Communicator {
            rank: 0,
            size,
            link: Link::Coordinator { peers, inbox },
        },
    );
    endpoints
}

impl Communicator {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }

    /// Collective: the coordinator passes `Some(setup)`, peers pass `None`;
    /// every rank gets the coordinator's value back.
    pub fn broadcast_setup(&self, setup: Option<Setup>) -> Result<Setup, CommError> {
        match self.broadcast(setup.map(Broadcast::Setup))? {
            Broadcast::Setup(setup) => Ok(setup),
            Broadcast::Bodies(_) => Err(CommError::UnexpectedMessage { rank: self.rank }),
        }
    }

    /// Collective: peers have `bodies` replaced by the coordinator's array.
    pub fn broadcast_bodies(&self, bodies: &mut Vec<Body>) -> Result<(), CommError> {
        match &self.link {
            Link::Coordinator { peers, .. } => {
                for peer in peers {
                    peer.send(Broadcast::Bodies(bodies.clone()))
                        .map_err(|_| CommError::BroadcastClosed)?;
                }
                Ok(())
            }
            Link::Peer {
                from_coordinator, ..
            } => match from_coordinator.recv() {
                Ok(Broadcast::Bodies(received)) => {
                    *bodies = received;
                    Ok(())
                }
                Ok(Broadcast::Setup(_)) => Err(CommError::UnexpectedMessage { rank: self.rank }),
                Err(_) => Err(CommError::ReceiveClosed { rank: self.rank }),
            },
        }
    }

    /// Point to point: a peer hands one updated body to the coordinator.
    pub fn send_to_coordinator(&self, body: Body) -> Result<(), CommError> {
        match &self.link {
            Link::Peer { to_coordinator, .. } => to_coordinator
                .send(Inbound::Body(body))
                .map_err(|_| CommError::SendClosed { rank: self.rank }),
            Link::Coordinator { .. } => Err(CommError::UnexpectedMessage { rank: self.rank }),
        }
    }

    /// Point to point: the coordinator takes the next message from any peer.
    pub fn receive_from_peers(&self) -> Result<Inbound, CommError> {
        match &self.link {
            Link::Coordinator { inbox, .. } => inbox
                .recv()
                .map_err(|_| CommError::ReceiveClosed { rank: self.rank }),
            Link::Peer { .. } => Err(CommError::UnexpectedMessage { rank: self.rank }),
        }
    }

    fn broadcast(&self, value: Option<Broadcast>) -> Result<Broadcast, CommError> {
        match (&self.link, value) {
            (Link::Coordinator { peers, .. }, Some(value)) => {
                for peer in peers {
                    peer.send(value.clone())
                        .map_err(|_| CommError::BroadcastClosed)?;
                }
                Ok(value)
            }
            (Link::Coordinator { .. }, None) => {
                Err(CommError::UnexpectedMessage { rank: self.rank })
            }
            (
                Link::Peer {
                    from_coordinator, ..
                },
                _,
            ) => from_coordinator
                .recv()
                .map_err(|_| CommError::ReceiveClosed { rank: self.rank }),
        }
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        if let Link::Peer { to_coordinator, .. } = &self.link {
            // the coordinator may already be gone
            let _ = to_coordinator.send(Inbound::PeerLeft(self.rank));
        }
    }
}
