//! # pdes-engine::sync
//!
//! The conservative rank synchronization boundary. Ranks exchange events
//! at window boundaries spaced no wider than the lookahead (the minimum
//! effective latency of any cross-rank link); an all-reduce over
//! next-event times yields the safe horizon every rank may dispatch up to.
//!
//! The message fabric is abstracted behind [`Fabric`]; the in-process
//! [`LoopbackFabric`] backs it with one thread per rank connected by
//! `crossbeam-channel` rendezvous. An MPI backing would implement the same
//! trait over collectives.

use crate::prelude::*;
use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender};
use pdes_types::graph::ConfigGraph;
use std::collections::BTreeMap;

/// One event crossing ranks at a sync boundary. `payload == None` is a
/// null tick promising the receiving link stays silent until
/// `delivery_time`.
#[derive(Debug, Clone)]
pub struct WireEvent {
    /// The receiving half's link id.
    pub link_id: LinkId,
    pub delivery_time: SimTime,
    pub payload: Option<Bytes>,
}

/// The message-passing fabric joining the ranks of one run.
///
/// All methods are collectives: every rank must call them in the same
/// order, MPI-style. Within one window a rank performs at most one
/// `exchange` followed by the reductions the driver asks for.
pub trait Fabric: Send {
    fn rank(&self) -> Rank;
    fn num_ranks(&self) -> Rank;

    /// Distributes rank 0's graph to every rank. Rank 0 passes `Some`,
    /// the rest pass `None` and receive the broadcast copy.
    fn broadcast_graph(&mut self, graph: Option<ConfigGraph>) -> ConfigGraph;

    /// Global minimum of `value` across all ranks.
    fn all_reduce_min(&mut self, value: u64) -> u64;

    /// Global sum of `value` across all ranks.
    fn all_reduce_sum(&mut self, value: u64) -> u64;

    /// Delivers each per-peer outbox and returns the inboxes received,
    /// ordered by sending rank.
    fn exchange(&mut self, out: BTreeMap<Rank, Vec<WireEvent>>) -> Vec<(Rank, Vec<WireEvent>)>;
}

/// The trivial fabric of a serial run.
#[derive(Debug, Default)]
pub struct SingleRank;

impl Fabric for SingleRank {
    fn rank(&self) -> Rank {
        0
    }

    fn num_ranks(&self) -> Rank {
        1
    }

    fn broadcast_graph(&mut self, graph: Option<ConfigGraph>) -> ConfigGraph {
        graph.expect("a serial run parses its own graph")
    }

    fn all_reduce_min(&mut self, value: u64) -> u64 {
        value
    }

    fn all_reduce_sum(&mut self, value: u64) -> u64 {
        value
    }

    fn exchange(&mut self, _out: BTreeMap<Rank, Vec<WireEvent>>) -> Vec<(Rank, Vec<WireEvent>)> {
        Vec::new()
    }
}

enum Packet {
    Graph(Box<ConfigGraph>),
    Value(u64),
    Events(Vec<WireEvent>),
}

/// An in-process fabric endpoint: every ordered rank pair gets its own
/// channel, so one message per peer per collective arrives unambiguously.
pub struct LoopbackFabric {
    rank: Rank,
    num_ranks: Rank,
    to_peer: Vec<Sender<Packet>>,
    from_peer: Vec<Receiver<Packet>>,
}

impl LoopbackFabric {
    /// Builds the connected endpoints of an `n`-rank cluster. Each
    /// endpoint is moved onto its rank's thread.
    pub fn cluster(n: Rank) -> Vec<LoopbackFabric> {
        let n = n as usize;
        let mut senders: Vec<Vec<Option<Sender<Packet>>>> = (0..n).map(|_| Vec::new()).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Packet>>>> =
            (0..n).map(|_| Vec::new()).collect();
        for src in 0..n {
            for dst in 0..n {
                let (tx, rx) = unbounded();
                senders[src].push(Some(tx));
                receivers[dst].push(Some(rx));
            }
        }
        // receivers[dst][src] pairs with senders[src][dst].
        (0..n)
            .map(|rank| LoopbackFabric {
                rank: rank as Rank,
                num_ranks: n as Rank,
                to_peer: senders[rank].iter_mut().map(|s| s.take().expect("built above")).collect(),
                from_peer: receivers[rank]
                    .iter_mut()
                    .map(|r| r.take().expect("built above"))
                    .collect(),
            })
            .collect()
    }

    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_ranks as usize).filter(move |p| *p != self.rank as usize)
    }

    fn recv_value(&self, peer: usize) -> u64 {
        match self.from_peer[peer].recv() {
            Ok(Packet::Value(v)) => v,
            _ => panic!("rank {} lost its fabric peer {peer}", self.rank),
        }
    }
}

impl Fabric for LoopbackFabric {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn num_ranks(&self) -> Rank {
        self.num_ranks
    }

    fn broadcast_graph(&mut self, graph: Option<ConfigGraph>) -> ConfigGraph {
        if self.rank == 0 {
            let graph = graph.expect("rank 0 provides the graph");
            for peer in self.peers() {
                self.to_peer[peer]
                    .send(Packet::Graph(Box::new(graph.clone())))
                    .expect("fabric peer hung up");
            }
            graph
        } else {
            match self.from_peer[0].recv() {
                Ok(Packet::Graph(g)) => *g,
                _ => panic!("rank {} expected a graph broadcast", self.rank),
            }
        }
    }

    fn all_reduce_min(&mut self, value: u64) -> u64 {
        for peer in self.peers() {
            self.to_peer[peer]
                .send(Packet::Value(value))
                .expect("fabric peer hung up");
        }
        self.peers()
            .collect::<Vec<_>>()
            .into_iter()
            .fold(value, |acc, peer| acc.min(self.recv_value(peer)))
    }

    fn all_reduce_sum(&mut self, value: u64) -> u64 {
        for peer in self.peers() {
            self.to_peer[peer]
                .send(Packet::Value(value))
                .expect("fabric peer hung up");
        }
        self.peers()
            .collect::<Vec<_>>()
            .into_iter()
            .fold(value, |acc, peer| acc + self.recv_value(peer))
    }

    fn exchange(&mut self, mut out: BTreeMap<Rank, Vec<WireEvent>>) -> Vec<(Rank, Vec<WireEvent>)> {
        for peer in self.peers() {
            let events = out.remove(&(peer as Rank)).unwrap_or_default();
            self.to_peer[peer]
                .send(Packet::Events(events))
                .expect("fabric peer hung up");
        }
        let mut inboxes = Vec::new();
        for peer in self.peers().collect::<Vec<_>>() {
            match self.from_peer[peer].recv() {
                Ok(Packet::Events(events)) => inboxes.push((peer as Rank, events)),
                _ => panic!("rank {} expected an event exchange", self.rank),
            }
        }
        inboxes
    }
}
