//! Per-slot contention resolution.
//!
//! Resolution runs in two phases. [`ContentionResolver::evaluate`] lets every
//! node sense the channel state committed for the slot and collects the nodes
//! whose backoff expired. [`ContentionResolver::commit`] then classifies the
//! slot by the size of that ready set and writes the resulting burst.
//!
//! Every node reads the same pre-slot channel state and only mutates itself,
//! so the ready set does not depend on the order nodes are visited in.

use rand::Rng;
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::node::{ContenderPool, Node, NodeId};
use crate::slot::{SlotState, SlotTimeline};

/// Nodes whose backoff expired in the current slot.
pub type ReadySet = Vec<NodeId>;

/// Classification of one slot after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// No backoff expired; the slot keeps its committed state.
    Quiet,
    /// One node started a transmission burst.
    Success(NodeId),
    /// Several nodes started transmitting together.
    Collision(Vec<NodeId>),
}

impl SlotOutcome {
    /// Slot state written for the burst, if one started.
    pub fn burst_state(&self) -> Option<SlotState> {
        match self {
            SlotOutcome::Quiet => None,
            SlotOutcome::Success(_) => Some(SlotState::Transmission),
            SlotOutcome::Collision(_) => Some(SlotState::Collision),
        }
    }
}

/// Stateless slot resolver, parameterized only by burst length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentionResolver {
    packet_size: usize,
}

impl ContentionResolver {
    /// Creates a resolver whose bursts occupy `packet_size` slots.
    pub fn new(packet_size: usize) -> Self {
        ContentionResolver { packet_size }
    }

    /// Slots occupied by each burst.
    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    /// Resolves slot `slot` end to end: sense, classify, commit.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        slot: usize,
        pool: &mut ContenderPool,
        timeline: &mut SlotTimeline,
        rng: &mut R,
    ) -> SimResult<SlotOutcome> {
        let channel = timeline.get(slot)?;
        let ready = self.evaluate(channel, pool, rng);
        self.commit(slot, ready, pool, timeline)
    }

    /// Lets every node sense `channel` and returns the nodes ready to transmit.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        channel: SlotState,
        pool: &mut ContenderPool,
        rng: &mut R,
    ) -> ReadySet {
        pool.iter_mut()
            .filter_map(|(id, node)| node.sense(channel, rng).then_some(id))
            .collect()
    }

    /// Classifies the slot by ready-set size and writes the burst.
    pub fn commit(
        &self,
        slot: usize,
        ready: ReadySet,
        pool: &mut ContenderPool,
        timeline: &mut SlotTimeline,
    ) -> SimResult<SlotOutcome> {
        let capacity = pool.len();
        if ready.len() > capacity {
            return Err(SimError::CapacityExceeded {
                ready: ready.len(),
                capacity,
            });
        }

        let outcome = match ready.len() {
            0 => return Ok(SlotOutcome::Quiet),
            1 => {
                let id = ready[0];
                node_mut(pool, id)?.complete_transmission();
                SlotOutcome::Success(id)
            }
            _ => {
                for &id in &ready {
                    node_mut(pool, id)?.complete_collision();
                }
                SlotOutcome::Collision(ready)
            }
        };

        if let Some(state) = outcome.burst_state() {
            let written = timeline.mark_range(slot, self.packet_size, state);
            trace!(slot, %state, written, "burst started");
            if written < self.packet_size {
                trace!(
                    slot,
                    horizon = timeline.horizon(),
                    "burst clamped at horizon"
                );
            }
        }

        Ok(outcome)
    }
}

fn node_mut(pool: &mut ContenderPool, id: NodeId) -> SimResult<&mut Node> {
    let capacity = pool.len();
    pool.get_mut(id).ok_or(SimError::CapacityExceeded {
        ready: id.0 + 1,
        capacity,
    })
}
