//! Contending nodes and the pool that owns them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::slot::SlotState;

/// Index of a node within its [`ContenderPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// A node's memory of the channel as it saw it one slot ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSense {
    /// The channel was idle.
    #[default]
    Idle,
    /// Another node's transmission or a collision occupied the channel.
    Busy,
}

impl From<SlotState> for ChannelSense {
    fn from(state: SlotState) -> Self {
        if state.is_busy() {
            ChannelSense::Busy
        } else {
            ChannelSense::Idle
        }
    }
}

/// A single contender running binary exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    backoff: Option<u64>,
    contention_window: u64,
    sensed: ChannelSense,
    successes: u64,
    collisions: u64,
}

impl Node {
    /// Creates a node with no backoff drawn and an idle channel memory.
    pub fn new(contention_window: u64) -> Self {
        Node {
            backoff: None,
            contention_window,
            sensed: ChannelSense::Idle,
            successes: 0,
            collisions: 0,
        }
    }

    /// Remaining backoff slots, or `None` if the next idle slot draws a new value.
    pub fn backoff(&self) -> Option<u64> {
        self.backoff
    }

    /// Current contention window.
    pub fn contention_window(&self) -> u64 {
        self.contention_window
    }

    /// Channel state the node observed in the previous slot.
    pub fn sensed(&self) -> ChannelSense {
        self.sensed
    }

    /// Packets this node delivered.
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Collisions this node took part in.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Applies one slot of channel sensing.
    ///
    /// Returns `true` when the backoff counter expires in this slot, i.e. the
    /// node wants to transmit. A node coming out of a busy period spends one
    /// full idle slot re-syncing before it resumes counting down.
    pub fn sense<R: Rng + ?Sized>(&mut self, channel: SlotState, rng: &mut R) -> bool {
        match (channel.is_busy(), self.sensed) {
            (false, ChannelSense::Idle) => {
                let window = self.contention_window;
                let remaining = self
                    .backoff
                    .get_or_insert_with(|| rng.gen_range(1..=window));
                *remaining -= 1;
                *remaining == 0
            }
            (false, ChannelSense::Busy) => {
                self.sensed = ChannelSense::Idle;
                false
            }
            (true, _) => {
                self.sensed = ChannelSense::Busy;
                false
            }
        }
    }

    /// Records a successful transmission.
    pub(crate) fn complete_transmission(&mut self) {
        self.backoff = None;
        self.successes += 1;
    }

    /// Records a collision and doubles the contention window.
    ///
    /// The window is unbounded; it saturates rather than wrapping.
    pub(crate) fn complete_collision(&mut self) {
        self.backoff = None;
        self.collisions += 1;
        self.contention_window = self.contention_window.saturating_mul(2);
    }

    #[cfg(test)]
    pub(crate) fn with_backoff(mut self, backoff: u64) -> Self {
        self.backoff = Some(backoff);
        self
    }
}

/// Fixed set of contenders sharing one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContenderPool {
    nodes: Vec<Node>,
    initial_cw: u64,
}

impl ContenderPool {
    /// Allocates `node_count` fresh nodes with window `initial_cw`.
    pub fn new(node_count: usize, initial_cw: u64) -> Self {
        ContenderPool {
            nodes: vec![Node::new(initial_cw); node_count],
            initial_cw,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the pool has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Window every node started with.
    pub fn initial_contention_window(&self) -> u64 {
        self.initial_cw
    }

    /// Looks up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Iterates over nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> + '_ {
        self.nodes.iter_mut().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<Node>, initial_cw: u64) -> Self {
        ContenderPool { nodes, initial_cw }
    }
}
