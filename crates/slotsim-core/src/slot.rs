//! Slot states and the fixed-horizon slot timeline.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// State of the shared channel during one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// Nobody is transmitting.
    #[default]
    Idle,
    /// Exactly one node is transmitting.
    Transmission,
    /// Two or more nodes are transmitting at once.
    Collision,
}

impl SlotState {
    /// True for [`SlotState::Transmission`] and [`SlotState::Collision`].
    pub fn is_busy(self) -> bool {
        !matches!(self, SlotState::Idle)
    }
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotState::Idle => write!(f, "idle"),
            SlotState::Transmission => write!(f, "transmission"),
            SlotState::Collision => write!(f, "collision"),
        }
    }
}

/// Channel state for every slot up to a fixed horizon.
///
/// Bursts that would run past the horizon are clamped at the boundary; the
/// timeline never grows after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTimeline {
    slots: Vec<SlotState>,
}

impl SlotTimeline {
    /// Creates a timeline of `horizon` idle slots.
    pub fn new(horizon: usize) -> Self {
        SlotTimeline {
            slots: vec![SlotState::Idle; horizon],
        }
    }

    /// Number of slots in the timeline.
    pub fn horizon(&self) -> usize {
        self.slots.len()
    }

    /// Reads the state of slot `index`.
    pub fn get(&self, index: usize) -> SimResult<SlotState> {
        self.slots.get(index).copied().ok_or(SimError::OutOfRange {
            index,
            horizon: self.horizon(),
        })
    }

    /// Sets `length` slots starting at `start` to `state`.
    ///
    /// The write is clamped to the horizon. Returns the number of slots
    /// actually written, which is less than `length` only for bursts that
    /// cross the end of the timeline.
    pub fn mark_range(&mut self, start: usize, length: usize, state: SlotState) -> usize {
        let horizon = self.horizon();
        let begin = start.min(horizon);
        let end = start.saturating_add(length).min(horizon);
        self.slots[begin..end].fill(state);
        end - begin
    }

    /// Iterates over all slot states in index order.
    pub fn iter(&self) -> impl Iterator<Item = SlotState> + '_ {
        self.slots.iter().copied()
    }

    /// Counts slots currently in `state`.
    pub fn count(&self, state: SlotState) -> usize {
        self.slots.iter().filter(|&&s| s == state).count()
    }
}
