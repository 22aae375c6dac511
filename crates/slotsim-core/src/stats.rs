//! Aggregate slot counters and end-of-run statistics.

use serde::{Deserialize, Serialize};

use crate::config::SimulationParams;
use crate::slot::SlotState;

/// Running per-slot counts, owned by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCounters {
    /// Slots the channel spent idle.
    pub idle: u64,
    /// Slots occupied by successful transmissions.
    pub transmission: u64,
    /// Slots occupied by collisions.
    pub collision: u64,
    /// Packets delivered without collision.
    pub completed_packets: u64,
}

impl SlotCounters {
    /// Counts one slot in `state`.
    pub fn record(&mut self, state: SlotState) {
        match state {
            SlotState::Idle => self.idle += 1,
            SlotState::Transmission => self.transmission += 1,
            SlotState::Collision => self.collision += 1,
        }
    }

    /// Total slots counted.
    pub fn total_slots(&self) -> u64 {
        self.idle + self.transmission + self.collision
    }
}

/// Final statistics of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Scenario the run simulated.
    pub params: SimulationParams,
    /// Index of the last simulated slot.
    pub final_slot: usize,
    /// Slot and packet counts.
    pub counters: SlotCounters,
    /// Whether the convergence test passed before the horizon.
    pub converged: bool,
}

impl SimulationStats {
    /// Completed packets per slot, using the final slot index as the denominator.
    pub fn throughput(&self) -> f64 {
        ratio(self.counters.completed_packets, self.final_slot)
    }

    /// Fraction of slots spent in successful transmission.
    pub fn transmission_fraction(&self) -> f64 {
        ratio(self.counters.transmission, self.final_slot)
    }

    /// Fraction of slots lost to collisions.
    pub fn collision_fraction(&self) -> f64 {
        ratio(self.counters.collision, self.final_slot)
    }

    /// Fraction of slots the channel stayed idle.
    pub fn idle_fraction(&self) -> f64 {
        ratio(self.counters.idle, self.final_slot)
    }
}

// A run that stops at slot 0 has no meaningful rate.
fn ratio(count: u64, slots: usize) -> f64 {
    if slots == 0 {
        0.0
    } else {
        count as f64 / slots as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(final_slot: usize, counters: SlotCounters) -> SimulationStats {
        SimulationStats {
            params: SimulationParams::new(1, 1, 1),
            final_slot,
            counters,
            converged: true,
        }
    }

    #[test]
    fn test_record() {
        let mut counters = SlotCounters::default();
        counters.record(SlotState::Idle);
        counters.record(SlotState::Transmission);
        counters.record(SlotState::Transmission);
        counters.record(SlotState::Collision);

        assert_eq!(counters.idle, 1);
        assert_eq!(counters.transmission, 2);
        assert_eq!(counters.collision, 1);
        assert_eq!(counters.completed_packets, 0);
        assert_eq!(counters.total_slots(), 4);
    }

    #[test]
    fn test_derived_rates() {
        let s = stats(
            1000,
            SlotCounters {
                idle: 201,
                transmission: 600,
                collision: 200,
                completed_packets: 60,
            },
        );
        assert!((s.throughput() - 0.06).abs() < 1e-12);
        assert!((s.transmission_fraction() - 0.6).abs() < 1e-12);
        assert!((s.collision_fraction() - 0.2).abs() < 1e-12);
        assert!((s.idle_fraction() - 0.201).abs() < 1e-12);
    }

    #[test]
    fn test_rates_at_slot_zero() {
        let s = stats(0, SlotCounters::default());
        assert_eq!(s.throughput(), 0.0);
        assert_eq!(s.transmission_fraction(), 0.0);
    }
}
