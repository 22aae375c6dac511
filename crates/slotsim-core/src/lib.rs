//! # slotsim-core
//!
//! Slot-level simulation of a carrier-sense multiple-access channel using
//! binary exponential backoff.
//!
//! A fixed pool of nodes contends for a single channel. In every slot each
//! node senses the channel, counts its backoff down while the channel is
//! idle, and transmits when the counter expires. A lone transmitter occupies
//! the channel for `packet_size` slots; simultaneous transmitters collide
//! and double their contention windows. The run stops once the fraction of
//! slots spent transmitting stops changing.
//!
//! ## Example
//!
//! ```rust
//! use slotsim_core::{SimulationConfig, SimulationEngine, SimulationParams};
//!
//! let config = SimulationConfig::new(SimulationParams::new(1, 1, 1));
//! let mut engine = SimulationEngine::with_seed(config, 42).unwrap();
//! let stats = engine.run().unwrap();
//!
//! assert!(stats.converged);
//! assert_eq!(stats.counters.collision, 0);
//! ```

pub mod config;
pub mod convergence;
pub mod engine;
pub mod error;
pub mod node;
pub mod resolver;
pub mod slot;
pub mod stats;

pub use config::{
    SimulationConfig, SimulationParams, DEFAULT_HORIZON, MAX_CONTENTION_WINDOW, MAX_NODE_COUNT,
    MAX_PACKET_SIZE,
};
pub use convergence::{
    ConvergenceConfig, ConvergenceMonitor, ConvergenceSample, ConvergenceState,
    DEFAULT_SAMPLING_INTERVAL, DEFAULT_THRESHOLD,
};
pub use engine::{SimRng, SimulationEngine, StepOutcome};
pub use error::{SimError, SimResult};
pub use node::{ChannelSense, ContenderPool, Node, NodeId};
pub use resolver::{ContentionResolver, ReadySet, SlotOutcome};
pub use slot::{SlotState, SlotTimeline};
pub use stats::{SimulationStats, SlotCounters};
