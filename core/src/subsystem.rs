//! Subsystem trait.
//!
//! RULE: Every ticked subsystem implements SimSubsystem.
//! The engine calls on_tick() on each registered subsystem
//! in registration order, every tick.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    types::{SimTime, Tick},
};

/// The contract every ticked subsystem must fulfill.
pub trait SimSubsystem {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    ///
    /// - `tick`: the current tick number
    /// - `dt`:   simulated time elapsed since the previous tick
    /// - `rng`:  this subsystem's deterministic RNG for this tick
    ///
    /// Returns messages for the engine to publish, in order, once this
    /// subsystem's state is no longer borrowed.
    fn on_tick(
        &mut self,
        tick: Tick,
        dt: SimTime,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;
}
