//! Simulation clock: owns tick state, simulated time, speed control, and pause.

use crate::types::{SimTime, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current_tick: Tick,
    pub sim_time:     SimTime,
    pub speed:        SimSpeed,
    pub paused:       bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            current_tick: 0,
            sim_time:     0.0,
            speed:        SimSpeed::Normal,
            paused:       false,
        }
    }

    /// Advance one tick by a frame delta. Returns the new tick number and
    /// the simulated delta after speed scaling.
    pub fn advance(&mut self, frame_dt: SimTime) -> (Tick, SimTime) {
        let dt = frame_dt * self.speed.time_scale();
        self.current_tick += 1;
        if dt.is_finite() && dt > 0.0 {
            self.sim_time += dt;
        }
        (self.current_tick, dt)
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }
}

impl Default for SimClock {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,       // 1x frame delta
    Accelerated,  // 2x
    FastForward,  // 5x
}

impl SimSpeed {
    pub fn time_scale(&self) -> SimTime {
        match self {
            SimSpeed::Normal      => 1.0,
            SimSpeed::Accelerated => 2.0,
            SimSpeed::FastForward => 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_scales_frame_delta() {
        let mut clock = SimClock::new();
        clock.set_speed(SimSpeed::FastForward);
        assert_eq!(clock.advance(0.5), (1, 2.5));
        assert_eq!(clock.sim_time, 2.5);
    }
}
