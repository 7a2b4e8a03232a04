//! Money accrual: periodic income and upkeep.
//!
//! The engine mirrors settlement counts from `CityTransition` messages
//! (it never reads the CityLedger directly) and counts officers from
//! `OfficerAdded`. Each tick it accumulates simulated time; once the
//! accumulator strictly exceeds the interval it pays out
//!
//!   delta = towns*town_income + cities*city_income
//!         + metros*metro_income - officers*officer_upkeep
//!
//! publishes `MoneyUpdated` with the new total, and resets the
//! accumulator to zero. At most one payout happens per tick.

use crate::{
    bus::{MessageBus, MessageHandler, Shared},
    config::AccrualConfig,
    error::SimResult,
    event::{EventKind, SimEvent},
    ledger::{CityLedger, TierCounts},
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::{SimTime, Tick},
};
use std::{cell::RefCell, rc::Rc};

pub struct MoneyAccrualEngine {
    config:   AccrualConfig,
    ledger:   CityLedger,
    amount:   i64,
    officers: u32,
    elapsed:  SimTime,
}

impl MoneyAccrualEngine {
    pub fn new(config: AccrualConfig) -> Self {
        Self {
            amount: config.starting_amount,
            config,
            ledger: CityLedger::new(),
            officers: 0,
            elapsed: 0.0,
        }
    }

    pub fn attach(self, bus: &MessageBus) -> Shared<Self> {
        let engine = Rc::new(RefCell::new(self));
        bus.attach(EventKind::CityTransition, &engine);
        bus.attach(EventKind::OfficerAdded, &engine);
        engine
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn officers(&self) -> u32 {
        self.officers
    }

    pub fn elapsed(&self) -> SimTime {
        self.elapsed
    }

    pub fn counts(&self) -> TierCounts {
        self.ledger.counts()
    }

    /// Net change applied at the next payout, given current counts.
    pub fn delta(&self) -> i64 {
        let counts = self.ledger.counts();
        let c = &self.config;
        i64::from(counts.towns)
            .saturating_mul(c.town_income)
            .saturating_add(i64::from(counts.cities).saturating_mul(c.city_income))
            .saturating_add(i64::from(counts.metros).saturating_mul(c.metro_income))
            .saturating_sub(i64::from(self.officers).saturating_mul(c.officer_upkeep))
    }

    /// Advance the accumulator. Returns the new total when a payout fired.
    pub fn advance(&mut self, dt: SimTime) -> Option<i64> {
        if !(dt.is_finite() && dt >= 0.0) {
            log::warn!("Ignoring invalid time delta {dt}");
            return None;
        }
        self.elapsed += dt;
        if self.elapsed <= self.config.interval {
            return None;
        }

        let delta = self.delta();
        self.amount = self.amount.saturating_add(delta);
        self.elapsed = 0.0;
        log::debug!("Accrual paid {delta:+}, total {}", self.amount);
        Some(self.amount)
    }
}

impl MessageHandler for MoneyAccrualEngine {
    fn on_message(&mut self, event: &SimEvent) {
        match event {
            SimEvent::CityTransition { .. } => self.ledger.on_message(event),
            SimEvent::OfficerAdded => self.officers += 1,
            _ => {}
        }
    }
}

impl SimSubsystem for MoneyAccrualEngine {
    fn name(&self) -> &'static str { "accrual" }

    fn on_tick(
        &mut self,
        _tick: Tick,
        dt: SimTime,
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        Ok(self
            .advance(dt)
            .map(|amount| SimEvent::MoneyUpdated { amount })
            .into_iter()
            .collect())
    }
}
