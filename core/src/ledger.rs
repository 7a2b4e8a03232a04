//! City ledger: running settlement counts per tier.
//!
//! Transition rule for `CityTransition { old, new }`:
//!   1. Increment the counter for `new`.
//!   2. If `old` is Town, City or Metro, decrement that counter.
//!   3. If `old` is New, nothing is decremented (net growth).
//!
//! The rule is applied unconditionally: `old == new` performs both writes
//! for a net change of zero. A decrement that would go below zero is
//! clamped at zero and logged.

use crate::{
    bus::{MessageBus, MessageHandler, Shared},
    event::{EventKind, SimEvent, Tier},
};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub towns:  u32,
    pub cities: u32,
    pub metros: u32,
}

impl TierCounts {
    pub fn total(&self) -> u32 {
        self.towns + self.cities + self.metros
    }

    fn slot_mut(&mut self, tier: Tier) -> Option<&mut u32> {
        match tier {
            Tier::New   => None,
            Tier::Town  => Some(&mut self.towns),
            Tier::City  => Some(&mut self.cities),
            Tier::Metro => Some(&mut self.metros),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityLedger {
    counts:     TierCounts,
    /// Decrements that hit an empty counter and were clamped.
    underflows: u64,
}

impl CityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the ledger and subscribe it to city transitions.
    pub fn attach(self, bus: &MessageBus) -> Shared<Self> {
        let ledger = Rc::new(RefCell::new(self));
        bus.attach(EventKind::CityTransition, &ledger);
        ledger
    }

    pub fn counts(&self) -> TierCounts {
        self.counts
    }

    pub fn underflows(&self) -> u64 {
        self.underflows
    }

    pub fn apply(&mut self, old: Tier, new: Tier) {
        if let Some(slot) = self.counts.slot_mut(new) {
            *slot += 1;
        }
        if let Some(slot) = self.counts.slot_mut(old) {
            if *slot == 0 {
                self.underflows += 1;
                log::warn!("Ledger underflow: no {old:?} left to transition to {new:?}");
            } else {
                *slot -= 1;
            }
        }
    }
}

impl MessageHandler for CityLedger {
    fn on_message(&mut self, event: &SimEvent) {
        match event {
            SimEvent::CityTransition { old, new } => self.apply(*old, *new),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn founding_only_increments() {
        let mut ledger = CityLedger::new();
        ledger.apply(Tier::New, Tier::Town);
        assert_eq!(ledger.counts(), TierCounts { towns: 1, cities: 0, metros: 0 });
    }

    #[test]
    fn promotion_moves_one_settlement() {
        let mut ledger = CityLedger::new();
        ledger.apply(Tier::New, Tier::Town);
        ledger.apply(Tier::Town, Tier::City);
        assert_eq!(ledger.counts(), TierCounts { towns: 0, cities: 1, metros: 0 });
    }

    #[test]
    fn same_tier_transition_is_net_zero() {
        let mut ledger = CityLedger::new();
        ledger.apply(Tier::New, Tier::City);
        ledger.apply(Tier::City, Tier::City);
        assert_eq!(ledger.counts().cities, 1);
        assert_eq!(ledger.underflows(), 0);
    }

    #[test]
    fn underflow_clamps_at_zero() {
        let mut ledger = CityLedger::new();
        ledger.apply(Tier::Town, Tier::City);
        assert_eq!(ledger.counts(), TierCounts { towns: 0, cities: 1, metros: 0 });
        assert_eq!(ledger.underflows(), 1);
    }

    #[test]
    fn unrelated_messages_are_ignored() {
        let mut ledger = CityLedger::new();
        ledger.on_message(&SimEvent::MoneyUpdated { amount: 10 });
        ledger.on_message(&SimEvent::OfficerAdded);
        assert_eq!(ledger, CityLedger::new());
    }
}
