//! City growth: the settlement producer.
//!
//! Each tick, in this order:
//!   1. Maybe found a new town (`New → Town`) on the next free tile.
//!   2. Maybe promote one randomly chosen settlement one tier up.
//!
//! Every transition is published as `CityTransition`, immediately followed
//! by a `RegionMessage` carrying the settlement's tile and description,
//! so the HUD can show it when clicked.

use crate::{
    config::GrowthConfig,
    error::SimResult,
    event::{RegionMessage, SimEvent, Tier},
    name_generator::NameGenerator,
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::{Rect, RegionId, SimTime, Tick},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub id:         RegionId,
    pub name:       String,
    pub tier:       Tier,
    pub tile:       u32,
    pub founded_at: Tick,
}

pub struct CityGrowthSubsystem {
    config:      GrowthConfig,
    settlements: Vec<Settlement>,
}

impl CityGrowthSubsystem {
    pub fn new(config: GrowthConfig) -> Self {
        Self { config, settlements: Vec::new() }
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    fn tile_rect(&self, tile: u32) -> Rect {
        let columns = self.config.grid_columns.max(1);
        let size = self.config.tile_size;
        Rect::new(
            (tile % columns) as f32 * size,
            (tile / columns) as f32 * size,
            size,
            size,
        )
    }

    fn describe(&self, settlement: &Settlement) -> SimEvent {
        SimEvent::RegionMessage(RegionMessage {
            region_id:  settlement.id.clone(),
            space_rect: self.tile_rect(settlement.tile),
            lines: [
                settlement.name.clone(),
                format!("Tier: {}", settlement.tier.label()),
                format!("Income: {}", self.tier_income_label(settlement.tier)),
                format!("Founded on tick {}", settlement.founded_at),
            ],
        })
    }

    fn tier_income_label(&self, tier: Tier) -> &'static str {
        match tier {
            Tier::New | Tier::Town => "modest",
            Tier::City => "steady",
            Tier::Metro => "booming",
        }
    }

    fn promote_chance(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Town => self.config.promote_town_chance,
            Tier::City => self.config.promote_city_chance,
            Tier::New | Tier::Metro => 0.0,
        }
    }

    fn found(&mut self, tick: Tick, rng: &mut SubsystemRng) -> Vec<SimEvent> {
        let tile = self.settlements.len() as u32;
        let settlement = Settlement {
            id:         format!("settlement-{tile}"),
            name:       NameGenerator::settlement_name(rng),
            tier:       Tier::Town,
            tile,
            founded_at: tick,
        };
        log::debug!("Founded {} ({}) at tick {tick}", settlement.name, settlement.id);
        let region = self.describe(&settlement);
        self.settlements.push(settlement);
        vec![SimEvent::CityTransition { old: Tier::New, new: Tier::Town }, region]
    }

    fn promote(&mut self, rng: &mut SubsystemRng) -> Vec<SimEvent> {
        if self.settlements.is_empty() {
            return Vec::new();
        }
        let i = rng.below(self.settlements.len());
        let old = self.settlements[i].tier;
        let Some(new) = old.next() else {
            return Vec::new();
        };
        if !rng.chance(self.promote_chance(old)) {
            return Vec::new();
        }
        self.settlements[i].tier = new;
        log::debug!("{} grew from {old:?} to {new:?}", self.settlements[i].name);
        vec![
            SimEvent::CityTransition { old, new },
            self.describe(&self.settlements[i]),
        ]
    }
}

impl SimSubsystem for CityGrowthSubsystem {
    fn name(&self) -> &'static str { "growth" }

    fn on_tick(
        &mut self,
        tick: Tick,
        _dt: SimTime,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        if self.settlements.len() < self.config.max_settlements
            && rng.chance(self.config.found_chance)
        {
            events.extend(self.found(tick, rng));
        }
        events.extend(self.promote(rng));
        Ok(events)
    }
}
