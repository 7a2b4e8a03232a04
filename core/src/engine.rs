//! The simulation engine: owns the bus and wires every consumer to it.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Growth subsystem   (publishes city transitions and regions)
//!   2. Accrual subsystem  (publishes money updates)
//!   3. HUD subsystem      (projects clicked regions and money text)
//!
//! SUBSCRIPTION ORDER (defines delivery order per kind):
//!   journal, ledger, accrual, hud
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - No subsystem calls another subsystem's functions directly.
//!   - Messages a subsystem returns are published after its state is
//!     released, before the next subsystem runs.
//!   - All randomness flows through the RngBank.

use crate::{
    accrual::MoneyAccrualEngine,
    bus::{MessageBus, Shared},
    clock::SimClock,
    command::PlayerCommand,
    config::SimConfig,
    error::SimResult,
    event::{EventLogEntry, SimEvent},
    growth::{CityGrowthSubsystem, Settlement},
    hud::{HudDisplay, HudStateProjector, RegionEntry},
    journal::{EventJournal, EXTERNAL_SOURCE},
    ledger::{CityLedger, TierCounts},
    render::{RegionTracker, RenderSink},
    rng::{RngBank, SubsystemSlot},
    subsystem::SimSubsystem,
    types::{SimTime, Tick},
};
use std::{cell::RefCell, rc::Rc};

/// Journal source for messages triggered by player commands.
pub const COMMAND_SOURCE: &str = "command";

pub struct SimEngine {
    pub clock:    SimClock,
    pub rng_bank: RngBank,
    bus:          MessageBus,
    subsystems:   Vec<(SubsystemSlot, Shared<dyn SimSubsystem>)>,
    journal:      Shared<EventJournal>,
    ledger:       Shared<CityLedger>,
    accrual:      Shared<MoneyAccrualEngine>,
    growth:       Shared<CityGrowthSubsystem>,
    hud:          Shared<HudStateProjector>,
}

impl SimEngine {
    /// Build a fully wired engine with all subsystems registered.
    pub fn new(seed: u64, config: SimConfig) -> Self {
        let bus = MessageBus::with_max_depth(config.bus.max_dispatch_depth);

        let journal = EventJournal::new().attach(&bus);
        let ledger  = CityLedger::new().attach(&bus);
        let accrual = MoneyAccrualEngine::new(config.accrual.clone()).attach(&bus);
        let hud     = HudStateProjector::new(config.hud.clone()).attach(&bus);
        let growth  = Rc::new(RefCell::new(CityGrowthSubsystem::new(config.growth.clone())));

        let mut engine = Self {
            clock: SimClock::new(),
            rng_bank: RngBank::new(seed),
            bus,
            subsystems: Vec::new(),
            journal,
            ledger,
            accrual: Rc::clone(&accrual),
            growth: Rc::clone(&growth),
            hud: Rc::clone(&hud),
        };

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(SubsystemSlot::Growth, growth);
        engine.register(SubsystemSlot::Accrual, accrual);
        engine.register(SubsystemSlot::Hud, hud);

        log::info!("Engine built with seed {seed}");
        engine
    }

    /// Register a ticked subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, subsystem: Shared<dyn SimSubsystem>) {
        self.subsystems.push((slot, subsystem));
    }

    /// The bus every consumer is attached to. External producers publish here.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Advance one tick by `frame_dt`. A paused engine does nothing.
    ///
    /// A failing subsystem or publish does not cut the tick short: every
    /// remaining message is still published and every remaining subsystem
    /// still runs. The first error is returned once the tick is complete.
    pub fn tick(&mut self, frame_dt: SimTime) -> SimResult<Tick> {
        if self.clock.paused {
            log::trace!("tick() skipped: clock paused");
            return Ok(self.clock.current_tick);
        }

        let (current_tick, dt) = self.clock.advance(frame_dt);
        self.journal.borrow_mut().set_tick(current_tick);
        let mut first_error = None;

        for (slot, subsystem) in &self.subsystems {
            let mut rng = self.rng_bank.for_subsystem_at_tick(*slot, current_tick);
            let mut borrowed = subsystem.borrow_mut();
            let name = borrowed.name();
            let result = borrowed.on_tick(current_tick, dt, &mut rng);
            drop(borrowed);

            let new_events = match result {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("Subsystem '{name}' failed at tick {current_tick}: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    continue;
                }
            };

            self.journal.borrow_mut().set_source(name);
            for event in new_events {
                if let Err(e) = self.bus.publish(event) {
                    log::warn!("Publish from '{name}' failed at tick {current_tick}: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        self.journal.borrow_mut().set_source(EXTERNAL_SOURCE);

        match first_error {
            Some(e) => Err(e),
            None => Ok(current_tick),
        }
    }

    /// Run n ticks with a fixed frame delta. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64, frame_dt: SimTime) -> SimResult<()> {
        for _ in 0..n {
            self.tick(frame_dt)?;
        }
        Ok(())
    }

    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<()> {
        log::debug!("Applying {command:?}");
        match command {
            PlayerCommand::Pause => self.clock.pause(),
            PlayerCommand::Resume => self.clock.resume(),
            PlayerCommand::SetSpeed { speed } => self.clock.set_speed(speed),
            PlayerCommand::HireOfficer => {
                self.journal.borrow_mut().set_source(COMMAND_SOURCE);
                let published = self.bus.publish(SimEvent::OfficerAdded);
                self.journal.borrow_mut().set_source(EXTERNAL_SOURCE);
                published?;
            }
            PlayerCommand::Click { region_id } => {
                self.hud.borrow_mut().set_clicked(&region_id, true)?;
            }
            PlayerCommand::Release { region_id } => {
                self.hud.borrow_mut().set_clicked(&region_id, false)?;
            }
        }
        Ok(())
    }

    /// Connect the external entity registry that owns click regions.
    pub fn set_region_tracker(&mut self, tracker: Box<dyn RegionTracker>) {
        self.hud.borrow_mut().set_tracker(tracker);
    }

    /// Push the HUD display state to a render sink. Call once per tick.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        self.hud.borrow().render(sink);
    }

    pub fn ledger_counts(&self) -> TierCounts {
        self.ledger.borrow().counts()
    }

    pub fn money(&self) -> i64 {
        self.accrual.borrow().amount()
    }

    pub fn officers(&self) -> u32 {
        self.accrual.borrow().officers()
    }

    pub fn hud_display(&self) -> HudDisplay {
        self.hud.borrow().display().clone()
    }

    pub fn regions(&self) -> Vec<RegionEntry> {
        self.hud.borrow().regions().to_vec()
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.growth.borrow().settlements().to_vec()
    }

    pub fn journal_entries(&self) -> Vec<EventLogEntry> {
        self.journal.borrow().entries().to_vec()
    }

    /// Journal entries recorded during one tick.
    pub fn events_for_tick(&self, tick: Tick) -> Vec<EventLogEntry> {
        self.journal.borrow().entries_for_tick(tick).cloned().collect()
    }
}
