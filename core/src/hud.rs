//! HUD state projection.
//!
//! Consumes `RegionMessage` and `MoneyUpdated`, keeps the four-line
//! description and the money readout, and hands them to a render sink.
//!
//! Click policy: every tick, regions are scanned in insertion order and
//! each clicked region overwrites the displayed lines. When several are
//! clicked at once the most recently inserted one wins.
//!
//! Money formatting is deferred: `MoneyUpdated` only stores the amount
//! and marks it dirty; the next tick formats it once.

use crate::{
    bus::{MessageBus, MessageHandler, Shared},
    config::HudLayout,
    error::{SimError, SimResult},
    event::{EventKind, RegionMessage, SimEvent},
    render::{RegionTracker, RenderSink},
    rng::SubsystemRng,
    subsystem::SimSubsystem,
    types::{Rect, RegionId, SimTime, Tick, Vec2},
};
use serde::Serialize;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionEntry {
    pub id:         RegionId,
    pub space_rect: Rect,
    pub lines:      [String; 4],
    /// Set by the input collaborator; only read here.
    pub clicked:    bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HudDisplay {
    pub lines:       [String; 4],
    pub money_text:  String,
    pub money:       i64,
    pub money_dirty: bool,
}

pub struct HudStateProjector {
    layout:  HudLayout,
    regions: Vec<RegionEntry>,
    index:   HashMap<RegionId, usize>,
    display: HudDisplay,
    tracker: Option<Box<dyn RegionTracker>>,
}

impl HudStateProjector {
    pub fn new(layout: HudLayout) -> Self {
        Self {
            layout,
            regions: Vec::new(),
            index:   HashMap::new(),
            display: HudDisplay::default(),
            tracker: None,
        }
    }

    /// Install the region tracker. Regions that already exist are tracked
    /// immediately, in insertion order.
    pub fn set_tracker(&mut self, mut tracker: Box<dyn RegionTracker>) {
        for region in &self.regions {
            tracker.track(&region.id, region.space_rect);
        }
        self.tracker = Some(tracker);
    }

    pub fn attach(self, bus: &MessageBus) -> Shared<Self> {
        let hud = Rc::new(RefCell::new(self));
        bus.attach(EventKind::RegionMessage, &hud);
        bus.attach(EventKind::MoneyUpdated, &hud);
        hud
    }

    pub fn display(&self) -> &HudDisplay {
        &self.display
    }

    /// Regions in insertion order.
    pub fn regions(&self) -> &[RegionEntry] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&RegionEntry> {
        self.index.get(id).map(|&i| &self.regions[i])
    }

    pub fn set_clicked(&mut self, id: &str, clicked: bool) -> SimResult<()> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| SimError::RegionNotFound { id: id.to_string() })?;
        self.regions[i].clicked = clicked;
        Ok(())
    }

    /// The per-tick step: copy clicked regions' lines, then format money if dirty.
    pub fn project(&mut self) {
        for region in self.regions.iter().filter(|r| r.clicked) {
            self.display.lines.clone_from(&region.lines);
        }
        if self.display.money_dirty {
            self.display.money_text = format_money(self.display.money);
            self.display.money_dirty = false;
        }
    }

    /// Push the current display state to the sink. Empty strings are skipped.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        let z = self.layout.z_order;
        for (i, line) in self.display.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let position = Vec2::new(
                self.layout.line_origin.x,
                self.layout.line_origin.y + self.layout.line_spacing * i as f32,
            );
            sink.draw_text(line, position, z);
        }
        if !self.display.money_text.is_empty() {
            sink.draw_text(&self.display.money_text, self.layout.money_position, z);
        }
    }

    fn upsert_region(&mut self, msg: &RegionMessage) {
        match self.index.get(&msg.region_id) {
            Some(&i) => {
                let entry = &mut self.regions[i];
                entry.space_rect = msg.space_rect;
                entry.lines.clone_from(&msg.lines);
                log::debug!("Region '{}' updated", msg.region_id);
            }
            None => {
                self.index.insert(msg.region_id.clone(), self.regions.len());
                self.regions.push(RegionEntry {
                    id:         msg.region_id.clone(),
                    space_rect: msg.space_rect,
                    lines:      msg.lines.clone(),
                    clicked:    false,
                });
                log::debug!("Region '{}' created", msg.region_id);
            }
        }
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.track(&msg.region_id, msg.space_rect);
        }
    }
}

impl MessageHandler for HudStateProjector {
    fn on_message(&mut self, event: &SimEvent) {
        match event {
            SimEvent::RegionMessage(msg) => self.upsert_region(msg),
            SimEvent::MoneyUpdated { amount } => {
                self.display.money = *amount;
                self.display.money_dirty = true;
            }
            _ => {}
        }
    }
}

impl SimSubsystem for HudStateProjector {
    fn name(&self) -> &'static str { "hud" }

    fn on_tick(
        &mut self,
        _tick: Tick,
        _dt: SimTime,
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        self.project();
        Ok(Vec::new())
    }
}

/// `640` → `"$640"`, `-40` → `"-$40"`.
pub fn format_money(amount: i64) -> String {
    if amount < 0 {
        format!("-${}", amount.unsigned_abs())
    } else {
        format!("${amount}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: &str, first_line: &str) -> SimEvent {
        SimEvent::RegionMessage(RegionMessage {
            region_id:  id.into(),
            space_rect: Rect::new(0.0, 0.0, 32.0, 32.0),
            lines:      [first_line.into(), "b".into(), "c".into(), "d".into()],
        })
    }

    #[derive(Default)]
    struct Calls(Vec<String>);

    impl RegionTracker for Calls {
        fn track(&mut self, id: &RegionId, _rect: Rect) {
            self.0.push(format!("track {id}"));
        }
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_money(640), "$640");
        assert_eq!(format_money(0), "$0");
        assert_eq!(format_money(-40), "-$40");
    }

    #[test]
    fn region_update_keeps_position_and_click_state() {
        let mut hud = HudStateProjector::new(HudLayout::default());
        hud.on_message(&region("a", "first"));
        hud.on_message(&region("b", "other"));
        hud.set_clicked("a", true).unwrap();
        hud.on_message(&region("a", "second"));

        assert_eq!(hud.regions()[0].id, "a");
        assert_eq!(hud.regions()[0].lines[0], "second");
        assert!(hud.regions()[0].clicked);
    }

    #[test]
    fn set_clicked_on_unknown_region_fails() {
        let mut hud = HudStateProjector::new(HudLayout::default());
        assert!(matches!(
            hud.set_clicked("missing", true),
            Err(SimError::RegionNotFound { .. })
        ));
    }

    #[test]
    fn late_tracker_replays_existing_regions_then_follows_updates() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut hud = HudStateProjector::new(HudLayout::default());
        hud.on_message(&region("a", "x"));
        hud.set_tracker(Box::new(Rc::clone(&calls)));
        hud.on_message(&region("b", "y"));
        hud.on_message(&region("a", "z"));

        assert_eq!(calls.borrow().0, ["track a", "track b", "track a"]);
        assert_eq!(hud.region("a").map(|r| r.lines[0].as_str()), Some("z"));
    }
}
