//! Messages carried by the bus.
//!
//! RULE: Subsystems communicate ONLY through these messages.
//! A subsystem may never call another subsystem's functions directly.
//! A subsystem may never read another subsystem's internal state.

use crate::types::{Rect, RegionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every message published during simulation.
/// One variant per kind; the payload shape is fixed per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// A settlement moved from `old` to `new`. `old == New` means it was just founded.
    CityTransition { old: Tier, new: Tier },

    OfficerAdded,

    MoneyUpdated { amount: i64 },

    RegionMessage(RegionMessage),
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::CityTransition { .. } => EventKind::CityTransition,
            Self::OfficerAdded => EventKind::OfficerAdded,
            Self::MoneyUpdated { .. } => EventKind::MoneyUpdated,
            Self::RegionMessage(_) => EventKind::RegionMessage,
        }
    }
}

/// A clickable area and the four description lines shown when it is clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMessage {
    pub region_id: RegionId,
    pub space_rect: Rect,
    pub lines: [String; 4],
}

/// Routing discriminant of a [`SimEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CityTransition,
    OfficerAdded,
    MoneyUpdated,
    RegionMessage,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::CityTransition,
        Self::OfficerAdded,
        Self::MoneyUpdated,
        Self::RegionMessage,
    ];

    /// Stable string identifier. Never renamed once published.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CityTransition => "city_transition",
            Self::OfficerAdded   => "officer_added",
            Self::MoneyUpdated   => "money_updated",
            Self::RegionMessage  => "region_message",
        }
    }

    /// Top-level payload keys each kind carries. Nothing else is accepted.
    pub fn payload_fields(&self) -> &'static [&'static str] {
        match self {
            Self::CityTransition => &["old", "new"],
            Self::OfficerAdded   => &[],
            Self::MoneyUpdated   => &["amount"],
            Self::RegionMessage  => &["region_id", "space_rect", "lines"],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement tier. `New` marks the absence of a prior tier and is never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    New,
    Town,
    City,
    Metro,
}

impl Tier {
    /// The tier a settlement grows into, if any.
    pub fn next(&self) -> Option<Tier> {
        match self {
            Self::New   => Some(Self::Town),
            Self::Town  => Some(Self::City),
            Self::City  => Some(Self::Metro),
            Self::Metro => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New   => "Unsettled",
            Self::Town  => "Town",
            Self::City  => "City",
            Self::Metro => "Metropolis",
        }
    }
}

/// A published message as recorded by the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub seq: u64,
    pub tick: u64,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
