//! Collaborator interfaces at the edge of the core.
//!
//! The core never draws and never hit-tests. It pushes text to a
//! [`RenderSink`] and tells a [`RegionTracker`] which rectangles exist;
//! whoever owns input flips `clicked` on the HUD's region entries.

use crate::types::{Rect, RegionId, Vec2};
use std::{cell::RefCell, rc::Rc};

/// Receives text to draw this frame.
pub trait RenderSink {
    fn draw_text(&mut self, text: &str, position: Vec2, z_order: i32);
}

/// External entity registry that owns spatial/click primitives.
/// Called whenever a region is created or its rectangle may have changed.
pub trait RegionTracker {
    fn track(&mut self, id: &RegionId, rect: Rect);
}

impl<T: RegionTracker> RegionTracker for Rc<RefCell<T>> {
    fn track(&mut self, id: &RegionId, rect: Rect) {
        self.borrow_mut().track(id, rect);
    }
}

/// One recorded `draw_text` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub text:     String,
    pub position: Vec2,
    pub z_order:  i32,
}

/// Sink that keeps every draw call. Used by tooling and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.text.as_str()).collect()
    }
}

impl RenderSink for RecordingSink {
    fn draw_text(&mut self, text: &str, position: Vec2, z_order: i32) {
        self.commands.push(DrawCommand { text: text.to_string(), position, z_order });
    }
}
