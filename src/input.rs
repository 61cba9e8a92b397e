use std::collections::HashSet;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use web_time::Instant;

/// Identifier for a pointer button (primary button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerButton(u8);

impl PointerButton {
    pub const PRIMARY: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const SECONDARY: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved { position: Vec2 },
    Pressed { button: PointerButton, position: Vec2 },
    Released { button: PointerButton, position: Vec2 },
    /// Browser sign convention: positive values zoom out.
    Wheel { delta_y: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: Vec2,
    buttons: HashSet<PointerButton>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Moved { position } => self.position = position,
            PointerEvent::Pressed { button, position } => {
                self.position = position;
                self.buttons.insert(button);
            }
            PointerEvent::Released { button, position } => {
                self.position = position;
                self.buttons.remove(&button);
            }
            PointerEvent::Wheel { .. } => {}
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_pressed(&self, button: PointerButton) -> bool {
        self.buttons.contains(&button)
    }
}

/// Recognizes double clicks from a stream of primary-button presses.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    window: Duration,
    slop: f32,
    last: Option<(Instant, Vec2)>,
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(400), 4.0)
    }
}

impl ClickTracker {
    pub fn new(window: Duration, slop: f32) -> Self {
        Self {
            window,
            slop,
            last: None,
        }
    }

    /// Records a press. Returns true when it completes a double click; the
    /// pair is consumed so a third press starts over.
    pub fn press(&mut self, position: Vec2, now: Instant) -> bool {
        let double = self.last.is_some_and(|(at, previous)| {
            now.saturating_duration_since(at) <= self.window
                && previous.distance(position) <= self.slop
        });
        self.last = if double { None } else { Some((now, position)) };
        double
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    SelectScene(usize),
    Toggle(&'static str),
    ResetPanel,
}

impl Shortcut {
    pub fn from_key(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("Backspace") {
            return Some(Self::ResetPanel);
        }
        let mut chars = name.chars();
        let ch = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let shortcut = match ch.to_ascii_uppercase() {
            '1' => Self::SelectScene(0),
            '2' => Self::SelectScene(1),
            'D' => Self::Toggle("Controls/drag controls"),
            'A' => Self::Toggle("Subject/animated"),
            'R' => Self::Toggle("Camera/autoRotate"),
            'P' => Self::Toggle("Lights/point light"),
            'L' => Self::Toggle("Lights/ambient light"),
            'X' => Self::Toggle("Helpers/axes"),
            'H' => Self::Toggle("Helpers/pointLight"),
            'W' => Self::Toggle("Subject/wireframe"),
            _ => return None,
        };
        Some(shortcut)
    }
}
