/// Keyboard input tracker.
///
/// Hops are discrete: every Press (and every auto-repeat while a key is
/// held) is one movement command. The controller drops commands that
/// arrive mid-hop, so holding a key walks at the hop rate.
///
/// Release events are ignored; nothing here depends on a key staying down.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::rules::MoveDir;

const UP_KEYS: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('k')];
const DOWN_KEYS: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('j')];
const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('h')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('l')];

pub struct InputState {
    /// Press/Repeat codes seen during the most recent `drain_events`, in order.
    presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        if key.kind != KeyEventKind::Release {
            self.presses.push(normalize(key.code));
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.contains(&code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// The first movement key pressed this frame, if any.
    pub fn move_command(&self) -> Option<MoveDir> {
        self.presses.iter().find_map(|code| {
            if UP_KEYS.contains(code) {
                Some(MoveDir::Up)
            } else if DOWN_KEYS.contains(code) {
                Some(MoveDir::Down)
            } else if LEFT_KEYS.contains(code) {
                Some(MoveDir::Left)
            } else if RIGHT_KEYS.contains(code) {
                Some(MoveDir::Right)
            } else {
                None
            }
        })
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Fold shifted letters onto lowercase so Caps Lock doesn't break controls.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
