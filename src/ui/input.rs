/// Keyboard input tracker.
///
/// Moves are edge-triggered: one press, one roll. Key auto-repeat while a
/// key is held must not queue further rolls, so each key is tracked as
/// held until it is released (or, on terminals without Release events,
/// until repeats stop arriving).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::direction::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const CONFIRM_KEYS: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const RESTART_KEYS: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const BACK_KEYS: &[KeyCode] = &[KeyCode::Esc];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last
    /// `drain_events()`, in arrival order.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without confirmed enhancement, rely on the timeout instead.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self
                    .last_active
                    .get(&key.code)
                    .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Was this key freshly pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// First movement key pressed this frame (arrows or WASD).
    pub fn direction(&self) -> Option<Direction> {
        self.fresh_presses.iter().find_map(|&code| key_direction(code))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn first_direction_wins() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(press(KeyCode::Char('x')), now);
        input.record(press(KeyCode::Left), now);
        input.record(press(KeyCode::Char('w')), now);
        assert_eq!(input.direction(), Some(Direction::Left));
    }

    #[test]
    fn auto_repeat_is_not_a_new_press() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(press(KeyCode::Up), now);
        input.fresh_presses.clear();
        input.record(press(KeyCode::Up), now + Duration::from_millis(30));
        assert_eq!(input.direction(), None);

        input.record(press(KeyCode::Up), now + Duration::from_millis(500));
        assert_eq!(input.direction(), Some(Direction::Up));
    }

    #[test]
    fn release_is_honored_only_when_enabled() {
        let mut input = InputState::new();
        let now = Instant::now();
        let release = KeyEvent::new_with_kind(KeyCode::Char('r'), KeyModifiers::NONE, KeyEventKind::Release);

        input.record(press(KeyCode::Char('r')), now);
        input.record(release, now);
        input.fresh_presses.clear();
        input.record(press(KeyCode::Char('r')), now);
        assert!(!input.any_pressed(RESTART_KEYS));

        input.honor_release = true;
        input.record(release, now);
        input.record(press(KeyCode::Char('r')), now);
        assert!(input.any_pressed(RESTART_KEYS));
    }

    #[test]
    fn ctrl_c() {
        let mut input = InputState::new();
        input.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(input.ctrl_c_pressed());
    }
}
