/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Roll
///   A / Start             →  Confirm
///   B / Select            →  Back / Quit
///   Y                     →  Restart level
///
/// Like the keyboard, rolls are edge-triggered: the stick must return to
/// center (or change direction) before it rolls again.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{info, warn};

use crate::config::GamepadConfig;
use crate::domain::direction::{dominant_direction, Direction};

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel:  vec![Btn::B, Btn::Select],
            restart: vec![Btn::Y],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Edge flags, cleared at the start of every `update()`.
    pressed: [bool; BTN_COUNT],

    /// D-pad press this frame, if any.
    dpad: Option<Direction>,

    stick_x: f32,
    stick_y: f32,
    stick_threshold: f32,
    /// Direction the stick pointed at after the previous poll.
    stick_dir: Option<Direction>,
    /// Set when the stick newly points somewhere.
    stick_edge: Option<Direction>,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                info!(connected = has_pad, "gamepad backend ready");
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            pressed: [false; BTN_COUNT],
            dpad: None,
            stick_x: 0.0,
            stick_y: 0.0,
            stick_threshold: 0.5,
            stick_dir: None,
            stick_edge: None,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() { map.restart = rs; }
        self.stick_threshold = cfg.stick_threshold;
    }

    pub fn update(&mut self) {
        self.pressed = [false; BTN_COUNT];
        self.dpad = None;

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.update_stick();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        // D-pad is movement, not part of the action map
        let dir = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            self.dpad.get_or_insert(dir);
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.pressed[btn as usize] = true;
        }
    }

    /// Turn the analog stick into a digital edge.
    fn update_stick(&mut self) {
        let dir = dominant_direction(self.stick_x, self.stick_y, self.stick_threshold);
        self.stick_edge = dir.filter(|&d| self.stick_dir != Some(d));
        self.stick_dir = dir;
    }

    // ── Action queries (config-driven) ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.pressed[b as usize])
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.restart)
    }

    /// Roll requested this frame: D-pad first, then the stick.
    pub fn direction(&self) -> Option<Direction> {
        self.dpad.or(self.stick_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        let mut p = GamepadState::new();
        #[cfg(feature = "gamepad")]
        {
            p.gilrs = None;
        }
        p.connected = false;
        p
    }

    fn tilt(p: &mut GamepadState, x: f32, y: f32) -> Option<Direction> {
        p.stick_x = x;
        p.stick_y = y;
        p.update();
        p.direction()
    }

    #[test]
    fn button_names() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("RB"), Some(Btn::R1));
        assert_eq!(Btn::from_name("Turbo"), None);
    }

    #[test]
    fn stick_fires_once_per_push() {
        let mut p = pad();
        assert_eq!(tilt(&mut p, 0.9, 0.1), Some(Direction::Right));
        assert_eq!(tilt(&mut p, 1.0, 0.0), None);
        assert_eq!(tilt(&mut p, 0.0, 0.9), Some(Direction::Up));
        assert_eq!(tilt(&mut p, 0.1, 0.1), None);
        assert_eq!(tilt(&mut p, 0.0, 0.9), Some(Direction::Up));
    }

    #[test]
    fn threshold_comes_from_config() {
        let mut p = pad();
        p.load_button_config(&GamepadConfig {
            confirm: vec![],
            cancel: vec!["Select".into()],
            restart: vec!["nonsense".into()],
            stick_threshold: 0.8,
        });
        assert_eq!(tilt(&mut p, 0.7, 0.0), None);
        assert_eq!(tilt(&mut p, 0.9, 0.0), Some(Direction::Right));
        assert_eq!(p.action_map.cancel, vec![Btn::Select]);
        assert_eq!(p.action_map.confirm, vec![Btn::A, Btn::Start]);
        assert_eq!(p.action_map.restart, vec![Btn::Y]);
    }
}
