/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Nothing is ever written back.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::actor::Timing;
use crate::domain::color::Color;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Frame interval of the main loop.
    pub frame: Duration,
    pub timing: Timing,
    pub colors: ColorConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub pack: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorConfig {
    pub actor: Color,
    pub unpainted: Color,
    pub wall: Color,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub stick_threshold: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    colors: TomlColors,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame")]
    frame_ms: u64,
    #[serde(default = "default_roll_cell")]
    roll_cell_ms: u64,
    #[serde(default = "default_brake")]
    brake_ms: u64,
    #[serde(default = "default_teleport")]
    teleport_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlColors {
    #[serde(default = "default_actor_color")]
    actor: String,
    #[serde(default = "default_unpainted_color")]
    unpainted: String,
    #[serde(default = "default_wall_color")]
    wall: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_stick_threshold")]
    stick_threshold: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    pack: Option<String>,
}

// ── Defaults ──

fn default_frame() -> u64 { 33 }
fn default_roll_cell() -> u64 { 45 }
fn default_brake() -> u64 { 120 }
fn default_teleport() -> u64 { 250 }

fn default_actor_color() -> String { "#f2c230".into() }
fn default_unpainted_color() -> String { "#3a3f4b".into() }
fn default_wall_color() -> String { "#8a8f99".into() }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_stick_threshold() -> f32 { 0.5 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame(),
            roll_cell_ms: default_roll_cell(),
            brake_ms: default_brake(),
            teleport_ms: default_teleport(),
        }
    }
}

impl Default for TomlColors {
    fn default() -> Self {
        TomlColors {
            actor: default_actor_color(),
            unpainted: default_unpainted_color(),
            wall: default_wall_color(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            stick_threshold: default_stick_threshold(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            pack: None,
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::resolve(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let timing = &toml_cfg.timing;
        let defaults = TomlColors::default();

        GameConfig {
            frame: Duration::from_millis(timing.frame_ms.max(1)),
            timing: Timing {
                roll_cell: Duration::from_millis(timing.roll_cell_ms),
                brake: Duration::from_millis(timing.brake_ms),
                teleport: Duration::from_millis(timing.teleport_ms),
            },
            colors: ColorConfig {
                actor: parse_color("actor", &toml_cfg.colors.actor, &defaults.actor),
                unpainted: parse_color("unpainted", &toml_cfg.colors.unpainted, &defaults.unpainted),
                wall: parse_color("wall", &toml_cfg.colors.wall, &defaults.wall),
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
                stick_threshold: toml_cfg.gamepad.stick_threshold.clamp(0.05, 0.95),
            },
            levels_dir: find_in(search_dirs, &toml_cfg.general.levels_dir, Path::is_dir),
            pack: toml_cfg
                .general
                .pack
                .as_deref()
                .map(|p| find_in(search_dirs, p, Path::is_file)),
        }
    }
}

/// Bad color strings fall back to the built-in default for that slot.
fn parse_color(key: &str, value: &str, default: &str) -> Color {
    Color::from_hex(value).unwrap_or_else(|| {
        warn!(key, value, "invalid color in config, using default");
        Color::from_hex(default).unwrap_or(Color::rgb(255, 255, 255))
    })
}

/// Absolute paths are taken as-is; relative ones are looked up in the
/// candidate dirs, then left relative to the CWD.
fn find_in(search_dirs: &[PathBuf], name: &str, exists: fn(&Path) -> bool) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(name))
        .find(|p| exists(p))
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds data next to the binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/rollsplat)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/rollsplat");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/rollsplat)
    let sys = PathBuf::from("/usr/share/rollsplat");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        info!(path = %path.display(), "config loaded");
                        return cfg;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read config");
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_str(text: &str) -> GameConfig {
        GameConfig::resolve(toml::from_str(text).unwrap(), &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = from_str("");
        assert_eq!(cfg.frame, Duration::from_millis(33));
        assert_eq!(cfg.timing.roll_cell, Duration::from_millis(45));
        assert_eq!(cfg.timing.brake, Duration::from_millis(120));
        assert_eq!(cfg.timing.teleport, Duration::from_millis(250));
        assert_eq!(cfg.colors.actor, Color::rgb(0xf2, 0xc2, 0x30));
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.pack, None);
        assert_eq!(cfg.gamepad.restart, vec!["Y".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = from_str(
            r#"
            [timing]
            roll_cell_ms = 0

            [general]
            pack = "/tmp/classic.rlp"
            "#,
        );
        assert_eq!(cfg.timing.roll_cell, Duration::ZERO);
        assert_eq!(cfg.timing.brake, Duration::from_millis(120));
        assert_eq!(cfg.pack, Some(PathBuf::from("/tmp/classic.rlp")));
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn bad_color_falls_back() {
        let cfg = from_str(
            r#"
            [colors]
            actor = "not a color"
            wall = "102030"
            "#,
        );
        assert_eq!(cfg.colors.actor, GameConfig::default().colors.actor);
        assert_eq!(cfg.colors.wall, Color::rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn stick_threshold_is_clamped() {
        let cfg = from_str("[gamepad]\nstick_threshold = 3.0\n");
        assert_eq!(cfg.gamepad.stick_threshold, 0.95);
        assert_eq!(cfg.gamepad.confirm, default_confirm());
    }

    #[test]
    fn zero_frame_is_raised() {
        assert_eq!(from_str("[timing]\nframe_ms = 0\n").frame, Duration::from_millis(1));
    }
}
