//! Roll Splat: roll a ball across a tile grid and paint every ground tile
//! one color before the move budget runs out.
//!
//! `domain` holds the static level model and the actor, `sim` the level
//! session and game flow, `ui` the terminal front-end.

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;
