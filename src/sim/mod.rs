pub mod event;
pub mod game;
pub mod level;
pub mod session;
pub mod step;
