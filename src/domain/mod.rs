pub mod actor;
pub mod cell;
pub mod color;
pub mod direction;
pub mod grid;
pub mod resolver;
pub mod tiles;
