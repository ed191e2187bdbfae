//! Grid generation and the per-session card grid.

pub mod board;
pub mod generator;

pub use board::Grid;
pub use generator::{fisher_yates, GridGenerator};
