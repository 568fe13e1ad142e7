//! Status line rendering and presentation

pub mod render;
pub mod types;
