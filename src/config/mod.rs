//! Installer options and operator input

mod input;
mod options;

pub use input::*;
pub use options::*;
