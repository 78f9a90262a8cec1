//! Installation orchestration

mod installer;
pub mod post_install;

pub use installer::*;
