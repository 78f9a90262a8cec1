//! Documents consumed by archinstall
//!
//! archinstall takes two JSON files: the configuration (`--config`) and the
//! credentials (`--creds`). Both are built here as pure functions of the
//! operator input, the partition geometry and the installer options.

pub mod credentials;
pub mod document;

pub use credentials::CredentialsDocument;
pub use document::{build_config, render_config};
