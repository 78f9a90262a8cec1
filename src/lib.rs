//! LishaLinux installer library - archinstall configuration front end

pub mod archinstall;
pub mod config;
pub mod disk;
pub mod install;
pub mod resources;
pub mod utils;

pub use config::{InstallOptions, UserInput};
pub use disk::geometry::PartitionGeometry;
pub use utils::error::InstallerError;
