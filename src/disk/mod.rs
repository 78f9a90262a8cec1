//! Disk queries and partition geometry

pub mod detection;
pub mod geometry;
