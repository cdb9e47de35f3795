//! CLI command implementations

pub mod address;
pub mod demo;
pub mod predict;
