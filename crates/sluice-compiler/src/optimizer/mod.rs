//! Optimization module
//!
//! Rewrites validated rules before code generation.

pub mod constant_folding;

pub use constant_folding::ConstantFolder;
