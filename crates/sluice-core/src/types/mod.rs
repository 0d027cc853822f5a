//! Type system for Sluice
//!
//! - Runtime values and operator semantics
//! - Calendar periods
//! - Static value types used by the type checker

pub mod ops;
pub mod period;
pub mod value;
pub mod value_type;

pub use period::Period;
pub use value::Value;
pub use value_type::ValueType;
