//! Text utilities shared by tasks and config groups

pub mod expression;
pub mod properties;
