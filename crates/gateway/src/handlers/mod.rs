//! API handlers module

pub mod answers;
pub mod health;
