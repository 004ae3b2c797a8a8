//! Data models for the SkillSwap application.
//!
//! JSON shapes use camelCase to match the browser client.

mod catalog;
mod exchange;
mod preferences;

pub use catalog::*;
pub use exchange::*;
pub use preferences::*;
