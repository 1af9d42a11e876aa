//! Domain models for the triage navigator.

mod audit;
mod classification;
mod escalation;
mod flag;

pub use audit::*;
pub use classification::*;
pub use escalation::*;
pub use flag::*;
