//! Grant-program management: application intake, per-reviewer scoring with
//! history tracking, and resource-allocation accounting.

pub mod config;
pub mod error;
pub mod grants;
pub mod telemetry;
