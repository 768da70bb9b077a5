//! API Routes
//!
//! Route handlers organized by functionality.

pub mod coverage;
pub mod health;
pub mod observations;
pub mod plumes;
pub mod reload;
pub mod targets;
